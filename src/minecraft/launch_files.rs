use std::fs::{File, read_to_string, write};
use std::io::{BufWriter, Write as _};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// classpath.txt is one `;`-joined line, no trailing separator. The
/// launch step reads it back instead of rebuilding the entry list.
pub fn write_classpath(path: &Path, entries: &[PathBuf]) -> Result<()> {
    let line = entries
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<String>>()
        .join(";");

    write(path, line).context(format!("Failed to write {path:?}"))?;
    Ok(())
}

pub fn read_classpath(path: &Path) -> Result<String> {
    read_to_string(path).context(format!("Failed to read {path:?}"))
}

/// The JVM argument file: one token per line, `-Xmx` first when a cap was
/// configured, then JVM args, main class, game args. Tokens containing a
/// space get double quotes; embedded quotes and backslashes pass through
/// untouched, a known limitation of the format.
pub fn write_launch_args(
    path: &Path,
    max_ram: &str,
    jvm_args: &[String],
    main_class: &str,
    game_args: &[String],
) -> Result<()> {
    let f = File::create(path).context(format!("Could not open {path:?} for writing"))?;
    let mut out = BufWriter::new(f);

    let mut emit = |token: &str| -> Result<()> {
        if token.contains(' ') {
            writeln!(out, "\"{token}\"")?;
        } else {
            writeln!(out, "{token}")?;
        }

        Ok(())
    };

    if !max_ram.is_empty() {
        emit(&format!("-Xmx{max_ram}"))?;
    }
    for arg in jvm_args {
        emit(arg)?;
    }
    emit(main_class)?;
    for arg in game_args {
        emit(arg)?;
    }

    out.flush().context(format!("Was flushing {path:?}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs::read_to_string;

    use super::*;

    #[test]
    fn classpath_round_trips_in_order() {
        let dir = crate::tests::scratch("classpath-roundtrip");
        let path = dir.join("classpath.txt");
        let entries = vec![
            PathBuf::from("libs/a-1.0.jar"),
            PathBuf::from("libs/b-2.0.jar"),
            PathBuf::from("versions/client.jar"),
        ];

        write_classpath(&path, &entries).unwrap();
        let line = read_classpath(&path).unwrap();
        assert_eq!(line, "libs/a-1.0.jar;libs/b-2.0.jar;versions/client.jar");
        assert!(!line.ends_with(';'));
    }

    #[test]
    fn empty_classpath_is_an_empty_line() {
        let dir = crate::tests::scratch("classpath-empty");
        let path = dir.join("classpath.txt");
        write_classpath(&path, &[]).unwrap();
        assert_eq!(read_classpath(&path).unwrap(), "");
    }

    #[test]
    fn args_file_layout_and_quoting() {
        let dir = crate::tests::scratch("launch-args");
        let path = dir.join("launch_args.txt");
        let jvm = vec!["-Xss1M".to_string(), "-Dname=hello world".to_string()];
        let game = vec!["--username".to_string(), "Steve".to_string()];

        write_launch_args(&path, "6G", &jvm, "net.minecraft.client.main.Main", &game).unwrap();

        let lines = read_to_string(&path).unwrap();
        let lines = lines.lines().collect::<Vec<&str>>();
        assert_eq!(
            lines,
            vec![
                "-Xmx6G",
                "-Xss1M",
                "\"-Dname=hello world\"",
                "net.minecraft.client.main.Main",
                "--username",
                "Steve",
            ],
        );
    }

    #[test]
    fn no_ram_cap_means_no_xmx_line() {
        let dir = crate::tests::scratch("launch-args-no-ram");
        let path = dir.join("launch_args.txt");
        write_launch_args(&path, "", &[], "Main", &[]).unwrap();

        let content = read_to_string(&path).unwrap();
        assert_eq!(content.lines().collect::<Vec<&str>>(), vec!["Main"]);
    }
}
