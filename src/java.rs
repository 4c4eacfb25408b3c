use std::env::consts;
use std::fs::remove_file;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use reqwest::blocking::Client;

use crate::init::get_appdir;
use crate::utils::archive;
use crate::utils::download::download;

const JRE_MAJOR: usize = 17;

/// Makes sure a usable runtime sits under the app dir and returns the path
/// to its java executable. Present runtime means no network at all.
pub fn ensure_runtime(cl: &Client) -> Result<String> {
    let root = get_appdir().join(format!("java{JRE_MAJOR}"));
    let java = java_executable(&root);
    if java.is_file() {
        return Ok(java.display().to_string());
    }

    // We're using Temurin
    let arch = if consts::ARCH == "x86_64" {
        "x64"
    } else {
        consts::ARCH
    };
    let url = format!(
        "https://api.adoptium.net/v3/binary/latest/{}/ga/{}/{}/jre/hotspot/normal/eclipse?project=jdk",
        JRE_MAJOR,
        consts::OS,
        arch,
    );

    let archive_name = if cfg!(windows) {
        "temurin.zip"
    } else {
        "temurin.tar.gz"
    };
    let tmp = get_appdir().join(archive_name);

    log::info!("Downloading a Java {JRE_MAJOR} runtime");
    download(cl, &url, &tmp).context("Could not download the Java runtime")?;

    log::info!("Extracting the Java runtime");
    #[cfg(target_family = "windows")]
    archive::extract_unwrapped(&tmp, &root).context("Could not extract the Java runtime")?;

    #[cfg(target_family = "unix")]
    archive::extract_tar_gz_unwrapped(&tmp, &root)
        .context("Could not extract the Java runtime")?;

    let _ = remove_file(&tmp);
    if !java.is_file() {
        bail!("The extracted runtime is missing {java:?}");
    }

    Ok(java.display().to_string())
}

fn java_executable(root: &Path) -> PathBuf {
    let mut j = root.to_path_buf();
    j.push("bin");

    if cfg!(windows) {
        j.push("java.exe");
    } else {
        j.push("java");
    }

    j
}
