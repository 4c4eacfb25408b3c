use std::fs::{File, create_dir_all};
use std::path::Path;

use anyhow::{Context, Result};
use zip::read::ZipArchive;

#[cfg(target_family = "windows")]
use zip::read::root_dir_common_filter;

/// Unpacks a zip archive over `dest`, creating it if needed. Entries that
/// would escape the destination are rejected by the reader itself.
pub fn extract(archive: impl AsRef<Path>, dest: impl AsRef<Path>) -> Result<()> {
    let archive = archive.as_ref();
    let dest = dest.as_ref();
    let f = File::open(archive).context(format!("Was opening archive {archive:?}"))?;
    let mut z = ZipArchive::new(f).context(format!("{archive:?} is not a readable zip"))?;

    create_dir_all(dest).context(format!("Was creating dir {dest:?}"))?;
    z.extract(dest)
        .context(format!("Was extracting {archive:?} into {dest:?}"))?;

    Ok(())
}

/// Like [`extract`] but drops the single top-level directory runtime
/// archives are wrapped in.
#[cfg(target_family = "windows")]
pub fn extract_unwrapped(archive: impl AsRef<Path>, dest: impl AsRef<Path>) -> Result<()> {
    let archive = archive.as_ref();
    let dest = dest.as_ref();
    let f = File::open(archive).context(format!("Was opening archive {archive:?}"))?;

    ZipArchive::new(f)
        .context(format!("{archive:?} is not a readable zip"))?
        .extract_unwrapped_root_dir(dest, root_dir_common_filter)
        .context(format!("Was extracting {archive:?} into {dest:?}"))?;

    Ok(())
}

/// tar.gz flavor of [`extract_unwrapped`] for the platforms whose runtime
/// ships as a tarball.
#[cfg(target_family = "unix")]
pub fn extract_tar_gz_unwrapped(archive: impl AsRef<Path>, dest: impl AsRef<Path>) -> Result<()> {
    use std::ffi::OsStr;

    use anyhow::bail;
    use flate2::read::GzDecoder;
    use tar::Archive;

    let archive = archive.as_ref();
    let dest = dest.as_ref();
    let f = File::open(archive).context(format!("Was opening archive {archive:?}"))?;
    let gz = GzDecoder::new(f);
    let mut tar = Archive::new(gz);

    create_dir_all(dest).context(format!("Was creating dir {dest:?}"))?;
    let canon_dest = dest
        .canonicalize()
        .context("Couldn't canonicalize the extraction dir?")?;

    for entry in tar.entries().context("Could not read the tarball entries")? {
        let mut e = match entry {
            Ok(e) => e,
            Err(err) => {
                log::error!("{err:?}");
                continue;
            }
        };

        if e.header().entry_type() != tar::EntryType::Regular {
            continue;
        }

        let path = e.path()?;
        let parts = path.iter().map(OsStr::to_owned).collect::<Vec<_>>();
        if parts.len() < 2 {
            // top-level entry of the wrapper dir itself
            continue;
        }

        let mut out = dest.to_path_buf();
        out.extend(&parts[1..]);
        if let Some(parent) = out.parent() {
            create_dir_all(parent)?;
            let canon = parent
                .canonicalize()
                .context("Couldn't canonicalize the final extract path?")?;
            if !canon.starts_with(&canon_dest) {
                bail!("This archive's got a path traversal? {out:?} goes out of {dest:?}");
            }
        }

        let _ = e.unpack(&out)?;
    }

    Ok(())
}
