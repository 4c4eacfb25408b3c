use std::fs::{read_to_string, remove_dir_all, remove_file};
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

/// Subtrees the pack archive owns outright. They get wiped before every
/// re-extraction instead of merged.
static MANAGED_DIRS: [&str; 4] = ["config", "fancymenu_data", "mods", "shaderpacks"];
static MANAGED_FILE: &str = "servers.dat";

#[derive(Debug, Clone, PartialEq)]
pub enum PackStatus {
    UpToDate,
    Updated(String),
}

/// Brings the game dir in line with the remote pack. `fetch` and `extract`
/// are the only ways this function touches the network or an archive, so
/// callers decide what those mean.
///
/// There is no partial-completion marker on disk: dying between the wipe
/// and the extraction leaves a stripped install whose stored version still
/// mismatches the remote, so the next run lands right back here and
/// finishes the job.
pub fn sync<F, X>(
    fetch: F,
    extract: X,
    manifest_url: &str,
    pack_url: &str,
    local_version: &str,
    game_dir: &Path,
) -> Result<PackStatus>
where
    F: Fn(&str, &Path) -> Result<()>,
    X: Fn(&Path, &Path) -> Result<()>,
{
    if manifest_url.is_empty() || pack_url.is_empty() {
        log::info!("No pack configured, skipping the update check");
        return Ok(PackStatus::UpToDate);
    }

    let temp_manifest = game_dir.join("remote_manifest.json");
    log::info!("Fetching the pack manifest from {manifest_url}");
    fetch(manifest_url, &temp_manifest).context("Could not fetch the remote pack manifest")?;

    let remote = match read_remote_version(&temp_manifest) {
        Ok(v) => v,
        Err(e) => {
            let _ = remove_file(&temp_manifest);
            return Err(e);
        }
    };

    if remote == local_version {
        log::info!("Pack is up to date ({local_version})");
        let _ = remove_file(&temp_manifest);
        return Ok(PackStatus::UpToDate);
    }

    log::info!("Pack {local_version} is stale, updating to {remote}");
    clean_managed_entries(game_dir);

    if let Err(e) = fetch_and_extract(&fetch, &extract, pack_url, game_dir) {
        let _ = remove_file(&temp_manifest);
        return Err(e);
    }

    let _ = remove_file(&temp_manifest);
    log::info!("Pack updated to {remote}");
    Ok(PackStatus::Updated(remote))
}

/// An unreadable manifest body is fatal, but a missing or non-string
/// version field just reads as "0.0.0".
fn read_remote_version(manifest: &Path) -> Result<String> {
    let json = read_to_string(manifest).context(format!("Failed to read {manifest:?}"))?;
    let v: Value = serde_json::from_str(&json).context("The remote manifest is not valid JSON")?;

    Ok(v.get("version")
        .and_then(Value::as_str)
        .unwrap_or("0.0.0")
        .to_string())
}

/// Unconditionally removes the pack-owned entries. A failure on one of
/// them is logged and the rest still get their turn.
fn clean_managed_entries(game_dir: &Path) {
    let servers = game_dir.join(MANAGED_FILE);
    if servers.exists() {
        match remove_file(&servers) {
            Ok(()) => log::info!("Deleted {MANAGED_FILE} for the mandatory overwrite"),
            Err(e) => log::error!("Could not delete {servers:?}: {e}"),
        }
    }

    for folder in MANAGED_DIRS {
        let dir = game_dir.join(folder);
        if !dir.exists() {
            continue;
        }

        match remove_dir_all(&dir) {
            Ok(()) => log::info!("Deleted {folder}/ for the mandatory overwrite"),
            Err(e) => log::error!("Could not delete {dir:?}: {e}"),
        }
    }
}

fn fetch_and_extract<F, X>(fetch: &F, extract: &X, pack_url: &str, game_dir: &Path) -> Result<()>
where
    F: Fn(&str, &Path) -> Result<()>,
    X: Fn(&Path, &Path) -> Result<()>,
{
    let archive = game_dir.join("pack.zip");
    log::info!("Downloading the pack archive from {pack_url}");
    fetch(pack_url, &archive).context("Could not download the pack archive")?;

    log::info!("Extracting the pack archive");
    if let Err(e) = extract(&archive, game_dir) {
        let _ = remove_file(&archive);
        return Err(e.context("Could not extract the pack archive"));
    }

    let _ = remove_file(&archive);
    Ok(())
}
