use std::fs::create_dir_all;
use std::io::{Write, stdin, stdout};
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use reqwest::blocking::Client;

mod account;
mod config;
mod init;
mod java;
mod logs;
mod minecraft;
mod utils;

#[cfg(test)]
mod tests;

use config::Config;
use minecraft::PackStatus;
use utils::download::download;

static AUTHLIB_INJECTOR_URL: &str =
    "https://authlib-injector.yushi.moe/artifact/53/authlib-injector-1.2.5.jar";

fn main() -> ExitCode {
    if let Err(e) = logs::init_logs_and_appdir() {
        eprintln!("Failed to init logs: {e}");
        return ExitCode::FAILURE;
    }

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Launch aborted: {e:?}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    log::info!("{} starting", init::FULLNAME);
    let cl = init::init_reqwest()?;
    let mut cfg = Config::load()?;

    if cfg.auth_token.is_empty() {
        log::info!("No token found in the config");
        cfg.auth_token = prompt_token()?;
        cfg.save()?;
        log::info!("Token saved to the config file");
    }

    let game_dir = init::get_gamedir();
    create_dir_all(&game_dir).context(format!("Failed to create {game_dir:?}"))?;

    // nothing below works without a runtime to hand the argfile to
    if !cfg.java_ready() {
        cfg.java_path = java::ensure_runtime(&cl)?;
        cfg.java_downloaded = true;
    }

    let account = account::login(&cl, &cfg.api_url, &cfg.auth_token)?;
    if account.is_online() {
        log::info!("Session established for {}", account.name);
    } else {
        log::info!("Running {} in offline mode", account.name);
    }
    cfg.username = account.name.clone();
    cfg.uuid = account.uuid.clone();

    create_dir_all(game_dir.join("config"))?;
    let fetch = |url: &str, dest: &Path| download(&cl, url, dest);
    let extract = |archive: &Path, dest: &Path| utils::archive::extract(archive, dest);
    let status = minecraft::pack::sync(
        fetch,
        extract,
        &cfg.pack_manifest_url,
        &cfg.pack_url,
        &cfg.pack_version,
        &game_dir,
    )
    .context("Failed to update the pack")?;

    if let PackStatus::Updated(version) = status {
        cfg.pack_version = version;
    }

    ensure_auth_agent(&cl, &game_dir)?;
    cfg.save()?;

    let os = minecraft::current_platform();
    minecraft::build_classpath(&cl, &game_dir, &cfg.game_version, os)?;
    minecraft::launch(&cfg, &account, &game_dir, &cfg.game_version, os)?;

    Ok(())
}

fn prompt_token() -> Result<String> {
    print!("Enter your launcher token: ");
    stdout().flush()?;

    let mut token = String::new();
    stdin().read_line(&mut token)?;
    let token = token.trim().to_string();
    if token.is_empty() {
        bail!("No token provided");
    }

    Ok(token)
}

/// The agent jar only moves over the wire once; after that its presence is
/// the idempotence check.
fn ensure_auth_agent(cl: &Client, game_dir: &Path) -> Result<()> {
    let jar = game_dir.join("libraries").join("authlib-injector.jar");
    if jar.is_file() {
        return Ok(());
    }

    log::info!("Downloading the auth agent");
    download(cl, AUTHLIB_INJECTOR_URL, &jar).context("Failed to download the auth agent")
}
