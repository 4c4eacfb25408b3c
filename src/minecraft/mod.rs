use std::fs::read_to_string;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, bail};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::from_str;

mod arguments;
mod launch_files;
mod libraries;
pub mod pack;
mod placeholders;
mod rules;

pub use arguments::{ArgToken, ArgValue, Arguments, prepend_auth_agent, synthesize_game, synthesize_jvm};
pub use launch_files::{read_classpath, write_classpath, write_launch_args};
pub use libraries::{Library, maven_path, resolve};
pub use pack::PackStatus;
pub use placeholders::{LaunchProfile, PlaceholderMap, build_placeholders, substitute};
pub use rules::{Rule, RuleAction, current_platform, rules_allow};

use crate::account::Account;
use crate::config::Config;

/// Manifests that never name a main class get the modern Forge bootstrap.
static DEFAULT_MAIN_CLASS: &str = "cpw.mods.bootstraplauncher.BootstrapLauncher";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetIndexRef {
    pub id: Option<String>,
}

/// One game version's structured description: libraries, argument
/// templates, entry point. Parsed fresh from disk on every launch, never
/// cached across runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionManifest {
    #[serde(rename = "mainClass")]
    main_class: Option<String>,
    #[serde(default)]
    libraries: Vec<Library>,
    arguments: Option<Arguments>,
    assets: Option<String>,
    #[serde(rename = "assetIndex")]
    asset_index: Option<AssetIndexRef>,
}

impl VersionManifest {
    pub fn load(game_dir: &Path, version: &str) -> Result<Self> {
        let path = manifest_path(game_dir, version);
        let json =
            read_to_string(&path).context(format!("Version JSON not found: {path:?}"))?;

        from_str(&json).context(format!("Failed to parse version JSON {path:?}"))
    }

    pub fn main_class(&self) -> &str {
        self.main_class.as_deref().unwrap_or(DEFAULT_MAIN_CLASS)
    }

    /// `assets` wins over `assetIndex.id`; ancient manifests carry
    /// neither and get the "5" index.
    pub fn asset_index_id(&self) -> &str {
        self.assets
            .as_deref()
            .or_else(|| self.asset_index.as_ref().and_then(|a| a.id.as_deref()))
            .unwrap_or("5")
    }

    /// None means the legacy argument format.
    pub fn jvm_tokens(&self) -> Option<&[ArgToken]> {
        self.arguments.as_ref().and_then(|a| a.jvm.as_deref())
    }

    pub fn game_tokens(&self) -> Option<&[ArgToken]> {
        self.arguments.as_ref().and_then(|a| a.game.as_deref())
    }
}

/// Resolves the manifest's libraries against the local install, pulls any
/// missing natives, and writes classpath.txt with the client jar last.
/// Libraries may be missing from disk, the client jar may not.
pub fn build_classpath(cl: &Client, game_dir: &Path, version: &str, os: &str) -> Result<()> {
    let manifest = VersionManifest::load(game_dir, version)?;
    let lib_dir = game_dir.join("libraries");
    let (mut entries, natives) = libraries::resolve(&manifest.libraries, &lib_dir, os);

    for lib in natives {
        lib.fetch_natives(cl, os, game_dir);
    }

    let client_jar = client_jar_path(game_dir, version);
    if !client_jar.is_file() {
        bail!("Missing client JAR: {client_jar:?}");
    }
    entries.push(client_jar);

    launch_files::write_classpath(&game_dir.join("classpath.txt"), &entries)?;
    log::info!("Classpath built with {} entries", entries.len());
    Ok(())
}

/// Turns the manifest plus the authenticated session into launch_args.txt
/// and hands the whole thing to the JVM as an argument file.
pub fn launch(
    cfg: &Config,
    account: &Account,
    game_dir: &Path,
    version: &str,
    os: &str,
) -> Result<()> {
    log::info!("Starting the launch sequence for {version}");
    let manifest = VersionManifest::load(game_dir, version)?;
    let classpath = launch_files::read_classpath(&game_dir.join("classpath.txt"))
        .context("Failed to load the classpath")?;

    let profile = LaunchProfile {
        username: account.name.clone(),
        uuid: account.uuid.clone(),
        access_token: account.token.clone(),
        user_type: account.user_type.to_string(),
        version: version.to_string(),
        asset_index: manifest.asset_index_id().to_string(),
        game_dir: game_dir.to_path_buf(),
    };
    let map = placeholders::build_placeholders(&profile, &classpath);

    let mut jvm_args = arguments::synthesize_jvm(manifest.jvm_tokens(), &map, os);
    let game_args = arguments::synthesize_game(manifest.game_tokens(), &map, &profile, os);
    arguments::prepend_auth_agent(
        &mut jvm_args,
        game_dir,
        &cfg.api_url,
        &account.token,
        &cfg.prefetched_cert,
    );

    let args_file = game_dir.join("launch_args.txt");
    launch_files::write_launch_args(
        &args_file,
        &cfg.max_ram,
        &jvm_args,
        manifest.main_class(),
        &game_args,
    )?;

    spawn(&cfg.java_path, &args_file, cfg.debug)
}

/// Debug keeps the console attached and waits; otherwise the game runs
/// detached under the windowless executable where the platform has one.
fn spawn(java_path: &str, args_file: &Path, debug: bool) -> Result<()> {
    let exec = if debug {
        java_path.to_string()
    } else {
        windowless_sibling(java_path)
    };

    let mut cmd = Command::new(&exec);
    cmd.arg(format!("@{}", args_file.display()));

    if debug {
        log::info!("Launching in debug mode with console output enabled");
        let status = cmd
            .status()
            .context(format!("Failed to start the game with {exec}"))?;
        log::info!("Game exited with status {:?}", status.code());
    } else {
        let child = cmd
            .spawn()
            .context(format!("Failed to start the game with {exec}"))?;
        log::info!("Game started detached with pid {}", child.id());
    }

    Ok(())
}

fn windowless_sibling(java_path: &str) -> String {
    if cfg!(windows)
        && let Some(parent) = Path::new(java_path).parent()
    {
        return parent.join("javaw.exe").display().to_string();
    }

    java_path.to_string()
}

fn manifest_path(game_dir: &Path, version: &str) -> PathBuf {
    let mut p = game_dir.join("versions");
    p.push(version);
    p.push(format!("{version}.json"));
    p
}

fn client_jar_path(game_dir: &Path, version: &str) -> PathBuf {
    let mut p = game_dir.join("versions");
    p.push(version);
    p.push(format!("{version}.jar"));
    p
}
