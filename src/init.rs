use std::env::var_os;
use std::path::PathBuf;

use anyhow::Result;
use reqwest::blocking::Client;

pub static VERSION: &str = env!("CARGO_PKG_VERSION");
pub static FULLNAME: &str = concat!("purr-launcher ", env!("CARGO_PKG_VERSION"));

pub fn get_appdir() -> PathBuf {
    #[cfg(target_family = "windows")]
    let appdir = {
        let mut p = PathBuf::from(var_os("APPDATA").unwrap_or_else(|| ".".into()));
        p.push("PurrLauncher");
        p
    };

    #[cfg(target_family = "unix")]
    let appdir = {
        let mut p = PathBuf::from(var_os("HOME").unwrap_or_else(|| ".".into()));
        p.push(".local");
        p.push("share");
        p.push("purrlauncher");
        p
    };

    appdir
}

/// The tree the pack owns and the game runs out of.
pub fn get_gamedir() -> PathBuf {
    get_appdir().join("minecraft")
}

pub fn init_reqwest() -> Result<Client> {
    let c = Client::builder()
        .user_agent(FULLNAME)
        .pool_idle_timeout(None)
        .use_rustls_tls()
        .https_only(true)
        .build()?;

    Ok(c)
}
