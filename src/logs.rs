use std::fs::create_dir_all;
use std::path::PathBuf;

use anyhow::{Result, anyhow};
use chrono::Local;
use fern::Dispatch;
use fern::colors::Color;
use fern::colors::ColoredLevelConfig;
use fern::log_file;
use log::LevelFilter;

use crate::init::get_appdir;

static COLORS: ColoredLevelConfig = ColoredLevelConfig {
    error: Color::Red,
    warn: Color::Yellow,
    info: Color::Green,
    debug: Color::Magenta,
    trace: Color::White,
};

/// Everything goes to a dated file under the app dir at debug level, the
/// console only sees info and up. Has to run before any other component
/// gets a chance to log.
pub fn init_logs_and_appdir() -> Result<PathBuf> {
    let root = get_appdir();
    let mut logs = root.join("logs");
    create_dir_all(&logs)?;

    logs.push(Local::now().format("launcher-%Y-%m-%d.log").to_string());
    let name = logs
        .to_str()
        .ok_or(anyhow!("Could not convert path {logs:?} to string"))?
        .to_string();

    let file = Dispatch::new()
        .format(|out, msg, rec| {
            out.finish(format_args!(
                "[{}] {} {} {}",
                Local::now().format("%d-%m-%Y %H:%M:%S"),
                rec.level(),
                rec.target(),
                msg
            ));
        })
        .level(LevelFilter::Debug)
        .chain(log_file(name)?);

    let stderr = Dispatch::new()
        .format(|out, msg, rec| {
            out.finish(format_args!(
                "[{}] {} {}",
                Local::now().format("%H:%M:%S"),
                COLORS.color(rec.level()),
                msg
            ));
        })
        .level(LevelFilter::Info)
        .chain(std::io::stderr());

    Dispatch::new().chain(file).chain(stderr).apply()?;

    Ok(root)
}
