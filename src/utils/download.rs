use std::fs::{create_dir_all, remove_file, write};
use std::path::Path;
use std::thread::sleep;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use reqwest::blocking::Client;
use serde::Serialize;

const MAX_ATTEMPTS: u64 = 3;

/// Fetches `url` into `dest`, overwriting whatever was there. Retries with
/// a linear backoff and never leaves a partial file behind on failure.
pub fn download(cl: &Client, url: impl AsRef<str>, dest: impl AsRef<Path>) -> Result<()> {
    let url = url.as_ref();
    let dest = dest.as_ref();
    if let Some(parent) = dest.parent() {
        create_dir_all(parent).context(format!("Was creating dir {parent:?}"))?;
    }

    let mut attempts = 1;
    loop {
        log::info!("Requesting {url} into {dest:?}");
        let res = fetch_bytes(cl, url)
            .and_then(|body| write(dest, &body).context(format!("Was writing {dest:?}")));

        match res {
            Ok(()) => return Ok(()),
            Err(e) => {
                if dest.is_file() {
                    let _ = remove_file(dest);
                }

                if attempts >= MAX_ATTEMPTS {
                    log::error!("Max download attempts for {url} reached, I'm giving up");
                    return Err(e);
                }

                log::error!("Download of {url} failed [attempts: {}]", attempts + 1);
                log::error!("{e:?}");
                sleep(Duration::from_secs(attempts * 5));
                attempts += 1;
            }
        }
    }
}

/// GET returning the response body, retried like [`download`].
pub fn http_get(cl: &Client, url: impl AsRef<str>) -> Result<String> {
    let url = url.as_ref();
    let mut attempts = 1;
    loop {
        match fetch_bytes(cl, url) {
            Ok(body) => return Ok(String::from_utf8_lossy(&body).into_owned()),
            Err(e) => {
                if attempts >= MAX_ATTEMPTS {
                    return Err(e);
                }

                log::error!("GET {url} failed [attempts: {}]", attempts + 1);
                log::error!("{e:?}");
                sleep(Duration::from_secs(attempts * 5));
                attempts += 1;
            }
        }
    }
}

/// POST with a JSON payload, retried like [`download`].
pub fn http_post<T: Serialize>(cl: &Client, url: impl AsRef<str>, payload: &T) -> Result<String> {
    let url = url.as_ref();
    let mut attempts = 1;
    loop {
        let res = cl
            .post(url)
            .json(payload)
            .send()
            .context(format!("POST {url} did not go through"))
            .and_then(|res| {
                let stat = res.status();
                if !stat.is_success() {
                    bail!("POST {url} returned {stat}");
                }

                Ok(res.text()?)
            });

        match res {
            Ok(body) => return Ok(body),
            Err(e) => {
                if attempts >= MAX_ATTEMPTS {
                    return Err(e);
                }

                log::error!("POST {url} failed [attempts: {}]", attempts + 1);
                log::error!("{e:?}");
                sleep(Duration::from_secs(attempts * 5));
                attempts += 1;
            }
        }
    }
}

fn fetch_bytes(cl: &Client, url: &str) -> Result<Vec<u8>> {
    let res = cl
        .get(url)
        .send()
        .context(format!("GET {url} did not go through"))?;

    let stat = res.status();
    if !stat.is_success() {
        bail!("GET {url} returned {stat}");
    }

    Ok(res.bytes()?.to_vec())
}
