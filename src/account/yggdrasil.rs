use anyhow::{Context, Result, bail};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::from_str;

use crate::account::{Account, UserType};
use crate::utils::crypto::{hwid, offline_uuid};
use crate::utils::download::{http_get, http_post};

/// Validates the launcher token, then tries to open a real session. Only
/// the validate step can fail the launch; a dead session server just
/// degrades to an offline account.
pub fn login(cl: &Client, api_url: impl AsRef<str>, token: impl AsRef<str>) -> Result<Account> {
    let api_url = api_url.as_ref();
    let token = token.as_ref();
    let hwid = hwid().context("Could not fingerprint this machine")?;
    log::debug!("Machine fingerprint: {hwid}");

    log::info!("Validating the launcher token against {api_url}");
    let url = format!("{api_url}/api/auth/validate?token={token}&hwid={hwid}");
    let body = http_get(cl, url).context("The validate endpoint did not answer")?;
    if body.is_empty() {
        bail!("Empty response from the validate endpoint");
    }

    let validated: ValidateResponse =
        from_str(&body).context("The validate response was not the JSON I expected")?;
    log::info!("Token belongs to {}", validated.username);
    if validated.registered.unwrap_or(false) {
        log::debug!("This machine fingerprint is already registered");
    }

    match authenticate(cl, api_url, &validated.username, token) {
        Ok(acc) => Ok(acc),
        Err(e) => {
            log::warn!("Session auth failed, falling back to offline mode");
            log::warn!("{e:?}");
            Ok(Account::offline(validated.username))
        }
    }
}

fn authenticate(cl: &Client, api_url: &str, name: &str, pass: &str) -> Result<Account> {
    let payload = AuthJson::new(name, pass);
    let body = http_post(cl, format!("{api_url}/authserver/authenticate"), &payload)?;
    if body.is_empty() {
        bail!("Empty response from the session server");
    }

    let res: AuthResponse = from_str(&body)?;
    let Some(token) = res.access_token else {
        bail!("The session server response carried no accessToken");
    };

    let uuid = res
        .available_profiles
        .first()
        .map(|p| p.id.clone())
        .unwrap_or_else(|| offline_uuid(name));

    Ok(Account {
        name: name.to_string(),
        uuid,
        token,
        user_type: UserType::Mojang,
    })
}

#[derive(Debug, Deserialize)]
struct ValidateResponse {
    username: String,
    registered: Option<bool>,
}

#[derive(Debug, Serialize)]
struct AuthJson {
    username: String,
    password: String,
    #[serde(rename = "clientToken")]
    client_token: String,
    #[serde(rename = "requestUser")]
    request_user: bool,
}

impl AuthJson {
    fn new(name: impl AsRef<str>, pass: impl AsRef<str>) -> Self {
        Self {
            username: name.as_ref().to_string(),
            password: pass.as_ref().to_string(),
            client_token: offline_uuid(&name),
            request_user: true,
        }
    }
}

#[derive(Default, Debug, Deserialize)]
struct AuthResponse {
    #[serde(rename = "accessToken")]
    access_token: Option<String>,
    #[serde(default, rename = "availableProfiles")]
    available_profiles: Vec<AuthProfile>,
}

#[derive(Debug, Deserialize)]
struct AuthProfile {
    id: String,
}
