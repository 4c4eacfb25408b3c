use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::minecraft::placeholders::{LaunchProfile, PlaceholderMap, substitute};
use crate::minecraft::rules::{Rule, rules_allow};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Arguments {
    pub jvm: Option<Vec<ArgToken>>,
    pub game: Option<Vec<ArgToken>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgToken {
    Plain(String),
    Conditional {
        #[serde(default)]
        rules: Vec<Rule>,
        value: Option<ArgValue>,
    },
    /// Some manifests carry literal nulls in the token arrays.
    Null,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgValue {
    Single(String),
    Many(Vec<String>),
}

/// JVM-side vector. Manifests without a modern `arguments` block get the
/// fixed three-token form instead.
pub fn synthesize_jvm(
    tokens: Option<&[ArgToken]>,
    placeholders: &PlaceholderMap,
    os: &str,
) -> Vec<String> {
    match tokens {
        Some(tokens) => expand_tokens(tokens, placeholders, os),
        None => vec![
            format!(
                "-Djava.library.path={}",
                placeholders
                    .get("natives_directory")
                    .map(String::as_str)
                    .unwrap_or_default(),
            ),
            "-cp".to_string(),
            placeholders
                .get("classpath")
                .cloned()
                .unwrap_or_default(),
        ],
    }
}

/// Game-side vector, or the eight fixed flag/value pairs in legacy mode.
pub fn synthesize_game(
    tokens: Option<&[ArgToken]>,
    placeholders: &PlaceholderMap,
    profile: &LaunchProfile,
    os: &str,
) -> Vec<String> {
    match tokens {
        Some(tokens) => expand_tokens(tokens, placeholders, os),
        None => vec![
            "--version".to_string(),
            profile.version.clone(),
            "--gameDir".to_string(),
            profile.game_dir.display().to_string(),
            "--assetsDir".to_string(),
            profile.game_dir.join("assets").display().to_string(),
            "--assetIndex".to_string(),
            profile.asset_index.clone(),
            "--uuid".to_string(),
            profile.uuid.clone(),
            "--username".to_string(),
            profile.username.clone(),
            "--accessToken".to_string(),
            profile.access_token.clone(),
            "--userType".to_string(),
            profile.user_type.clone(),
        ],
    }
}

fn expand_tokens(tokens: &[ArgToken], placeholders: &PlaceholderMap, os: &str) -> Vec<String> {
    let mut out = Vec::with_capacity(tokens.len());
    for token in tokens {
        match token {
            ArgToken::Null => {}
            ArgToken::Plain(s) => out.push(substitute(s, placeholders)),
            ArgToken::Conditional { rules, value } => {
                // Feature-gated tokens (demo mode, quick play, custom
                // resolution) are dropped outright, active or not.
                if rules.iter().any(Rule::references_features) {
                    continue;
                }
                if !rules_allow(rules, os) {
                    continue;
                }

                match value {
                    None => {}
                    Some(ArgValue::Single(s)) => out.push(substitute(s, placeholders)),
                    Some(ArgValue::Many(list)) => {
                        out.extend(list.iter().map(|s| substitute(s, placeholders)));
                    }
                }
            }
        }
    }

    out
}

/// When the session is real and the injector jar is installed, the agent
/// pair goes in front of every other JVM flag so it can patch the auth
/// endpoints before anything else classloads. Otherwise nothing changes.
pub fn prepend_auth_agent(
    jvm_args: &mut Vec<String>,
    game_dir: &Path,
    api_url: &str,
    access_token: &str,
    prefetched_cert: &str,
) {
    let agent_jar = game_dir.join("libraries").join("authlib-injector.jar");
    if access_token.is_empty() || access_token == "0" || !agent_jar.is_file() {
        log::info!("Offline session or no injector jar, launching without the auth agent");
        return;
    }

    let cert = format!("-Dauthlibinjector.yggdrasil.prefetched={prefetched_cert}");
    let agent = format!("-javaagent:{}={api_url}", agent_jar.display());
    jvm_args.splice(0..0, [cert, agent]);
    log::info!("Auth agent enabled against {api_url}");
}
