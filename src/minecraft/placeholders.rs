use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::init::VERSION;

pub type PlaceholderMap = BTreeMap<String, String>;

/// Everything about one launch the argument templates can reference.
#[derive(Debug, Clone)]
pub struct LaunchProfile {
    pub username: String,
    pub uuid: String,
    pub access_token: String,
    pub user_type: String,
    pub version: String,
    pub asset_index: String,
    pub game_dir: PathBuf,
}

/// The closed key set the manifests reference. Built once per launch;
/// anything a manifest asks for beyond these stays unexpanded.
pub fn build_placeholders(profile: &LaunchProfile, classpath: &str) -> PlaceholderMap {
    let game_dir = profile.game_dir.display().to_string();
    let pairs = [
        ("auth_player_name", profile.username.clone()),
        ("version_name", profile.version.clone()),
        ("game_directory", game_dir),
        (
            "assets_root",
            profile.game_dir.join("assets").display().to_string(),
        ),
        ("assets_index_name", profile.asset_index.clone()),
        ("auth_uuid", profile.uuid.clone()),
        ("auth_access_token", profile.access_token.clone()),
        ("user_type", profile.user_type.clone()),
        ("version_type", "release".to_string()),
        ("resolution_width", "854".to_string()),
        ("resolution_height", "480".to_string()),
        ("classpath", classpath.to_string()),
        (
            "natives_directory",
            profile.game_dir.join("natives").display().to_string(),
        ),
        ("launcher_name", "purr-launcher".to_string()),
        ("launcher_version", VERSION.to_string()),
        ("clientid", String::new()),
        ("auth_xuid", String::new()),
        ("quickPlayPath", String::new()),
        ("quickPlaySingleplayer", String::new()),
        ("quickPlayMultiplayer", String::new()),
        ("quickPlayRealms", String::new()),
        ("fml.forgeVersion", "47.4.6".to_string()),
        ("fml.mcVersion", "1.20.1".to_string()),
        ("fml.forgeGroup", "net.minecraftforge".to_string()),
        ("fml.mcpVersion", "20230612.114412".to_string()),
        (
            "library_directory",
            profile.game_dir.join("libraries").display().to_string(),
        ),
        ("classpath_separator", ";".to_string()),
    ];

    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

/// Replaces every known `${key}` span in one left-to-right pass. Unknown
/// keys stay as written, replacement text is never rescanned, and an
/// unterminated `${` leaves the rest of the template untouched.
pub fn substitute(template: &str, map: &PlaceholderMap) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("${") {
        let Some(len) = rest[start + 2..].find('}') else {
            break;
        };

        out.push_str(&rest[..start]);
        let key = &rest[start + 2..start + 2 + len];
        match map.get(key) {
            Some(value) => out.push_str(value),
            None => out.push_str(&rest[start..start + len + 3]),
        }

        rest = &rest[start + len + 3..];
    }

    out.push_str(rest);
    out
}
