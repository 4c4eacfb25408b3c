use std::env::consts;
use std::env::var_os;

use anyhow::{Result, bail};
use crypto::digest::Digest;
use crypto::md5::Md5;
use uuid::Builder;

pub fn md5_bytes(input: impl AsRef<[u8]>) -> [u8; 16] {
    let mut md5 = Md5::new();
    md5.input(input.as_ref());
    let mut out = [0u8; 16];
    md5.result(&mut out);
    out
}

pub fn md5_hex(input: impl AsRef<[u8]>) -> String {
    let mut md5 = Md5::new();
    md5.input(input.as_ref());
    md5.result_str()
}

/// The same derivation the vanilla client uses for offline accounts:
/// a version-3 uuid over "OfflinePlayer:<name>".
pub fn offline_uuid(name: impl AsRef<str>) -> String {
    let seed = format!("OfflinePlayer:{}", name.as_ref());
    Builder::from_md5_bytes(md5_bytes(seed))
        .into_uuid()
        .to_string()
}

/// Stable-ish machine fingerprint the auth server ties tokens to. Built
/// from whatever identifiers the platform exposes without shelling out.
pub fn hwid() -> Result<String> {
    let mut raw = String::new();

    #[cfg(target_family = "unix")]
    if let Ok(id) = std::fs::read_to_string("/etc/machine-id") {
        raw.push_str(id.trim());
    }

    for key in ["COMPUTERNAME", "HOSTNAME", "USERNAME", "USER"] {
        if let Some(v) = var_os(key) {
            raw.push_str(&v.to_string_lossy());
        }
    }

    if raw.is_empty() {
        bail!("No stable machine identifiers found to fingerprint");
    }

    raw.push_str(consts::OS);
    raw.push_str(consts::ARCH);
    Ok(md5_hex(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn md5_matches_known_vectors() {
        assert_eq!(md5_hex(""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(md5_hex("abc"), "900150983cd24fb0d6963f7d28e17f72");
    }

    #[test]
    fn offline_uuid_is_version_3() {
        let u = offline_uuid("Steve");
        let chars = u.chars().collect::<Vec<char>>();
        assert_eq!(chars.len(), 36);
        // 8-4-4-4-12 layout, version nibble 3, rfc4122 variant
        assert_eq!(chars[14], '3');
        assert!(matches!(chars[19], '8' | '9' | 'a' | 'b'));
    }

    #[test]
    fn offline_uuid_is_deterministic() {
        assert_eq!(offline_uuid("Steve"), offline_uuid("Steve"));
        assert_ne!(offline_uuid("Steve"), offline_uuid("Alex"));
    }
}
