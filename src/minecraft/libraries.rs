use std::collections::BTreeMap;
use std::fs::{read_dir, remove_file};
use std::path::{Path, PathBuf};

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::minecraft::rules::{Rule, rules_allow};
use crate::utils::archive;
use crate::utils::download::download;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryArtifact {
    pub path: Option<String>,
    pub url: Option<String>,
}

#[derive(Default, Debug, Clone, Serialize, Deserialize)]
pub struct LibraryDownloads {
    pub artifact: Option<LibraryArtifact>,
    #[serde(default)]
    pub classifiers: BTreeMap<String, LibraryArtifact>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Library {
    pub name: String,
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub downloads: LibraryDownloads,
    /// platform name -> classifier key under downloads.classifiers
    #[serde(default)]
    pub natives: BTreeMap<String, String>,
    #[serde(default, rename = "downloadOnly")]
    pub download_only: bool,
}

impl Library {
    pub fn is_needed(&self, os: &str) -> bool {
        rules_allow(&self.rules, os)
    }

    pub fn has_artifact(&self) -> bool {
        self.downloads.artifact.is_some()
    }

    pub fn wants_natives(&self, os: &str) -> bool {
        self.natives.contains_key(os)
    }

    /// The manifest's explicit artifact path when it has one, otherwise
    /// the maven coordinate spelled out as a repository-relative path.
    pub fn relative_path(&self) -> Option<String> {
        if let Some(artifact) = &self.downloads.artifact
            && let Some(path) = &artifact.path
        {
            return Some(path.clone());
        }

        maven_path(&self.name)
    }

    /// Downloads and unpacks this library's platform natives into
    /// `<game_dir>/natives`, once. A populated natives dir short-circuits
    /// so reruns cost nothing, and any failure here only costs the JVM a
    /// later load error, never the resolve pass.
    pub fn fetch_natives(&self, cl: &Client, os: &str, game_dir: &Path) {
        let Some(classifier) = self.natives.get(os) else {
            return;
        };
        let Some(native) = self.downloads.classifiers.get(classifier) else {
            return;
        };
        let Some(url) = &native.url else {
            return;
        };

        let natives_dir = game_dir.join("natives");
        if dir_is_populated(&natives_dir) {
            log::debug!("Natives already extracted, skipping {}", self.name);
            return;
        }

        let temp_jar = game_dir.join("temp_natives.jar");
        log::info!("Downloading natives for {} from {url}", self.name);
        if let Err(e) = download(cl, url, &temp_jar) {
            log::error!("Native download for {} failed: {e:?}", self.name);
            return;
        }

        log::info!("Extracting natives for {}", self.name);
        if let Err(e) = archive::extract(&temp_jar, &natives_dir) {
            log::error!("Native extraction for {} failed: {e:?}", self.name);
            return;
        }

        let _ = remove_file(&temp_jar);
    }
}

/// Walks the manifest's library list in order. Classpath entries keep
/// their manifest order and a jar missing on disk is logged and skipped so
/// a partially populated install can still try to launch. Libraries whose
/// natives should be fetched come back separately.
pub fn resolve<'a>(
    libraries: &'a [Library],
    lib_dir: &Path,
    os: &str,
) -> (Vec<PathBuf>, Vec<&'a Library>) {
    let mut entries = Vec::with_capacity(libraries.len());
    let mut natives = Vec::new();

    for lib in libraries {
        if !lib.is_needed(os) {
            log::debug!("Rules exclude {} on {os}", lib.name);
            continue;
        }

        if lib.wants_natives(os) {
            natives.push(lib);
        }

        if !lib.has_artifact() || lib.download_only {
            continue;
        }

        let Some(rel) = lib.relative_path() else {
            log::warn!("Could not make a path out of {:?}", lib.name);
            continue;
        };

        let mut full = lib_dir.to_path_buf();
        full.extend(rel.split('/'));
        if full.is_file() {
            entries.push(full);
        } else {
            log::warn!("Missing library {full:?}, leaving it off the classpath");
        }
    }

    (entries, natives)
}

/// "group:artifact:version[:classifier]" becomes
/// "group/as/dirs/artifact/version/artifact-version[-classifier].jar".
pub fn maven_path(coordinate: &str) -> Option<String> {
    let mut parts = coordinate.split(':');
    let group = parts.next()?;
    let artifact = parts.next()?;
    let version = parts.next()?;
    let classifier = match parts.next() {
        Some(c) => format!("-{c}"),
        None => String::new(),
    };

    Some(format!(
        "{}/{artifact}/{version}/{artifact}-{version}{classifier}.jar",
        group.replace('.', "/"),
    ))
}

fn dir_is_populated(dir: &Path) -> bool {
    match read_dir(dir) {
        Ok(mut entries) => entries.next().is_some(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use std::fs::{create_dir_all, write};

    use serde_json::from_value;

    use super::*;
    use crate::minecraft::rules::{RuleAction, RuleOs};

    fn plain_lib(name: &str) -> Library {
        Library {
            name: name.to_string(),
            rules: Vec::new(),
            downloads: LibraryDownloads::default(),
            natives: BTreeMap::new(),
            download_only: false,
        }
    }

    fn lib_with_artifact(name: &str) -> Library {
        let mut lib = plain_lib(name);
        lib.downloads.artifact = Some(LibraryArtifact {
            path: None,
            url: None,
        });
        lib
    }

    #[test]
    fn maven_coordinates_become_repo_paths() {
        assert_eq!(
            maven_path("com.google.guava:guava:32.1.2").as_deref(),
            Some("com/google/guava/guava/32.1.2/guava-32.1.2.jar"),
        );
        assert_eq!(
            maven_path("org.lwjgl:lwjgl:3.3.1:natives-windows").as_deref(),
            Some("org/lwjgl/lwjgl/3.3.1/lwjgl-3.3.1-natives-windows.jar"),
        );
    }

    #[test]
    fn short_coordinates_have_no_path() {
        assert_eq!(maven_path("g.x:a"), None);
        assert_eq!(maven_path("bare"), None);
    }

    #[test]
    fn explicit_artifact_path_wins_over_the_coordinate() {
        let mut lib = lib_with_artifact("g.x:a:1.0");
        lib.downloads.artifact.as_mut().unwrap().path = Some("custom/spot/a.jar".to_string());
        assert_eq!(lib.relative_path().as_deref(), Some("custom/spot/a.jar"));
    }

    #[test]
    fn library_deserializes_from_manifest_json() {
        let lib: Library = from_value(serde_json::json!({
            "name": "org.lwjgl:lwjgl:3.3.1",
            "rules": [{ "action": "allow", "os": { "name": "windows" } }],
            "natives": { "windows": "natives-windows" },
            "downloads": {
                "artifact": { "path": "org/lwjgl/lwjgl/3.3.1/lwjgl-3.3.1.jar", "url": "https://libraries.example/lwjgl.jar" },
                "classifiers": {
                    "natives-windows": { "url": "https://libraries.example/lwjgl-natives.jar", "path": null }
                }
            }
        }))
        .unwrap();

        assert!(lib.is_needed("windows"));
        assert!(!lib.is_needed("linux"));
        assert!(lib.wants_natives("windows"));
        assert!(!lib.wants_natives("osx"));
    }

    #[test]
    fn resolve_keeps_manifest_order_and_skips_missing_jars() {
        let dir = crate::tests::scratch("resolve-order");
        let present_a = "g/a/1.0/a-1.0.jar";
        let present_b = "g/b/2.0/b-2.0.jar";
        for rel in [present_a, present_b] {
            let mut p = dir.clone();
            p.extend(rel.split('/'));
            create_dir_all(p.parent().unwrap()).unwrap();
            write(&p, b"jar").unwrap();
        }

        let libs = vec![
            lib_with_artifact("g:a:1.0"),
            lib_with_artifact("g:gone:9.9"),
            lib_with_artifact("g:b:2.0"),
        ];

        let (entries, natives) = resolve(&libs, &dir, "windows");
        assert!(natives.is_empty());
        assert_eq!(entries.len(), 2);
        assert!(entries[0].ends_with("a-1.0.jar"));
        assert!(entries[1].ends_with("b-2.0.jar"));
    }

    #[test]
    fn resolve_applies_rules_per_platform() {
        let dir = crate::tests::scratch("resolve-rules");
        let mut p = dir.clone();
        p.extend(["g", "a", "1.0", "a-1.0.jar"]);
        create_dir_all(p.parent().unwrap()).unwrap();
        write(&p, b"jar").unwrap();

        let mut lib = lib_with_artifact("g:a:1.0");
        lib.rules.push(Rule {
            action: RuleAction::Allow,
            os: Some(RuleOs {
                name: Some("windows".to_string()),
            }),
            features: None,
        });

        let libs = vec![lib];
        let (on_windows, _) = resolve(&libs, &dir, "windows");
        assert_eq!(on_windows.len(), 1);

        let (on_linux, _) = resolve(&libs, &dir, "linux");
        assert!(on_linux.is_empty());
    }

    #[test]
    fn download_only_libraries_stay_off_the_classpath() {
        let dir = crate::tests::scratch("resolve-download-only");
        let mut p = dir.clone();
        p.extend(["g", "a", "1.0", "a-1.0.jar"]);
        create_dir_all(p.parent().unwrap()).unwrap();
        write(&p, b"jar").unwrap();

        let mut lib = lib_with_artifact("g:a:1.0");
        lib.download_only = true;

        let (entries, _) = resolve(&[lib], &dir, "windows");
        assert!(entries.is_empty());
    }

    #[test]
    fn populated_natives_dir_short_circuits_the_fetch() {
        let dir = crate::tests::scratch("natives-idempotent");
        create_dir_all(dir.join("natives")).unwrap();
        write(dir.join("natives").join("present.dll"), b"lib").unwrap();

        let mut lib = plain_lib("g:nat:1.0");
        lib.natives
            .insert("windows".to_string(), "natives-windows".to_string());
        lib.downloads.classifiers.insert(
            "natives-windows".to_string(),
            LibraryArtifact {
                path: None,
                url: Some("https://unreachable.invalid/nat.jar".to_string()),
            },
        );

        let cl = crate::init::init_reqwest().unwrap();
        lib.fetch_natives(&cl, "windows", &dir);

        // nothing was downloaded and the extracted set is untouched
        assert!(!dir.join("temp_natives.jar").exists());
        assert!(dir.join("natives").join("present.dll").is_file());
    }

    #[test]
    fn duplicate_manifest_entries_appear_twice() {
        let dir = crate::tests::scratch("resolve-dupes");
        let mut p = dir.clone();
        p.extend(["g", "a", "1.0", "a-1.0.jar"]);
        create_dir_all(p.parent().unwrap()).unwrap();
        write(&p, b"jar").unwrap();

        let libs = vec![lib_with_artifact("g:a:1.0"), lib_with_artifact("g:a:1.0")];
        let (entries, _) = resolve(&libs, &dir, "windows");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], entries[1]);
    }
}
