// This file is dual licensed under the terms of the Apache License, Version
// 2.0, and the BSD License. See the LICENSE file in the root of this repository
// for complete details.

use std::fs::{self, File};
use std::io::BufReader;

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::errors::ManifestError;
use crate::package::PackageInfo;
use crate::Prompt;

pub const MANIFEST_FILENAME: &str = "pym.json";

type Result<T, E = ManifestError> = core::result::Result<T, E>;

/// The pym.json document, for the project itself and for every installed
/// package. Keys already present in the file win; missing keys take these
/// defaults, so a hand-written manifest can be as sparse as `{}`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Manifest {
    pub name: String,
    pub version: String,
    pub description: String,
    pub src: String,
    pub license: String,
    pub dependencies: IndexMap<String, String>,
    pub install_location: Utf8PathBuf,
    pub staging_location: Utf8PathBuf,
}

impl Default for Manifest {
    fn default() -> Manifest {
        Manifest {
            name: String::new(),
            version: "0.1.0".to_string(),
            description: String::new(),
            src: "src".to_string(),
            license: "MIT".to_string(),
            dependencies: IndexMap::new(),
            install_location: Utf8PathBuf::from("pym_packages"),
            staging_location: Utf8PathBuf::from("pym_packages/.staging"),
        }
    }
}

impl Manifest {
    /// Read `dir/pym.json`. A directory without a manifest reports
    /// [`ManifestError::Missing`] so callers can choose to synthesize one;
    /// a manifest that will not parse is its own, harder error.
    pub fn load(dir: &Utf8Path) -> Result<Manifest> {
        let path = dir.join(MANIFEST_FILENAME);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(ManifestError::Missing { path })
            }
            Err(err) => return Err(err.into()),
        };
        serde_json::from_reader(BufReader::new(file))
            .map_err(|source| ManifestError::Malformed { source })
    }

    pub fn save(&self, dir: &Utf8Path) -> Result<()> {
        let rendered = serde_json::to_string_pretty(self)
            .map_err(|source| ManifestError::Malformed { source })?;
        fs::write(dir.join(MANIFEST_FILENAME), rendered)?;
        Ok(())
    }
}

/// Builds a manifest for a package that shipped without one.
pub struct ConfigBuilder;

// The fields worth asking a human about, with the question asked for each.
const QUERY_FIELDS: [(&str, &str); 5] = [
    ("name", "Project name"),
    ("description", "Project description"),
    ("version", "Project version"),
    ("src", "Project source location"),
    ("license", "Project license"),
];

impl ConfigBuilder {
    /// Fill a manifest skeleton from whatever the descriptor already knows.
    pub fn build(info: &PackageInfo) -> Manifest {
        let mut manifest = Manifest::default();
        if let Some(name) = &info.name {
            manifest.name = name.clone();
        }
        if let Some(description) = &info.description {
            manifest.description = description.clone();
        }
        if let Some(version) = &info.version {
            manifest.version = version.clone();
        }
        if let Some(src) = &info.src {
            manifest.src = src.clone();
        }
        if let Some(license) = &info.license {
            manifest.license = license.clone();
        }
        manifest.dependencies = info.dependencies.clone();
        manifest
    }

    /// Ask the host about each recognized field, suggesting the descriptor's
    /// current value, then build. An empty answer keeps the suggestion.
    pub fn query(info: &PackageInfo, prompt: &mut Prompt<'_>) -> Manifest {
        let mut info = info.clone();
        for (field, question) in QUERY_FIELDS {
            let suggestion = match field {
                "name" => info.name.clone(),
                "description" => info.description.clone(),
                "version" => info.version.clone(),
                "src" => info.src.clone(),
                "license" => info.license.clone(),
                _ => None,
            };
            let answer = (prompt)(question, suggestion.as_deref());
            let value = if answer.is_empty() { suggestion } else { Some(answer) };
            match field {
                "name" => info.name = value,
                "description" => info.description = value,
                "version" => info.version = value,
                "src" => info.src = value,
                "license" => info.license = value,
                _ => {}
            }
        }
        ConfigBuilder::build(&info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tempdir() -> (tempfile::TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8Path::from_path(dir.path()).unwrap().to_owned();
        (dir, path)
    }

    #[test]
    fn missing_and_malformed_are_distinct() {
        let (_guard, dir) = tempdir();
        assert!(matches!(
            Manifest::load(&dir),
            Err(ManifestError::Missing { .. })
        ));

        fs::write(dir.join(MANIFEST_FILENAME), "{not json").unwrap();
        assert!(matches!(
            Manifest::load(&dir),
            Err(ManifestError::Malformed { .. })
        ));
    }

    #[test]
    fn sparse_manifests_take_defaults() {
        let (_guard, dir) = tempdir();
        fs::write(dir.join(MANIFEST_FILENAME), r#"{"name": "demo"}"#).unwrap();

        let manifest = Manifest::load(&dir).unwrap();
        assert_eq!(manifest.name, "demo");
        assert_eq!(manifest.version, "0.1.0");
        assert_eq!(manifest.src, "src");
        assert_eq!(manifest.license, "MIT");
        assert_eq!(manifest.install_location, Utf8PathBuf::from("pym_packages"));
        assert_eq!(
            manifest.staging_location,
            Utf8PathBuf::from("pym_packages/.staging")
        );
        assert!(manifest.dependencies.is_empty());
    }

    #[test]
    fn present_keys_win_over_defaults() {
        let (_guard, dir) = tempdir();
        fs::write(
            dir.join(MANIFEST_FILENAME),
            r#"{"install_location": "vendor", "dependencies": {"tornado": "^6.0.0"}}"#,
        )
        .unwrap();

        let manifest = Manifest::load(&dir).unwrap();
        assert_eq!(manifest.install_location, Utf8PathBuf::from("vendor"));
        assert_eq!(manifest.dependencies["tornado"], "^6.0.0");
    }

    #[test]
    fn save_round_trips() {
        let (_guard, dir) = tempdir();
        let mut manifest = Manifest::default();
        manifest.name = "demo".to_string();
        manifest
            .dependencies
            .insert("tornado".to_string(), "^6.0.0".to_string());
        manifest.save(&dir).unwrap();

        assert_eq!(Manifest::load(&dir).unwrap(), manifest);
    }

    #[test]
    fn build_takes_the_descriptor_fields() {
        let mut info = PackageInfo::parse("tornado@6.0.0", '@');
        info.description = Some("a web framework".to_string());
        info.src = Some("tornado".to_string());
        info.dependencies
            .insert("certifi".to_string(), "*".to_string());

        let manifest = ConfigBuilder::build(&info);
        assert_eq!(manifest.name, "tornado");
        assert_eq!(manifest.version, "6.0.0");
        assert_eq!(manifest.description, "a web framework");
        assert_eq!(manifest.src, "tornado");
        assert_eq!(manifest.dependencies["certifi"], "*");
    }

    #[test]
    fn query_prefers_answers_and_falls_back_to_suggestions() {
        let info = {
            let mut info = PackageInfo::parse("demo@1.0.0", '@');
            info.src = Some("src".to_string());
            info
        };

        let mut asked = Vec::new();
        let mut prompt: Prompt<'_> = Box::new(|question, suggestion| {
            asked.push(question.to_string());
            match question {
                "Project description" => "hand-typed".to_string(),
                _ => suggestion.unwrap_or_default().to_string(),
            }
        });

        let manifest = ConfigBuilder::query(&info, &mut prompt);
        drop(prompt);
        assert_eq!(manifest.name, "demo");
        assert_eq!(manifest.version, "1.0.0");
        assert_eq!(manifest.description, "hand-typed");
        assert_eq!(asked.len(), QUERY_FIELDS.len());
    }
}
