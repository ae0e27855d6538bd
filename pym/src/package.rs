// This file is dual licensed under the terms of the Apache License, Version
// 2.0, and the BSD License. See the LICENSE file in the root of this repository
// for complete details.

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;

/// Everything known about a package at some point in its install lifecycle.
/// Parsing fills in the identity fields, the installers fill in the rest;
/// absence is ordinary state, not an error.
#[derive(Debug, Clone, Default)]
pub struct PackageInfo {
    pub reference: Option<String>,
    pub name: Option<String>,
    pub source: Option<String>,
    pub version: Option<String>,
    pub version_range: Option<String>,
    pub path: Option<Utf8PathBuf>,
    pub description: Option<String>,
    pub src: Option<String>,
    pub license: Option<String>,
    pub dependencies: IndexMap<String, String>,
}

impl PackageInfo {
    /// Split a reference into source and version at the first `delim`. The
    /// package name is the extension-stripped basename of the source, so
    /// `https://host/team/tornado.git#v6.0.0` names `tornado`.
    pub fn parse(reference: &str, delim: char) -> PackageInfo {
        let (source, version) = match reference.split_once(delim) {
            Some((source, version)) => (source, Some(version)),
            None => (reference, None),
        };
        let name = Utf8Path::new(source)
            .file_stem()
            .unwrap_or(source)
            .to_string();

        PackageInfo {
            reference: Some(reference.to_string()),
            name: Some(name),
            source: Some(source.to_string()),
            version: version.filter(|v| !v.is_empty()).map(String::from),
            ..PackageInfo::default()
        }
    }

    /// Probe the conventional source locations under the package root,
    /// returning the first that exists, relative to the root.
    pub fn guess_src(info: &PackageInfo) -> Option<String> {
        let path = info.path.as_deref()?;
        let mut candidates = vec!["src".to_string()];
        if let Some(name) = &info.name {
            candidates.push(name.clone());
        }
        candidates
            .into_iter()
            .find(|candidate| path.join(candidate).exists())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_git_reference() {
        let info = PackageInfo::parse("https://github.com/tornadoweb/tornado.git#v6.0.0", '#');
        assert_eq!(info.name.as_deref(), Some("tornado"));
        assert_eq!(
            info.source.as_deref(),
            Some("https://github.com/tornadoweb/tornado.git")
        );
        assert_eq!(info.version.as_deref(), Some("v6.0.0"));
    }

    #[test]
    fn parses_an_index_reference() {
        let info = PackageInfo::parse("tornado@^6.0.0", '@');
        assert_eq!(info.name.as_deref(), Some("tornado"));
        assert_eq!(info.source.as_deref(), Some("tornado"));
        assert_eq!(info.version.as_deref(), Some("^6.0.0"));
    }

    #[test]
    fn missing_version_stays_absent() {
        let info = PackageInfo::parse("tornado", '@');
        assert_eq!(info.version, None);

        // A trailing delimiter is the same as no version at all.
        let info = PackageInfo::parse("tornado@", '@');
        assert_eq!(info.version, None);
    }

    #[test]
    fn splits_at_the_first_delimiter_only() {
        let info = PackageInfo::parse("pkg@>=1.0.0", '@');
        assert_eq!(info.version.as_deref(), Some(">=1.0.0"));
    }

    #[test]
    fn guess_src_prefers_src_then_the_package_name() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();

        let mut info = PackageInfo::parse("demo", '@');
        info.path = Some(root.to_owned());
        assert_eq!(PackageInfo::guess_src(&info), None);

        std::fs::create_dir(root.join("demo")).unwrap();
        assert_eq!(PackageInfo::guess_src(&info).as_deref(), Some("demo"));

        std::fs::create_dir(root.join("src")).unwrap();
        assert_eq!(PackageInfo::guess_src(&info).as_deref(), Some("src"));
    }
}
