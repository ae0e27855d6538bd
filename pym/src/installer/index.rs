// This file is dual licensed under the terms of the Apache License, Version
// 2.0, and the BSD License. See the LICENSE file in the root of this repository
// for complete details.

use std::fs::{self, File};
use std::io::{Read, Write};

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::blocking::Client as HttpClient;
use serde::Deserialize;
use url::Url;

use crate::errors::InstallError;
use crate::installer::Installer;
use crate::package::PackageInfo;
use crate::progress::Progress;
use crate::semver::{Segment, Version, VersionRange};

const LOGNAME: &str = "pym::installer::index";
const INDEX_URL: &str = "https://pypi.python.org/pypi";

type Result<T, E = InstallError> = core::result::Result<T, E>;

// The release page is plain HTML; the one selector we need is the first
// anchor whose text names a wheel.
static WHEEL_ANCHOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<a[^>]*\bhref="([^"]+)"[^>]*>([^<]*\.whl)\s*</a>"#).unwrap());

static REQUIREMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([A-Za-z0-9][A-Za-z0-9._-]*)\s*(?:\((.*)\))?\s*$").unwrap());

#[derive(Deserialize, Debug)]
struct WheelMetadata {
    version: String,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    run_requires: Vec<RequiresBlock>,
}

#[derive(Deserialize, Debug)]
struct RequiresBlock {
    #[serde(default)]
    requires: Vec<String>,
    #[serde(default)]
    extra: Option<String>,
    #[serde(default)]
    environment: Option<String>,
}

pub(crate) struct IndexInstaller {
    client: HttpClient,
    base: String,
}

impl IndexInstaller {
    pub(crate) fn new() -> Result<IndexInstaller> {
        let client = HttpClient::builder().gzip(true).build()?;
        Ok(IndexInstaller {
            client,
            base: INDEX_URL.to_string(),
        })
    }

    fn release_url(&self, name: &str, version: &str) -> String {
        format!("{}/{}/{}", self.base, name, version)
    }

    fn page_exists(&self, name: &str, version: &Version) -> bool {
        self.client
            .get(self.release_url(name, &version.to_string()))
            .send()
            .map(|response| response.status().is_success())
            .unwrap_or(false)
    }

    /// Find the wheel link for `name`/`version`. The index addresses
    /// releases by their published spelling, so `6.0` may live where we
    /// computed `6.0.0`; trailing `.0` segments come off one at a time until
    /// a page answers or the spelling cannot shrink further.
    fn find_download_url(&self, name: &str, version: &str) -> Result<Url> {
        let mut version = version.to_string();
        loop {
            let url = self.release_url(name, &version);
            debug!(target: LOGNAME, "probing {}", url);
            let response = self.client.get(&url).send()?;
            if response.status().is_success() {
                let page = response.text()?;
                return scrape_wheel_link(&url, &page)
                    .ok_or(InstallError::PackageUrl { url });
            }
            match version.strip_suffix(".0") {
                Some(shorter) => version = shorter.to_string(),
                None => return Err(InstallError::PackageUrl { url }),
            }
        }
    }

    fn download(
        &self,
        url: &Url,
        dest: &Utf8Path,
        progress: &Progress<'_>,
    ) -> Result<Utf8PathBuf> {
        let filename = url
            .path_segments()
            .and_then(|segments| segments.last())
            .filter(|name| !name.is_empty())
            .unwrap_or("package.whl");
        let filename = filename.split('#').next().unwrap_or(filename);
        let target = dest.join(filename);
        debug!(target: LOGNAME, "downloading {} to {}", url, target);

        let mut response = self.client.get(url.clone()).send()?.error_for_status()?;
        let task = progress.task(filename, response.content_length());
        let mut file = File::create(&target)?;
        let mut buffer = [0u8; 8192];
        loop {
            let count = response.read(&mut buffer)?;
            if count == 0 {
                break;
            }
            file.write_all(&buffer[..count])?;
            task.update(count as u64);
        }
        Ok(target)
    }

    fn extract(&self, archive: &Utf8Path, target: &Utf8Path) -> Result<()> {
        debug!(target: LOGNAME, "extracting {} to {}", archive, target);
        let mut wheel = zip::ZipArchive::new(File::open(archive)?)?;
        for index in 0..wheel.len() {
            let mut entry = wheel.by_index(index)?;
            let relative = entry
                .enclosed_name()
                .and_then(|path| path.to_str())
                .and_then(rehome)
                .map(str::to_string);
            let relative = match relative {
                Some(relative) => relative,
                None => continue,
            };

            let dest = target.join(&relative);
            if entry.is_dir() {
                fs::create_dir_all(&dest)?;
            } else {
                if let Some(parent) = dest.parent() {
                    fs::create_dir_all(parent)?;
                }
                let mut file = File::create(&dest)?;
                std::io::copy(&mut entry, &mut file)?;
            }
        }
        Ok(())
    }

    fn read_metadata(target: &Utf8Path) -> Option<WheelMetadata> {
        for entry in walkdir::WalkDir::new(target).into_iter().flatten() {
            let path = entry.path();
            let in_dist_info = path
                .parent()
                .and_then(|parent| parent.file_name())
                .map_or(false, |name| name.to_string_lossy().ends_with(".dist-info"));
            if in_dist_info && path.file_name().map_or(false, |name| name == "metadata.json") {
                let file = File::open(path).ok()?;
                return serde_json::from_reader(file).ok();
            }
        }
        None
    }

    /// A concrete version when one was requested, otherwise the best the
    /// index admits for the range. No version at all addresses the bare
    /// release page, which serves the latest wheel.
    fn resolve_version(&self, name: &str, requested: &str) -> Result<String> {
        if requested.is_empty() {
            return Ok(String::new());
        }
        match requested.parse::<Version>() {
            Ok(version) if !version.is_partial() => Ok(version.to_string()),
            _ => {
                let range: VersionRange = requested.parse().map_err(InstallError::Semver)?;
                let best = probe_max_version(&range, |candidate| self.page_exists(name, candidate));
                Ok(best.to_string())
            }
        }
    }
}

impl Installer for IndexInstaller {
    fn can_install_reference(&self, reference: &str) -> Option<PackageInfo> {
        let stripped = reference.strip_prefix("pypi+").unwrap_or(reference);
        let mut info = PackageInfo::parse(stripped, '@');
        info.reference = Some(reference.to_string());
        Some(info)
    }

    fn can_install(&self, name: &str, version: &str) -> Option<PackageInfo> {
        let mut info = PackageInfo::parse(&format!("{}@{}", name, version), '@');
        info.name = Some(name.to_string());
        Some(info)
    }

    fn install(
        &self,
        mut info: PackageInfo,
        dest: &Utf8Path,
        progress: &Progress<'_>,
    ) -> Result<PackageInfo> {
        let name = info.name.clone().unwrap_or_default();
        let requested = info.version.clone().unwrap_or_default();

        let version = self.resolve_version(&name, &requested)?;
        let url = self.find_download_url(&name, &version)?;
        let archive = self.download(&url, dest, progress)?;
        let target = dest.join(name.to_lowercase());
        self.extract(&archive, &target)?;
        fs::remove_file(&archive)?;

        match IndexInstaller::read_metadata(&target) {
            Some(metadata) => {
                if metadata.summary.is_some() {
                    info.description = metadata.summary.clone();
                }
                info.dependencies = translate_requirements(&metadata.run_requires);
                info.version = Some(metadata.version.clone());
                info.version_range = Some(format!("^{}", metadata.version));
            }
            None => {
                warn!(target: LOGNAME, "no wheel metadata found for {}", name);
                if !version.is_empty() {
                    info.version = Some(version.clone());
                    info.version_range = Some(format!("^{}", version));
                }
            }
        }

        info.path = Some(target);
        Ok(info)
    }
}

/// Where an archive entry belongs under the package root, or `None` for
/// entries with nothing to write.
///
/// A wheel splits its content between the top level and per-scheme trees
/// under `{name}-{version}.data/`; the pure and platform install locations
/// both rehome to the package root, merged with the top-level files. The
/// remaining schemes (scripts, headers, data) keep the archive layout.
fn rehome(path: &str) -> Option<&str> {
    let (first, rest) = match path.split_once('/') {
        Some(split) => split,
        None => return Some(path),
    };
    if !first.ends_with(".data") {
        return Some(path);
    }
    match rest.split_once('/') {
        Some(("purelib", tail)) | Some(("platlib", tail)) if !tail.is_empty() => Some(tail),
        Some(("purelib", _)) | Some(("platlib", _)) => None,
        // The bare scheme directories carry nothing worth creating.
        None if rest.is_empty() || rest == "purelib" || rest == "platlib" => None,
        _ => Some(path),
    }
}

fn scrape_wheel_link(page_url: &str, page: &str) -> Option<Url> {
    let captures = WHEEL_ANCHOR.captures(page)?;
    let href = captures.get(1)?.as_str();
    Url::parse(page_url).ok()?.join(href).ok()
}

/// Turn wheel `run_requires` blocks into manifest dependency entries.
/// Blocks gated on an extra or an environment marker are not part of a plain
/// install and are skipped. A constraint we cannot express stays verbatim so
/// nothing silently disappears from the manifest.
fn translate_requirements(blocks: &[RequiresBlock]) -> IndexMap<String, String> {
    let mut dependencies = IndexMap::new();
    for block in blocks {
        if block.extra.is_some() || block.environment.is_some() {
            continue;
        }
        for item in &block.requires {
            match split_requirement(item) {
                Some((name, range)) => {
                    dependencies.insert(name, range);
                }
                None => {
                    warn!(
                        target: LOGNAME,
                        "keeping unparseable requirement '{}' verbatim", item
                    );
                    dependencies.insert(item.clone(), item.clone());
                }
            }
        }
    }
    dependencies
}

/// `name (>=lower,<upper)` becomes `name` plus a space-joined range literal.
fn split_requirement(item: &str) -> Option<(String, String)> {
    let captures = REQUIREMENT.captures(item)?;
    let name = captures.get(1)?.as_str().to_string();
    let range = match captures.get(2) {
        Some(constraints) => {
            let literal = constraints
                .as_str()
                .split(',')
                .map(str::trim)
                .collect::<Vec<_>>()
                .join(" ");
            match literal.parse::<VersionRange>() {
                Ok(_) => literal,
                Err(_) => {
                    warn!(
                        target: LOGNAME,
                        "keeping unparseable constraint '{}' for {} verbatim",
                        constraints.as_str(),
                        name
                    );
                    constraints.as_str().to_string()
                }
            }
        }
        None => "*".to_string(),
    };
    Some((name, range))
}

/// The best version the index can offer inside `range`, found by walking
/// upward from the range floor: bump the major while a release exists and
/// the range still allows it, then the minor, then the patch. The index has
/// no listing endpoint, so this stays a best-effort walk.
pub(crate) fn probe_max_version(
    range: &VersionRange,
    exists: impl Fn(&Version) -> bool,
) -> Version {
    let mut current = range.lower().version().clone();
    for segment in Segment::ALL {
        loop {
            let candidate = current.bumped(segment);
            if range.contains(&candidate) && exists(&candidate) {
                current = candidate;
            } else {
                break;
            }
        }
    }
    current
}
