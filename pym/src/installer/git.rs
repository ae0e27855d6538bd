// This file is dual licensed under the terms of the Apache License, Version
// 2.0, and the BSD License. See the LICENSE file in the root of this repository
// for complete details.

use std::cell::Cell;
use std::fs;

use camino::Utf8Path;
use git2::build::{CheckoutBuilder, RepoBuilder};
use git2::{FetchOptions, RemoteCallbacks, Repository};
use log::debug;

use crate::errors::InstallError;
use crate::installer::Installer;
use crate::package::PackageInfo;
use crate::progress::Progress;
use crate::staging;

const LOGNAME: &str = "pym::installer::git";

type Result<T, E = InstallError> = core::result::Result<T, E>;

pub(crate) struct GitInstaller;

impl GitInstaller {
    pub(crate) fn new() -> GitInstaller {
        GitInstaller
    }

    fn accepts(reference: &str) -> bool {
        let source = reference.split('#').next().unwrap_or(reference);
        source.ends_with(".git") || reference.starts_with("git+")
    }

    fn clone(&self, source: &str, dest: &Utf8Path, progress: &Progress<'_>) -> Result<Repository> {
        debug!(target: LOGNAME, "cloning {} into {}", source, dest);
        let task = progress.task(source, None);
        let received = Cell::new(0u64);

        let mut callbacks = RemoteCallbacks::new();
        callbacks.transfer_progress(|stats| {
            let objects = stats.received_objects() as u64;
            task.update(objects.saturating_sub(received.get()));
            received.set(objects);
            true
        });
        let mut options = FetchOptions::new();
        options.remote_callbacks(callbacks);

        let repo = RepoBuilder::new()
            .fetch_options(options)
            .clone(source, dest.as_std_path())?;
        Ok(repo)
    }

    fn checkout(&self, repo: &Repository, refspec: &str) -> Result<()> {
        debug!(target: LOGNAME, "checking out {}", refspec);
        let attempt = || -> Result<(), git2::Error> {
            let (object, reference) = repo.revparse_ext(refspec)?;
            repo.checkout_tree(&object, Some(CheckoutBuilder::new().force()))?;
            match reference.and_then(|r| r.name().map(String::from)) {
                Some(name) => repo.set_head(&name),
                None => repo.set_head_detached(object.id()),
            }
        };
        attempt().map_err(|source| InstallError::VersionNotFound {
            version: refspec.to_string(),
            source,
        })
    }

    // Branch checkouts land on a branch; tag and commit checkouts leave HEAD
    // detached, and the caller keeps whatever version it parsed.
    fn active_branch(repo: &Repository) -> Option<String> {
        let head = repo.head().ok()?;
        if head.is_branch() {
            head.shorthand().map(String::from)
        } else {
            None
        }
    }

    fn read_description(path: &Utf8Path) -> Option<String> {
        let text = fs::read_to_string(path.join(".git").join("description")).ok()?;
        let text = text.trim();
        if text.is_empty() || text.starts_with("Unnamed repository") {
            return None;
        }
        Some(text.to_string())
    }
}

impl Installer for GitInstaller {
    fn can_install_reference(&self, reference: &str) -> Option<PackageInfo> {
        if !GitInstaller::accepts(reference) {
            return None;
        }
        let stripped = reference.strip_prefix("git+").unwrap_or(reference);
        let mut info = PackageInfo::parse(stripped, '#');
        info.reference = Some(reference.to_string());
        Some(info)
    }

    fn can_install(&self, name: &str, version: &str) -> Option<PackageInfo> {
        // Manifest entries carry the whole git reference in the version slot.
        let mut info = self.can_install_reference(version)?;
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
        let source = info.source.clone().unwrap_or_default();
        let target = dest.join(&name);

        let repo = self.clone(&source, &target, progress)?;
        if let Some(refspec) = &info.version {
            self.checkout(&repo, refspec)?;
        }
        if let Some(branch) = GitInstaller::active_branch(&repo) {
            info.version = Some(branch);
        }
        drop(repo);

        info.description = GitInstaller::read_description(&target).or(info.description);
        staging::remove_tree_forced(&target.join(".git"))?;

        let reference = info.reference.clone().unwrap_or_default();
        let reference = reference.strip_prefix("git+").unwrap_or(&reference);
        info.version_range = Some(format!("git+{}", reference));
        info.path = Some(target);
        Ok(info)
    }
}
