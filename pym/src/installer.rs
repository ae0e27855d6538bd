// This file is dual licensed under the terms of the Apache License, Version
// 2.0, and the BSD License. See the LICENSE file in the root of this repository
// for complete details.

use camino::Utf8Path;

use crate::errors::InstallError;
use crate::package::PackageInfo;
use crate::progress::Progress;

pub(crate) mod git;
pub(crate) mod index;

type Result<T, E = InstallError> = core::result::Result<T, E>;

/// A source driver. The discriminators decide whether the driver claims a
/// raw reference or a `(name, constraint)` manifest entry, handing back a
/// descriptor when they do; `install` fetches into the staging area and
/// fills the descriptor in.
pub(crate) trait Installer {
    fn can_install_reference(&self, reference: &str) -> Option<PackageInfo>;

    fn can_install(&self, name: &str, version: &str) -> Option<PackageInfo>;

    fn install(
        &self,
        info: PackageInfo,
        dest: &Utf8Path,
        progress: &Progress<'_>,
    ) -> Result<PackageInfo>;
}

/// The drivers in claim order: git first, the index takes the rest.
pub(crate) fn default_installers() -> Result<Vec<Box<dyn Installer>>> {
    Ok(vec![
        Box::new(git::GitInstaller::new()),
        Box::new(index::IndexInstaller::new()?),
    ])
}

pub(crate) fn find_for_reference<'i>(
    installers: &'i [Box<dyn Installer>],
    reference: &str,
) -> Result<(&'i dyn Installer, PackageInfo)> {
    installers
        .iter()
        .find_map(|installer| {
            installer
                .can_install_reference(reference)
                .map(|info| (installer.as_ref(), info))
        })
        .ok_or_else(|| InstallError::InstallerNotFound {
            reference: reference.to_string(),
        })
}

pub(crate) fn find_for_requirement<'i>(
    installers: &'i [Box<dyn Installer>],
    name: &str,
    version: &str,
) -> Result<(&'i dyn Installer, PackageInfo)> {
    installers
        .iter()
        .find_map(|installer| {
            installer
                .can_install(name, version)
                .map(|info| (installer.as_ref(), info))
        })
        .ok_or_else(|| InstallError::InstallerNotFound {
            reference: format!("{}@{}", name, version),
        })
}
