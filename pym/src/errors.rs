// This file is dual licensed under the terms of the Apache License, Version
// 2.0, and the BSD License. See the LICENSE file in the root of this repository
// for complete details.

use camino::Utf8PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PymError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Semver(#[from] SemverError),

    #[error(transparent)]
    Install(#[from] InstallError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("could not access the project directory")]
    Io(#[from] std::io::Error),
}

impl PymError {
    /// The action a user can take to get past this error, when we know one.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            PymError::Manifest(_) => Some("run 'pym init' to create a project here"),
            PymError::Install(InstallError::InstallerNotFound { .. }) => {
                Some("double-check the source and version syntax (git references use '#')")
            }
            PymError::Install(InstallError::VersionNotFound { .. }) => {
                Some("verify that the version exists")
            }
            PymError::Install(InstallError::PackageUrl { .. }) => {
                Some("verify the package name and version")
            }
            PymError::Semver(_)
            | PymError::Install(InstallError::Semver(_))
            | PymError::Graph(GraphError::Semver(_)) => Some("fix the version literal"),
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("no pym.json found in {path}")]
    Missing { path: Utf8PathBuf },

    #[error("could not parse pym.json")]
    Malformed { source: serde_json::Error },

    #[error("could not access pym.json")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SemverError {
    #[error("invalid version string '{literal}'")]
    VersionParse { literal: String },

    #[error("invalid version range '{literal}'")]
    RangeParse { literal: String },
}

#[derive(Error, Debug)]
pub enum InstallError {
    #[error("failed to find an installer for {reference}")]
    InstallerNotFound { reference: String },

    #[error("failed to find version {version}")]
    VersionNotFound { version: String, source: git2::Error },

    #[error("failed to find a package at {url}")]
    PackageUrl { url: String },

    #[error(transparent)]
    Git(#[from] git2::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("could not read the wheel archive")]
    Archive(#[from] zip::result::ZipError),

    #[error(transparent)]
    Semver(#[from] SemverError),

    #[error("could not write the staged package")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("requirements for {name} cannot be satisfied")]
    Unsatisfiable { name: String },

    #[error(transparent)]
    Semver(#[from] SemverError),
}
