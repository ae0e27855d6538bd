// This file is dual licensed under the terms of the Apache License, Version
// 2.0, and the BSD License. See the LICENSE file in the root of this repository
// for complete details.

use camino::{Utf8Path, Utf8PathBuf};

use crate::installer::Installer;
use crate::progress::Progress;

pub mod errors;
pub mod graph;
pub mod manifest;
pub mod package;
pub mod semver;

mod installer;
mod operations;
mod progress;
mod staging;

pub use crate::errors::{GraphError, InstallError, ManifestError, PymError, SemverError};
pub use crate::manifest::{ConfigBuilder, Manifest, MANIFEST_FILENAME};
pub use crate::package::PackageInfo;

type Result<T, E = PymError> = core::result::Result<T, E>;

/// How the host answers a question: the field's description plus the value
/// we would suggest, returning the answer (empty keeps the suggestion).
pub type Prompt<'p> = Box<dyn FnMut(&str, Option<&str>) -> String + 'p>;

/// A project rooted at a directory holding a pym.json. The root is carried
/// explicitly; nothing below the entry point consults the process working
/// directory.
#[derive(Debug, Clone)]
pub struct Project {
    root: Utf8PathBuf,
    pub manifest: Manifest,
}

impl Project {
    pub fn new(root: impl Into<Utf8PathBuf>, manifest: Manifest) -> Project {
        Project {
            root: root.into(),
            manifest,
        }
    }

    pub fn load(root: impl Into<Utf8PathBuf>) -> Result<Project, ManifestError> {
        let root = root.into();
        let manifest = Manifest::load(&root)?;
        Ok(Project { root, manifest })
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn save(&self) -> Result<(), ManifestError> {
        self.manifest.save(&self.root)
    }

    pub(crate) fn install_path(&self) -> Utf8PathBuf {
        self.root.join(&self.manifest.install_location)
    }

    pub(crate) fn staging_path(&self) -> Utf8PathBuf {
        self.root.join(&self.manifest.staging_location)
    }
}

/// The installation engine for one project: the loaded manifest, the driver
/// registry, and whatever prompt and progress callbacks the host wired in.
pub struct Pym<'p> {
    pub(crate) project: Project,
    pub(crate) installers: Vec<Box<dyn Installer>>,
    pub(crate) progress: Progress<'p>,
    pub(crate) prompt: Prompt<'p>,
}

impl<'p> Pym<'p> {
    pub fn new(project: Project) -> Result<Pym<'p>> {
        Ok(Pym {
            project,
            installers: installer::default_installers()?,
            progress: Progress::new(),
            prompt: Box::new(|_, suggestion| suggestion.unwrap_or_default().to_string()),
        })
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    /// Replace the default prompt (which silently accepts every suggestion)
    /// with an interactive one.
    pub fn with_prompt(&mut self, prompt: impl FnMut(&str, Option<&str>) -> String + 'p) {
        self.prompt = Box::new(prompt);
    }

    pub fn with_progress_start(&mut self, cb: impl FnMut(&str, Option<u64>) + 'p) {
        self.progress.with_start(cb);
    }

    pub fn with_progress_update(&mut self, cb: impl FnMut(&str, u64) + 'p) {
        self.progress.with_update(cb);
    }

    pub fn with_progress_finish(&mut self, cb: impl FnMut(&str) + 'p) {
        self.progress.with_finish(cb);
    }

    /// Install the named references, or everything the manifest declares
    /// when none are given. With `save`, requested packages are written back
    /// to the manifest under their resolved version ranges.
    pub fn install(&mut self, references: &[String], save: bool) -> Result<()> {
        operations::install(self, references, save)
    }

    /// Remove installed packages by name. With `save`, the packages also
    /// come out of the manifest's dependency table.
    pub fn uninstall(&mut self, names: &[String], save: bool) -> Result<()> {
        operations::uninstall(self, names, save)
    }
}

/// Create a pym.json in `root` by asking the prompt about each recognized
/// field, suggesting what the directory itself gives away.
pub fn init(root: &Utf8Path, prompt: &mut Prompt<'_>) -> Result<Project> {
    operations::init(root, prompt)
}
