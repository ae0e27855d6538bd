// This file is dual licensed under the terms of the Apache License, Version
// 2.0, and the BSD License. See the LICENSE file in the root of this repository
// for complete details.

use std::io;

use camino::Utf8Path;
use log::{debug, info, warn};

use crate::errors::{ManifestError, PymError};
use crate::graph::DependencyGraph;
use crate::installer::{self, Installer};
use crate::manifest::{ConfigBuilder, Manifest};
use crate::package::PackageInfo;
use crate::progress::Progress;
use crate::staging::{self, StagingDir};
use crate::{Project, Prompt, Pym};

const LOGNAME: &str = "pym::operations";

type Result<T, E = PymError> = core::result::Result<T, E>;

/// A package sitting in staging with its loaded or synthesized manifest.
/// `requested` marks the ones the user named on the command line, which are
/// the only ones `--save` writes back.
struct Fetched {
    info: PackageInfo,
    manifest: Manifest,
    requested: bool,
}

impl Fetched {
    fn name(&self) -> String {
        if self.manifest.name.is_empty() {
            self.info.name.clone().unwrap_or_default()
        } else {
            self.manifest.name.clone()
        }
    }
}

pub(crate) fn install(pym: &mut Pym<'_>, references: &[String], save: bool) -> Result<()> {
    let Pym {
        project,
        installers,
        progress,
        prompt,
    } = pym;

    // The staging directory is ours for the duration of the command; the
    // guard removes it again on every exit path.
    let staging = StagingDir::enter(project.staging_path())?;

    // Work set: explicit references, deduplicated with the first mention
    // winning, or everything the project manifest declares.
    let mut work: Vec<(&dyn Installer, PackageInfo, bool)> = Vec::new();
    if references.is_empty() {
        for (name, version) in &project.manifest.dependencies {
            let (installer, info) = installer::find_for_requirement(installers, name, version)?;
            work.push((installer, info, false));
        }
    } else {
        let mut seen: Vec<&String> = Vec::new();
        for reference in references {
            if seen.contains(&reference) {
                continue;
            }
            seen.push(reference);
            let (installer, info) = installer::find_for_reference(installers, reference)?;
            work.push((installer, info, true));
        }
    }

    let mut fetched: Vec<Fetched> = Vec::new();
    for (installer, info, requested) in work {
        let (info, manifest) = fetch(installer, info, staging.path(), progress, prompt)?;
        fetched.push(Fetched {
            info,
            manifest,
            requested,
        });
    }

    // Every fetched package's declared dependencies feed one graph, which
    // folds them down to a single range per name.
    let mut graph = DependencyGraph::new();
    for package in &fetched {
        for (name, literal) in &package.manifest.dependencies {
            if let Err(err) = graph.add(name, literal) {
                warn!(
                    target: LOGNAME,
                    "skipping dependency constraint {} = '{}': {}", name, literal, err
                );
            }
        }
    }

    for (name, range) in graph.resolve()? {
        if fetched.iter().any(|package| package.name() == name) {
            debug!(
                target: LOGNAME,
                "{} already fetched, keeping the explicit version", name
            );
            continue;
        }
        let (installer, info) =
            installer::find_for_requirement(installers, &name, &range.to_string())?;
        let (info, manifest) = fetch(installer, info, staging.path(), progress, prompt)?;
        fetched.push(Fetched {
            info,
            manifest,
            requested: false,
        });
    }

    // Unstage pass: every fetch landed before anything replaces an existing
    // install, so an abort up to here leaves the install tree untouched.
    for package in &fetched {
        let name = package.name();
        let dest = project.install_path().join(&name);
        let src = package
            .info
            .path
            .as_deref()
            .expect("installer set the staged path");
        staging::unstage(src, &dest)?;
        info!(target: LOGNAME, "successfully installed {}", name);
    }

    if save {
        for package in fetched.iter().filter(|package| package.requested) {
            if let Some(range) = &package.info.version_range {
                project
                    .manifest
                    .dependencies
                    .insert(package.name(), range.clone());
            }
        }
        info!(target: LOGNAME, "saving to {}", project.manifest.name);
        project.save()?;
    }

    drop(staging);
    Ok(())
}

fn fetch(
    installer: &dyn Installer,
    info: PackageInfo,
    staging: &Utf8Path,
    progress: &Progress<'_>,
    prompt: &mut Prompt<'_>,
) -> Result<(PackageInfo, Manifest)> {
    info!(
        target: LOGNAME,
        "installing {}",
        info.reference.as_deref().unwrap_or("package")
    );
    let mut info = installer.install(info, staging, progress)?;
    let path = info
        .path
        .clone()
        .expect("installer set the staged path");

    let manifest = match Manifest::load(&path) {
        Ok(manifest) => manifest,
        Err(ManifestError::Missing { .. }) => {
            debug!(target: LOGNAME, "no package manifest found, creating one");
            let manifest = synthesize(&mut info, prompt);
            manifest.save(&path)?;
            manifest
        }
        Err(err) => return Err(err.into()),
    };

    Ok((info, manifest))
}

// A package without a manifest gets one built from what the installer
// learned; when not even the source layout is guessable, the host's prompt
// fills the gaps.
fn synthesize(info: &mut PackageInfo, prompt: &mut Prompt<'_>) -> Manifest {
    info.src = PackageInfo::guess_src(info);
    if info.src.is_some() {
        ConfigBuilder::build(info)
    } else {
        ConfigBuilder::query(info, prompt)
    }
}

pub(crate) fn uninstall(pym: &mut Pym<'_>, names: &[String], save: bool) -> Result<()> {
    let project = &mut pym.project;

    for name in names {
        let location = project.install_path().join(name);
        debug!(target: LOGNAME, "removing {} at {}", name, location);
        match std::fs::remove_dir_all(&location) {
            Ok(()) => {
                if save && project.manifest.dependencies.shift_remove(name).is_none() {
                    debug!(
                        target: LOGNAME,
                        "{} was never saved as a dependency", name
                    );
                }
                info!(target: LOGNAME, "uninstalled {}", name);
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                warn!(
                    target: LOGNAME,
                    "failed to uninstall {}, is the name spelled correctly?", name
                );
            }
            Err(err) => return Err(err.into()),
        }
    }

    project.save()?;
    Ok(())
}

pub(crate) fn init(root: &Utf8Path, prompt: &mut Prompt<'_>) -> Result<Project> {
    let mut info = PackageInfo::parse(root.as_str(), '@');
    info.path = Some(root.to_owned());
    info.src = PackageInfo::guess_src(&info);
    info.version = Some("0.1.0".to_string());
    info.license = Some("MIT".to_string());

    let manifest = ConfigBuilder::query(&info, prompt);
    let project = Project::new(root, manifest);
    project.save()?;
    info!(target: LOGNAME, "initialized project");
    Ok(project)
}
