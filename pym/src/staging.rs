// This file is dual licensed under the terms of the Apache License, Version
// 2.0, and the BSD License. See the LICENSE file in the root of this repository
// for complete details.

use std::fs;
use std::io;
use std::path::Path;

use camino::{Utf8Path, Utf8PathBuf};
use log::debug;

const LOGNAME: &str = "pym::staging";

/// The scratch directory a single command materializes packages into.
/// Created on enter, removed recursively when the guard drops, on success
/// and failure alike, so the install tree only ever sees finished packages.
#[derive(Debug)]
pub(crate) struct StagingDir {
    path: Utf8PathBuf,
}

impl StagingDir {
    pub(crate) fn enter(path: Utf8PathBuf) -> io::Result<StagingDir> {
        fs::create_dir_all(&path)?;
        Ok(StagingDir { path })
    }

    pub(crate) fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl Drop for StagingDir {
    fn drop(&mut self) {
        if let Err(err) = fs::remove_dir_all(&self.path) {
            if err.kind() != io::ErrorKind::NotFound {
                debug!(target: LOGNAME, "leaving staging directory {}: {}", self.path, err);
            }
        }
    }
}

/// Replace whatever sits at `dest` with the staged directory at `src`. A
/// missing `dest` is nothing to replace, not an error.
pub(crate) fn unstage(src: &Utf8Path, dest: &Utf8Path) -> io::Result<()> {
    debug!(target: LOGNAME, "moving {} to {}", src, dest);
    match fs::remove_dir_all(dest) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(err),
    }
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    move_dir(src, dest)
}

// Staging and install both live under the project root, so a rename is the
// expected path; the copy fallback covers setups where one of them is a
// mount point.
fn move_dir(src: &Utf8Path, dest: &Utf8Path) -> io::Result<()> {
    match fs::rename(src, dest) {
        Ok(()) => Ok(()),
        Err(_) => {
            copy_dir(src.as_std_path(), dest.as_std_path())?;
            fs::remove_dir_all(src)
        }
    }
}

fn copy_dir(src: &Path, dest: &Path) -> io::Result<()> {
    fs::create_dir_all(dest)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let target = dest.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Remove a tree that may contain read-only entries, the way a fresh clone's
/// `.git` does on Windows and some Unix configurations: grant write
/// permission and retry once when the first pass is denied.
pub(crate) fn remove_tree_forced(path: &Utf8Path) -> io::Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::PermissionDenied => {
            grant_write(path)?;
            fs::remove_dir_all(path)
        }
        Err(err) => Err(err),
    }
}

fn grant_write(path: &Utf8Path) -> io::Result<()> {
    for entry in walkdir::WalkDir::new(path) {
        let entry = entry.map_err(io::Error::from)?;
        let mut permissions = entry.metadata().map_err(io::Error::from)?.permissions();
        if permissions.readonly() {
            permissions.set_readonly(false);
            fs::set_permissions(entry.path(), permissions)?;
        }
    }
    Ok(())
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
    fn staging_dir_is_removed_on_drop() {
        let (_guard, root) = tempdir();
        let staging_path = root.join("pym_packages").join(".staging");

        let staging = StagingDir::enter(staging_path.clone()).unwrap();
        fs::write(staging.path().join("partial"), "bytes").unwrap();
        assert!(staging_path.exists());

        drop(staging);
        assert!(!staging_path.exists());
    }

    #[test]
    fn entering_twice_is_idempotent() {
        let (_guard, root) = tempdir();
        let staging_path = root.join(".staging");

        let first = StagingDir::enter(staging_path.clone()).unwrap();
        drop(first);
        let second = StagingDir::enter(staging_path.clone()).unwrap();
        assert!(staging_path.exists());
        drop(second);
    }

    #[test]
    fn unstage_moves_into_place() {
        let (_guard, root) = tempdir();
        let staged = root.join("staged");
        fs::create_dir(&staged).unwrap();
        fs::write(staged.join("module.py"), "pass").unwrap();

        let dest = root.join("pym_packages").join("demo");
        unstage(&staged, &dest).unwrap();

        assert!(!staged.exists());
        assert!(dest.join("module.py").exists());
    }

    #[test]
    fn unstage_replaces_an_existing_install() {
        let (_guard, root) = tempdir();
        let dest = root.join("demo");
        fs::create_dir(&dest).unwrap();
        fs::write(dest.join("stale"), "old").unwrap();

        let staged = root.join("staged");
        fs::create_dir(&staged).unwrap();
        fs::write(staged.join("fresh"), "new").unwrap();

        unstage(&staged, &dest).unwrap();
        assert!(!dest.join("stale").exists());
        assert!(dest.join("fresh").exists());
    }

    #[test]
    fn forced_removal_clears_read_only_entries() {
        let (_guard, root) = tempdir();
        let tree = root.join("scrub");
        fs::create_dir_all(tree.join("objects")).unwrap();
        let locked = tree.join("objects").join("pack");
        fs::write(&locked, "bytes").unwrap();
        let mut permissions = fs::metadata(&locked).unwrap().permissions();
        permissions.set_readonly(true);
        fs::set_permissions(&locked, permissions).unwrap();

        remove_tree_forced(&tree).unwrap();
        assert!(!tree.exists());
    }
}
