//! Filesystem utilities.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use walkdir::WalkDir;

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.is_dir() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Write a string to a file, creating parent directories if needed.
pub fn write_string(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    fs::write(path, contents).with_context(|| format!("failed to write file: {}", path.display()))
}

/// Move `from` onto `to`, replacing any existing file.
///
/// Both paths are expected on the same filesystem so the rename is atomic.
pub fn rename_into_place(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent() {
        ensure_dir(parent)?;
    }
    fs::rename(from, to)
        .with_context(|| format!("failed to move {} to {}", from.display(), to.display()))
}

/// Copy a file into `dir`, keeping its file name. Returns the destination.
pub fn copy_into(file: &Path, dir: &Path) -> Result<PathBuf> {
    let Some(name) = file.file_name() else {
        bail!("not a file path: {}", file.display());
    };
    ensure_dir(dir)?;
    let dest = dir.join(name);
    fs::copy(file, &dest)
        .with_context(|| format!("failed to copy {} to {}", file.display(), dest.display()))?;
    Ok(dest)
}

/// List regular files under `dir` (recursively), sorted.
pub fn files_in(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("failed to read directory entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    files
}

/// Immediate subdirectories of `dir` with the given extension, sorted.
pub fn dirs_with_extension(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.with_context(|| format!("failed to read directory: {}", dir.display()))?;
        if entry.file_type().is_dir()
            && entry.path().extension().is_some_and(|ext| ext == extension)
        {
            found.push(entry.into_path());
        }
    }
    found.sort();
    Ok(found)
}

/// Locate the project to use when none was given: a single `.xcworkspace`
/// in `dir`, otherwise a single `.xcodeproj`.
pub fn find_project_path(dir: &Path) -> Result<PathBuf> {
    for extension in ["xcworkspace", "xcodeproj"] {
        let mut candidates = dirs_with_extension(dir, extension)?;
        if candidates.len() == 1 {
            return Ok(candidates.remove(0));
        }
    }

    bail!(
        "couldn't determine the project in {}; use --project-path to provide it",
        dir.display()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_find_project_prefers_workspace() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("App.xcodeproj")).unwrap();
        fs::create_dir(tmp.path().join("App.xcworkspace")).unwrap();

        let found = find_project_path(tmp.path()).unwrap();
        assert_eq!(found, tmp.path().join("App.xcworkspace"));
    }

    #[test]
    fn test_find_project_ambiguous() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("A.xcodeproj")).unwrap();
        fs::create_dir(tmp.path().join("B.xcodeproj")).unwrap();

        assert!(find_project_path(tmp.path()).is_err());
    }

    #[test]
    fn test_copy_into_and_files_in() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("a.bc");
        fs::write(&src, "ir").unwrap();

        let dest = copy_into(&src, &tmp.path().join("out/nested")).unwrap();
        assert_eq!(fs::read_to_string(&dest).unwrap(), "ir");
        assert_eq!(files_in(&tmp.path().join("out")), vec![dest]);
    }

    #[test]
    fn test_rename_into_place_replaces() {
        let tmp = TempDir::new().unwrap();
        let from = tmp.path().join("tmp.bc");
        let to = tmp.path().join("final/a.bc");
        fs::write(&from, "new").unwrap();

        rename_into_place(&from, &to).unwrap();
        assert!(!from.exists());
        assert_eq!(fs::read_to_string(&to).unwrap(), "new");
    }
}
