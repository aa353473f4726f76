// SPDX-License-Identifier: MPL-2.0

//! Storage utilities for the photo library and scratch files

use crate::constants::app_info;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// `$XDG_PICTURES_DIR/PhotoShot`, or `~/Pictures/PhotoShot` when unset
pub fn default_library_dir() -> PathBuf {
    dirs::picture_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Pictures")))
        .unwrap_or_else(std::env::temp_dir)
        .join(app_info::LIBRARY_FOLDER)
}

/// `$TMPDIR/photoshot`
pub fn default_scratch_dir() -> PathBuf {
    std::env::temp_dir().join(app_info::APP_ID)
}

/// Directory for log files in terminal mode
pub fn log_dir() -> PathBuf {
    dirs::state_dir()
        .or_else(dirs::cache_dir)
        .unwrap_or_else(std::env::temp_dir)
        .join(app_info::APP_ID)
}

/// Write `data` to `<dir>/<file_name>` atomically
///
/// The bytes go to a hidden temporary file first and are renamed into
/// place, so readers never observe a partial file.
pub fn write_scratch_file(dir: &Path, file_name: &str, data: &[u8]) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let dest = dir.join(file_name);
    let tmp = dir.join(format!(".{}.tmp", file_name));

    let mut file = std::fs::File::create(&tmp)?;
    file.write_all(data)?;
    file.sync_all()?;
    drop(file);

    if let Err(e) = std::fs::rename(&tmp, &dest) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e);
    }
    debug!(path = %dest.display(), size = data.len(), "Scratch file written");
    Ok(dest)
}

/// Remove a scratch file if it still exists
pub fn remove_scratch_file(path: &Path) -> std::io::Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            debug!(path = %path.display(), "Scratch file removed");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scratch_write_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_scratch_file(dir.path(), "a.jpg", b"bytes").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"bytes");
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("a.jpg")]);
    }

    #[test]
    fn test_scratch_write_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested/scratch");
        let path = write_scratch_file(&nested, "b.dng", b"x").unwrap();
        assert!(path.starts_with(&nested));
    }

    #[test]
    fn test_remove_missing_file_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        assert!(remove_scratch_file(&dir.path().join("missing")).is_ok());
    }

    #[test]
    fn test_default_dirs_use_app_names() {
        assert!(default_library_dir().ends_with(app_info::LIBRARY_FOLDER));
        assert!(default_scratch_dir().ends_with(app_info::APP_ID));
    }
}
