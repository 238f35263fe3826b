//! Append-only line file with size-based rotation.
//!
//! When the live file grows past its limit it is renamed to `<name>.1`,
//! existing backups shift up by one (`.1` → `.2`, …) and the oldest beyond the
//! retention count is dropped.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Live file size that triggers a rotation.
pub const DEFAULT_MAX_BYTES: u64 = 10 * 1024 * 1024;

/// Backups kept next to the live file.
pub const DEFAULT_BACKUPS: usize = 3;

pub struct RotatingFile {
    path: PathBuf,
    max_bytes: u64,
    backups: usize,
    handle: Mutex<Option<File>>,
}

impl RotatingFile {
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self::with_limits(path, DEFAULT_MAX_BYTES, DEFAULT_BACKUPS)
    }

    #[must_use]
    pub const fn with_limits(path: PathBuf, max_bytes: u64, backups: usize) -> Self {
        Self {
            path,
            max_bytes,
            backups,
            handle: Mutex::new(None),
        }
    }

    /// Appends `line` plus a newline, rotating first if the file is full.
    pub fn append_line(&self, line: &str) -> io::Result<()> {
        let mut handle = self
            .handle
            .lock()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("writer lock poisoned: {e}")))?;

        let full = fs::metadata(&self.path).is_ok_and(|meta| meta.len() > self.max_bytes);
        if full {
            *handle = None;
            self.rotate()?;
        }

        if handle.is_none() {
            *handle = Some(OpenOptions::new().create(true).append(true).open(&self.path)?);
        }
        let Some(file) = handle.as_mut() else {
            return Err(io::Error::new(io::ErrorKind::Other, "trace file unavailable"));
        };
        writeln!(file, "{line}")?;
        file.flush()
    }

    fn backup_path(&self, index: usize) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(format!(".{index}"));
        PathBuf::from(name)
    }

    fn rotate(&self) -> io::Result<()> {
        if self.backups == 0 {
            return remove_if_exists(&self.path);
        }

        remove_if_exists(&self.backup_path(self.backups))?;
        for index in (1..self.backups).rev() {
            let from = self.backup_path(index);
            if from.exists() {
                fs::rename(&from, self.backup_path(index + 1))?;
            }
        }
        if self.path.exists() {
            fs::rename(&self.path, self.backup_path(1))?;
        }
        Ok(())
    }
}

fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

impl std::fmt::Debug for RotatingFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotatingFile")
            .field("path", &self.path)
            .field("max_bytes", &self.max_bytes)
            .field("backups", &self.backups)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotates_and_keeps_bounded_backups() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.json");
        let file = RotatingFile::with_limits(path.clone(), 10, 2);

        for i in 0..5 {
            file.append_line(&format!("line-number-{i}")).unwrap();
        }

        assert_eq!(fs::read_to_string(&path).unwrap(), "line-number-4\n");
        assert_eq!(
            fs::read_to_string(dir.path().join("trace.json.1")).unwrap(),
            "line-number-3\n"
        );
        assert!(dir.path().join("trace.json.2").exists());
        assert!(!dir.path().join("trace.json.3").exists());
    }

    #[test]
    fn appends_below_the_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.json");
        let file = RotatingFile::new(path.clone());
        file.append_line("a").unwrap();
        file.append_line("b").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "a\nb\n");
    }
}
