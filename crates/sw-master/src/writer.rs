//! Track output through a scoped temporary file.
//!
//! Bytes go to a uniquely named `.<name>.XXXX.partial` file next to the
//! target, so concurrent renders never share one. [`PartialFile::commit`]
//! renames it into place; dropping an uncommitted file deletes it.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

/// Suffix of in-progress output files.
pub const PARTIAL_SUFFIX: &str = ".partial";

#[derive(Debug)]
pub struct PartialFile {
    target: PathBuf,
    file: NamedTempFile,
}

impl PartialFile {
    /// Start writing `target`, creating its parent directory.
    pub fn create(target: &Path) -> io::Result<Self> {
        let dir = match target.parent().filter(|d| !d.as_os_str().is_empty()) {
            Some(dir) => {
                fs::create_dir_all(dir)?;
                dir
            }
            None => Path::new("."),
        };
        let name = target.file_name().unwrap_or_default().to_string_lossy();
        let file = tempfile::Builder::new()
            .prefix(&format!(".{}.", name))
            .suffix(PARTIAL_SUFFIX)
            .tempfile_in(dir)?;
        debug!(path = %file.path().display(), "opened partial output");
        Ok(Self { target: target.to_path_buf(), file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.file.write_all(bytes)
    }

    /// Move the partial file to its target, replacing any older output.
    pub fn commit(mut self) -> io::Result<PathBuf> {
        self.file.as_file_mut().sync_all()?;
        self.file.persist(&self.target).map_err(|e| e.error)?;
        Ok(self.target)
    }
}

/// Whether `path` names an in-progress output file.
pub fn is_partial(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(PARTIAL_SUFFIX))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leftovers(dir: &Path) -> Vec<PathBuf> {
        fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| is_partial(p))
            .collect()
    }

    #[test]
    fn commit_renames_into_place() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested/out.wav");
        let mut file = PartialFile::create(&target).unwrap();
        assert!(file.path().exists());
        assert!(is_partial(file.path()));
        file.write_all(b"abc").unwrap();
        file.write_all(b"def").unwrap();
        let written = file.commit().unwrap();
        assert_eq!(written, target);
        assert_eq!(fs::read(&target).unwrap(), b"abcdef");
        assert!(leftovers(&dir.path().join("nested")).is_empty());
    }

    #[test]
    fn drop_without_commit_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.wav");
        {
            let mut file = PartialFile::create(&target).unwrap();
            file.write_all(b"half").unwrap();
        }
        assert!(!target.exists());
        assert!(leftovers(dir.path()).is_empty());
    }

    #[test]
    fn writers_to_one_target_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.wav");
        let mut first = PartialFile::create(&target).unwrap();
        let mut second = PartialFile::create(&target).unwrap();
        assert_ne!(first.path(), second.path());

        first.write_all(b"first take").unwrap();
        second.write_all(b"abandoned").unwrap();
        drop(second);

        first.commit().unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"first take");
        assert!(leftovers(dir.path()).is_empty());
    }

    #[test]
    fn commit_replaces_older_output() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.wav");
        fs::write(&target, b"old").unwrap();
        let mut file = PartialFile::create(&target).unwrap();
        file.write_all(b"new").unwrap();
        file.commit().unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"new");
    }

    #[test]
    fn partial_names() {
        assert!(is_partial(Path::new("out/.score.wav.a1b2c3.partial")));
        assert!(!is_partial(Path::new("out/score.wav")));
    }
}
