//! Backing stores for single-note recordings.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use sw_ir::{PitchClass, Register};

use crate::FormatError;

/// Identity of one recording: a scale degree in a register.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetId {
    pub pitch: PitchClass,
    pub register: Register,
}

impl AssetId {
    pub fn new(pitch: PitchClass, register: Register) -> Self {
        Self { pitch, register }
    }

    /// Path relative to a store root: `<register>/<degree>.wav`.
    pub fn relative_path(&self) -> PathBuf {
        Path::new(self.register.name()).join(format!("{}.wav", self.pitch.symbol()))
    }

    /// Every id a complete store holds, lowest register first.
    pub fn all() -> impl Iterator<Item = AssetId> {
        Register::ALL
            .into_iter()
            .flat_map(|r| PitchClass::ALL.into_iter().map(move |p| AssetId::new(p, r)))
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.register.name(), self.pitch.symbol())
    }
}

/// Read-only collection of recordings keyed by [`AssetId`].
pub trait SampleStore {
    /// Whether the store holds a recording for `id`.
    fn contains(&self, id: &AssetId) -> bool;

    /// Raw WAV bytes for `id`.
    fn read(&self, id: &AssetId) -> Result<Vec<u8>, FormatError>;

    /// Human-readable location of `id`, for messages.
    fn describe(&self, id: &AssetId) -> String {
        id.to_string()
    }
}

impl<S: SampleStore + ?Sized> SampleStore for &S {
    fn contains(&self, id: &AssetId) -> bool {
        (**self).contains(id)
    }

    fn read(&self, id: &AssetId) -> Result<Vec<u8>, FormatError> {
        (**self).read(id)
    }

    fn describe(&self, id: &AssetId) -> String {
        (**self).describe(id)
    }
}

/// Recordings laid out on disk as `root/low/1.wav` .. `root/high/7.wav`.
#[derive(Clone, Debug)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_of(&self, id: &AssetId) -> PathBuf {
        self.root.join(id.relative_path())
    }

    /// Ids whose files are missing, for diagnostics.
    pub fn missing(&self) -> Vec<AssetId> {
        AssetId::all().filter(|id| !self.contains(id)).collect()
    }
}

impl SampleStore for DirStore {
    fn contains(&self, id: &AssetId) -> bool {
        self.path_of(id).is_file()
    }

    fn read(&self, id: &AssetId) -> Result<Vec<u8>, FormatError> {
        Ok(fs::read(self.path_of(id))?)
    }

    fn describe(&self, id: &AssetId) -> String {
        self.path_of(id).display().to_string()
    }
}

/// In-memory store, for tests and embedding.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    assets: HashMap<AssetId, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: AssetId, wav: Vec<u8>) {
        self.assets.insert(id, wav);
    }

    pub fn with(mut self, id: AssetId, wav: Vec<u8>) -> Self {
        self.insert(id, wav);
        self
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

impl SampleStore for MemoryStore {
    fn contains(&self, id: &AssetId) -> bool {
        self.assets.contains_key(id)
    }

    fn read(&self, id: &AssetId) -> Result<Vec<u8>, FormatError> {
        self.assets.get(id).cloned().ok_or_else(|| {
            FormatError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no asset {}", id),
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_path_layout() {
        let id = AssetId::new(PitchClass::Ti, Register::Low);
        assert_eq!(id.relative_path(), Path::new("low").join("7.wav"));
        assert_eq!(id.to_string(), "low/7");
    }

    #[test]
    fn all_ids_cover_every_register() {
        let ids: Vec<_> = AssetId::all().collect();
        assert_eq!(ids.len(), 21);
        assert_eq!(ids[0], AssetId::new(PitchClass::Do, Register::Low));
        assert_eq!(ids[20], AssetId::new(PitchClass::Ti, Register::High));
    }

    #[test]
    fn dir_store_finds_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("mid")).unwrap();
        fs::write(dir.path().join("mid/1.wav"), b"RIFF").unwrap();

        let store = DirStore::new(dir.path());
        let present = AssetId::new(PitchClass::Do, Register::Mid);
        let absent = AssetId::new(PitchClass::Re, Register::Mid);
        assert!(store.contains(&present));
        assert!(!store.contains(&absent));
        assert_eq!(store.read(&present).unwrap(), b"RIFF");
        assert!(store.read(&absent).is_err());
        assert_eq!(store.missing().len(), 20);
    }

    #[test]
    fn memory_store_round_trip() {
        let id = AssetId::new(PitchClass::Mi, Register::High);
        let store = MemoryStore::new().with(id, vec![1, 2, 3]);
        assert!(store.contains(&id));
        assert_eq!(store.read(&id).unwrap(), vec![1, 2, 3]);
        assert!(store
            .read(&AssetId::new(PitchClass::Fa, Register::High))
            .is_err());
    }
}
