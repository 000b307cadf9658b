//! Note-to-recording resolution and the decoded sample cache.

use std::collections::HashMap;

use slotmap::SlotMap;
use sw_ir::score::parse_note;
use sw_ir::{PitchClass, Register, Sample};
use thiserror::Error;
use tracing::debug;

use crate::store::{AssetId, SampleStore};
use crate::wav_format::load_wav;
use crate::FormatError;

slotmap::new_key_type! {
    /// Key for a decoded sample held by a [`SampleBank`].
    pub struct SampleKey;
}

/// Error raised while resolving or loading a recording.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Symbol or register outside the recognized set.
    #[error("unknown note {symbol:?} in register {register:?}")]
    UnknownNote { symbol: String, register: String },
    /// The note is valid but the store has no recording for it.
    #[error("no recording for {asset}")]
    AssetNotFound { asset: String },
    /// The recording exists but could not be read or decoded.
    #[error("failed to load {asset}")]
    Format {
        asset: String,
        #[source]
        source: FormatError,
    },
}

/// Proof that a recording exists for a note.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AssetHandle {
    id: AssetId,
}

impl AssetHandle {
    pub fn id(&self) -> AssetId {
        self.id
    }
}

/// Maps notes to recordings in a [`SampleStore`].
#[derive(Debug)]
pub struct SampleResolver<S> {
    store: S,
}

impl<S: SampleStore> SampleResolver<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Find the recording for a note. No side effects.
    pub fn resolve(&self, pitch: PitchClass, register: Register) -> Result<AssetHandle, ResolveError> {
        let id = AssetId::new(pitch, register);
        if !self.store.contains(&id) {
            return Err(ResolveError::AssetNotFound { asset: self.store.describe(&id) });
        }
        Ok(AssetHandle { id })
    }

    /// Resolve a note given in textual form (`"1"`..`"7"`, `"low"|"mid"|"high"`).
    pub fn resolve_symbol(&self, symbol: &str, register: &str) -> Result<AssetHandle, ResolveError> {
        match parse_note(symbol, register) {
            Ok((pitch, reg)) => self.resolve(pitch, reg),
            Err(_) => Err(ResolveError::UnknownNote {
                symbol: symbol.into(),
                register: register.into(),
            }),
        }
    }

    /// Read and decode the recording behind `handle`.
    pub fn load(&self, handle: &AssetHandle) -> Result<Sample, ResolveError> {
        let asset = self.store.describe(&handle.id);
        let bytes = self.store.read(&handle.id).map_err(|source| ResolveError::Format {
            asset: asset.clone(),
            source,
        })?;
        load_wav(&bytes, &handle.id.to_string()).map_err(|source| ResolveError::Format { asset, source })
    }
}

/// Decoded samples, each loaded at most once per bank.
#[derive(Debug, Default)]
pub struct SampleBank {
    samples: SlotMap<SampleKey, Sample>,
    index: HashMap<AssetId, SampleKey>,
}

impl SampleBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the decoded sample for `handle`, loading it on first use.
    pub fn get_or_load<S: SampleStore>(
        &mut self,
        resolver: &SampleResolver<S>,
        handle: &AssetHandle,
    ) -> Result<&Sample, ResolveError> {
        let key = match self.index.get(&handle.id).copied() {
            Some(key) => key,
            None => {
                let sample = resolver.load(handle)?;
                debug!(asset = %handle.id, frames = sample.len(), rate = sample.sample_rate, "decoded sample");
                let key = self.samples.insert(sample);
                self.index.insert(handle.id, key);
                key
            }
        };
        Ok(&self.samples[key])
    }

    pub fn get(&self, key: SampleKey) -> Option<&Sample> {
        self.samples.get(key)
    }

    pub fn key_of(&self, id: &AssetId) -> Option<SampleKey> {
        self.index.get(id).copied()
    }

    /// Number of decoded samples held.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Drop every decoded sample.
    pub fn clear(&mut self) {
        self.samples.clear();
        self.index.clear();
    }
}
