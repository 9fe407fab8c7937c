// ============================================================
// Layer 6 — Artifact Storage Backends
// ============================================================
// Byte-oriented get/put over a small fixed set of named blobs.
// The Model Store decides WHAT goes in each blob; a backend only
// decides WHERE the bytes live.
//
//   FsBackend      — one file per blob in a directory, written
//                    to a per-writer temp file, synced, then
//                    renamed into place
//   MemoryBackend  — process-local map, for tests and for
//                    deployments without a writable disk
//
// The backend is picked once, when the ModelStore is built.

use std::{
    collections::HashMap,
    fmt,
    fs::{self, File},
    io::{self, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use parking_lot::Mutex;

use crate::error::StoreError;

/// The named blobs that make up one stored model artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactBlob {
    /// Network topology (layer sizes), JSON
    Topology,
    /// Trained parameters, burn binary record
    Weights,
    /// Normalization params + weights checksum, JSON; written last
    Normalization,
}

impl ArtifactBlob {
    pub const ALL: [ArtifactBlob; 3] = [Self::Topology, Self::Weights, Self::Normalization];

    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Topology      => "model_config.json",
            Self::Weights       => "model_weights.bin",
            Self::Normalization => "normalization.json",
        }
    }
}

impl fmt::Display for ArtifactBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

/// Where artifact bytes are kept.
pub trait ArtifactBackend: Send + Sync {
    /// `Ok(None)` when the blob has never been written.
    fn get(&self, blob: ArtifactBlob) -> Result<Option<Vec<u8>>, StoreError>;

    /// Replace the blob's contents.
    fn put(&self, blob: ArtifactBlob, bytes: &[u8]) -> Result<(), StoreError>;
}

impl<T: ArtifactBackend + ?Sized> ArtifactBackend for Arc<T> {
    fn get(&self, blob: ArtifactBlob) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).get(blob)
    }

    fn put(&self, blob: ArtifactBlob, bytes: &[u8]) -> Result<(), StoreError> {
        (**self).put(blob, bytes)
    }
}

// ─── FsBackend ────────────────────────────────────────────────────────────────
/// One file per blob inside `dir`.
pub struct FsBackend {
    dir: PathBuf,
}

impl FsBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
        let mut file = File::create(path)?;
        file.write_all(bytes)?;
        file.sync_all()
    }

    fn io_error(blob: ArtifactBlob, source: io::Error) -> StoreError {
        StoreError::Io { blob: blob.to_string(), source }
    }
}

impl ArtifactBackend for FsBackend {
    fn get(&self, blob: ArtifactBlob) -> Result<Option<Vec<u8>>, StoreError> {
        match fs::read(self.dir.join(blob.file_name())) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Self::io_error(blob, e)),
        }
    }

    fn put(&self, blob: ArtifactBlob, bytes: &[u8]) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(|e| Self::io_error(blob, e))?;

        // Readers only ever see the old file or the complete new one.
        // The temp name is unique per call so two writers never share it.
        let target = self.dir.join(blob.file_name());
        let tmp    = self.dir.join(format!(
            "{}.{}-{:08x}.tmp",
            blob.file_name(),
            std::process::id(),
            rand::random::<u32>()
        ));

        let written = Self::write_synced(&tmp, bytes).and_then(|()| fs::rename(&tmp, &target));
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp);
            return Err(Self::io_error(blob, e));
        }

        tracing::debug!("Wrote {} bytes to '{}'", bytes.len(), target.display());
        Ok(())
    }
}

// ─── MemoryBackend ────────────────────────────────────────────────────────────
#[derive(Default)]
pub struct MemoryBackend {
    blobs: Mutex<HashMap<ArtifactBlob, Vec<u8>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ArtifactBackend for MemoryBackend {
    fn get(&self, blob: ArtifactBlob) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.blobs.lock().get(&blob).cloned())
    }

    fn put(&self, blob: ArtifactBlob, bytes: &[u8]) -> Result<(), StoreError> {
        self.blobs.lock().insert(blob, bytes.to_vec());
        Ok(())
    }
}
