// ============================================================
// Layer 6 — Model Store
// ============================================================
// Saves and restores a trained model TOGETHER with the
// normalization parameters it was trained against.
//
// What gets saved (one blob each, in this order):
//   1. model_config.json  — topology, so the network can be rebuilt
//   2. model_weights.bin  — burn BinBytesRecorder, full precision
//   3. normalization.json — params + CRC32 of the weights blob
//
// normalization.json is written last and names the exact weights
// it belongs with. load() therefore:
//   - returns Ok(None) if any blob is missing (never trained)
//   - returns StoreError::Mismatch if the weights on hand are not
//     the ones the params were saved with
//   - never hands back a model paired with foreign params
//
// Inside one process an RwLock also keeps load() from reading
// between the three puts of a concurrent save().

use burn::{
    prelude::*,
    record::{BinBytesRecorder, FullPrecisionSettings, Recorder},
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::data::preprocessor::NormalizationParams;
use crate::error::StoreError;
use crate::infra::storage::{ArtifactBackend, ArtifactBlob};
use crate::ml::model::{HousePriceModel, HousePriceModelConfig};
use crate::ml::InferBackend;

/// Bumped whenever the blob layout changes.
pub const FORMAT_VERSION: u32 = 1;

type WeightsRecorder = BinBytesRecorder<FullPrecisionSettings>;

/// A network and the normalization scale it was trained on.
/// Always created, stored and loaded as one unit.
#[derive(Debug, Clone)]
pub struct TrainedModel {
    pub model:  HousePriceModel<InferBackend>,
    pub params: NormalizationParams,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NormalizationManifest {
    format_version: u32,
    weights_crc32:  u32,
    params:         NormalizationParams,
}

pub struct ModelStore {
    backend: Box<dyn ArtifactBackend>,
    lock:    RwLock<()>,
}

impl ModelStore {
    pub fn new(backend: impl ArtifactBackend + 'static) -> Self {
        Self { backend: Box::new(backend), lock: RwLock::new(()) }
    }

    /// Persist `model` and `params` as one artifact.
    pub fn save(
        &self,
        model:  &HousePriceModel<InferBackend>,
        params: &NormalizationParams,
    ) -> Result<(), StoreError> {
        let topology = serde_json::to_vec_pretty(&HousePriceModelConfig::new())
            .map_err(|source| serialization(ArtifactBlob::Topology, source))?;

        let recorder = WeightsRecorder::default();
        let weights  = Recorder::<InferBackend>::record(&recorder, model.clone().into_record(), ())
            .map_err(|e| StoreError::Record(format!("{e:?}")))?;

        let manifest = NormalizationManifest {
            format_version: FORMAT_VERSION,
            weights_crc32:  crc32fast::hash(&weights),
            params:         *params,
        };
        let manifest = serde_json::to_vec_pretty(&manifest)
            .map_err(|source| serialization(ArtifactBlob::Normalization, source))?;

        let _guard = self.lock.write();
        self.backend.put(ArtifactBlob::Topology, &topology)?;
        self.backend.put(ArtifactBlob::Weights, &weights)?;
        self.backend.put(ArtifactBlob::Normalization, &manifest)?;

        tracing::info!("Saved model artifact ({} weight bytes)", weights.len());
        Ok(())
    }

    /// Load the stored pair, or `Ok(None)` if nothing complete is stored.
    pub fn load(&self) -> Result<Option<TrainedModel>, StoreError> {
        let (manifest, topology, weights) = {
            let _guard = self.lock.read();
            (
                self.backend.get(ArtifactBlob::Normalization)?,
                self.backend.get(ArtifactBlob::Topology)?,
                self.backend.get(ArtifactBlob::Weights)?,
            )
        };

        let (Some(manifest), Some(topology), Some(weights)) = (manifest, topology, weights) else {
            tracing::debug!("No complete model artifact stored");
            return Ok(None);
        };

        let manifest: NormalizationManifest = serde_json::from_slice(&manifest)
            .map_err(|source| serialization(ArtifactBlob::Normalization, source))?;
        if manifest.format_version != FORMAT_VERSION {
            return Err(StoreError::UnsupportedVersion(manifest.format_version));
        }

        let found = crc32fast::hash(&weights);
        if found != manifest.weights_crc32 {
            return Err(StoreError::Mismatch { expected: manifest.weights_crc32, found });
        }

        let config: HousePriceModelConfig = serde_json::from_slice(&topology)
            .map_err(|source| serialization(ArtifactBlob::Topology, source))?;

        let device: <InferBackend as Backend>::Device = Default::default();
        let recorder = WeightsRecorder::default();
        let record   = Recorder::<InferBackend>::load(&recorder, weights, &device)
            .map_err(|e| StoreError::Record(format!("{e:?}")))?;
        let model    = config.init::<InferBackend>(&device).load_record(record);

        tracing::info!("Loaded model artifact");
        Ok(Some(TrainedModel { model, params: manifest.params }))
    }
}

fn serialization(blob: ArtifactBlob, source: serde_json::Error) -> StoreError {
    StoreError::Serialization { blob: blob.to_string(), source }
}
