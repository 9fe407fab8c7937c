// ============================================================
// Layer 2 — Prediction Service
// ============================================================
// Stateful facade that owns the active model and coordinates
// every other layer:
//
//   predict(input)
//     1. validate input                  (Layer 3 - domain)
//     2. initialize on demand            (below)
//     3. snapshot the active pair, price (Layer 5 - ml)
//     4. spawn best-effort log write     (Layer 6 - infra)
//
//   initialize()
//     model active? → done
//     store.load()  → hit: adopt it
//                   → none: train_new_model path
//
//   train_new_model()
//     fetch corpus → train → save → publish new pair
//
// Lifecycle:
//
//   Uninitialized → Initializing → Ready
//   Ready → Training → Ready
//   Training / Initializing → Failed   (retry allowed)
//
// The active model and its params sit in ONE Mutex slot and are
// swapped as a unit, so a prediction can never see a new model
// with old params. A tokio latch serializes load/train sequences:
// N concurrent first callers trigger exactly one load-or-train.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::task::JoinSet;

use crate::application::config::ServiceConfig;
use crate::data::loader::JsonCorpus;
use crate::domain::housing::{PredictionInput, PredictionResult, TrainingExample};
use crate::domain::traits::{PredictionLog, TrainingCorpus};
use crate::error::{PipelineError, StoreError, TrainingError};
use crate::infra::metrics::EpochMetrics;
use crate::infra::model_store::{ModelStore, TrainedModel};
use crate::infra::prediction_log::JsonlPredictionLog;
use crate::ml::{predictor, trainer};
use crate::ml::trainer::TrainingOptions;

// ─── Status ───────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceState {
    Uninitialized,
    Initializing,
    Ready,
    Training,
    Failed,
}

/// Read-only view of the service for health checks.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub state:          ServiceState,
    pub is_initialized: bool,
    pub has_model:      bool,
    pub has_params:     bool,
    /// Message of the most recent failed load or training run
    pub last_error:     Option<String>,
}

/// What a completed `train_new_model` produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingSummary {
    pub examples:   usize,
    pub final_loss: f64,
    pub history:    Vec<EpochMetrics>,
}

struct Lifecycle {
    state:      ServiceState,
    last_error: Option<String>,
}

// ─── PredictionService ────────────────────────────────────────────────────────
/// Owns the active model and serves predictions from it.
///
/// Prediction-log writes run as tasks owned by the service. Dropping
/// the service aborts any that have not finished, so call
/// [`flush_logs`](Self::flush_logs) before letting it go when every
/// record must reach the log.
pub struct PredictionService {
    corpus:  Arc<dyn TrainingCorpus>,
    log:     Arc<dyn PredictionLog>,
    store:   Arc<ModelStore>,
    options: TrainingOptions,

    active:    Mutex<Option<TrainedModel>>,
    lifecycle: Mutex<Lifecycle>,
    latch:     tokio::sync::Mutex<()>,
    log_tasks: Mutex<JoinSet<()>>,
}

impl PredictionService {
    pub fn new(
        corpus:  Arc<dyn TrainingCorpus>,
        log:     Arc<dyn PredictionLog>,
        store:   Arc<ModelStore>,
        options: TrainingOptions,
    ) -> Self {
        Self {
            corpus,
            log,
            store,
            options,
            active:    Mutex::new(None),
            lifecycle: Mutex::new(Lifecycle { state: ServiceState::Uninitialized, last_error: None }),
            latch:     tokio::sync::Mutex::new(()),
            log_tasks: Mutex::new(JoinSet::new()),
        }
    }

    /// Wire the service to the JSON corpus, JSONL log and model store
    /// named by `config`.
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(
            Arc::new(JsonCorpus::new(&config.corpus_path)),
            Arc::new(JsonlPredictionLog::new(&config.prediction_log_path)),
            Arc::new(config.model_store()),
            config.training.clone(),
        )
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────────

    /// Make sure a model is active: adopt the stored one, or train.
    pub async fn initialize(&self) -> Result<(), PipelineError> {
        if self.has_model() {
            return Ok(());
        }
        let _latch = self.latch.lock().await;
        // another caller may have finished while we waited
        if self.has_model() {
            return Ok(());
        }

        if self.load_locked().await? {
            return Ok(());
        }
        tracing::info!("No stored model found, training a new one");
        self.train_locked().await.map(|_| ())
    }

    /// Adopt the stored model if there is one. Never trains.
    /// Returns whether a model is active afterwards.
    pub async fn load_stored(&self) -> Result<bool, PipelineError> {
        if self.has_model() {
            return Ok(true);
        }
        let _latch = self.latch.lock().await;
        if self.has_model() {
            return Ok(true);
        }
        self.load_locked().await
    }

    /// Fit a fresh model on the full corpus, persist it and make it
    /// active. On any failure the previously active model is kept.
    pub async fn train_new_model(&self) -> Result<TrainingSummary, PipelineError> {
        let _latch = self.latch.lock().await;
        self.train_locked().await
    }

    // Caller holds the latch.
    // A miss puts the state back where it was; Initializing only lasts
    // as long as the load itself.
    async fn load_locked(&self) -> Result<bool, PipelineError> {
        let previous = self.set_state(ServiceState::Initializing);

        let store  = Arc::clone(&self.store);
        let loaded = tokio::task::spawn_blocking(move || store.load())
            .await
            .map_err(|e| StoreError::Worker(e.to_string()))
            .and_then(|r| r);

        match loaded {
            Ok(Some(trained)) => {
                *self.active.lock() = Some(trained);
                self.set_state(ServiceState::Ready);
                tracing::info!("Adopted stored model");
                Ok(true)
            }
            Ok(None) => {
                self.set_state(previous);
                Ok(false)
            }
            Err(e) => {
                let err = PipelineError::from(e);
                self.record_failure(&err);
                Err(err)
            }
        }
    }

    // Caller holds the latch.
    async fn train_locked(&self) -> Result<TrainingSummary, PipelineError> {
        self.set_state(ServiceState::Training);
        match self.fit_and_publish().await {
            Ok(summary) => {
                self.set_state(ServiceState::Ready);
                tracing::info!(
                    "Model trained on {} examples, final loss {:.6}",
                    summary.examples,
                    summary.final_loss
                );
                Ok(summary)
            }
            Err(e) => {
                self.record_failure(&e);
                Err(e)
            }
        }
    }

    async fn fit_and_publish(&self) -> Result<TrainingSummary, PipelineError> {
        // ── Step 1: Fetch the corpus ──────────────────────────────────────────
        let examples: Vec<TrainingExample> = self
            .corpus
            .fetch_all_training_examples()
            .await
            .map_err(PipelineError::corpus)?;
        if examples.is_empty() {
            return Err(PipelineError::NoTrainingData);
        }
        let count = examples.len();

        // ── Step 2: Train + save off the async runtime ────────────────────────
        let options = self.options.clone();
        let store   = Arc::clone(&self.store);
        let (trained, final_loss, history) = tokio::task::spawn_blocking(move || {
            let outcome = trainer::train(&examples, &options)?;
            store.save(&outcome.model, &outcome.params)?;
            let trained = TrainedModel { model: outcome.model, params: outcome.params };
            Ok::<_, PipelineError>((trained, outcome.final_loss, outcome.history))
        })
        .await
        .map_err(|e| TrainingError::Worker(e.to_string()))??;

        // ── Step 3: Publish the new pair in one assignment ────────────────────
        *self.active.lock() = Some(trained);

        Ok(TrainingSummary { examples: count, final_loss, history })
    }

    // ── Serving ───────────────────────────────────────────────────────────────

    /// Price one house. Initializes the service on first use.
    pub async fn predict(&self, input: PredictionInput) -> Result<PredictionResult, PipelineError> {
        input.validate()?;

        self.initialize()
            .await
            .map_err(|e| PipelineError::ModelInitialization(Box::new(e)))?;

        let trained = self.snapshot().ok_or_else(|| {
            PipelineError::ModelInitialization(Box::new(PipelineError::Prediction(
                "no active model after initialization".into(),
            )))
        })?;
        let result = predictor::predict(&trained.model, &input, &trained.params)?;

        self.spawn_log(input, result.clone());
        Ok(result)
    }

    /// MSE of the active model over the current corpus, in normalized units.
    pub async fn evaluate(&self) -> Result<f64, PipelineError> {
        self.initialize().await?;
        let trained = self
            .snapshot()
            .ok_or_else(|| PipelineError::Prediction("no active model".into()))?;

        let examples = self
            .corpus
            .fetch_all_training_examples()
            .await
            .map_err(PipelineError::corpus)?;
        if examples.is_empty() {
            return Err(PipelineError::NoTrainingData);
        }
        trainer::evaluate(&trained.model, &examples, &trained.params)
    }

    pub fn status(&self) -> StatusSnapshot {
        let has_model = self.has_model();
        let lifecycle = self.lifecycle.lock();
        StatusSnapshot {
            state:          lifecycle.state,
            is_initialized: has_model,
            has_model,
            has_params:     has_model,
            last_error:     lifecycle.last_error.clone(),
        }
    }

    /// Wait for every prediction-log write spawned so far.
    pub async fn flush_logs(&self) {
        let mut pending = std::mem::take(&mut *self.log_tasks.lock());
        while pending.join_next().await.is_some() {}
    }

    // ── Internals ─────────────────────────────────────────────────────────────

    fn spawn_log(&self, input: PredictionInput, result: PredictionResult) {
        let log = Arc::clone(&self.log);
        let mut tasks = self.log_tasks.lock();
        while tasks.try_join_next().is_some() {}
        tasks.spawn(async move {
            if let Err(e) = log.record_prediction(&input, &result).await {
                tracing::warn!("Failed to record prediction: {e:#}");
            }
        });
    }

    fn snapshot(&self) -> Option<TrainedModel> {
        self.active.lock().clone()
    }

    fn has_model(&self) -> bool {
        self.active.lock().is_some()
    }

    /// Returns the state being replaced.
    fn set_state(&self, state: ServiceState) -> ServiceState {
        let mut lifecycle = self.lifecycle.lock();
        if state == ServiceState::Ready {
            lifecycle.last_error = None;
        }
        std::mem::replace(&mut lifecycle.state, state)
    }

    fn record_failure(&self, err: &PipelineError) {
        tracing::error!("Model lifecycle step failed: {err}");
        let mut lifecycle = self.lifecycle.lock();
        lifecycle.state      = ServiceState::Failed;
        lifecycle.last_error = Some(err.to_string());
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::seed_examples;
    use crate::infra::storage::MemoryBackend;
    use crate::ml::model::HousePriceModelConfig;
    use crate::ml::InferBackend;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory corpus that counts fetches.
    struct CountingCorpus {
        rows:  Mutex<Vec<TrainingExample>>,
        calls: AtomicUsize,
    }

    impl CountingCorpus {
        fn new(rows: Vec<TrainingExample>) -> Arc<Self> {
            Arc::new(Self { rows: Mutex::new(rows), calls: AtomicUsize::new(0) })
        }
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TrainingCorpus for CountingCorpus {
        async fn fetch_all_training_examples(&self) -> anyhow::Result<Vec<TrainingExample>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            Ok(self.rows.lock().clone())
        }
    }

    struct BrokenCorpus;

    #[async_trait]
    impl TrainingCorpus for BrokenCorpus {
        async fn fetch_all_training_examples(&self) -> anyhow::Result<Vec<TrainingExample>> {
            Err(anyhow!("database unreachable"))
        }
    }

    #[derive(Default)]
    struct RecordingLog {
        entries: Mutex<Vec<(PredictionInput, PredictionResult)>>,
    }

    #[async_trait]
    impl PredictionLog for RecordingLog {
        async fn record_prediction(&self, input: &PredictionInput, result: &PredictionResult) -> anyhow::Result<()> {
            self.entries.lock().push((*input, result.clone()));
            Ok(())
        }
    }

    struct FailingLog;

    #[async_trait]
    impl PredictionLog for FailingLog {
        async fn record_prediction(&self, _: &PredictionInput, _: &PredictionResult) -> anyhow::Result<()> {
            Err(anyhow!("disk full"))
        }
    }

    fn options() -> TrainingOptions {
        TrainingOptions { epochs: 5, batch_size: 4, validation_split: 0.2 }
    }

    fn service(corpus: Arc<dyn TrainingCorpus>, log: Arc<dyn PredictionLog>) -> PredictionService {
        PredictionService::new(corpus, log, Arc::new(ModelStore::new(MemoryBackend::new())), options())
    }

    #[tokio::test]
    async fn test_fresh_service_status() {
        let svc = service(CountingCorpus::new(seed_examples()), Arc::new(RecordingLog::default()));
        let s   = svc.status();
        assert_eq!(s.state, ServiceState::Uninitialized);
        assert!(!s.is_initialized && !s.has_model && !s.has_params);
        assert!(s.last_error.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_initialize_fetches_corpus_once() {
        let corpus = CountingCorpus::new(seed_examples());
        let svc    = Arc::new(service(corpus.clone(), Arc::new(RecordingLog::default())));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let svc = Arc::clone(&svc);
                tokio::spawn(async move { svc.initialize().await })
            })
            .collect();
        for h in handles {
            h.await.unwrap().unwrap();
        }

        assert_eq!(corpus.calls(), 1);
        assert_eq!(svc.status().state, ServiceState::Ready);
        assert!(svc.status().has_model);
    }

    #[tokio::test]
    async fn test_stored_model_is_adopted_without_training() {
        let store = Arc::new(ModelStore::new(MemoryBackend::new()));
        let model = HousePriceModelConfig::new().init::<InferBackend>(&Default::default());
        let params = crate::data::preprocessor::compute_params(&seed_examples()).unwrap();
        store.save(&model, &params).unwrap();

        let corpus = CountingCorpus::new(seed_examples());
        let svc = PredictionService::new(corpus.clone(), Arc::new(RecordingLog::default()), store, options());
        assert!(svc.load_stored().await.unwrap());
        svc.initialize().await.unwrap();

        assert_eq!(corpus.calls(), 0);
        assert_eq!(svc.status().state, ServiceState::Ready);
    }

    #[tokio::test]
    async fn test_load_stored_never_trains() {
        let corpus = CountingCorpus::new(seed_examples());
        let svc    = service(corpus.clone(), Arc::new(RecordingLog::default()));
        assert!(!svc.load_stored().await.unwrap());
        assert_eq!(corpus.calls(), 0);

        let status = svc.status();
        assert!(!status.has_model);
        assert_eq!(status.state, ServiceState::Uninitialized);
    }

    #[tokio::test]
    async fn test_store_miss_keeps_failed_state_and_error() {
        let svc = service(CountingCorpus::new(Vec::new()), Arc::new(RecordingLog::default()));
        assert!(svc.train_new_model().await.is_err());

        assert!(!svc.load_stored().await.unwrap());
        let status = svc.status();
        assert_eq!(status.state, ServiceState::Failed);
        assert!(status.last_error.is_some());
    }

    #[tokio::test]
    async fn test_empty_corpus_retrain_keeps_active_model() {
        let corpus = CountingCorpus::new(seed_examples());
        let svc    = service(corpus.clone(), Arc::new(RecordingLog::default()));
        svc.initialize().await.unwrap();
        let input  = PredictionInput::new(1500.0, 3.0);
        let before = svc.predict(input).await.unwrap();

        corpus.rows.lock().clear();
        assert!(matches!(svc.train_new_model().await, Err(PipelineError::NoTrainingData)));

        let status = svc.status();
        assert_eq!(status.state, ServiceState::Failed);
        assert!(status.has_model && status.has_params);
        assert!(status.last_error.is_some());

        let after = svc.predict(input).await.unwrap();
        assert_eq!(after.price, before.price);
        assert_eq!(after.confidence, before.confidence);
    }

    #[tokio::test]
    async fn test_retrain_reports_summary_and_recovers_from_failed() {
        let corpus = CountingCorpus::new(Vec::new());
        let svc    = service(corpus.clone(), Arc::new(RecordingLog::default()));
        assert!(svc.train_new_model().await.is_err());
        assert_eq!(svc.status().state, ServiceState::Failed);

        *corpus.rows.lock() = seed_examples();
        let summary = svc.train_new_model().await.unwrap();
        assert_eq!(summary.examples, 8);
        assert_eq!(summary.history.len(), 5);
        assert!(summary.final_loss.is_finite());

        let status = svc.status();
        assert_eq!(status.state, ServiceState::Ready);
        assert!(status.last_error.is_none());
    }

    #[tokio::test]
    async fn test_validation_runs_before_initialization() {
        let corpus = CountingCorpus::new(seed_examples());
        let svc    = service(corpus.clone(), Arc::new(RecordingLog::default()));

        match svc.predict(PredictionInput::new(0.0, 3.5)).await {
            Err(PipelineError::Validation(v)) => {
                assert!(v.touches("squareFootage"));
                assert!(v.touches("bedrooms"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        assert_eq!(corpus.calls(), 0);
    }

    #[tokio::test]
    async fn test_predict_without_training_data_is_initialization_error() {
        let svc = service(CountingCorpus::new(Vec::new()), Arc::new(RecordingLog::default()));
        let err = svc.predict(PredictionInput::new(1500.0, 3.0)).await.unwrap_err();
        match err {
            PipelineError::ModelInitialization(inner) => {
                assert!(matches!(*inner, PipelineError::NoTrainingData));
            }
            other => panic!("expected initialization error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_corpus_failure_is_reported() {
        let svc = service(Arc::new(BrokenCorpus), Arc::new(RecordingLog::default()));
        assert!(matches!(svc.train_new_model().await, Err(PipelineError::Corpus(_))));
        assert!(svc.status().last_error.unwrap().contains("database unreachable"));
    }

    #[tokio::test]
    async fn test_prediction_is_logged() {
        let log = Arc::new(RecordingLog::default());
        let svc = service(CountingCorpus::new(seed_examples()), log.clone());

        let input  = PredictionInput::new(1500.0, 3.0);
        let result = svc.predict(input).await.unwrap();
        svc.flush_logs().await;

        let entries = log.entries.lock();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, input);
        assert_eq!(entries[0].1, result);
    }

    #[tokio::test]
    async fn test_flush_waits_for_every_pending_write() {
        let log = Arc::new(RecordingLog::default());
        let svc = service(CountingCorpus::new(seed_examples()), log.clone());

        for sqft in [1200.0, 1500.0, 1800.0, 2100.0] {
            svc.predict(PredictionInput::new(sqft, 3.0)).await.unwrap();
        }
        svc.flush_logs().await;
        drop(svc);

        assert_eq!(log.entries.lock().len(), 4);
    }

    #[tokio::test]
    async fn test_log_failure_does_not_fail_prediction() {
        let svc    = service(CountingCorpus::new(seed_examples()), Arc::new(FailingLog));
        let result = svc.predict(PredictionInput::new(1500.0, 3.0)).await.unwrap();
        svc.flush_logs().await;

        assert!(result.price.is_finite());
        assert!((0.0..=1.0).contains(&result.confidence));
    }

    #[tokio::test]
    async fn test_corrupt_store_surfaces_store_error() {
        use crate::infra::storage::{ArtifactBackend, ArtifactBlob};

        let backend = Arc::new(MemoryBackend::new());
        let store   = Arc::new(ModelStore::new(backend.clone()));
        let model   = HousePriceModelConfig::new().init::<InferBackend>(&Default::default());
        let params  = crate::data::preprocessor::compute_params(&seed_examples()).unwrap();
        store.save(&model, &params).unwrap();
        backend.put(ArtifactBlob::Weights, b"tampered").unwrap();

        let corpus = CountingCorpus::new(seed_examples());
        let svc = PredictionService::new(corpus.clone(), Arc::new(RecordingLog::default()), store, options());
        assert!(matches!(svc.initialize().await, Err(PipelineError::Store(StoreError::Mismatch { .. }))));
        assert_eq!(svc.status().state, ServiceState::Failed);
        assert_eq!(corpus.calls(), 0);
    }

    #[tokio::test]
    async fn test_evaluate_uses_active_model() {
        let svc = service(CountingCorpus::new(seed_examples()), Arc::new(RecordingLog::default()));
        let mse = svc.evaluate().await.unwrap();
        assert!(mse.is_finite() && mse >= 0.0);
    }
}
