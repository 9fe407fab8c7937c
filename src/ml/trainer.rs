// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Fits a fresh HousePriceModel to the training rows.
//
//   1. compute normalization params over every example
//   2. normalize each row into a HousingItem
//   3. shuffle + hold out `validation_split` of rows
//   4. batch rows into [N, 2] features / [N, 1] targets
//   5. Adam on MSE for `epochs` passes, reshuffling each pass
//
// Training runs on Autodiff<NdArray>; model.valid() hands back the
// same network on the plain NdArray backend for validation and for
// everything downstream (prediction, persistence).

use std::sync::Arc;

use burn::{
    data::dataloader::{batcher::Batcher, DataLoader, DataLoaderBuilder},
    module::AutodiffModule,
    optim::{GradientsParams, Optimizer},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use crate::data::{
    batcher::{HousingBatch, HousingBatcher},
    dataset::{HousingDataset, HousingItem},
    preprocessor::{compute_params, NormalizationParams},
    splitter::split_holdout,
};
use crate::domain::housing::TrainingExample;
use crate::error::{PipelineError, TrainingError};
use crate::infra::metrics::EpochMetrics;
use crate::ml::model::{optimizer_config, HousePriceModel, HousePriceModelConfig, LEARNING_RATE};
use crate::ml::{InferBackend, TrainBackend};

// ─── Training Options ────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TrainingOptions {
    pub epochs:           usize,
    pub batch_size:       usize,
    /// Fraction of rows held out from gradient updates, in [0, 1)
    pub validation_split: f64,
}

impl Default for TrainingOptions {
    fn default() -> Self {
        Self {
            epochs:           100,
            batch_size:       4,
            validation_split: 0.2,
        }
    }
}

impl TrainingOptions {
    pub fn validate(&self) -> Result<(), TrainingError> {
        if self.epochs == 0 {
            return Err(TrainingError::InvalidOptions("epochs must be at least 1".into()));
        }
        if self.batch_size == 0 {
            return Err(TrainingError::InvalidOptions("batch size must be at least 1".into()));
        }
        if !(0.0..1.0).contains(&self.validation_split) {
            return Err(TrainingError::InvalidOptions(format!(
                "validation split must be in [0, 1), got {}",
                self.validation_split
            )));
        }
        Ok(())
    }
}

/// A freshly fitted model and the params it was trained against.
#[derive(Debug)]
pub struct TrainingOutcome {
    pub model:      HousePriceModel<InferBackend>,
    pub params:     NormalizationParams,
    /// Training loss of the last epoch
    pub final_loss: f64,
    pub history:    Vec<EpochMetrics>,
}

pub fn train(
    examples: &[TrainingExample],
    options:  &TrainingOptions,
) -> Result<TrainingOutcome, PipelineError> {
    let params = compute_params(examples)?;
    options.validate()?;

    let items: Vec<HousingItem> = examples
        .iter()
        .map(|e| HousingItem::from_example(e, &params))
        .collect();
    let (train_items, val_items) = split_holdout(items, options.validation_split, &mut rand::thread_rng());
    tracing::info!(
        "Training on {} rows ({} held out for validation), {} epochs, batch size {}",
        train_items.len(),
        val_items.len(),
        options.epochs,
        options.batch_size,
    );

    let device = Default::default();
    let (model, history) = train_loop(options, train_items, val_items, device)?;

    let final_loss = history.last().map(|m| m.train_loss).unwrap_or(f64::NAN);
    tracing::info!("Training complete: final loss {:.6}", final_loss);

    Ok(TrainingOutcome { model, params, final_loss, history })
}

fn train_loop(
    options:     &TrainingOptions,
    train_items: Vec<HousingItem>,
    val_items:   Vec<HousingItem>,
    device:      <TrainBackend as Backend>::Device,
) -> Result<(HousePriceModel<InferBackend>, Vec<EpochMetrics>), TrainingError> {

    // ── Build model + Adam ────────────────────────────────────────────────────
    let mut model: HousePriceModel<TrainBackend> = HousePriceModelConfig::new().init(&device);
    let mut optim = optimizer_config().init::<TrainBackend, HousePriceModel<TrainBackend>>();

    // ── Training data loader (reshuffled every epoch) ─────────────────────────
    let train_loader = DataLoaderBuilder::new(HousingBatcher::<TrainBackend>::new(device.clone()))
        .batch_size(options.batch_size)
        .shuffle(rand::random::<u64>())
        .build(HousingDataset::new(train_items));

    // ── Validation data loader (inner backend, no autodiff) ──────────────────
    let val_loader = if val_items.is_empty() {
        None
    } else {
        Some(
            DataLoaderBuilder::new(HousingBatcher::<InferBackend>::new(device.clone()))
                .batch_size(options.batch_size)
                .build(HousingDataset::new(val_items)),
        )
    };

    let mut history = Vec::with_capacity(options.epochs);

    for epoch in 1..=options.epochs {
        let mut loss_sum = 0.0f64;
        let mut seen     = 0usize;

        for batch in train_loader.iter() {
            let rows = batch.targets.dims()[0];
            let (loss, _) = model.forward_loss(batch.features, batch.targets);

            let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
            if !loss_val.is_finite() {
                return Err(TrainingError::NonFiniteLoss { epoch });
            }
            loss_sum += loss_val * rows as f64;
            seen     += rows;

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(LEARNING_RATE, model, grads);
        }

        let train_loss = loss_sum / seen.max(1) as f64;
        let val_loss   = val_loader
            .as_ref()
            .map(|loader| mean_loss(&model.valid(), loader));

        tracing::debug!(
            "Epoch {:>3}/{} | loss={:.6} | val_loss={}",
            epoch,
            options.epochs,
            train_loss,
            val_loss.map(|v| format!("{v:.6}")).unwrap_or_else(|| "-".into()),
        );
        history.push(EpochMetrics::new(epoch, train_loss, val_loss));
    }

    Ok((model.valid(), history))
}

/// Sample-weighted mean MSE over every batch of `loader`.
fn mean_loss<B: Backend>(
    model:  &HousePriceModel<B>,
    loader: &Arc<dyn DataLoader<HousingBatch<B>>>,
) -> f64 {
    let mut sum  = 0.0f64;
    let mut seen = 0usize;
    for batch in loader.iter() {
        let rows = batch.targets.dims()[0];
        let (loss, _) = model.forward_loss(batch.features, batch.targets);
        sum  += loss.into_scalar().elem::<f64>() * rows as f64;
        seen += rows;
    }
    sum / seen.max(1) as f64
}

/// Mean squared error of `model` over `examples`, in normalized units.
pub fn evaluate(
    model:    &HousePriceModel<InferBackend>,
    examples: &[TrainingExample],
    params:   &NormalizationParams,
) -> Result<f64, PipelineError> {
    if examples.is_empty() {
        return Err(PipelineError::EmptyDataset);
    }
    let dataset = HousingDataset::from_examples(examples, params);
    let batch   = HousingBatcher::<InferBackend>::new(Default::default())
        .batch(dataset.items().to_vec());

    let (loss, _) = model.forward_loss(batch.features, batch.targets);
    let mse = loss.into_scalar().elem::<f64>();
    if !mse.is_finite() {
        return Err(PipelineError::Prediction("evaluation produced a non-finite loss".into()));
    }
    Ok(mse)
}
