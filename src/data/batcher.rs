// ============================================================
// Layer 4 — Housing Batcher
// ============================================================
// Implements Burn's Batcher trait to stack normalized rows into
// the two tensors the regression network trains on:
//
//   Input:  Vec of N HousingItems
//   Output: HousingBatch { features: [N, 2], targets: [N, 1] }
//
// Rows are flattened row-major and reshaped:
//   [sqft_1, beds_1, sqft_2, beds_2, ..., sqft_N, beds_N] → [N, 2]

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
    tensor::TensorData,
};

use crate::data::dataset::HousingItem;

/// A batch of normalized rows ready for the forward pass.
#[derive(Debug, Clone)]
pub struct HousingBatch<B: Backend> {
    /// Feature matrix — shape: [batch_size, 2]
    pub features: Tensor<B, 2>,

    /// Normalized prices — shape: [batch_size, 1]
    pub targets: Tensor<B, 2>,
}

#[derive(Clone, Debug)]
pub struct HousingBatcher<B: Backend> {
    /// The device to create tensors on
    pub device: B::Device,
}

impl<B: Backend> HousingBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<HousingItem, HousingBatch<B>> for HousingBatcher<B> {
    fn batch(&self, items: Vec<HousingItem>) -> HousingBatch<B> {
        let batch_size = items.len();

        let features_flat: Vec<f32> = items
            .iter()
            .flat_map(|item| item.features)
            .collect();

        let targets_flat: Vec<f32> = items
            .iter()
            .map(|item| item.target)
            .collect();

        let features = Tensor::<B, 2>::from_data(
            TensorData::new(features_flat, [batch_size, 2]), &self.device,
        );
        let targets = Tensor::<B, 2>::from_data(
            TensorData::new(targets_flat, [batch_size, 1]), &self.device,
        );

        HousingBatch { features, targets }
    }
}
