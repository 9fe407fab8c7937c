use burn::data::dataset::Dataset;

use crate::data::preprocessor::{normalize_example, NormalizationParams};
use crate::domain::housing::TrainingExample;

/// One normalized training row: `[square_footage, bedrooms]` → price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HousingItem {
    pub features: [f32; 2],
    pub target:   f32,
}

impl HousingItem {
    pub fn from_example(example: &TrainingExample, params: &NormalizationParams) -> Self {
        let (features, target) = normalize_example(example, params);
        Self { features, target }
    }
}

pub struct HousingDataset {
    items: Vec<HousingItem>,
}

impl HousingDataset {
    pub fn new(items: Vec<HousingItem>) -> Self { Self { items } }

    /// Normalize every example with `params`.
    pub fn from_examples(examples: &[TrainingExample], params: &NormalizationParams) -> Self {
        Self::new(
            examples
                .iter()
                .map(|e| HousingItem::from_example(e, params))
                .collect(),
        )
    }

    pub fn items(&self) -> &[HousingItem] { &self.items }
}

impl Dataset<HousingItem> for HousingDataset {
    fn get(&self, index: usize) -> Option<HousingItem> {
        self.items.get(index).copied()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::preprocessor::compute_params;

    #[test]
    fn test_from_examples_normalizes_rows() {
        let examples = vec![
            TrainingExample::new(1000.0, 2, 100_000.0),
            TrainingExample::new(2000.0, 4, 300_000.0),
        ];
        let params  = compute_params(&examples).unwrap();
        let dataset = HousingDataset::from_examples(&examples, &params);

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.get(0).unwrap().features, [0.0, 0.0]);
        assert_eq!(dataset.get(1).unwrap().target, 1.0);
        assert!(dataset.get(2).is_none());
    }
}
