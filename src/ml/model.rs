use burn::{
    nn::{
        loss::{MseLoss, Reduction},
        Initializer, Linear, LinearConfig, Relu,
    },
    optim::AdamConfig,
    prelude::*,
};

/// Adam step size. Fixed for this topology.
pub const LEARNING_RATE: f64 = 0.01;

/// He-normal: N(0, 2 / fan_in).
pub fn he_normal() -> Initializer {
    Initializer::KaimingNormal { gain: std::f64::consts::SQRT_2, fan_out_only: false }
}

/// Adam with the fixed learning rate applied at each `step`.
pub fn optimizer_config() -> AdamConfig {
    AdamConfig::new().with_epsilon(1e-7)
}

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
// Deriving them again gives conflicting impls.
/// Topology of the price regressor. Serialised next to the weights so a
/// stored model can be rebuilt before its record is loaded.
#[derive(Config, Debug)]
pub struct HousePriceModelConfig {
    #[config(default = 2)]
    pub input_size:   usize,
    #[config(default = 8)]
    pub hidden1_size: usize,
    #[config(default = 4)]
    pub hidden2_size: usize,
}

impl HousePriceModelConfig {
    /// 2 → Dense(8, ReLU) → Dense(4, ReLU) → Dense(1, linear),
    /// every layer He-normal initialised.
    pub fn init<B: Backend>(&self, device: &B::Device) -> HousePriceModel<B> {
        let hidden1 = LinearConfig::new(self.input_size, self.hidden1_size)
            .with_initializer(he_normal())
            .init(device);
        let hidden2 = LinearConfig::new(self.hidden1_size, self.hidden2_size)
            .with_initializer(he_normal())
            .init(device);
        let output = LinearConfig::new(self.hidden2_size, 1)
            .with_initializer(he_normal())
            .init(device);
        HousePriceModel { hidden1, hidden2, output, activation: Relu::new() }
    }
}

#[derive(Module, Debug)]
pub struct HousePriceModel<B: Backend> {
    pub hidden1:    Linear<B>,
    pub hidden2:    Linear<B>,
    pub output:     Linear<B>,
    pub activation: Relu,
}

impl<B: Backend> HousePriceModel<B> {
    /// features: [batch, 2] → normalized price: [batch, 1]
    pub fn forward(&self, features: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.activation.forward(self.hidden1.forward(features));
        let x = self.activation.forward(self.hidden2.forward(x));
        self.output.forward(x)
    }

    /// Mean squared error against `targets` ([batch, 1]).
    pub fn forward_loss(
        &self,
        features: Tensor<B, 2>,
        targets:  Tensor<B, 2>,
    ) -> (Tensor<B, 1>, Tensor<B, 2>) {
        let output = self.forward(features);
        let loss   = MseLoss::new().forward(output.clone(), targets, Reduction::Mean);
        (loss, output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    #[test]
    fn test_topology_parameter_count() {
        let model: HousePriceModel<NdArray> = HousePriceModelConfig::new().init(&Default::default());
        // (2*8 + 8) + (8*4 + 4) + (4*1 + 1)
        assert_eq!(model.num_params(), 65);
    }

    #[test]
    fn test_forward_shape() {
        let device = Default::default();
        let model: HousePriceModel<NdArray> = HousePriceModelConfig::new().init(&device);
        let x = Tensor::<NdArray, 2>::zeros([5, 2], &device);
        assert_eq!(model.forward(x).dims(), [5, 1]);
    }

    #[test]
    fn test_loss_is_zero_on_exact_fit() {
        let device = Default::default();
        let model: HousePriceModel<NdArray> = HousePriceModelConfig::new().init(&device);
        let x = Tensor::<NdArray, 2>::ones([3, 2], &device);
        let target = model.forward(x.clone());
        let (loss, _) = model.forward_loss(x, target);
        assert!(loss.into_scalar().elem::<f64>().abs() < 1e-12);
    }

    #[test]
    fn test_config_round_trips_as_json() {
        let cfg  = HousePriceModelConfig::new();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: HousePriceModelConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.hidden1_size, 8);
        assert_eq!(back.hidden2_size, 4);
    }
}
