use std::cell::{Cell, RefCell};

use ndarray::{Array1, Array2, Axis};

use ocd_core::config::BatchNormArgs;
use ocd_core::errors::{ConfigError, OcdResult, ShapeError};

/// Batch normalisation over the feature axis of `(batch, features)` inputs.
///
/// Training mode normalises with batch statistics and folds them into the
/// running estimates; evaluation mode uses the running estimates only.
#[derive(Debug)]
pub struct BatchNorm1d {
    features: usize,
    eps: f64,
    momentum: f64,
    weight: Option<Array1<f64>>,
    bias: Option<Array1<f64>>,
    running_mean: RefCell<Array1<f64>>,
    running_var: RefCell<Array1<f64>>,
    training: Cell<bool>,
}

impl BatchNorm1d {
    pub fn new(features: usize, args: BatchNormArgs) -> OcdResult<Self> {
        if features == 0 {
            return Err(ShapeError::EmptyFeatures {
                context: "batch norm".into(),
            }
            .into());
        }
        if !(args.eps > 0.0) || !args.eps.is_finite() {
            return Err(ConfigError::InvalidValue {
                field: "batch_norm_args.eps".into(),
                reason: format!("must be positive, got {}", args.eps),
            }
            .into());
        }
        if !(0.0..=1.0).contains(&args.momentum) {
            return Err(ConfigError::InvalidValue {
                field: "batch_norm_args.momentum".into(),
                reason: format!("must be in [0, 1], got {}", args.momentum),
            }
            .into());
        }
        Ok(Self {
            features,
            eps: args.eps,
            momentum: args.momentum,
            weight: args.affine.then(|| Array1::ones(features)),
            bias: args.affine.then(|| Array1::zeros(features)),
            running_mean: RefCell::new(Array1::zeros(features)),
            running_var: RefCell::new(Array1::ones(features)),
            training: Cell::new(true),
        })
    }

    pub fn features(&self) -> usize {
        self.features
    }

    pub fn is_training(&self) -> bool {
        self.training.get()
    }

    pub fn set_training(&self, training: bool) {
        self.training.set(training);
    }

    pub fn running_mean(&self) -> Array1<f64> {
        self.running_mean.borrow().clone()
    }

    pub fn running_var(&self) -> Array1<f64> {
        self.running_var.borrow().clone()
    }

    pub fn num_parameters(&self) -> usize {
        self.weight.as_ref().map_or(0, |w| w.len()) + self.bias.as_ref().map_or(0, |b| b.len())
    }

    pub fn forward(&self, inputs: Array2<f64>) -> OcdResult<Array2<f64>> {
        let (rows, cols) = inputs.dim();
        if cols != self.features {
            return Err(ShapeError::Mismatch {
                context: "batch norm input".into(),
                expected: format!("{} features", self.features),
                actual: format!("{cols}"),
            }
            .into());
        }

        let (mean, var) = if self.is_training() {
            if rows < 2 {
                return Err(ShapeError::Mismatch {
                    context: "batch norm in training mode".into(),
                    expected: "at least 2 rows".into(),
                    actual: format!("{rows}"),
                }
                .into());
            }
            let mean = inputs.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(cols));
            let var = inputs.var_axis(Axis(0), 0.0);
            let unbiased = &var * (rows as f64 / (rows as f64 - 1.0));

            let m = self.momentum;
            let mut running_mean = self.running_mean.borrow_mut();
            let mut running_var = self.running_var.borrow_mut();
            *running_mean = &*running_mean * (1.0 - m) + &mean * m;
            *running_var = &*running_var * (1.0 - m) + &unbiased * m;
            (mean, var)
        } else {
            (self.running_mean(), self.running_var())
        };

        let std = var.mapv(|v| (v + self.eps).sqrt());
        let mut out = (inputs - &mean) / &std;
        if let (Some(weight), Some(bias)) = (&self.weight, &self.bias) {
            out = out * weight + bias;
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    #[test]
    fn training_output_has_zero_mean_per_feature() {
        let bn = BatchNorm1d::new(2, BatchNormArgs::default()).unwrap();
        let y = bn
            .forward(arr2(&[[1.0, 10.0], [3.0, 20.0], [5.0, 30.0]]))
            .unwrap();
        for m in y.mean_axis(Axis(0)).unwrap().iter() {
            assert!(m.abs() < 1e-12);
        }
    }

    #[test]
    fn running_statistics_move_by_momentum() {
        let bn = BatchNorm1d::new(1, BatchNormArgs::default()).unwrap();
        bn.forward(arr2(&[[1.0], [3.0]])).unwrap();
        assert!((bn.running_mean()[0] - 0.2).abs() < 1e-12);
        // unbiased variance of [1, 3] is 2
        assert!((bn.running_var()[0] - (0.9 + 0.2)).abs() < 1e-12);
    }

    #[test]
    fn single_row_needs_eval_mode() {
        let bn = BatchNorm1d::new(1, BatchNormArgs::default()).unwrap();
        assert!(bn.forward(arr2(&[[1.0]])).is_err());
        bn.set_training(false);
        let y = bn.forward(arr2(&[[1.0]])).unwrap();
        assert!((y[[0, 0]] - 1.0 / (1.0 + 1e-5f64).sqrt()).abs() < 1e-12);
    }
}
