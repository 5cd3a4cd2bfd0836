use std::cell::{Cell, RefCell};
use std::fmt;

use ndarray::{Array2, Zip};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use ocd_core::errors::{ConfigError, OcdResult};

/// Bernoulli dropout with a seeded RNG. Identity outside training mode.
pub struct Dropout {
    probability: f64,
    keep_scale: f64,
    training: Cell<bool>,
    rng: RefCell<StdRng>,
}

impl fmt::Debug for Dropout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dropout")
            .field("probability", &self.probability)
            .field("training", &self.training.get())
            .finish()
    }
}

impl Dropout {
    pub fn new(probability: f64, seed: u64) -> OcdResult<Self> {
        if !(0.0..1.0).contains(&probability) {
            return Err(ConfigError::InvalidValue {
                field: "dropout".into(),
                reason: format!("probability must be in [0, 1), got {probability}"),
            }
            .into());
        }
        Ok(Self {
            probability,
            keep_scale: 1.0 / (1.0 - probability),
            training: Cell::new(true),
            rng: RefCell::new(StdRng::seed_from_u64(seed)),
        })
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }

    pub fn is_training(&self) -> bool {
        self.training.get()
    }

    pub fn set_training(&self, training: bool) {
        self.training.set(training);
    }

    pub fn forward(&self, mut inputs: Array2<f64>) -> Array2<f64> {
        if !self.is_training() || self.probability == 0.0 {
            return inputs;
        }
        let mut rng = self.rng.borrow_mut();
        Zip::from(&mut inputs).for_each(|x| {
            *x = if rng.gen::<f64>() >= self.probability {
                *x * self.keep_scale
            } else {
                0.0
            };
        });
        inputs
    }
}
