//! Mini-batch training with early stopping.
//!
//! ## Algorithm
//! 1. Normalize ratings with the snapshot's min/max
//! 2. Shuffle with the configured seed, hold out the last
//!    `validation_split` share for validation
//! 3. Measure the untrained model on validation (the baseline)
//! 4. Each epoch: reshuffle the training split, run mini-batch Adam on
//!    binary cross-entropy plus an L2 penalty on touched embedding rows,
//!    then evaluate on validation
//! 5. Keep the weights of the best validation RMSE; stop after `patience`
//!    epochs without improvement, after `epochs`, or when the stop signal
//!    is raised (checked between epochs)

use crate::config::TrainingConfig;
use crate::error::TrainingError;
use crate::metrics::{bce, evaluate, Sample};
use crate::model::{affinity, sigmoid, LatentFactorModel};
use crate::optimizer::{Adam, Moments, RowGradients};
use crate::scaler::TargetScaler;
use crate::stop::StopSignal;
use data_loader::InteractionRepository;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

/// Metrics recorded after one epoch
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EpochStats {
    /// 1-based
    pub epoch: usize,
    pub train_loss: f32,
    pub train_rmse: f32,
    pub val_loss: f32,
    pub val_rmse: f32,
}

/// Outcome of a successful fit
#[derive(Debug, Clone)]
pub struct TrainingReport {
    /// Weights restored from the best epoch
    pub model: LatentFactorModel,
    pub scaler: TargetScaler,
    pub history: Vec<EpochStats>,
    pub best_epoch: usize,
    pub best_val_rmse: f32,
    /// Validation RMSE of the freshly initialized model
    pub baseline_rmse: f32,
    /// Patience ran out before `epochs`
    pub stopped_early: bool,
    /// The stop signal ended training
    pub interrupted: bool,
    pub train_size: usize,
    pub validation_size: usize,
}

/// Trains a `LatentFactorModel` on an interaction snapshot
#[derive(Debug, Clone, Default)]
pub struct Trainer {
    config: TrainingConfig,
    stop: StopSignal,
}

impl Trainer {
    pub fn new(config: TrainingConfig) -> Self {
        Self {
            config,
            stop: StopSignal::new(),
        }
    }

    /// Share a stop signal with the caller (default: a private one)
    pub fn with_stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = stop;
        self
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    #[instrument(skip_all, fields(dim = self.config.embedding_dim, seed = self.config.seed))]
    pub fn fit(&self, repo: &InteractionRepository) -> Result<TrainingReport, TrainingError> {
        let (min, max) = repo.rating_range().ok_or(TrainingError::EmptyDataset)?;
        let scaler = TargetScaler::new(min, max);

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut samples: Vec<Sample> = repo
            .triples()
            .map(|(user, item, rating)| Sample {
                user,
                item,
                target: scaler.normalize(rating),
            })
            .collect();
        samples.shuffle(&mut rng);

        let n = samples.len();
        let n_train = (((1.0 - self.config.validation_split) * n as f32).floor() as usize).clamp(1, n);
        let validation = samples.split_off(n_train);
        let mut train = samples;
        let held_out = if validation.is_empty() {
            warn!("Validation split is empty, validating on the training split");
            train.clone()
        } else {
            validation.clone()
        };

        let mut model = LatentFactorModel::init(
            repo.num_users(),
            repo.num_items(),
            self.config.embedding_dim,
            &mut rng,
        );
        let baseline_rmse = evaluate(&model, &held_out).rmse;
        info!(
            "Training on {} interactions, validating on {} (baseline val RMSE {:.4})",
            train.len(),
            validation.len(),
            baseline_rmse
        );

        let mut optimization = Optimization::new(&model, self.config.learning_rate);
        let batch_size = self.config.batch_size.max(1);
        let mut history = Vec::with_capacity(self.config.epochs);
        let mut best: Option<(usize, f32, LatentFactorModel)> = None;
        let mut since_best = 0;
        let mut stopped_early = false;
        let mut interrupted = false;

        for epoch in 1..=self.config.epochs {
            if self.stop.is_stopped() {
                info!("Stop requested, ending training before epoch {}", epoch);
                interrupted = true;
                break;
            }

            train.shuffle(&mut rng);
            let (mut loss_sum, mut squared_sum) = (0.0f32, 0.0f32);
            for batch in train.chunks(batch_size) {
                let (loss, squared) = optimization.step(&mut model, batch, self.config.l2);
                loss_sum += loss;
                squared_sum += squared;
            }

            let val = evaluate(&model, &held_out);
            let stats = EpochStats {
                epoch,
                train_loss: loss_sum / train.len() as f32,
                train_rmse: (squared_sum / train.len() as f32).sqrt(),
                val_loss: val.loss,
                val_rmse: val.rmse,
            };
            if !(stats.train_loss.is_finite() && val.loss.is_finite() && val.rmse.is_finite())
                || !model.is_finite()
            {
                warn!("Loss is no longer finite at epoch {}", epoch);
                return Err(TrainingError::Diverged { epoch });
            }
            debug!(
                "Epoch {}: loss {:.4}, rmse {:.4}, val_loss {:.4}, val_rmse {:.4}",
                epoch, stats.train_loss, stats.train_rmse, stats.val_loss, stats.val_rmse
            );
            history.push(stats);

            if best.as_ref().is_none_or(|(_, rmse, _)| val.rmse < *rmse) {
                best = Some((epoch, val.rmse, model.clone()));
                since_best = 0;
            } else {
                since_best += 1;
                if since_best >= self.config.patience {
                    info!("No improvement for {} epochs, stopping at epoch {}", since_best, epoch);
                    stopped_early = true;
                    break;
                }
            }
        }

        let Some((best_epoch, best_val_rmse, best_model)) = best else {
            return Err(if interrupted {
                TrainingError::Cancelled
            } else {
                TrainingError::NoImprovement {
                    best: baseline_rmse,
                    baseline: baseline_rmse,
                }
            });
        };
        if best_val_rmse >= baseline_rmse {
            return Err(TrainingError::NoImprovement {
                best: best_val_rmse,
                baseline: baseline_rmse,
            });
        }

        info!(
            "Restored weights from epoch {} (val RMSE {:.4}, baseline {:.4})",
            best_epoch, best_val_rmse, baseline_rmse
        );
        Ok(TrainingReport {
            model: best_model,
            scaler,
            history,
            best_epoch,
            best_val_rmse,
            baseline_rmse,
            stopped_early,
            interrupted,
            train_size: train.len(),
            validation_size: validation.len(),
        })
    }
}

/// Optimizer state for the four parameter buffers of a model
struct Optimization {
    adam: Adam,
    user_weights: Moments,
    user_bias: Moments,
    item_weights: Moments,
    item_bias: Moments,
}

impl Optimization {
    fn new(model: &LatentFactorModel, learning_rate: f32) -> Self {
        let dim = model.dim();
        Self {
            adam: Adam::new(learning_rate),
            user_weights: Moments::zeros(model.num_users(), dim),
            user_bias: Moments::zeros(model.num_users(), 1),
            item_weights: Moments::zeros(model.num_items(), dim),
            item_bias: Moments::zeros(model.num_items(), 1),
        }
    }

    /// One Adam step on `batch`; returns the summed loss and squared error
    /// of the batch as seen before the update
    fn step(&mut self, model: &mut LatentFactorModel, batch: &[Sample], l2: f32) -> (f32, f32) {
        let dim = model.dim();
        let scale = 1.0 / batch.len() as f32;
        let mut user_grads = RowGradients::new();
        let mut item_grads = RowGradients::new();
        let mut user_bias_grads = RowGradients::new();
        let mut item_bias_grads = RowGradients::new();
        let (mut loss, mut squared) = (0.0f32, 0.0f32);

        for s in batch {
            let logit = model.logit(s.user, s.item);
            let p = affinity(logit);
            loss += bce(p, s.target);
            squared += (p - s.target).powi(2);

            // d(bce)/d(logit) for a sigmoid output
            let g = (sigmoid(logit) - s.target) * scale;
            let user_vec = model.users.vector(s.user);
            let item_vec = model.items.vector(s.item);

            let ug = user_grads.entry(s.user).or_insert_with(|| vec![0.0; dim]);
            for (acc, &w) in ug.iter_mut().zip(item_vec) {
                *acc += g * w;
            }
            let ig = item_grads.entry(s.item).or_insert_with(|| vec![0.0; dim]);
            for (acc, &w) in ig.iter_mut().zip(user_vec) {
                *acc += g * w;
            }
            user_bias_grads.entry(s.user).or_insert_with(|| vec![0.0])[0] += g;
            item_bias_grads.entry(s.item).or_insert_with(|| vec![0.0])[0] += g;
        }

        add_l2(&mut user_grads, &model.users.weights, dim, l2);
        add_l2(&mut item_grads, &model.items.weights, dim, l2);

        self.adam.tick();
        self.adam.update(&mut model.users.weights, &mut self.user_weights, &user_grads);
        self.adam.update(&mut model.items.weights, &mut self.item_weights, &item_grads);
        self.adam.update(&mut model.users.bias, &mut self.user_bias, &user_bias_grads);
        self.adam.update(&mut model.items.bias, &mut self.item_bias, &item_bias_grads);

        (loss, squared)
    }
}

/// Gradient of `l2 * ||w||^2` for the touched rows
fn add_l2(grads: &mut RowGradients, weights: &[f32], dim: usize, l2: f32) {
    if l2 == 0.0 {
        return;
    }
    for (&row, grad) in grads.iter_mut() {
        for (k, acc) in grad.iter_mut().enumerate() {
            *acc += 2.0 * l2 * weights[row * dim + k];
        }
    }
}
