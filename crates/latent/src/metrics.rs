//! Loss and error metrics over labelled (user, item, target) samples.
//!
//! Per-sample terms are computed in parallel and summed in input order, so
//! results do not depend on how rayon splits the work.

use crate::model::LatentFactorModel;
use data_loader::{ItemIndex, UserIndex};
use rayon::prelude::*;

/// One training or validation row with its normalized target in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub user: UserIndex,
    pub item: ItemIndex,
    pub target: f32,
}

/// Binary cross-entropy of a prediction already clamped into (0, 1)
pub fn bce(prediction: f32, target: f32) -> f32 {
    -(target * prediction.ln() + (1.0 - target) * (1.0 - prediction).ln())
}

/// Mean BCE and RMSE of a model over samples
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub loss: f32,
    pub rmse: f32,
}

/// Evaluate `model` on `samples`; an empty set evaluates to zeros
pub fn evaluate(model: &LatentFactorModel, samples: &[Sample]) -> Evaluation {
    if samples.is_empty() {
        return Evaluation { loss: 0.0, rmse: 0.0 };
    }

    let terms: Vec<(f32, f32)> = samples
        .par_iter()
        .map(|s| {
            let p = model.predict(s.user, s.item);
            (bce(p, s.target), (p - s.target).powi(2))
        })
        .collect();

    let n = samples.len() as f32;
    let (loss, squared) = terms
        .iter()
        .fold((0.0f32, 0.0f32), |(l, e), &(dl, de)| (l + dl, e + de));
    Evaluation {
        loss: loss / n,
        rmse: (squared / n).sqrt(),
    }
}

pub fn rmse(model: &LatentFactorModel, samples: &[Sample]) -> f32 {
    evaluate(model, samples).rmse
}
