//! Min-max normalization of ratings into [0, 1].

/// Maps a rating onto [0, 1] using the snapshot's observed range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetScaler {
    min: f32,
    max: f32,
}

impl TargetScaler {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Normalize a rating. A degenerate range (every rating equal) maps
    /// everything to 1.0.
    pub fn normalize(&self, rating: f32) -> f32 {
        if self.max > self.min {
            (rating - self.min) / (self.max - self.min)
        } else {
            1.0
        }
    }

    /// Map a normalized value back onto the rating scale
    pub fn denormalize(&self, value: f32) -> f32 {
        self.min + value * (self.max - self.min)
    }

    pub fn range(&self) -> (f32, f32) {
        (self.min, self.max)
    }
}
