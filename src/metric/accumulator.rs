use burn::prelude::*;

use crate::error::DiceError;

/// How accumulated batch scores turn into the epoch score.
#[derive(Config, Debug, PartialEq, Eq)]
pub enum Aggregation {
    /// Arithmetic mean over every accumulated batch (training).
    Mean,
    /// Sum of batch scores divided by the number of batches that carried at
    /// least one mask (evaluation). The count is per batch, not per sample.
    PresenceWeighted,
}

/// Running list of batch-level Dice scores.
///
/// Scores keep accumulating until [reset](DiceAccumulator::reset) is called,
/// so a caller that skips the reset between epochs folds the previous epoch
/// into the next mean.
#[derive(Debug, Clone)]
pub struct DiceAccumulator {
    aggregation: Aggregation,
    scores: Vec<f64>,
    batches_with_mask: usize,
}

impl DiceAccumulator {
    pub fn new(aggregation: Aggregation) -> Self {
        Self {
            aggregation,
            scores: Vec::new(),
            batches_with_mask: 0,
        }
    }

    /// Appends one batch score. `any_mask` feeds the presence counter.
    pub fn push(&mut self, score: f64, any_mask: bool) -> Result<(), DiceError> {
        if !score.is_finite() {
            return Err(DiceError::NonFiniteScore(score));
        }

        self.scores.push(score);
        if any_mask {
            self.batches_with_mask += 1;
        }

        Ok(())
    }

    pub fn compute(&self) -> Result<f64, DiceError> {
        let total: f64 = self.scores.iter().sum();

        match self.aggregation {
            Aggregation::Mean => {
                if self.scores.is_empty() {
                    return Err(DiceError::EmptyAccumulator);
                }
                Ok(total / self.scores.len() as f64)
            }
            Aggregation::PresenceWeighted => {
                if self.batches_with_mask == 0 {
                    return Err(DiceError::NoMaskPresent);
                }
                Ok(total / self.batches_with_mask as f64)
            }
        }
    }

    pub fn reset(&mut self) {
        self.scores.clear();
        self.batches_with_mask = 0;
    }

    pub fn aggregation(&self) -> &Aggregation {
        &self.aggregation
    }

    pub fn scores(&self) -> &[f64] {
        &self.scores
    }

    pub fn batches_with_mask(&self) -> usize {
        self.batches_with_mask
    }
}
