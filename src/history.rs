//! Bounded step history.

use std::collections::VecDeque;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Default number of step records kept by a [`crate::Trainer`].
pub const HISTORY_CAPACITY: usize = 32;

/// FIFO ring of step snapshots. Pushing into a full history evicts the oldest
/// record.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "StepHistoryParts<T>"))]
#[derive(Debug, Clone, PartialEq)]
pub struct StepHistory<T> {
    capacity: usize,
    records: VecDeque<T>,
}

/// Unvalidated history fields, used when decoding.
#[cfg_attr(feature = "serde", derive(Deserialize))]
#[derive(Debug, Clone)]
pub struct StepHistoryParts<T> {
    pub capacity: usize,
    pub records: Vec<T>,
}

impl<T> TryFrom<StepHistoryParts<T>> for StepHistory<T> {
    type Error = Error;

    /// Rejects a zero capacity; keeps only the newest `capacity` records.
    fn try_from(parts: StepHistoryParts<T>) -> Result<Self> {
        let mut history = Self::with_capacity(parts.capacity)?;
        for record in parts.records {
            history.push(record);
        }
        Ok(history)
    }
}

impl<T> Default for StepHistory<T> {
    fn default() -> Self {
        Self {
            capacity: HISTORY_CAPACITY,
            records: VecDeque::with_capacity(HISTORY_CAPACITY),
        }
    }
}

impl<T> StepHistory<T> {
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidConfig(
                "history capacity must be > 0".to_owned(),
            ));
        }
        Ok(Self {
            capacity,
            records: VecDeque::with_capacity(capacity),
        })
    }

    /// Appends `record`, returning the evicted one when full.
    pub fn push(&mut self, record: T) -> Option<T> {
        let mut evicted = None;
        while self.records.len() >= self.capacity {
            evicted = self.records.pop_front();
        }
        self.records.push_back(record);
        evicted
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record `idx`, counting from the oldest kept one.
    #[inline]
    pub fn get(&self, idx: usize) -> Option<&T> {
        self.records.get(idx)
    }

    #[inline]
    pub fn latest(&self) -> Option<&T> {
        self.records.back()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.records.iter()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}
