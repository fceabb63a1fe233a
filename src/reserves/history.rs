/*
 * Time-windowed reserve history for charting
 */

use chrono::Duration;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::VecDeque;
use crate::models::ReserveSample;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChartDomain {
    pub min: Decimal,
    pub max: Decimal,
}

pub struct ReserveHistory {
    window: Duration,
    capacity: usize,
    samples: VecDeque<ReserveSample>,
}

impl ReserveHistory {
    #[must_use]
    pub fn new(window: Duration, capacity: usize) -> Self {
        Self {
            window,
            capacity: capacity.max(1),
            samples: VecDeque::new(),
        }
    }

    pub fn push(&mut self, sample: ReserveSample) {
        let cutoff = sample.timestamp.checked_sub_signed(self.window);
        self.samples.push_back(sample);

        if let Some(cutoff) = cutoff {
            while self
                .samples
                .front()
                .is_some_and(|oldest| oldest.timestamp < cutoff)
            {
                self.samples.pop_front();
            }
        }
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    #[must_use]
    pub fn samples(&self) -> Vec<ReserveSample> {
        self.samples.iter().cloned().collect()
    }

    #[must_use]
    pub fn latest(&self) -> Option<&ReserveSample> {
        self.samples.back()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Y-axis bounds over both series, padded by 15% of the spread (or of 1
    /// when every value is equal) and never below zero.
    #[must_use]
    pub fn domain(&self) -> Option<ChartDomain> {
        let mut values = self
            .samples
            .iter()
            .flat_map(|sample| [sample.reserve_eth, sample.reserve_token]);

        let first = values.next()?;
        let (min, max) = values.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));

        let spread = if max == min { Decimal::ONE } else { max - min };
        let padding = spread * Decimal::new(15, 2);

        Some(ChartDomain {
            min: (min - padding).max(Decimal::ZERO),
            max: max + padding,
        })
    }
}
