// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2024 Jonathan Lee
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License version 3
// as published by the Free Software Foundation.
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see https://www.gnu.org/licenses/.


//! Two independent confidence scorers.
//!
//! [`text`] runs at normalization time and only sees the model's words.
//! [`grounded`] runs at spec generation time against the real table.

pub mod grounded;
pub mod text;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use grounded::GroundedConfidence;
pub use text::TextConfidence;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfidenceLabel {
    Low,
    Medium,
    High,
}

impl fmt::Display for ConfidenceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConfidenceLabel::Low => "Low",
            ConfidenceLabel::Medium => "Medium",
            ConfidenceLabel::High => "High",
        };
        f.write_str(label)
    }
}

/// Inclusive lower bounds for the `High` and `Medium` labels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabelThresholds {
    pub high: f64,
    pub medium: f64,
}

impl LabelThresholds {
    pub fn label(&self, score: f64) -> ConfidenceLabel {
        if score >= self.high {
            ConfidenceLabel::High
        } else if score >= self.medium {
            ConfidenceLabel::Medium
        } else {
            ConfidenceLabel::Low
        }
    }

    pub fn is_valid(&self) -> bool {
        (0.0..=1.0).contains(&self.medium)
            && (0.0..=1.0).contains(&self.high)
            && self.medium <= self.high
    }
}

pub(crate) fn round2(score: f64) -> f64 {
    (score * 100.0).round() / 100.0
}
