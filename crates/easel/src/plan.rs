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

use crate::chart_type::ChartType;
use crate::confidence::ConfidenceLabel;
use serde::{Deserialize, Serialize};

/// One chart after repair. Every field is well-formed regardless of what the
/// model produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedChart {
    pub id: String,
    #[serde(rename = "type")]
    pub chart_type: ChartType,
    pub title: String,
    pub description: String,
    pub x: String,
    pub y: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub aggregation: String,
    pub interactions: Vec<String>,
    pub confidence: f64,
    pub confidence_label: ConfidenceLabel,
    pub confidence_reason: String,
    pub context: Vec<String>,
}

impl NormalizedChart {
    pub fn is_count(&self) -> bool {
        self.aggregation.eq_ignore_ascii_case("count")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisualizationPlan {
    pub insights: Vec<String>,
    pub visualizations: Vec<NormalizedChart>,
}

impl VisualizationPlan {
    pub fn is_empty(&self) -> bool {
        self.insights.is_empty() && self.visualizations.is_empty()
    }
}
