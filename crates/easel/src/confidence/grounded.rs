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

use super::{round2, ConfidenceLabel};
use crate::chart_type::ChartType;
use crate::plan::NormalizedChart;
use crate::rules::GroundedScoring;
use crate::table::DataTable;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundedConfidence {
    pub confidence: f64,
    pub label: ConfidenceLabel,
    pub reasons: Vec<String>,
}

/// Re-scores a normalized chart against the real table.
pub fn score(chart: &NormalizedChart, table: &DataTable, rules: &GroundedScoring) -> GroundedConfidence {
    let mut score = rules.base;
    let mut reasons: Vec<&str> = Vec::new();

    let x_valid = table.is_valid_field(Some(chart.x.as_str()));
    if x_valid {
        reasons.push("Sufficient data available on x-axis");
    } else {
        score -= rules.invalid_x_penalty;
        reasons.push("Limited usable data on x-axis");
    }

    let x_kind = table.kind(&chart.x);
    match chart.chart_type {
        ChartType::Histogram if x_valid && x_kind.is_some_and(|k| k.is_numeric()) => {
            reasons.push("Histogram suits numeric distribution");
        }
        ChartType::Line if x_valid && x_kind.is_some_and(|k| k.is_temporal()) => {
            reasons.push("Line chart fits temporal trend");
        }
        ChartType::Pie
            if x_valid
                && table
                    .distinct_count(&chart.x)
                    .is_some_and(|n| n > rules.pie_max_categories) =>
        {
            score -= rules.pie_category_penalty;
            reasons.push("Too many categories for a pie chart");
        }
        _ => {}
    }

    if table.is_valid_field(Some(chart.y.as_str())) && !chart.is_count() {
        let low = table
            .std_dev(&chart.y)
            .is_some_and(|std| std < rules.low_variation_threshold);
        if low {
            score -= rules.low_variation_penalty;
            reasons.push("Low variation in values");
        } else {
            reasons.push("Strong variation in values");
        }
    }

    let confidence = round2(score.clamp(0.0, 1.0));
    GroundedConfidence {
        confidence,
        label: rules.thresholds.label(confidence),
        reasons: reasons
            .into_iter()
            .take(rules.max_reasons)
            .map(str::to_string)
            .collect(),
    }
}
