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
use crate::rules::TextScoring;
use serde::{Deserialize, Serialize};

const GENERIC_REASON: &str = "General-purpose visualization choice.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextConfidence {
    pub confidence: f64,
    pub label: ConfidenceLabel,
    pub reason: String,
}

/// Plausibility of a chart from its field names alone. No data is consulted,
/// so the score never exceeds `rules.cap`.
pub fn score(
    rules: &TextScoring,
    chart_type: ChartType,
    x: &str,
    y: &str,
    _description: &str,
) -> TextConfidence {
    let x_text = x.to_lowercase();
    let y_text = y.to_lowercase();
    let mut score = rules.base;
    let mut reasons: Vec<&str> = Vec::new();

    if chart_type == ChartType::Line && mentions_any(&x_text, &rules.temporal_keywords) {
        score += rules.temporal_line_bonus;
        reasons.push("Time-based data aligns well with a line chart.");
    }
    if chart_type.is_categorical_comparison() && mentions_any(&x_text, &rules.categorical_keywords)
    {
        score += rules.categorical_bonus;
        reasons.push("Categorical comparison suits this chart type.");
    }
    let placeholder = rules
        .placeholder_measures
        .iter()
        .any(|p| p.eq_ignore_ascii_case(&y_text));
    if !y_text.is_empty() && !placeholder {
        score += rules.measure_bonus;
        reasons.push("Uses a meaningful quantitative measure.");
    }

    // The label is read off the rounded score, so a float sum such as
    // 0.5 + 0.2 + 0.1 = 0.7999... is labelled at 0.8.
    let confidence = round2(score.min(rules.cap));
    let reason = if reasons.is_empty() {
        GENERIC_REASON.to_string()
    } else {
        reasons.join(" ")
    };
    TextConfidence {
        confidence,
        label: rules.thresholds.label(confidence),
        reason,
    }
}

fn mentions_any(text: &str, keywords: &[String]) -> bool {
    keywords
        .iter()
        .any(|k| !k.is_empty() && text.contains(k.to_lowercase().as_str()))
}

/// Short explanation keyed on chart type and the measure name.
pub fn generate_context(chart_type: ChartType, y: &str) -> Vec<String> {
    let measure = if y.trim().is_empty() {
        "values".to_string()
    } else {
        y.to_lowercase()
    };
    match chart_type {
        ChartType::Line => vec![
            format!("Shows how {measure} change over time."),
            "Useful for identifying trends.".to_string(),
        ],
        ChartType::Bar => vec![
            format!("Compares {measure} across categories."),
            "Helps spot differences.".to_string(),
        ],
        ChartType::Pie => vec![
            "Shows proportions of categories.".to_string(),
            "Best for relative comparison.".to_string(),
        ],
        _ => vec!["Provides a high-level overview.".to_string()],
    }
}
