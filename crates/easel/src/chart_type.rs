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

use crate::rules::Rules;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Closed chart vocabulary. Every normalized chart carries one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Line,
    Bar,
    Histogram,
    Pie,
    Map,
    Heatmap,
}

impl ChartType {
    pub const ALL: [ChartType; 6] = [
        ChartType::Line,
        ChartType::Bar,
        ChartType::Histogram,
        ChartType::Pie,
        ChartType::Map,
        ChartType::Heatmap,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartType::Line => "line",
            ChartType::Bar => "bar",
            ChartType::Histogram => "histogram",
            ChartType::Pie => "pie",
            ChartType::Map => "map",
            ChartType::Heatmap => "heatmap",
        }
    }

    pub fn is_categorical_comparison(&self) -> bool {
        matches!(self, ChartType::Bar | ChartType::Pie)
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keyword classifier over free text. Rules are checked in order and the
/// first rule with any keyword contained in the lower-cased text wins.
pub fn infer_chart_type(rules: &Rules, text: &str) -> ChartType {
    if text.trim().is_empty() {
        return rules.default_chart_type;
    }
    let lowered = text.to_lowercase();
    rules
        .keyword_rules
        .iter()
        .find(|rule| {
            rule.keywords
                .iter()
                .any(|k| lowered.contains(k.to_lowercase().as_str()))
        })
        .map_or(rules.default_chart_type, |rule| rule.chart_type)
}

/// Synonym table first, keyword inference on the raw text second.
pub fn resolve_chart_type(rules: &Rules, raw: &str) -> ChartType {
    let key = raw.trim().to_lowercase();
    if let Some(chart_type) = rules.synonyms.get(&key) {
        return *chart_type;
    }
    let inferred = infer_chart_type(rules, raw);
    debug!(raw_type = raw, inferred = %inferred, "Chart type not in synonym table, inferred");
    inferred
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_rules_first_match_wins() {
        let rules = Rules::default();
        assert_eq!(infer_chart_type(&rules, "Sales over time"), ChartType::Line);
        assert_eq!(infer_chart_type(&rules, ""), ChartType::Bar);
        assert_eq!(
            infer_chart_type(&rules, "regional distribution map"),
            ChartType::Histogram
        );
        assert_eq!(infer_chart_type(&rules, "Market SHARE"), ChartType::Pie);
        assert_eq!(infer_chart_type(&rules, "geographic spread"), ChartType::Map);
        assert_eq!(infer_chart_type(&rules, "scatter"), ChartType::Bar);
    }

    #[test]
    fn test_synonyms_take_priority_over_keywords() {
        let rules = Rules::default();
        assert_eq!(resolve_chart_type(&rules, "Pie_Chart"), ChartType::Pie);
        assert_eq!(resolve_chart_type(&rules, "heatmap"), ChartType::Heatmap);
        assert_eq!(resolve_chart_type(&rules, "map"), ChartType::Map);
        assert_eq!(resolve_chart_type(&rules, "timeline"), ChartType::Line);
        assert_eq!(resolve_chart_type(&rules, "None"), ChartType::Bar);
    }
}
