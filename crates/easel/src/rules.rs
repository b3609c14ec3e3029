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

//! Configuration tables for normalization, scoring and spec generation.
//!
//! Every table the pipeline consults lives here so it can be versioned,
//! loaded from YAML and swapped out in tests. `Rules::default()` matches
//! `config/chart_rules.yml`.

use crate::chart_type::ChartType;
use crate::confidence::LabelThresholds;
use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rules {
    pub synonyms: BTreeMap<String, ChartType>,
    pub keyword_rules: Vec<KeywordRule>,
    pub default_chart_type: ChartType,
    pub fallbacks: FieldFallbacks,
    pub default_interactions: Vec<String>,
    pub units: Vec<UnitRule>,
    pub default_unit: String,
    pub temporal_formats: Vec<String>,
    pub text_scoring: TextScoring,
    pub grounded_scoring: GroundedScoring,
    pub vega_lite: VegaLiteRules,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordRule {
    pub keywords: Vec<String>,
    pub chart_type: ChartType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitRule {
    pub keywords: Vec<String>,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldFallbacks {
    pub x: String,
    pub y: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextScoring {
    pub base: f64,
    pub temporal_line_bonus: f64,
    pub categorical_bonus: f64,
    pub measure_bonus: f64,
    pub cap: f64,
    pub temporal_keywords: Vec<String>,
    pub categorical_keywords: Vec<String>,
    pub placeholder_measures: Vec<String>,
    pub thresholds: LabelThresholds,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundedScoring {
    pub base: f64,
    pub invalid_x_penalty: f64,
    pub pie_category_penalty: f64,
    pub pie_max_categories: usize,
    pub low_variation_penalty: f64,
    pub low_variation_threshold: f64,
    pub max_reasons: usize,
    pub thresholds: LabelThresholds,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VegaLiteRules {
    pub schema: String,
    pub count_title: String,
    pub context_note: String,
    pub aggregates: Vec<String>,
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}

impl Default for Rules {
    fn default() -> Self {
        let synonyms = [
            ("line_chart", ChartType::Line),
            ("line", ChartType::Line),
            ("bar_chart", ChartType::Bar),
            ("bar", ChartType::Bar),
            ("histogram", ChartType::Histogram),
            ("heatmap", ChartType::Heatmap),
            ("pie_chart", ChartType::Pie),
            ("pie", ChartType::Pie),
            ("map", ChartType::Map),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        Self {
            synonyms,
            keyword_rules: vec![
                KeywordRule {
                    keywords: strings(&["line", "trend", "over time", "time series"]),
                    chart_type: ChartType::Line,
                },
                KeywordRule {
                    keywords: strings(&["histogram", "distribution"]),
                    chart_type: ChartType::Histogram,
                },
                KeywordRule {
                    keywords: strings(&["pie", "share", "percentage"]),
                    chart_type: ChartType::Pie,
                },
                KeywordRule {
                    keywords: strings(&["map", "region", "geographic"]),
                    chart_type: ChartType::Map,
                },
                KeywordRule {
                    keywords: strings(&["bar", "compare"]),
                    chart_type: ChartType::Bar,
                },
            ],
            default_chart_type: ChartType::Bar,
            fallbacks: FieldFallbacks::default(),
            default_interactions: strings(&["hover", "filter"]),
            units: vec![
                UnitRule {
                    keywords: strings(&["age"]),
                    unit: "years".to_string(),
                },
                UnitRule {
                    keywords: strings(&["duration"]),
                    unit: "seconds".to_string(),
                },
                UnitRule {
                    keywords: strings(&["income"]),
                    unit: "USD".to_string(),
                },
                UnitRule {
                    keywords: strings(&["price", "value"]),
                    unit: "value".to_string(),
                },
            ],
            default_unit: "records".to_string(),
            temporal_formats: strings(&[
                "%Y-%m-%d",
                "%Y-%m-%d %H:%M:%S",
                "%Y-%m-%dT%H:%M:%S",
                "%Y-%m-%dT%H:%M:%SZ",
                "%m/%d/%Y",
                "%d/%m/%Y",
            ]),
            text_scoring: TextScoring::default(),
            grounded_scoring: GroundedScoring::default(),
            vega_lite: VegaLiteRules::default(),
        }
    }
}

impl Default for FieldFallbacks {
    fn default() -> Self {
        Self {
            x: "Date".to_string(),
            y: "Value".to_string(),
        }
    }
}

impl Default for TextScoring {
    fn default() -> Self {
        Self {
            base: 0.5,
            temporal_line_bonus: 0.2,
            categorical_bonus: 0.15,
            measure_bonus: 0.1,
            cap: 0.95,
            temporal_keywords: strings(&["date"]),
            categorical_keywords: strings(&["category", "type", "group"]),
            placeholder_measures: strings(&["value", ""]),
            thresholds: LabelThresholds {
                high: 0.8,
                medium: 0.6,
            },
        }
    }
}

impl Default for GroundedScoring {
    fn default() -> Self {
        Self {
            base: 1.0,
            invalid_x_penalty: 0.3,
            pie_category_penalty: 0.25,
            pie_max_categories: 12,
            low_variation_penalty: 0.2,
            low_variation_threshold: 0.01,
            max_reasons: 3,
            thresholds: LabelThresholds {
                high: 0.85,
                medium: 0.65,
            },
        }
    }
}

impl Default for VegaLiteRules {
    fn default() -> Self {
        Self {
            schema: "https://vega.github.io/schema/vega-lite/v6.json".to_string(),
            count_title: "Number of records".to_string(),
            context_note: "This chart highlights patterns derived from the uploaded dataset."
                .to_string(),
            aggregates: strings(&[
                "count", "valid", "missing", "distinct", "sum", "product", "mean", "average",
                "variance", "variancep", "stdev", "stdevp", "stderr", "median", "q1", "q3", "min",
                "max", "argmin", "argmax",
            ]),
        }
    }
}

impl Rules {
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::ConfigFileError {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_string(&content)
    }

    pub fn from_yaml_string(yaml_content: &str) -> ConfigResult<Self> {
        let rules: Self = serde_yaml::from_str(yaml_content)?;
        rules.validate()?;
        Ok(rules)
    }

    pub fn to_yaml_string(&self) -> ConfigResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let unit_interval = [
            ("text_scoring.base", self.text_scoring.base),
            ("text_scoring.cap", self.text_scoring.cap),
            ("grounded_scoring.base", self.grounded_scoring.base),
        ];
        for (field, value) in unit_interval {
            if !(0.0..=1.0).contains(&value) {
                return Err(out_of_range(field));
            }
        }
        let weights = [
            ("text_scoring.temporal_line_bonus", self.text_scoring.temporal_line_bonus),
            ("text_scoring.categorical_bonus", self.text_scoring.categorical_bonus),
            ("text_scoring.measure_bonus", self.text_scoring.measure_bonus),
            ("grounded_scoring.invalid_x_penalty", self.grounded_scoring.invalid_x_penalty),
            ("grounded_scoring.pie_category_penalty", self.grounded_scoring.pie_category_penalty),
            ("grounded_scoring.low_variation_penalty", self.grounded_scoring.low_variation_penalty),
            ("grounded_scoring.low_variation_threshold", self.grounded_scoring.low_variation_threshold),
        ];
        for (field, value) in weights {
            if !value.is_finite() || value < 0.0 {
                return Err(out_of_range(field));
            }
        }
        if !self.text_scoring.thresholds.is_valid() {
            return Err(out_of_range("text_scoring.thresholds"));
        }
        if !self.grounded_scoring.thresholds.is_valid() {
            return Err(out_of_range("grounded_scoring.thresholds"));
        }
        if self.grounded_scoring.max_reasons == 0 {
            return Err(out_of_range("grounded_scoring.max_reasons"));
        }
        if self.fallbacks.x.is_empty() {
            return Err(missing("fallbacks.x"));
        }
        if self.fallbacks.y.is_empty() {
            return Err(missing("fallbacks.y"));
        }
        if self.vega_lite.schema.trim().is_empty() {
            return Err(missing("vega_lite.schema"));
        }
        Ok(())
    }

    /// Unit label for an axis title. Purely cosmetic.
    pub fn unit_for(&self, field: &str) -> &str {
        let lowered = field.to_lowercase();
        self.units
            .iter()
            .find(|rule| {
                rule.keywords
                    .iter()
                    .any(|k| lowered.contains(k.to_lowercase().as_str()))
            })
            .map_or(self.default_unit.as_str(), |rule| rule.unit.as_str())
    }
}

fn out_of_range(field: &str) -> ConfigError {
    ConfigError::OutOfRange {
        field: field.to_string(),
    }
}

fn missing(field: &str) -> ConfigError {
    ConfigError::MissingRequiredConfig {
        field: field.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rules_validate() {
        assert!(Rules::default().validate().is_ok());
    }

    #[test]
    fn test_unit_lookup() {
        let rules = Rules::default();
        assert_eq!(rules.unit_for("Age"), "years");
        assert_eq!(rules.unit_for("call_duration"), "seconds");
        assert_eq!(rules.unit_for("household_income"), "USD");
        assert_eq!(rules.unit_for("unit_price"), "value");
        assert_eq!(rules.unit_for("city"), "records");
        // first matching rule wins: "average" contains "age"
        assert_eq!(rules.unit_for("average_value"), "years");
    }

    #[test]
    fn test_partial_yaml_overrides_single_table() {
        let rules = Rules::from_yaml_string("default_unit: rows\nfallbacks:\n  x: Month\n").unwrap();
        assert_eq!(rules.default_unit, "rows");
        assert_eq!(rules.fallbacks.x, "Month");
        assert_eq!(rules.fallbacks.y, "Value");
        assert_eq!(rules.synonyms, Rules::default().synonyms);
    }

    #[test]
    fn test_invalid_thresholds_rejected() {
        let yaml = "text_scoring:\n  thresholds:\n    high: 0.5\n    medium: 0.7\n";
        let err = Rules::from_yaml_string(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { .. }));
    }

    #[test]
    fn test_yaml_round_trip_is_lossless() {
        let rules = Rules::default();
        let yaml = rules.to_yaml_string().unwrap();
        assert_eq!(Rules::from_yaml_string(&yaml).unwrap(), rules);
    }
}
