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

//! Vega-Lite documents for normalized charts.
//!
//! [`generate`] is the only place a chart can be dropped: a chart whose x
//! field is not a present, non-empty column is refused.

use crate::chart_type::ChartType;
use crate::confidence::{grounded, ConfidenceLabel};
use crate::plan::NormalizedChart;
use crate::rules::Rules;
use crate::table::{ColumnKind, DataTable};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    #[serde(rename = "$schema")]
    pub schema: String,
    pub description: String,
    pub mark: Mark,
    pub encoding: Encoding,
    pub confidence: f64,
    pub confidence_label: ConfidenceLabel,
    pub confidence_reasons: Vec<String>,
    pub context: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkType {
    Line,
    Bar,
    Arc,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mark {
    #[serde(rename = "type")]
    pub mark_type: MarkType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point: Option<bool>,
}

impl Mark {
    pub fn for_chart(chart_type: ChartType) -> Self {
        match chart_type {
            ChartType::Line => Mark {
                mark_type: MarkType::Line,
                point: Some(true),
            },
            ChartType::Pie => Mark {
                mark_type: MarkType::Arc,
                point: None,
            },
            _ => Mark {
                mark_type: MarkType::Bar,
                point: None,
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Encoding {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<Channel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<Channel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theta: Option<Channel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Channel>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Quantitative,
    Temporal,
    Nominal,
}

impl From<ColumnKind> for FieldType {
    fn from(kind: ColumnKind) -> Self {
        match kind {
            ColumnKind::Temporal => FieldType::Temporal,
            ColumnKind::Numeric => FieldType::Quantitative,
            ColumnKind::Categorical => FieldType::Nominal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Legend {
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bin: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legend: Option<Legend>,
}

impl Channel {
    fn field(name: &str, field_type: FieldType) -> Self {
        Self {
            field: Some(name.to_string()),
            field_type,
            aggregate: None,
            bin: None,
            title: None,
            legend: None,
        }
    }

    fn count(title: &str) -> Self {
        Self {
            field: None,
            field_type: FieldType::Quantitative,
            aggregate: Some("count".to_string()),
            bin: None,
            title: Some(title.to_string()),
            legend: None,
        }
    }

    fn nominal_with_legend(name: &str) -> Self {
        Self {
            legend: Some(Legend {
                title: name.to_string(),
            }),
            ..Self::field(name, FieldType::Nominal)
        }
    }

    fn titled(mut self, title: String) -> Self {
        self.title = Some(title);
        self
    }
}

/// Builds the Vega-Lite document for `chart`, or `None` when its x field
/// cannot be grounded in `table`.
pub fn generate(chart: &NormalizedChart, table: &DataTable, rules: &Rules) -> Option<ChartSpec> {
    if !table.is_valid_field(Some(chart.x.as_str())) {
        debug!(chart = %chart.id, x = %chart.x, "Refusing chart without a usable x field");
        return None;
    }

    let encoding = match chart.chart_type {
        ChartType::Histogram => Encoding {
            x: Some(Channel {
                bin: Some(true),
                ..Channel::field(&chart.x, FieldType::Quantitative)
                    .titled(axis_title(&chart.x, rules))
            }),
            y: Some(Channel::count(&rules.vega_lite.count_title)),
            ..Encoding::default()
        },
        ChartType::Pie => Encoding {
            theta: Some(Channel::count(&rules.vega_lite.count_title)),
            color: Some(Channel::nominal_with_legend(&chart.x)),
            ..Encoding::default()
        },
        _ => cartesian_encoding(chart, table, rules),
    };

    let confidence = grounded::score(chart, table, &rules.grounded_scoring);
    Some(ChartSpec {
        schema: rules.vega_lite.schema.clone(),
        description: chart.description.clone(),
        mark: Mark::for_chart(chart.chart_type),
        encoding,
        confidence: confidence.confidence,
        confidence_label: confidence.label,
        confidence_reasons: confidence.reasons,
        context: vec![chart.description.clone(), rules.vega_lite.context_note.clone()],
    })
}

fn cartesian_encoding(chart: &NormalizedChart, table: &DataTable, rules: &Rules) -> Encoding {
    let x = Channel::field(&chart.x, field_type(table, &chart.x)).titled(axis_title(&chart.x, rules));

    let y = if chart.is_count() || !table.is_valid_field(Some(chart.y.as_str())) {
        Channel::count(&rules.vega_lite.count_title)
    } else {
        Channel {
            aggregate: aggregate_op(chart, rules),
            ..Channel::field(&chart.y, field_type(table, &chart.y))
                .titled(axis_title(&chart.y, rules))
        }
    };

    let color = match (&chart.color, chart.chart_type) {
        (Some(color), ChartType::Bar) if table.is_valid_field(Some(color.as_str())) => {
            Some(Channel::nominal_with_legend(color))
        }
        _ => None,
    };

    Encoding {
        x: Some(x),
        y: Some(y),
        theta: None,
        color,
    }
}

fn field_type(table: &DataTable, field: &str) -> FieldType {
    table
        .kind(field)
        .map_or(FieldType::Nominal, FieldType::from)
}

fn axis_title(field: &str, rules: &Rules) -> String {
    format!("{field} ({})", rules.unit_for(field))
}

/// Requested aggregation as a Vega-Lite op. `none` and anything outside the
/// configured vocabulary map to no aggregate.
fn aggregate_op(chart: &NormalizedChart, rules: &Rules) -> Option<String> {
    let op = chart.aggregation.trim().to_lowercase();
    if op == "none" || op.is_empty() {
        return None;
    }
    if rules.vega_lite.aggregates.iter().any(|a| *a == op) {
        Some(op)
    } else {
        debug!(chart = %chart.id, aggregation = %op, "Dropping unsupported aggregation");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::normalize;
    use polars::prelude::*;
    use serde_json::json;

    fn people() -> DataTable {
        DataTable::from_dataframe(
            df! {
                "age" => &[23.0, 35.0, 41.0, 51.0],
                "city" => &["Paris", "Lyon", "Paris", "Nice"],
                "income" => &[31000.0, 42000.0, 39000.0, 58000.0],
            }
            .unwrap(),
        )
        .unwrap()
    }

    fn chart(raw: serde_json::Value) -> NormalizedChart {
        normalize(&json!({ "visualizations": [raw] }), &Rules::default())
            .visualizations
            .remove(0)
    }

    #[test]
    fn test_bar_with_aggregate_and_color() {
        let rules = Rules::default();
        let spec = generate(
            &chart(json!({"type": "bar", "x": "city", "y": "income", "aggregation": "Mean", "color": "city"})),
            &people(),
            &rules,
        )
        .unwrap();
        let doc = serde_json::to_value(&spec).unwrap();
        assert_eq!(doc["$schema"], json!(rules.vega_lite.schema));
        assert_eq!(doc["mark"], json!({"type": "bar"}));
        assert_eq!(
            doc["encoding"]["x"],
            json!({"field": "city", "type": "nominal", "title": "city (records)"})
        );
        assert_eq!(
            doc["encoding"]["y"],
            json!({"field": "income", "type": "quantitative", "aggregate": "mean", "title": "income (USD)"})
        );
        assert_eq!(doc["encoding"]["color"]["legend"], json!({"title": "city"}));
    }

    #[test]
    fn test_unknown_aggregation_and_invalid_y() {
        let table = people();
        let rules = Rules::default();
        let spec = generate(
            &chart(json!({"type": "line", "x": "age", "y": "income", "aggregation": "rolling"})),
            &table,
            &rules,
        )
        .unwrap();
        assert_eq!(spec.mark.point, Some(true));
        let y = spec.encoding.y.unwrap();
        assert_eq!(y.aggregate, None);
        assert_eq!(y.field.as_deref(), Some("income"));

        let counted = generate(&chart(json!({"type": "bar", "x": "city", "y": "ghost"})), &table, &rules)
            .unwrap();
        let y = counted.encoding.y.unwrap();
        assert_eq!(y.aggregate.as_deref(), Some("count"));
        assert_eq!(y.title.as_deref(), Some("Number of records"));
        assert_eq!(counted.encoding.color, None);
    }

    #[test]
    fn test_pie_uses_theta_and_arc() {
        let spec = generate(&chart(json!({"type": "pie", "x": "city"})), &people(), &Rules::default())
            .unwrap();
        assert_eq!(spec.mark.mark_type, MarkType::Arc);
        assert!(spec.encoding.x.is_none());
        assert_eq!(spec.encoding.theta.unwrap().aggregate.as_deref(), Some("count"));
        assert_eq!(spec.encoding.color.unwrap().field.as_deref(), Some("city"));
        assert_eq!(spec.context.len(), 2);
    }

    #[test]
    fn test_refuses_missing_x() {
        let result = generate(&chart(json!({"type": "bar", "x": "nonexistent_col"})), &people(), &Rules::default());
        assert!(result.is_none());
    }
}
