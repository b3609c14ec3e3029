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

//! Repairs raw model output into a [`VisualizationPlan`].
//!
//! Normalization is total: every shape of input yields a well-formed plan.
//! Missing or mistyped fields get the fallbacks configured in [`Rules`].

use crate::chart_type::resolve_chart_type;
use crate::confidence::text;
use crate::plan::{NormalizedChart, VisualizationPlan};
use crate::rules::Rules;
use serde_json::{Map, Value};
use tracing::{debug, warn};

pub fn normalize(raw: &Value, rules: &Rules) -> VisualizationPlan {
    let plan = VisualizationPlan {
        insights: normalize_insights(raw),
        visualizations: normalize_visualizations(raw, rules),
    };
    debug!(
        insights = plan.insights.len(),
        charts = plan.visualizations.len(),
        "Normalized visualization plan"
    );
    plan
}

pub fn normalize_insights(raw: &Value) -> Vec<String> {
    let entries = match raw.get("insights") {
        Some(Value::Array(items)) => items.as_slice(),
        Some(Value::String(single)) => return non_empty(single).into_iter().collect(),
        _ => return Vec::new(),
    };
    entries
        .iter()
        .filter_map(|entry| match entry {
            Value::String(s) => non_empty(s),
            Value::Object(obj) => obj.get("description").and_then(Value::as_str).and_then(non_empty),
            _ => None,
        })
        .collect()
}

fn non_empty(s: &str) -> Option<String> {
    (!s.trim().is_empty()).then(|| s.to_string())
}

fn normalize_visualizations(raw: &Value, rules: &Rules) -> Vec<NormalizedChart> {
    let Some(Value::Array(entries)) = raw.get("visualizations") else {
        return Vec::new();
    };
    let mut charts = Vec::with_capacity(entries.len());
    for (position, entry) in entries.iter().enumerate() {
        let Value::Object(descriptor) = entry else {
            warn!(position, "Skipping visualization entry that is not an object");
            continue;
        };
        charts.push(normalize_chart(descriptor, charts.len() + 1, rules));
    }
    charts
}

fn normalize_chart(descriptor: &Map<String, Value>, ordinal: usize, rules: &Rules) -> NormalizedChart {
    let raw_type = type_text(descriptor.get("type"));
    let chart_type = resolve_chart_type(rules, &raw_type);
    let x = pick_field(descriptor.get("x"), &rules.fallbacks.x);
    let y = pick_field(descriptor.get("y"), &rules.fallbacks.y);
    let description = string_or_empty(descriptor.get("description"));
    let confidence = text::score(&rules.text_scoring, chart_type, &x, &y, &description);

    NormalizedChart {
        id: format!("v{ordinal}"),
        chart_type,
        title: string_or_empty(descriptor.get("title")),
        description,
        context: text::generate_context(chart_type, &y),
        x,
        y,
        color: descriptor
            .get("color")
            .and_then(Value::as_str)
            .map(str::to_string),
        aggregation: descriptor
            .get("aggregation")
            .and_then(Value::as_str)
            .map_or_else(|| "none".to_string(), str::to_string),
        interactions: interactions(descriptor.get("interactions"), rules),
        confidence: confidence.confidence,
        confidence_label: confidence.label,
        confidence_reason: confidence.reason,
    }
}

/// Coerces a field reference to a single string: first element of a
/// non-empty list, a string as is, otherwise `fallback`.
pub fn pick_field(value: Option<&Value>, fallback: &str) -> String {
    match value {
        Some(Value::Array(items)) if !items.is_empty() => scalar_text(&items[0]),
        Some(Value::String(s)) => s.clone(),
        _ => fallback.to_string(),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn type_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .map(scalar_text)
            .collect::<Vec<_>>()
            .join(" "),
        _ => String::new(),
    }
}

fn string_or_empty(value: Option<&Value>) -> String {
    value.and_then(Value::as_str).unwrap_or_default().to_string()
}

fn interactions(value: Option<&Value>, rules: &Rules) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => rules.default_interactions.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart_type::ChartType;
    use crate::confidence::ConfidenceLabel;
    use serde_json::json;

    #[test]
    fn test_pick_field_shapes() {
        assert_eq!(pick_field(Some(&json!(["age", "city"])), "Date"), "age");
        assert_eq!(pick_field(Some(&json!([42])), "Date"), "42");
        assert_eq!(pick_field(Some(&json!("city")), "Date"), "city");
        assert_eq!(pick_field(Some(&json!([])), "Date"), "Date");
        assert_eq!(pick_field(Some(&Value::Null), "Value"), "Value");
        assert_eq!(pick_field(Some(&json!({"a": 1})), "Value"), "Value");
        assert_eq!(pick_field(None, "Value"), "Value");
    }

    #[test]
    fn test_insight_shapes() {
        let raw = json!({
            "insights": ["Plain", {"description": "From object"}, "", null, 7, {"title": "no description"}]
        });
        assert_eq!(normalize_insights(&raw), vec!["Plain", "From object"]);
        assert_eq!(normalize_insights(&json!({"insights": "Only one"})), vec!["Only one"]);
        assert!(normalize_insights(&json!({})).is_empty());
    }

    #[test]
    fn test_chart_repair() {
        let raw = json!({
            "visualizations": [
                {"type": "Line_Chart", "x": ["Date"], "y": "Revenue", "title": "Revenue"},
                "not a chart",
                {"type": "scatter plot", "x": null, "interactions": ["zoom", 3]},
            ]
        });
        let plan = normalize(&raw, &Rules::default());
        assert_eq!(plan.visualizations.len(), 2);

        let first = &plan.visualizations[0];
        assert_eq!(first.id, "v1");
        assert_eq!(first.chart_type, ChartType::Line);
        assert_eq!(first.x, "Date");
        assert_eq!(first.confidence, 0.8);
        assert_eq!(first.confidence_label, ConfidenceLabel::High);
        assert_eq!(first.aggregation, "none");
        assert_eq!(first.interactions, vec!["hover", "filter"]);
        assert_eq!(first.context[0], "Shows how revenue change over time.");

        let second = &plan.visualizations[1];
        assert_eq!(second.id, "v2");
        assert_eq!(second.chart_type, ChartType::Bar);
        assert_eq!((second.x.as_str(), second.y.as_str()), ("Date", "Value"));
        assert_eq!(second.interactions, vec!["zoom"]);
        assert_eq!(second.color, None);
    }

    #[test]
    fn test_non_object_root_yields_empty_plan() {
        assert!(normalize(&json!([1, 2, 3]), &Rules::default()).is_empty());
        assert!(normalize(&json!({"visualizations": "line"}), &Rules::default()).is_empty());
    }
}
