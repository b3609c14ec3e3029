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

use easel::{ChartType, ConfidenceLabel, DataTable, Pipeline, Rules};
use polars::prelude::*;
use serde_json::{json, Value};
use std::io::Write;

fn people() -> DataTable {
    let cities: Vec<String> = (0..20).map(|i| format!("city_{i}")).collect();
    let ages: Vec<f64> = (0..20).map(|i| 18.0 + f64::from(i) * 2.5).collect();
    DataTable::from_dataframe(df! { "age" => ages, "city" => cities }.unwrap()).unwrap()
}

const REPLY: &str = r#"Sure! Here is the filled template:
```json
{
  "insights": ["Most people are under 40", {"description": "Cities are evenly represented"}],
  "visualizations": [
    {"type": "histogram", "title": "Age", "description": "Age spread.", "x": "age", "y": "count",
     "aggregation": "count"},
    {"type": "pie_chart", "title": "Cities", "description": "Share by city.", "x": ["city"], "y": null},
    {"type": "line", "title": "Ghost", "description": "Missing column.", "x": "nonexistent_col", "y": "age"}
  ]
}
```
Let me know if you need anything else."#;

#[test]
fn test_full_run_over_fenced_reply() {
    let report = Pipeline::new().run(REPLY, &people()).unwrap();

    assert_eq!(
        report.insights,
        vec!["Most people are under 40", "Cities are evenly represented"]
    );
    assert_eq!(report.charts.len(), 2);
    assert_eq!(report.data.len(), 20);

    let histogram = serde_json::to_value(&report.charts[0]).unwrap();
    assert_eq!(histogram["mark"], json!({"type": "bar"}));
    assert_eq!(histogram["encoding"]["x"]["bin"], json!(true));
    assert_eq!(histogram["encoding"]["x"]["field"], json!("age"));
    assert_eq!(histogram["encoding"]["x"]["title"], json!("age (years)"));
    assert_eq!(histogram["encoding"]["y"]["aggregate"], json!("count"));
    assert_eq!(histogram["confidence"], json!(1.0));
    assert_eq!(histogram["confidence_label"], json!("High"));
    assert_eq!(
        histogram["context"],
        json!(["Age spread.", "This chart highlights patterns derived from the uploaded dataset."])
    );
}

#[test]
fn test_pie_with_many_categories_is_penalised() {
    let report = Pipeline::new().run(REPLY, &people()).unwrap();
    let pie = &report.charts[1];
    assert!(pie.confidence <= 0.75);
    assert_eq!(pie.confidence_label, ConfidenceLabel::Medium);
    assert!(pie
        .confidence_reasons
        .contains(&"Too many categories for a pie chart".to_string()));
    assert!(pie.confidence_reasons.len() <= 3);
}

#[test]
fn test_chart_with_missing_x_is_dropped() {
    let pipeline = Pipeline::new();
    let plan = pipeline.extract_and_normalize(REPLY).unwrap();
    assert_eq!(plan.visualizations.len(), 3);
    assert_eq!(plan.visualizations[2].chart_type, ChartType::Line);

    let charts = pipeline.ground(&plan, &people());
    let descriptions: Vec<&str> = charts.iter().map(|c| c.description.as_str()).collect();
    assert_eq!(descriptions, vec!["Age spread.", "Share by city."]);
}

#[test]
fn test_normalizing_canonical_plan_is_stable() {
    let pipeline = Pipeline::new();
    let first = pipeline.extract_and_normalize(REPLY).unwrap();
    let again = pipeline.normalize(&serde_json::to_value(&first).unwrap());
    for (a, b) in first.visualizations.iter().zip(&again.visualizations) {
        assert_eq!((a.chart_type, &a.x, &a.y), (b.chart_type, &b.x, &b.y));
        assert_eq!(a.id, b.id);
        assert_eq!(a.confidence, b.confidence);
        assert_eq!(a.context, b.context);
    }
    assert_eq!(first.insights, again.insights);
}

#[test]
fn test_csv_loading_coerces_and_exports_nulls() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "day,sales,region").unwrap();
    writeln!(file, "2024-01-01,10.5,North").unwrap();
    writeln!(file, "2024-01-02,,South").unwrap();
    writeln!(file, "2024-01-03,7.25,North").unwrap();
    file.flush().unwrap();

    let table = DataTable::from_csv(file.path()).unwrap();
    assert_eq!(table.height(), 3);
    assert_eq!(table.kind("day"), Some(easel::ColumnKind::Temporal));
    assert_eq!(table.kind("sales"), Some(easel::ColumnKind::Numeric));

    let records = table.to_records();
    assert_eq!(records[1]["sales"], Value::Null);
    assert_eq!(records[0]["region"], json!("North"));

    let reply = r#"{"visualizations": [{"type": "trend", "x": "day", "y": "sales"}]}"#;
    let report = Pipeline::new().run(reply, &table).unwrap();
    let line = &report.charts[0];
    assert_eq!(line.encoding.x.as_ref().unwrap().field_type, easel::vegalite::FieldType::Temporal);
    assert!(line
        .confidence_reasons
        .contains(&"Line chart fits temporal trend".to_string()));
}

#[test]
fn test_non_finite_values_export_as_null() {
    let table = DataTable::from_dataframe(
        df! { "ratio" => &[1.0, f64::NAN, f64::INFINITY] }.unwrap(),
    )
    .unwrap();
    let rows = table.to_records();
    assert_eq!(rows[0]["ratio"], json!(1.0));
    assert_eq!(rows[1]["ratio"], Value::Null);
    assert_eq!(rows[2]["ratio"], Value::Null);
    assert!(serde_json::to_string(&rows).is_ok());
}

#[test]
fn test_shipped_rules_match_defaults() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../config/chart_rules.yml");
    let rules = Rules::from_yaml_file(path).unwrap();
    assert_eq!(rules, Rules::default());
}

#[test]
fn test_extraction_error_surfaces() {
    let err = Pipeline::new().run("I could not find any charts.", &people());
    assert!(matches!(
        err,
        Err(easel::EaselError::Extraction(easel::ExtractionError::MissingOpeningBrace))
    ));
}
