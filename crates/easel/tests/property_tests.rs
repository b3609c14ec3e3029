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

use easel::confidence::text;
use easel::normalizer::normalize;
use easel::{extract, infer_chart_type, ChartType, Rules};
use proptest::prelude::*;
use serde_json::{json, Value};

fn arb_json() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i32>().prop_map(|n| json!(n)),
        "[a-z_ ]{0,12}".prop_map(Value::String),
        prop::sample::select(vec!["line_chart", "pie", "histogram", "map", "Date", "age"])
            .prop_map(|s| Value::String(s.to_string())),
    ];
    leaf.prop_recursive(3, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..5).prop_map(Value::Array),
            prop::collection::vec(
                (
                    prop::sample::select(vec![
                        "type", "x", "y", "title", "description", "color", "aggregation",
                        "interactions", "insights", "visualizations",
                    ]),
                    inner,
                ),
                0..6,
            )
            .prop_map(|pairs| {
                Value::Object(pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
            }),
        ]
    })
}

proptest! {
    #[test]
    fn normalization_is_total(raw in arb_json()) {
        let rules = Rules::default();
        let plan = normalize(&raw, &rules);
        for (i, chart) in plan.visualizations.iter().enumerate() {
            prop_assert!(ChartType::ALL.contains(&chart.chart_type));
            prop_assert_eq!(&chart.id, &format!("v{}", i + 1));
            prop_assert!((0.0..=1.0).contains(&chart.confidence));
            prop_assert!(!chart.context.is_empty());
        }
        prop_assert!(plan.insights.iter().all(|s| !s.trim().is_empty()));
    }

    #[test]
    fn wrapped_objects_are_extracted(
        raw in arb_json(),
        prefix in "[a-zA-Z .:\n]{0,30}",
        suffix in "[a-zA-Z .:\n]{0,30}",
    ) {
        let object = json!({ "payload": raw });
        let text = format!("{prefix}```json\n{object}\n```{suffix}");
        prop_assert_eq!(extract(&text).unwrap(), object);
    }

    #[test]
    fn text_without_braces_fails(text in "[^{]{1,60}") {
        prop_assert!(extract(&text).is_err());
    }

    #[test]
    fn inference_is_total(text in ".{0,40}") {
        let rules = Rules::default();
        let inferred = infer_chart_type(&rules, &text);
        prop_assert!(ChartType::ALL.contains(&inferred));
        prop_assert_eq!(inferred, infer_chart_type(&rules, &text));
    }

    #[test]
    fn text_confidence_is_capped_and_monotone(
        x in "[a-z_]{0,12}",
        y in "[a-z_]{0,12}",
        chart_type in prop::sample::select(ChartType::ALL.to_vec()),
    ) {
        let rules = Rules::default().text_scoring;
        let plain = text::score(&rules, chart_type, &x, &y, "");
        prop_assert!(plain.confidence <= rules.cap);
        prop_assert!(plain.confidence >= rules.base);

        let richer_x = format!("{x}_date_category");
        let richer = text::score(&rules, chart_type, &richer_x, &y, "");
        prop_assert!(richer.confidence >= plain.confidence);
    }
}

#[test]
fn rule_order_decides_ambiguous_text() {
    let rules = Rules::default();
    assert_eq!(infer_chart_type(&rules, "Sales over time"), ChartType::Line);
    assert_eq!(infer_chart_type(&rules, ""), ChartType::Bar);
    assert_eq!(infer_chart_type(&rules, "regional distribution map"), ChartType::Histogram);
}
