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

use async_trait::async_trait;
use easel::agent::{EXPLANATION_FALLBACK, STRICT_GOAL};
use easel::{Analyst, DataTable, EaselError, ExtractionError};
use llm_contracts::{CompletionOracle, LLMError, LLMResult, ProviderRequest, ProviderResponse};
use polars::prelude::*;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Hands out scripted replies in order and records every prompt it saw.
struct ScriptedOracle {
    replies: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<(String, Option<f32>)>>,
}

impl ScriptedOracle {
    fn new(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| (*r).to_string()).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn prompts(&self) -> Vec<(String, Option<f32>)> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionOracle for ScriptedOracle {
    async fn complete(&self, request: ProviderRequest) -> LLMResult<ProviderResponse> {
        self.prompts
            .lock()
            .unwrap()
            .push((request.prompt().to_string(), request.generation.temperature));
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(LLMError::Exhausted)?;
        Ok(ProviderResponse::text(request.id, request.model, reply))
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }
}

fn sales() -> DataTable {
    DataTable::from_dataframe(
        df! {
            "month" => &["2024-01-01", "2024-02-01", "2024-03-01"],
            "revenue" => &[120.0, 180.0, 150.0],
            "product_type" => &["a", "b", "a"],
        }
        .unwrap(),
    )
    .unwrap()
}

const PLAN: &str = r#"{"insights": ["Revenue peaked in February"],
  "visualizations": [{"type": "line", "x": "month", "y": "revenue", "description": "Monthly revenue."}]}"#;

#[tokio::test]
async fn test_analyze_uses_profile_and_grounds_charts() {
    let analyst = Analyst::new(ScriptedOracle::new(&[PLAN]));
    let report = analyst.analyze(&sales()).await.unwrap();

    assert_eq!(report.insights, vec!["Revenue peaked in February"]);
    assert_eq!(report.charts.len(), 1);
    assert_eq!(report.data.len(), 3);
    assert_eq!(report.data[0]["revenue"], json!(120.0));
}

#[tokio::test]
async fn test_prompt_carries_summary_and_analysis_temperature() {
    let oracle = std::sync::Arc::new(ScriptedOracle::new(&[PLAN]));
    let analyst = Analyst::new(oracle.clone());
    analyst.analyze(&sales()).await.unwrap();

    let prompts = oracle.prompts();
    assert_eq!(prompts.len(), 1);
    let (prompt, temperature) = &prompts[0];
    assert!(prompt.contains("Rows: 3"));
    assert!(prompt.contains("- revenue: f64"));
    assert_eq!(*temperature, Some(0.0));
}

#[tokio::test]
async fn test_extraction_failure_retries_once_with_strict_goal() {
    let oracle = std::sync::Arc::new(ScriptedOracle::new(&["I think a bar chart works.", PLAN]));
    let analyst = Analyst::new(oracle.clone());
    let raw = analyst.propose("Rows: 3").await.unwrap();
    assert_eq!(raw["insights"][0], json!("Revenue peaked in February"));

    let prompts = oracle.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(!prompts[0].0.contains(STRICT_GOAL));
    assert!(prompts[1].0.contains(STRICT_GOAL));
}

#[tokio::test]
async fn test_second_extraction_failure_is_returned() {
    let oracle = std::sync::Arc::new(ScriptedOracle::new(&["no json", "still { no json", PLAN]));
    let analyst = Analyst::new(oracle.clone());
    let err = analyst.propose("Rows: 3").await.unwrap_err();
    assert!(matches!(
        err,
        EaselError::Extraction(ExtractionError::MissingClosingBrace)
    ));
    assert_eq!(oracle.prompts().len(), 2);
}

#[tokio::test]
async fn test_model_errors_propagate() {
    let analyst = Analyst::new(ScriptedOracle::new(&[]));
    let err = analyst.propose("Rows: 3").await.unwrap_err();
    assert!(matches!(err, EaselError::Model(LLMError::Exhausted)));
}

#[tokio::test]
async fn test_explainer_never_returns_json() {
    let oracle = std::sync::Arc::new(ScriptedOracle::new(&[
        "  {\"explanation\": \"high\"}",
        "[1, 2]",
        "  Paris sold the most units this month.  ",
    ]));
    let analyst = Analyst::new(oracle.clone());
    let point = json!({"city": "Paris", "units": 42});

    for _ in 0..2 {
        let text = analyst.explain("Units by city", &point).await.unwrap();
        assert_eq!(text, EXPLANATION_FALLBACK);
    }
    let text = analyst.explain("Units by city", &point).await.unwrap();
    assert_eq!(text, "Paris sold the most units this month.");

    let prompts = oracle.prompts();
    assert!(prompts[0].0.contains("Units by city"));
    assert_eq!(prompts[0].1, Some(0.3));
}
