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

//! Model-facing half of the system: prompt construction, the stricter-prompt
//! retry and the point explainer.

use crate::error::{EaselError, Result};
use crate::extract::extract;
use crate::profiler::profile;
use crate::table::DataTable;
use crate::vegalite::ChartSpec;
use crate::Pipeline;
use llm_contracts::{CompletionOracle, ModelConfig, ModelRole, ProviderRequest};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

pub const DEFAULT_GOAL: &str = "Analyze the dataset and propose the best visualizations";
pub const STRICT_GOAL: &str = "Return ONLY valid JSON. Do not explain. Do not summarize.";
pub const EXPLANATION_FALLBACK: &str = "This data point highlights a meaningful pattern in the chart. \
It represents a notable concentration within this category, which can help guide business decisions.";

const FILL_TEMPLATE: &str = r#"You MUST fill in the JSON template below.

RULES (ABSOLUTE):
- Do NOT add or remove keys
- Do NOT add explanations outside JSON
- Do NOT output text outside JSON
- Replace every <...> placeholder
- Use ONLY these chart types:
  line, bar, histogram, pie, map

IMPORTANT GUIDANCE:
- Choose charts that BEST match the data types
- The chart description MUST explain:
  1. What the chart shows
  2. Why this chart is appropriate
- Keep descriptions concise (1 sentence)

JSON TEMPLATE (FILL ALL FIELDS):

{
  "insights": [
    "<insight_1>",
    "<insight_2>",
    "<insight_3>"
  ],
  "visualizations": [
    {
      "type": "<line|bar|histogram|pie|map>",
      "title": "<short title>",
      "description": "<one sentence explaining what this chart shows and why it is appropriate>",
      "x": "<column name>",
      "y": "<column name>",
      "color": null,
      "aggregation": "none",
      "interactions": ["hover", "filter"]
    },
    {
      "type": "<line|bar|histogram|pie|map>",
      "title": "<short title>",
      "description": "<one sentence explaining what this chart shows and why it is appropriate>",
      "x": "<column name>",
      "y": "<column name>",
      "color": null,
      "aggregation": "none",
      "interactions": ["hover", "filter"]
    }
  ]
}
"#;

pub fn analysis_prompt(goal: &str, dataset_summary: &str) -> String {
    format!(
        "You are a senior data analyst designing charts for a modern analytics product.\n\n\
         USER GOAL:\n{goal}\n\n\
         DATASET SUMMARY (PLAIN TEXT, NOT JSON):\n<<<\n{dataset_summary}\n>>>\n\n\
         {FILL_TEMPLATE}"
    )
}

pub fn explanation_prompt(chart_description: &str, selected_point: &Value) -> String {
    format!(
        "You are explaining a data point to a non-technical business user.\n\n\
         Chart context:\n{chart_description}\n\n\
         Selected data point:\n{selected_point}\n\n\
         RULES (ABSOLUTE):\n\
         - DO NOT return JSON\n\
         - DO NOT use bullet points\n\
         - DO NOT mention schemas, templates, or fields\n\
         - DO NOT restate the chart title\n\
         - Write 2-3 short sentences ONLY\n\
         - Explain what this data point means in plain business language\n"
    )
}

/// Output of one full analysis request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub insights: Vec<String>,
    pub charts: Vec<ChartSpec>,
    pub data: Vec<Map<String, Value>>,
}

pub struct Analyst<O: CompletionOracle> {
    oracle: O,
    models: ModelConfig,
    pipeline: Pipeline,
}

impl<O: CompletionOracle> Analyst<O> {
    pub fn new(oracle: O) -> Self {
        Self::with_config(oracle, ModelConfig::default(), Pipeline::new())
    }

    pub fn with_config(oracle: O, models: ModelConfig, pipeline: Pipeline) -> Self {
        Self {
            oracle,
            models,
            pipeline,
        }
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    async fn ask(&self, role: &ModelRole, prompt: String) -> Result<String> {
        let request = ProviderRequest::for_role(role, prompt);
        debug!(
            request_id = %request.id,
            model = %request.model,
            provider = self.oracle.provider_name(),
            "Sending completion request"
        );
        let response = self.oracle.complete(request).await?;
        Ok(response.content)
    }

    /// Raw plan proposed for a dataset summary. One extraction failure is
    /// retried with a stricter goal; a second failure is returned.
    pub async fn propose(&self, dataset_summary: &str) -> Result<Value> {
        let text = self
            .ask(&self.models.analysis, analysis_prompt(DEFAULT_GOAL, dataset_summary))
            .await?;
        match extract(&text) {
            Ok(raw) => Ok(raw),
            Err(first) => {
                warn!(error = %first, "Model output had no usable JSON, retrying with strict prompt");
                let retry = self
                    .ask(&self.models.analysis, analysis_prompt(STRICT_GOAL, dataset_summary))
                    .await?;
                extract(&retry).map_err(EaselError::from)
            }
        }
    }

    /// Plain-language explanation of a selected point. Replies that look like
    /// JSON are replaced with a fixed sentence.
    pub async fn explain(&self, chart_description: &str, selected_point: &Value) -> Result<String> {
        let reply = self
            .ask(
                &self.models.explain,
                explanation_prompt(chart_description, selected_point),
            )
            .await?;
        let text = reply.trim();
        if text.starts_with('{') || text.starts_with('[') {
            warn!("Explainer returned structured output, using fallback sentence");
            return Ok(EXPLANATION_FALLBACK.to_string());
        }
        Ok(text.to_string())
    }

    #[instrument(skip(self, table), fields(request_id = %Uuid::new_v4(), rows = table.height()))]
    pub async fn analyze(&self, table: &DataTable) -> Result<AnalysisReport> {
        let summary = profile(table).summary_text();
        let raw = self.propose(&summary).await?;
        let report = self.pipeline.run_value(&raw, table);
        info!(
            insights = report.insights.len(),
            charts = report.charts.len(),
            "Analysis complete"
        );
        Ok(report)
    }
}
