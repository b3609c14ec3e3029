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

pub mod agent;
pub mod chart_type;
pub mod confidence;
pub mod error;
pub mod extract;
pub mod normalizer;
pub mod plan;
pub mod profiler;
pub mod rules;
pub mod table;
pub mod vegalite;

pub use agent::{AnalysisReport, Analyst};
pub use chart_type::{infer_chart_type, resolve_chart_type, ChartType};
pub use confidence::{ConfidenceLabel, GroundedConfidence, LabelThresholds, TextConfidence};
pub use error::{ConfigError, DataError, EaselError, ExtractionError, Result};
pub use extract::extract;
pub use plan::{NormalizedChart, VisualizationPlan};
pub use profiler::{profile, ColumnProfile, DatasetProfile};
pub use rules::Rules;
pub use table::{ColumnKind, DataTable};
pub use vegalite::ChartSpec;

use serde_json::Value;
use std::path::Path;
use tracing::debug;

/// Straight-line orchestration of extract, normalize and ground over one set
/// of rules. Holds no per-request state.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    rules: Rules,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(rules: Rules) -> Self {
        Self { rules }
    }

    pub fn from_rules_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::with_rules(Rules::from_yaml_file(path)?))
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    pub fn normalize(&self, raw: &Value) -> VisualizationPlan {
        normalizer::normalize(raw, &self.rules)
    }

    pub fn extract_and_normalize(&self, text: &str) -> Result<VisualizationPlan> {
        let raw = extract(text)?;
        Ok(self.normalize(&raw))
    }

    /// Chart specs for every chart of `plan` that can be grounded in `table`,
    /// in plan order.
    pub fn ground(&self, plan: &VisualizationPlan, table: &DataTable) -> Vec<ChartSpec> {
        plan.visualizations
            .iter()
            .filter_map(|chart| {
                let spec = vegalite::generate(chart, table, &self.rules);
                if spec.is_none() {
                    debug!(chart = %chart.id, "Dropped chart that could not be grounded");
                }
                spec
            })
            .collect()
    }

    pub fn run_value(&self, raw: &Value, table: &DataTable) -> AnalysisReport {
        let plan = self.normalize(raw);
        AnalysisReport {
            charts: self.ground(&plan, table),
            insights: plan.insights,
            data: table.to_records(),
        }
    }

    pub fn run(&self, text: &str, table: &DataTable) -> Result<AnalysisReport> {
        let raw = extract(text)?;
        Ok(self.run_value(&raw, table))
    }
}
