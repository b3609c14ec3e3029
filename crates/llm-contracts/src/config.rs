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

use crate::types::{LLMError, LLMResult, Provider};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Models used by the analyst. The analysis role fills a JSON template and
/// runs deterministic; the explain role writes prose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default = "default_analysis_role")]
    pub analysis: ModelRole,
    #[serde(default = "default_explain_role")]
    pub explain: ModelRole,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRole {
    pub model: String,
    pub temperature: f32,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_provider")]
    pub kind: Provider,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_provider() -> Provider {
    Provider::Ollama
}
fn default_base_url() -> String {
    "http://localhost:11434".to_string()
}
fn default_timeout_seconds() -> u64 {
    120
}
fn default_max_retries() -> u32 {
    2
}
fn default_analysis_role() -> ModelRole {
    ModelRole {
        model: "llama3:latest".to_string(),
        temperature: 0.0,
        max_tokens: None,
    }
}
fn default_explain_role() -> ModelRole {
    ModelRole {
        model: "llama3:latest".to_string(),
        temperature: 0.3,
        max_tokens: None,
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: default_provider(),
            base_url: default_base_url(),
            timeout_seconds: default_timeout_seconds(),
            max_retries: default_max_retries(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            analysis: default_analysis_role(),
            explain: default_explain_role(),
        }
    }
}

impl ModelConfig {
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> LLMResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            LLMError::Configuration(format!(
                "Failed to read model config '{}': {e}",
                path.display()
            ))
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> LLMResult<Self> {
        let config: Self = serde_yaml::from_str(content)
            .map_err(|e| LLMError::Configuration(format!("Invalid model config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> LLMResult<()> {
        for (name, role) in [("analysis", &self.analysis), ("explain", &self.explain)] {
            if role.model.trim().is_empty() {
                return Err(LLMError::Configuration(format!(
                    "{name} model name must not be empty"
                )));
            }
            if !(0.0..=2.0).contains(&role.temperature) {
                return Err(LLMError::Configuration(format!(
                    "{name} temperature must be between 0.0 and 2.0"
                )));
            }
        }
        if self.provider.timeout_seconds == 0 {
            return Err(LLMError::Configuration(
                "provider timeout_seconds must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = ModelConfig::from_yaml_str("analysis:\n  model: mistral\n  temperature: 0.1\n")
            .unwrap();
        assert_eq!(config.analysis.model, "mistral");
        assert_eq!(config.explain, ModelConfig::default().explain);
        assert_eq!(config.provider.base_url, "http://localhost:11434");
    }

    #[test]
    fn test_rejects_out_of_range_temperature() {
        let result = ModelConfig::from_yaml_str("explain:\n  model: llama3\n  temperature: 4.0\n");
        assert!(matches!(result, Err(LLMError::Configuration(_))));
    }
}
