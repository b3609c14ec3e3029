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

use crate::error::ExtractionError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

static JSON_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)```json").expect("fence pattern is valid"));

/// Recovers the single JSON object in free-form model output.
///
/// Code fences are removed textually, then the text between the first `{`
/// and the last `}` is parsed. This is not a parser: a stray brace inside a
/// string value before the real closing brace will mis-slice.
pub fn extract(text: &str) -> Result<Value, ExtractionError> {
    if text.trim().is_empty() {
        return Err(ExtractionError::EmptyInput);
    }
    let cleaned = strip_fences(text);
    let start = cleaned
        .find('{')
        .ok_or(ExtractionError::MissingOpeningBrace)?;
    let end = cleaned
        .rfind('}')
        .filter(|end| *end > start)
        .ok_or(ExtractionError::MissingClosingBrace)?;
    let candidate = &cleaned[start..=end];

    match serde_json::from_str::<Value>(candidate) {
        Ok(value) => {
            debug!(bytes = candidate.len(), "Extracted JSON object from model output");
            Ok(value)
        }
        Err(source) => {
            warn!(error = %source, "Model output slice failed to parse as JSON");
            Err(ExtractionError::InvalidJson { source })
        }
    }
}

fn strip_fences(text: &str) -> String {
    JSON_FENCE.replace_all(text, "").replace("```", "")
}
