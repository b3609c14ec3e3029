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

use llm_contracts::LLMError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EaselError {
    #[error("Model output extraction error: {0}")]
    Extraction(#[from] ExtractionError),
    #[error("Dataset error: {0}")]
    Data(#[from] DataError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Model invocation error: {0}")]
    Model(#[from] LLMError),
}

/// The one failure mode of reading a plan out of model text. Everything after
/// extraction is repaired rather than rejected.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Model output is empty")]
    EmptyInput,
    #[error("No opening '{{' found in model output")]
    MissingOpeningBrace,
    #[error("No closing '}}' found after the first '{{' in model output")]
    MissingClosingBrace,
    #[error("Extracted text is not valid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Error, Debug)]
pub enum DataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to read data file '{path}': {source}")]
    DataFileError {
        path: String,
        #[source]
        source: polars::error::PolarsError,
    },
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),
    #[error("Empty dataset provided")]
    EmptyDataset,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read rules file '{path}': {source}")]
    ConfigFileError {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse YAML configuration: {source}")]
    YamlParseError {
        #[from]
        source: serde_yaml::Error,
    },
    #[error("Invalid rules: {field} is out of range")]
    OutOfRange { field: String },
    #[error("Missing required configuration: {field}")]
    MissingRequiredConfig { field: String },
}

pub type Result<T> = std::result::Result<T, EaselError>;
pub type DataResult<T> = std::result::Result<T, DataError>;
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
