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

use crate::error::{DataError, DataResult};
use crate::rules::Rules;
use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

/// Coarse semantic class of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ColumnKind {
    Numeric,
    Categorical,
    Temporal,
}

impl ColumnKind {
    pub fn of(dtype: &DataType) -> Self {
        if dtype.is_temporal() {
            ColumnKind::Temporal
        } else if dtype.is_primitive_numeric() {
            ColumnKind::Numeric
        } else {
            ColumnKind::Categorical
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnKind::Numeric)
    }
    pub fn is_temporal(&self) -> bool {
        matches!(self, ColumnKind::Temporal)
    }
}

/// The uploaded dataset. Read-only once constructed.
#[derive(Debug, Clone)]
pub struct DataTable {
    frame: DataFrame,
}

impl DataTable {
    pub fn from_csv<P: AsRef<Path>>(path: P) -> DataResult<Self> {
        Self::from_csv_with_rules(path, &Rules::default())
    }

    pub fn from_csv_with_rules<P: AsRef<Path>>(path: P, rules: &Rules) -> DataResult<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let df = CsvReader::new(file)
            .finish()
            .map_err(|source| DataError::DataFileError {
                path: path.display().to_string(),
                source,
            })?;
        info!(
            path = %path.display(),
            rows = df.height(),
            columns = df.width(),
            "Loaded dataset"
        );
        Self::from_dataframe_with_rules(df, rules)
    }

    pub fn from_dataframe(df: DataFrame) -> DataResult<Self> {
        Self::from_dataframe_with_rules(df, &Rules::default())
    }

    /// Wraps `df`, coercing string columns that are entirely numeric or
    /// entirely parseable as dates.
    pub fn from_dataframe_with_rules(mut df: DataFrame, rules: &Rules) -> DataResult<Self> {
        if df.width() == 0 {
            return Err(DataError::EmptyDataset);
        }
        let mut replacements = Vec::new();
        for column in df.get_columns() {
            let series = column.as_materialized_series();
            if let Some(coerced) = coerce_string_column(series, &rules.temporal_formats)? {
                replacements.push(coerced);
            }
        }
        for series in replacements {
            debug!(column = %series.name(), dtype = %series.dtype(), "Coerced string column");
            df.with_column(series)?;
        }
        Ok(Self { frame: df })
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn width(&self) -> usize {
        self.frame.width()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .collect()
    }

    pub fn series(&self, name: &str) -> Option<&Series> {
        self.frame
            .column(name)
            .ok()
            .map(|column| column.as_materialized_series())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.series(name).is_some()
    }

    /// A field reference is valid when it names a column holding at least
    /// one non-missing value. NaN counts as missing.
    pub fn is_valid_field(&self, field: Option<&str>) -> bool {
        field.is_some_and(|name| self.non_missing_count(name).is_some_and(|n| n > 0))
    }

    pub fn non_missing_count(&self, name: &str) -> Option<usize> {
        let series = self.series(name)?;
        if series.dtype().is_float() {
            return self.numeric(name).map(|floats| floats.len());
        }
        Some(series.len() - series.null_count())
    }

    pub fn missing_count(&self, name: &str) -> Option<usize> {
        Some(self.series(name)?.len() - self.non_missing_count(name)?)
    }

    pub fn kind(&self, name: &str) -> Option<ColumnKind> {
        self.series(name).map(|s| ColumnKind::of(s.dtype()))
    }

    /// Sample standard deviation (ddof 1). `None` for non-numeric columns and
    /// whenever the statistic is undefined.
    pub fn std_dev(&self, name: &str) -> Option<f64> {
        self.numeric(name)?.std(1).filter(|std| std.is_finite())
    }

    /// Non-missing values of a numeric column as Float64, NaN removed.
    pub fn numeric(&self, name: &str) -> Option<Float64Chunked> {
        let series = self.series(name)?;
        if !ColumnKind::of(series.dtype()).is_numeric() {
            return None;
        }
        let floats = series.cast(&DataType::Float64).ok()?.drop_nulls();
        let floats = floats.f64().ok()?;
        floats.filter(&floats.is_not_nan()).ok()
    }

    /// Distinct non-missing values.
    pub fn distinct_count(&self, name: &str) -> Option<usize> {
        self.series(name)?.drop_nulls().n_unique().ok()
    }

    /// Rows as JSON objects, column order preserved. Non-finite floats become
    /// `null` so the result is always serialisable.
    pub fn to_records(&self) -> Vec<Map<String, Value>> {
        let columns: Vec<&Series> = self
            .frame
            .get_columns()
            .iter()
            .map(|c| c.as_materialized_series())
            .collect();
        (0..self.frame.height())
            .map(|idx| {
                columns
                    .iter()
                    .map(|series| {
                        let value = series.get(idx).unwrap_or(AnyValue::Null);
                        (series.name().to_string(), any_to_json(value))
                    })
                    .collect()
            })
            .collect()
    }
}

fn float_to_json(value: f64) -> Value {
    Number::from_f64(value).map_or(Value::Null, Value::Number)
}

fn any_to_json(value: AnyValue) -> Value {
    match value {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(b) => Value::Bool(b),
        AnyValue::String(s) => Value::String(s.to_string()),
        AnyValue::StringOwned(s) => Value::String(s.to_string()),
        AnyValue::Int8(v) => Value::from(v),
        AnyValue::Int16(v) => Value::from(v),
        AnyValue::Int32(v) => Value::from(v),
        AnyValue::Int64(v) => Value::from(v),
        AnyValue::UInt8(v) => Value::from(v),
        AnyValue::UInt16(v) => Value::from(v),
        AnyValue::UInt32(v) => Value::from(v),
        AnyValue::UInt64(v) => Value::from(v),
        AnyValue::Float32(v) => float_to_json(f64::from(v)),
        AnyValue::Float64(v) => float_to_json(v),
        other => Value::String(other.to_string()),
    }
}

fn coerce_string_column(series: &Series, formats: &[String]) -> DataResult<Option<Series>> {
    if !matches!(series.dtype(), DataType::String) {
        return Ok(None);
    }
    let non_null = series.len() - series.null_count();
    if non_null == 0 {
        return Ok(None);
    }
    let as_float = series.cast(&DataType::Float64)?;
    if as_float.null_count() == series.null_count() {
        return Ok(Some(as_float));
    }
    let values: Vec<Option<&str>> = series.str()?.into_iter().collect();
    for format in formats {
        let parsed: Vec<Option<i64>> = values
            .iter()
            .map(|v| v.and_then(|s| parse_timestamp_millis(s.trim(), format)))
            .collect();
        let parsed_count = parsed.iter().filter(|v| v.is_some()).count();
        if parsed_count == non_null {
            let millis = Series::new(series.name().clone(), parsed);
            let temporal =
                millis.cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;
            return Ok(Some(temporal));
        }
    }
    Ok(None)
}

fn parse_timestamp_millis(value: &str, format: &str) -> Option<i64> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
        return Some(dt.and_utc().timestamp_millis());
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, format) {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis());
    }
    None
}
