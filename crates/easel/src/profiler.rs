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

use crate::table::{ColumnKind, DataTable};
use chrono::{DateTime, Utc};
use polars::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

const MAX_DESCRIBED_COLUMNS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericStats {
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalStats {
    pub min_date: Option<String>,
    pub max_date: Option<String>,
    pub date_range_days: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub name: String,
    pub kind: ColumnKind,
    pub dtype: String,
    pub non_null_count: usize,
    pub missing_count: usize,
    pub distinct_count: Option<usize>,
    pub numeric_stats: Option<NumericStats>,
    pub temporal_stats: Option<TemporalStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetProfile {
    pub rows: usize,
    pub columns: Vec<ColumnProfile>,
}

/// Per-column summary of `table`, computed in parallel and returned in
/// column order.
pub fn profile(table: &DataTable) -> DatasetProfile {
    let names = table.column_names();
    let columns = names
        .par_iter()
        .filter_map(|name| profile_column(table, name))
        .collect();
    DatasetProfile {
        rows: table.height(),
        columns,
    }
}

fn profile_column(table: &DataTable, name: &str) -> Option<ColumnProfile> {
    let series = table.series(name)?;
    let kind = ColumnKind::of(series.dtype());
    let missing_count = table.missing_count(name)?;
    let numeric_stats = kind
        .is_numeric()
        .then(|| numeric_stats(table, name))
        .flatten();
    let temporal_stats = kind
        .is_temporal()
        .then(|| temporal_stats(series))
        .flatten();
    Some(ColumnProfile {
        name: name.to_string(),
        kind,
        dtype: series.dtype().to_string(),
        non_null_count: series.len() - missing_count,
        missing_count,
        distinct_count: table.distinct_count(name),
        numeric_stats,
        temporal_stats,
    })
}

fn numeric_stats(table: &DataTable, name: &str) -> Option<NumericStats> {
    let values = table.numeric(name)?;
    Some(NumericStats {
        mean: values.mean(),
        std: table.std_dev(name),
        min: values.min(),
        max: values.max(),
    })
}

fn temporal_stats(series: &Series) -> Option<TemporalStats> {
    let millis = series
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
        .ok()?
        .cast(&DataType::Int64)
        .ok()?;
    let values = millis.i64().ok()?;
    let (min, max) = (values.min(), values.max());
    let render = |ms: Option<i64>| {
        ms.and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(|dt| dt.naive_utc().to_string())
    };
    Some(TemporalStats {
        min_date: render(min),
        max_date: render(max),
        date_range_days: min.zip(max).map(|(lo, hi)| (hi - lo) / 86_400_000),
    })
}

impl DatasetProfile {
    pub fn column(&self, name: &str) -> Option<&ColumnProfile> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn kind_counts(&self) -> (usize, usize, usize) {
        self.columns.iter().fold((0, 0, 0), |(n, c, t), column| match column.kind {
            ColumnKind::Numeric => (n + 1, c, t),
            ColumnKind::Categorical => (n, c + 1, t),
            ColumnKind::Temporal => (n, c, t + 1),
        })
    }

    /// Plain-text description of the dataset for the analysis prompt.
    pub fn summary_text(&self) -> String {
        let mut text = String::new();
        let _ = writeln!(text, "Rows: {}", self.rows);
        text.push_str("Columns and types:\n");
        for column in &self.columns {
            let _ = writeln!(text, "- {}: {}", column.name, column.dtype);
        }

        text.push_str("\nBasic statistics:\n");
        for column in self.columns.iter().take(MAX_DESCRIBED_COLUMNS) {
            let _ = writeln!(text, "{}", column.describe());
        }

        text.push_str("\nMissing values:\n");
        let missing: Vec<&ColumnProfile> =
            self.columns.iter().filter(|c| c.missing_count > 0).collect();
        if missing.is_empty() {
            text.push_str("No missing values");
        } else {
            let lines: Vec<String> = missing
                .iter()
                .map(|c| format!("{} {}", c.name, c.missing_count))
                .collect();
            text.push_str(&lines.join("\n"));
        }
        text
    }
}

impl ColumnProfile {
    fn describe(&self) -> String {
        let mut line = format!("{}: count={}", self.name, self.non_null_count);
        if let Some(distinct) = self.distinct_count {
            let _ = write!(line, " unique={distinct}");
        }
        if let Some(stats) = &self.numeric_stats {
            let fields = [
                ("mean", stats.mean),
                ("std", stats.std),
                ("min", stats.min),
                ("max", stats.max),
            ];
            for (label, value) in fields {
                if let Some(value) = value {
                    let _ = write!(line, " {label}={value:.3}");
                }
            }
        }
        if let Some(stats) = &self.temporal_stats {
            if let (Some(first), Some(last)) = (&stats.min_date, &stats.max_date) {
                let _ = write!(line, " first={first} last={last}");
            }
        }
        line
    }
}

impl std::fmt::Display for DatasetProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.summary_text())
    }
}
