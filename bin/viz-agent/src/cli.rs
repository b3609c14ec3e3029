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

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "viz-agent")]
#[command(about = "Propose, repair and ground Vega-Lite charts for a CSV dataset")]
#[command(version)]
pub struct Args {
    #[arg(long, value_enum, global = true, help = "Set the logging level")]
    pub log_level: Option<LogLevel>,

    #[arg(long, global = true, help = "Emit logs as JSON lines on stderr")]
    pub json_logs: bool,

    #[arg(long, global = true, help = "Chart rules YAML file")]
    pub rules: Option<PathBuf>,

    #[arg(long, global = true, help = "Model configuration YAML file")]
    pub model_config: Option<PathBuf>,

    #[arg(long, global = true, help = "Pretty-print JSON output")]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Profile a dataset, ask the model for charts and ground them.
    Analyze {
        #[arg(long)]
        data: PathBuf,
        #[arg(long, help = "Replay the model reply from this file instead of calling the model")]
        response: Option<PathBuf>,
    },
    /// Print the dataset summary sent to the model.
    Profile {
        #[arg(long)]
        data: PathBuf,
    },
    /// Explain a selected data point in plain language.
    Explain {
        #[arg(long)]
        description: String,
        #[arg(long, help = "Selected point as JSON")]
        point: String,
        #[arg(long, help = "Replay the model reply from this file instead of calling the model")]
        response: Option<PathBuf>,
    },
    /// Extract and normalize a saved model reply without a dataset.
    Normalize {
        #[arg(long)]
        response: PathBuf,
    },
}

#[derive(clap::ValueEnum, Clone, Debug)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}
