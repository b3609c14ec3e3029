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

mod cli;
mod oracle;

use anyhow::{bail, Context, Result};
use clap::Parser;
use cli::{Args, Command};
use easel::{profile, Analyst, DataTable, Pipeline, Rules};
use llm_contracts::{CompletionOracle, ModelConfig, Provider};
use oracle::{OllamaOracle, ReplayOracle};
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(&args);

    if let Err(e) = run(args).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn init_logging(args: &Args) {
    let filter = match &args.log_level {
        Some(level) => EnvFilter::new(format!(
            "{},reqwest=warn,hyper=warn,hyper_util=warn",
            level.as_str()
        )),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn,hyper=warn,hyper_util=warn")),
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if args.json_logs {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(args: Args) -> Result<()> {
    let rules = match &args.rules {
        Some(path) => Rules::from_yaml_file(path)
            .with_context(|| format!("Failed to load rules from '{}'", path.display()))?,
        None => Rules::default(),
    };
    let models = match &args.model_config {
        Some(path) => ModelConfig::from_yaml_file(path)?,
        None => ModelConfig::default(),
    };

    match &args.command {
        Command::Analyze { data, response } => {
            let table = load_table(data, &rules)?;
            let analyst = Analyst::with_config(
                select_oracle(response.as_deref(), &models)?,
                models,
                Pipeline::with_rules(rules),
            );
            let report = analyst.analyze(&table).await?;
            print_json(&report, args.pretty)
        }
        Command::Profile { data } => {
            let table = load_table(data, &rules)?;
            println!("{}", profile(&table).summary_text());
            Ok(())
        }
        Command::Explain {
            description,
            point,
            response,
        } => {
            let point: serde_json::Value =
                serde_json::from_str(point).context("--point must be valid JSON")?;
            let analyst = Analyst::with_config(
                select_oracle(response.as_deref(), &models)?,
                models,
                Pipeline::with_rules(rules),
            );
            let explanation = analyst.explain(description, &point).await?;
            print_json(&serde_json::json!({ "explanation": explanation }), args.pretty)
        }
        Command::Normalize { response } => {
            let text = read_reply(response)?;
            let plan = Pipeline::with_rules(rules).extract_and_normalize(&text)?;
            print_json(&plan, args.pretty)
        }
    }
}

fn load_table(path: &Path, rules: &Rules) -> Result<DataTable> {
    let table = DataTable::from_csv_with_rules(path, rules)
        .with_context(|| format!("Failed to load dataset '{}'", path.display()))?;
    info!(rows = table.height(), columns = table.width(), "Dataset ready");
    Ok(table)
}

fn read_reply(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .with_context(|| format!("Failed to read model reply '{}'", path.display()))
}

/// A recorded reply passed with `--response` always wins over the configured provider.
fn select_oracle(replay: Option<&Path>, models: &ModelConfig) -> Result<Arc<dyn CompletionOracle>> {
    if let Some(path) = replay {
        return Ok(Arc::new(ReplayOracle::new(read_reply(path)?)));
    }
    match &models.provider.kind {
        Provider::Ollama => Ok(Arc::new(OllamaOracle::new(&models.provider)?)),
        Provider::Replay => bail!("Provider 'replay' needs a recorded reply via --response"),
        Provider::Custom(name) => bail!("Unsupported provider '{name}'"),
    }
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{rendered}");
    Ok(())
}
