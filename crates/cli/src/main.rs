//! Online model server CLI
//!
//! A command-line tool for configuring the server flavor, managing the
//! active model, and exercising the predict/learn API.

mod client;
mod config;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client::{
    ApiClient, DeleteResponse, InitRequest, InitResponse, LearnRequest, LearnResponse,
    MetricReport, ModelResponse, PredictRequest, PredictResponse, StatusResponse,
};
use output::StatusRow;
use std::path::PathBuf;

/// Online model server CLI
#[derive(Parser)]
#[command(name = "oms")]
#[command(author, version, about = "CLI for the online model server", long_about = None)]
pub struct Cli {
    /// Server URL (can also be set via OMS_SERVER_URL env var)
    #[arg(long, env = "OMS_SERVER_URL")]
    pub server: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set the flavor; resets the model, metric, and pending samples
    Init {
        /// Flavor name (e.g. regression)
        flavor: String,
    },

    /// Upload a serialized model
    AddModel {
        /// Path to the model blob
        path: PathBuf,

        /// Name for the model; a default is picked if none is given
        #[arg(long)]
        name: Option<String>,
    },

    /// Download the active model
    DownloadModel {
        /// Output file path
        output: PathBuf,
    },

    /// Delete the named model
    DeleteModel {
        /// Model name
        name: String,
    },

    /// Request a prediction
    Predict {
        /// Features as a JSON object, e.g. '{"x": 1}'
        #[arg(long)]
        features: String,

        /// Sample id for deferred ground truth
        #[arg(long)]
        id: Option<String>,
    },

    /// Send ground truth to update the model
    Learn {
        /// Ground truth as a JSON value, e.g. 'true' or '3.5'
        #[arg(long)]
        ground_truth: String,

        /// Features as a JSON object; omit when an id was predicted
        #[arg(long)]
        features: Option<String>,

        /// Sample id of an earlier predict call
        #[arg(long)]
        id: Option<String>,
    },

    /// Show the running performance metric
    Metric,

    /// Show server status
    Status,
}

/// Ids typed on the command line stay strings unless they parse as JSON
/// scalars, matching what the API accepts.
fn parse_id(id: &str) -> serde_json::Value {
    serde_json::from_str(id).unwrap_or_else(|_| serde_json::Value::String(id.to_string()))
}

fn parse_json(label: &str, raw: &str) -> Result<serde_json::Value> {
    serde_json::from_str(raw).with_context(|| format!("Invalid JSON for {label}: {raw}"))
}

async fn run(cli: Cli) -> Result<()> {
    let server_url = config::resolve_server_url(cli.server);
    let client = ApiClient::new(&server_url)?;

    match cli.command {
        Commands::Init { flavor } => {
            let response: InitResponse = client.post("/api/init", &InitRequest { flavor }).await?;
            output::print_success(&format!("Flavor set to {}", response.flavor));
        }
        Commands::AddModel { path, name } => {
            let blob = std::fs::read(&path)
                .with_context(|| format!("Failed to read model from {}", path.display()))?;
            let route = match &name {
                Some(name) => format!("/api/model?name={name}"),
                None => "/api/model".to_string(),
            };
            let response: ModelResponse = client.post_blob(&route, blob).await?;
            output::print_success(&format!("{} has been added", response.name));
        }
        Commands::DownloadModel { output } => {
            let blob = client.get_bytes("/api/model").await?;
            std::fs::write(&output, blob)
                .with_context(|| format!("Failed to write model to {}", output.display()))?;
            output::print_success(&format!("Model written to {}", output.display()));
        }
        Commands::DeleteModel { name } => {
            let _: DeleteResponse = client.delete(&format!("/api/model?name={name}")).await?;
            output::print_success(&format!("{name} has been deleted"));
        }
        Commands::Predict { features, id } => {
            let request = PredictRequest {
                features: parse_json("features", &features)?,
                id: id.as_deref().map(parse_id),
            };
            let response: PredictResponse = client.post("/api/predict", &request).await?;
            output::print_json(&response.prediction);
            if response.status == "created" {
                output::print_info("Features cached pending ground truth");
            }
        }
        Commands::Learn {
            ground_truth,
            features,
            id,
        } => {
            let request = LearnRequest {
                ground_truth: parse_json("ground_truth", &ground_truth)?,
                features: features
                    .as_deref()
                    .map(|raw| parse_json("features", raw))
                    .transpose()?,
                id: id.as_deref().map(parse_id),
            };
            let _: LearnResponse = client.post("/api/learn", &request).await?;
            output::print_success("Model updated");
        }
        Commands::Metric => {
            let report: MetricReport = client.get("/api/metric").await?;
            output::print_json(&report);
        }
        Commands::Status => {
            let status: StatusResponse = client.get("/api/status").await?;
            let rows = vec![
                StatusRow {
                    field: "flavor",
                    value: status.flavor.unwrap_or_else(|| "unset".to_string()),
                },
                StatusRow {
                    field: "model",
                    value: status.model.unwrap_or_else(|| "unset".to_string()),
                },
                StatusRow {
                    field: "pending samples",
                    value: status.pending_samples.to_string(),
                },
                StatusRow {
                    field: "metric",
                    value: status
                        .metric
                        .map(|m| format!("{} = {:.6} (n = {})", m.kind, m.value, m.n))
                        .unwrap_or_else(|| "unset".to_string()),
                },
            ];
            output::print_status_table(rows);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        output::print_error(&format!("{err:#}"));
        std::process::exit(1);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_init_command() {
        let cli = Cli::try_parse_from(["oms", "init", "regression"]).unwrap();
        let Commands::Init { flavor } = cli.command else {
            panic!("expected init command");
        };
        assert_eq!(flavor, "regression");
    }

    #[test]
    fn parses_add_model_with_name() {
        let cli =
            Cli::try_parse_from(["oms", "add-model", "model.json", "--name", "probe"]).unwrap();
        let Commands::AddModel { path, name } = cli.command else {
            panic!("expected add-model command");
        };
        assert_eq!(path, PathBuf::from("model.json"));
        assert_eq!(name.as_deref(), Some("probe"));
    }

    #[test]
    fn parses_predict_with_id() {
        let cli = Cli::try_parse_from([
            "oms",
            "predict",
            "--features",
            r#"{"x": 1}"#,
            "--id",
            "90210",
        ])
        .unwrap();
        let Commands::Predict { features, id } = cli.command else {
            panic!("expected predict command");
        };
        assert_eq!(features, r#"{"x": 1}"#);
        assert_eq!(id.as_deref(), Some("90210"));
    }

    #[test]
    fn learn_requires_ground_truth() {
        assert!(Cli::try_parse_from(["oms", "learn", "--id", "42"]).is_err());
        assert!(Cli::try_parse_from(["oms", "learn", "--ground-truth", "true"]).is_ok());
    }

    #[test]
    fn server_flag_is_accepted_before_subcommand() {
        let cli = Cli::try_parse_from(["oms", "--server", "http://host:9","status"]).unwrap();
        assert_eq!(cli.server.as_deref(), Some("http://host:9"));
    }

    #[test]
    fn numeric_id_tokens_stay_numbers() {
        assert_eq!(parse_id("42"), serde_json::json!(42));
        assert_eq!(parse_id("abc"), serde_json::json!("abc"));
    }
}
