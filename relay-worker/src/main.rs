use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use lambda_runtime::{run, service_fn, LambdaEvent};
use relay_core::{wait_for_service, Config, Worker};
use serde_json::Value;
use tracing::info;

// Command line arguments; defaults match the pod image this worker ships in.
#[derive(Parser, Debug)]
#[command(author, version, about = "Serverless relay worker for Stable Diffusion WebUI txt2img")]
struct Args {
    /// Base URL of the WebUI API
    #[arg(long, default_value = relay_core::config::DEFAULT_API_BASE)]
    api_base: String,

    /// Directory the WebUI loads LoRA weights from
    #[arg(long, default_value = relay_core::config::DEFAULT_LORA_DIR)]
    lora_dir: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();
    let config = Config {
        api_base: args.api_base,
        lora_dir: args.lora_dir,
        ..Config::default()
    };

    let worker = Arc::new(Worker::new(&config)?);

    // Gate on the WebUI before taking any jobs. This blocks for as long as
    // the service takes to come up; the platform's own deadline applies.
    wait_for_service(worker.http(), &config.txt2img_url(), &config).await?;
    info!("WebUI API is ready, starting handler");

    run(service_fn(move |event: LambdaEvent<Value>| {
        let worker = worker.clone();
        async move {
            worker
                .handle(&event.payload)
                .await
                .map_err(lambda_runtime::Error::from)
        }
    }))
    .await
    .map_err(|e| anyhow::anyhow!(e))
}
