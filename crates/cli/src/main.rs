mod cli;

use std::io::Read;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use uuid::Uuid;

use mosaik_chunker::{ChunkingOutcome, ChunkingPipeline, ChunkingRequest};
use mosaik_core::chunk::CHUNK_ID_NAMESPACE;
use mosaik_core::config::{load_dotenv, Config};
use mosaik_llm::create_provider;

use crate::cli::CliArgs;

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();
    let mut config = Config::from_env();
    apply_overrides(&mut config, &args);
    config.log_summary();

    let text = read_input(args.input.as_deref())?;
    let document_id = args
        .document_id
        .unwrap_or_else(|| derive_document_id(args.input.as_deref()));

    let provider =
        create_provider(&config.llm, &config.ollama).context("failed to create LLM provider")?;
    config.chunking.oracle_model = provider.model().to_string();

    let pipeline = ChunkingPipeline::with_default_embedder(provider);
    let request = ChunkingRequest {
        document_id,
        text,
        config: config.chunking.clone(),
    };

    info!(%document_id, no_oracle = args.no_oracle, "starting chunking run");
    let result = if args.no_oracle {
        pipeline.split_only(request)
    } else {
        pipeline.run(request).await
    };

    let outcome = ChunkingOutcome::from_result(document_id, result);
    let json = if args.pretty {
        serde_json::to_string_pretty(&outcome)?
    } else {
        serde_json::to_string(&outcome)?
    };
    println!("{json}");

    if outcome.is_error() {
        std::process::exit(1);
    }
    Ok(())
}

fn apply_overrides(config: &mut Config, args: &CliArgs) {
    if let Some(provider) = &args.provider {
        config.llm.provider = provider.clone();
    }
    if let Some(model) = &args.model {
        match config.llm.provider.as_str() {
            "openai" => config.llm.openai_model = model.clone(),
            "anthropic" => config.llm.anthropic_model = model.clone(),
            _ => config.ollama.model = model.clone(),
        }
    }
    if let Some(concurrency) = args.concurrency {
        config.chunking.max_concurrent_reviews = concurrency.max(1);
    }
    if let Some(timeout) = args.timeout_secs {
        config.chunking.review_timeout_secs = timeout;
    }
    if let Some(target) = args.target_size {
        config.chunking.target_chunk_size = target;
    }
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) if path != "-" => {
            std::fs::read_to_string(path).with_context(|| format!("failed to read {path}"))
        }
        _ => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("failed to read stdin")?;
            Ok(text)
        }
    }
}

/// Stable document id for ad-hoc runs: derived from the input path so
/// re-chunking the same file yields the same ids.
fn derive_document_id(path: Option<&str>) -> Uuid {
    match path {
        Some(path) if path != "-" => Uuid::new_v5(&CHUNK_ID_NAMESPACE, path.as_bytes()),
        _ => Uuid::new_v4(),
    }
}
