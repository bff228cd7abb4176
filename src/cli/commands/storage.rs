use std::path::PathBuf;

use anyhow::Context;
use clap::Subcommand;
use futures::TryStreamExt;
use serde_json::json;
use tokio::io::AsyncWriteExt;

use crate::cli::utils::{format_size, output_error, output_success};
use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::storage::{candidate_endpoints, content_type_for, ObjectStore, S3ObjectStore};

#[derive(Subcommand)]
pub enum StorageCommands {
    #[command(about = "Try every candidate endpoint and report which one answers")]
    Probe,

    #[command(about = "List objects under a prefix")]
    Ls {
        #[arg(help = "Key prefix, e.g. arquivos/2025-10")]
        prefix: Option<String>,
    },

    #[command(about = "Download an object and report its size")]
    Get {
        #[arg(help = "Object key")]
        key: String,
        #[arg(long, short, help = "Write the object to this file")]
        output: Option<PathBuf>,
    },
}

pub async fn handle(cmd: StorageCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("loading configuration from environment")?;

    match cmd {
        StorageCommands::Probe => {
            let candidates = candidate_endpoints(&config.storage);
            let store = S3ObjectStore::connect(&config.storage).await?;
            if store.reachable() {
                output_success(
                    output_format,
                    &format!("Bucket '{}' reachable at {}", store.bucket(), store.endpoint()),
                    Some(json!({ "endpoint": store.endpoint(), "candidates": candidates })),
                )
            } else {
                output_error(
                    output_format,
                    &format!("No endpoint reachable (tried {})", candidates.join(", ")),
                    Some("STORAGE_UNREACHABLE"),
                )?;
                anyhow::bail!("object store unreachable")
            }
        }
        StorageCommands::Ls { prefix } => {
            let store = S3ObjectStore::connect(&config.storage).await?;
            let objects = store.list_objects(prefix.as_deref().unwrap_or_default()).await?;
            match output_format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&json!({ "data": objects }))?);
                }
                OutputFormat::Text => {
                    for object in &objects {
                        println!(
                            "{:>10}  {}  {}",
                            format_size(object.size.max(0) as u64),
                            object.last_modified.as_deref().unwrap_or("-"),
                            object.key
                        );
                    }
                    println!("{} object(s)", objects.len());
                }
            }
            Ok(())
        }
        StorageCommands::Get { key, output } => {
            let store = S3ObjectStore::connect(&config.storage).await?;
            let object = store.get_object(&key).await?;

            let mut file = match &output {
                Some(path) => Some(
                    tokio::fs::File::create(path)
                        .await
                        .with_context(|| format!("creating {}", path.display()))?,
                ),
                None => None,
            };

            let mut total: u64 = 0;
            let mut body = object.body;
            while let Some(chunk) = body.try_next().await? {
                total += chunk.len() as u64;
                if let Some(file) = file.as_mut() {
                    file.write_all(&chunk).await?;
                }
            }
            if let Some(file) = file.as_mut() {
                file.flush().await?;
            }

            output_success(
                output_format,
                &format!("{} ({}, {})", key, content_type_for(&key), format_size(total)),
                Some(json!({ "key": key, "bytes": total, "contentType": content_type_for(&key) })),
            )
        }
    }
}
