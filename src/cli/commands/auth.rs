use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::output_success;
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Hash a password for a usuarios_viewer document")]
    Hash {
        #[arg(help = "Plain password")]
        password: String,
        #[arg(long, default_value_t = bcrypt::DEFAULT_COST, help = "bcrypt cost factor")]
        cost: u32,
    },
}

pub async fn handle(cmd: AuthCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        AuthCommands::Hash { password, cost } => {
            let hash = bcrypt::hash(&password, cost)?;
            match output_format {
                OutputFormat::Json => output_success(output_format, "Password hashed", Some(json!({ "hash": hash }))),
                OutputFormat::Text => {
                    println!("{}", hash);
                    Ok(())
                }
            }
        }
    }
}
