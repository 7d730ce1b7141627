use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "ptu-sentinel",
    about = "PTU Sentinel - provisioned throughput vs reservation reconciliation",
    version = env!("CARGO_PKG_VERSION"),
    author,
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[arg(short, long, env = "PTU_SENTINEL_PORT", default_value = "8046")]
    pub port: u16,

    #[arg(short, long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    #[arg(short, long, env = "PTU_SENTINEL_CONFIG", help = "Path to a JSON config file")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Start the Event Grid webhook server (default if no command specified)")]
    Serve {
        #[arg(short, long, env = "PTU_SENTINEL_PORT", default_value = "8046")]
        port: u16,
    },

    #[command(about = "Run one reconciliation pass for an account")]
    Check {
        #[arg(long, env = "AZURE_SUBSCRIPTION_ID", help = "Subscription id of the account")]
        subscription: String,

        #[arg(long, help = "Resource group of the account")]
        resource_group: String,

        #[arg(long, help = "Cognitive Services account (or ML workspace) name")]
        account: String,

        #[arg(long, help = "Deployment to report as the trigger")]
        deployment: Option<String>,

        #[arg(long, help = "Treat --account as a Machine Learning workspace")]
        workspace: bool,

        #[arg(long, help = "Scan every account in the subscription")]
        all_accounts: bool,

        #[arg(short, long, help = "Output as JSON")]
        json: bool,
    },

    #[command(about = "Run an Event Grid payload from disk through the pipeline")]
    Replay {
        #[arg(help = "Path to an Event Grid JSON payload")]
        file: PathBuf,

        #[arg(short, long, help = "Output as JSON")]
        json: bool,
    },
}
