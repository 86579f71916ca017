use clap::{Parser, Subcommand};
use lib::backend::MemoryBackend;
use lib::channels::{MsgId, OutgoingMsg, Urn};
use lib::gateway::GatewayState;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "relay")]
#[command(about = "Relay CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Run the webhook gateway. Every channel in the config is validated and served at /c/{type}/{uuid}/receive.
    Gateway {
        /// Config file path (default: RELAY_CONFIG_PATH or ~/.relay/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// HTTP port (default from config or 15151)
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Send one message through a configured channel and print the resulting status as JSON.
    Send {
        /// Config file path (default: RELAY_CONFIG_PATH or ~/.relay/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// UUID of the channel to send through.
        #[arg(long, value_name = "UUID")]
        channel: uuid::Uuid,

        /// Destination URN, e.g. rocketchat:GENERAL
        #[arg(long)]
        urn: String,

        /// Message id reported back with the status.
        #[arg(long, default_value_t = 1)]
        id: i64,

        /// Request deadline in seconds (0 disables; default from config).
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,

        /// Message text.
        text: String,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("relay {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Gateway { config, port }) => {
            if let Err(e) = run_gateway(config, port).await {
                log::error!("gateway failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Send {
            config,
            channel,
            urn,
            id,
            timeout,
            text,
        }) => match run_send(config, channel, &urn, id, timeout, text).await {
            Ok(true) => {}
            Ok(false) => std::process::exit(2),
            Err(e) => {
                log::error!("send failed: {:#}", e);
                std::process::exit(1);
            }
        },
        None => {
            println!("Run with --help for usage");
        }
    }
}

async fn run_gateway(
    config_path: Option<std::path::PathBuf>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let (mut config, path) = lib::config::load_config(config_path)?;
    if let Some(p) = port {
        config.gateway.port = p;
    }
    log::info!(
        "starting gateway on {}:{} (config {})",
        config.gateway.bind,
        config.gateway.port,
        path.display()
    );
    lib::gateway::run_gateway(config).await
}

/// Returns whether the message was wired.
async fn run_send(
    config_path: Option<std::path::PathBuf>,
    channel: uuid::Uuid,
    urn: &str,
    id: i64,
    timeout: Option<u64>,
    text: String,
) -> anyhow::Result<bool> {
    let (mut config, _) = lib::config::load_config(config_path)?;
    if let Some(secs) = timeout {
        config.rocketchat.request_timeout_secs = secs;
    }
    let urn = Urn::parse(urn)?;
    let state = GatewayState::from_config(config, Arc::new(MemoryBackend::new())).await?;

    let msg = OutgoingMsg::new(MsgId(id), channel, urn, text);
    let outcome = state.send(&msg).await?;
    println!("{}", serde_json::to_string_pretty(&outcome.status)?);
    if let Some(e) = &outcome.error {
        eprintln!("error: {}", e);
    }
    Ok(outcome.error.is_none())
}
