mod config;
mod device;
mod directory;
mod error;
mod prompt;
mod provision;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use device::DeviceLink;
use directory::types::{BOARD_WIO_LINK_1_0, BOARD_WIO_NODE_1_0};
use directory::{Directory, DirectoryClient};
use prompt::ConsolePrompt;
use provision::{Provisioner, ProvisioningRequest};

#[derive(Parser)]
#[command(name = "wio-provision")]
#[command(about = "Provision Wio Link / Wio Node boards against a Wio server")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Provision a node end to end
    Prov {
        /// Name to register the node under
        #[arg(long)]
        name: String,
        /// Wio server host, e.g. us.wio.seeed.io
        #[arg(long)]
        server: String,
        /// Account email
        #[arg(long)]
        user: String,
        /// Account password (prompted for when omitted)
        #[arg(long)]
        password: Option<String>,
        /// SSID of the Wi-Fi network the node should join
        #[arg(long)]
        wifi_ssid: String,
        /// Password of that network (prompted for when omitted)
        #[arg(long)]
        wifi_password: Option<String>,
        /// Board type being provisioned
        #[arg(long, value_enum, default_value_t = Board::Node)]
        board: Board,
    },
    /// Remove a node registration from the server
    Delete {
        /// Wio server host, e.g. us.wio.seeed.io
        #[arg(long)]
        server: String,
        /// Account email
        #[arg(long)]
        user: String,
        /// Account password (prompted for when omitted)
        #[arg(long)]
        password: Option<String>,
        /// Serial number of the node to remove
        #[arg(long)]
        node_sn: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Board {
    Node,
    Link,
}

impl Board {
    fn api_name(self) -> &'static str {
        match self {
            Board::Node => BOARD_WIO_NODE_1_0,
            Board::Link => BOARD_WIO_LINK_1_0,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = config::Config::load(&cli.config).unwrap_or_else(|e| {
        eprintln!("Warning: Failed to load config from {:?}: {}", cli.config, e);
        eprintln!("Using default configuration");
        config::Config::default()
    });

    // Initialize tracing/logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .init();

    info!("wio-provision v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Prov {
            name,
            server,
            user,
            password,
            wifi_ssid,
            wifi_password,
            board,
        } => {
            let password = resolve_password(password, "Account password: ")?;
            let wifi_password =
                resolve_password(wifi_password, &format!("Password for \"{}\": ", wifi_ssid))?;

            let request = ProvisioningRequest {
                device_name: name,
                server_host: server,
                email: user,
                password,
                wifi_ssid,
                wifi_password,
                board: board.api_name().to_string(),
            };

            let device_addr: SocketAddr = config
                .device
                .address
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid device address in config: {}", e))?;
            let bind_addr: SocketAddr = config
                .device
                .bind
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid bind address in config: {}", e))?;
            let link = DeviceLink::new(device_addr, bind_addr).with_timing(
                Duration::from_millis(config.device.settle_ms),
                Duration::from_millis(config.device.exchange_timeout_ms),
            );

            let directory = DirectoryClient::new(&request.server_host);
            let mut provisioner = Provisioner::new(directory, link, ConsolePrompt::stdio())
                .with_poll_budget(
                    config.online.poll_attempts,
                    Duration::from_millis(config.online.poll_interval_ms),
                );

            let report = provisioner.run(&request).await?;
            println!(
                "Provisioned \"{}\" (sn {}), last seen {}.",
                report.name, report.node_sn, report.online
            );
        }
        Command::Delete {
            server,
            user,
            password,
            node_sn,
        } => {
            let password = resolve_password(password, "Account password: ")?;

            let client = DirectoryClient::new(&server);
            let session = client.login(&user, &password).await?;
            client.delete_node(&session, &node_sn).await?;
            println!("Deleted node {}.", node_sn);
        }
    }

    Ok(())
}

fn resolve_password(given: Option<String>, prompt: &str) -> anyhow::Result<String> {
    match given {
        Some(password) => Ok(password),
        None => Ok(rpassword::prompt_password(prompt)?),
    }
}
