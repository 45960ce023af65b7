use anyhow::{Context, Result};
use aqualink_client::CommandError;
use aqualink_core::{ConnectedDevice, DeviceStatus, DiscoveryConfig};
use aqualink_discovery::{
    AdvertSource, DiscoveredEndpoint, DiscoveryEngine, DiscoverySession, MdnsAdvertSource,
};
use aqualink_orchestrator::ConnectionOrchestrator;
use aqualink_registry::ConnectionRegistry;
use clap::{Parser, Subcommand};
use std::fs;
use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// AquaLink - discover and control AquaLuminus UV lights on the local network
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a YAML configuration file (defaults apply when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the discovery cascade and list what was found
    Discover,

    /// Discover and connect everything (post-setup flow)
    Connect,

    /// Restart advertisement discovery and reconnect
    ForceDiscover,

    /// Show network diagnostics
    Net,

    /// Turn a device's UV light on
    On { ip: IpAddr },

    /// Turn a device's UV light off
    Off { ip: IpAddr },

    /// Toggle a device's UV light
    Toggle { ip: IpAddr },

    /// Read a device's light state
    Status { ip: IpAddr },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("aqualink=info")),
        )
        .init();

    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;

    // Composition root: every collaborator is built here and injected
    let probe = Arc::new(aqualink_client::IdentityProbe::new(&config));
    let session = Arc::new(DiscoverySession::new());
    let source: Arc<dyn AdvertSource> = Arc::new(
        MdnsAdvertSource::new(&config.service_type).context("mDNS daemon unavailable")?,
    );
    let engine = Arc::new(
        DiscoveryEngine::new(
            config.clone(),
            Arc::clone(&probe),
            source,
            Arc::clone(&session),
        )
        .context("failed to build discovery engine")?,
    );
    let registry = Arc::new(ConnectionRegistry::new(Arc::clone(&probe), &config));
    let orchestrator = ConnectionOrchestrator::new(
        config.clone(),
        engine,
        Arc::clone(&session),
        Arc::clone(&registry),
    );

    match args.command {
        Command::Discover => {
            let endpoints = orchestrator.discover().await;
            print_endpoints(&endpoints);
            let snapshot = orchestrator.subscribe_session().borrow().clone();
            println!("{}", snapshot.status_message);
        }
        Command::Connect => {
            orchestrator
                .connect_after_setup()
                .await
                .context("connection after setup failed")?;
            print_devices(&orchestrator.connected_devices());
        }
        Command::ForceDiscover => {
            orchestrator
                .force_discovery()
                .await
                .context("forced discovery failed")?;
            print_devices(&orchestrator.connected_devices());
        }
        Command::Net => {
            println!(
                "on private network: {}",
                orchestrator.is_on_same_network()
            );
            println!(
                "network name:       {}",
                orchestrator
                    .current_network_name()
                    .unwrap_or_else(|| "unknown".to_string())
            );
        }
        Command::On { ip } => run_device_command(&registry, &config, ip, DeviceAction::On).await?,
        Command::Off { ip } => {
            run_device_command(&registry, &config, ip, DeviceAction::Off).await?;
        }
        Command::Toggle { ip } => {
            run_device_command(&registry, &config, ip, DeviceAction::Toggle).await?;
        }
        Command::Status { ip } => {
            run_device_command(&registry, &config, ip, DeviceAction::Status).await?;
        }
    }

    Ok(())
}

enum DeviceAction {
    On,
    Off,
    Toggle,
    Status,
}

async fn run_device_command(
    registry: &ConnectionRegistry,
    config: &DiscoveryConfig,
    ip: IpAddr,
    action: DeviceAction,
) -> Result<()> {
    let device = registry
        .connect(ip, config.device_port)
        .await
        .with_context(|| format!("no device at {ip}"))?;
    info!(device_id = %device.device_id, %ip, "Device confirmed");

    let client = registry
        .client(&device.device_id)
        .context("client binding missing after connect")?;

    let result = match action {
        DeviceAction::On => client.turn_on().await,
        DeviceAction::Off => client.turn_off().await,
        DeviceAction::Toggle => client.toggle().await,
        DeviceAction::Status => client.status().await,
    };

    match result {
        Ok(status) => {
            println!(
                "{}: UV light is {}",
                device.name,
                if status.uv_light_on { "ON" } else { "OFF" }
            );
            if let Some(message) = status.message {
                println!("  {message}");
            }
            Ok(())
        }
        Err(e) => {
            let status = match e {
                CommandError::ConnectionLost { .. } => DeviceStatus::Offline,
                _ => DeviceStatus::Error,
            };
            registry.set_status(&device.device_id, status);
            Err(e).context("device command failed")
        }
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<DiscoveryConfig> {
    match path {
        Some(path) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("failed to read config file: {path:?}"))?;
            serde_yaml::from_str(&content).context("failed to parse config file")
        }
        None => Ok(DiscoveryConfig::default()),
    }
}

fn print_endpoints(endpoints: &[DiscoveredEndpoint]) {
    for endpoint in endpoints {
        println!(
            "{:<24} {:<21} {}",
            endpoint.name,
            endpoint.addr(),
            endpoint.hostname.as_deref().unwrap_or("-")
        );
    }
}

fn print_devices(devices: &[ConnectedDevice]) {
    for device in devices {
        println!(
            "{:<12} {:<24} {:<16} {:<18} fw {}",
            device.device_id, device.name, device.ip, device.mac, device.firmware_version
        );
    }
}
