use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use wan6_core::config::Config;
use wan6_core::db::StateStore;
use wan6_dhcp::hook::Dhcp6cHook;
use wan6_dhcp::sixrd::store_ip6rd_from_dhcp;
use wan6_link::Wan6;
use wan6_sys::{LinuxSystem, System};

#[derive(Parser)]
#[command(name = "wan6", about = "wan6 - IPv6 WAN setup: native, DHCPv6, 6to4, 6in4 and 6RD")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "/etc/wan6/wan6.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Bring IPv6 up after the WAN link came up
    Up {
        /// WAN device carrying IPv6 (defaults to the configured one)
        #[arg(long)]
        ifname: Option<String>,
        /// Current WAN IPv4 address, used as the SIT tunnel endpoint
        #[arg(long)]
        wan_ipv4: Option<String>,
    },
    /// Tear IPv6 down after the WAN link went down
    Down {
        #[arg(long)]
        ifname: Option<String>,
    },
    /// Reset runtime variables from the configuration
    Reset,
    /// Entry point for the dhcp6c script
    Dhcp6cHook,
    /// Store 6RD parameters from DHCPv4 option 212
    #[command(name = "store-6rd")]
    Store6rd {
        /// "<ipv4 mask len> <prefix len> <prefix> <relay>"
        value: String,
    },
    /// Print the runtime variables as JSON
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::from_file(&cli.config)?;

    init_logging(&config.logging);

    let state = StateStore::open(&config.paths.state_db)?;
    let sys: Arc<dyn System> = Arc::new(LinuxSystem::new());

    match cli.command {
        Command::Up { ifname, wan_ipv4 } => {
            let wan6 = Wan6::new(config, state, sys);
            if let Some(addr) = wan_ipv4 {
                wan6.set_wan_ipv4(&addr)?;
            }
            let ifname = ifname.unwrap_or_else(|| wan6.config().wan6_ifname().to_string());
            wan6.up(&ifname).await?;
        }
        Command::Down { ifname } => {
            let wan6 = Wan6::new(config, state, sys);
            let ifname = ifname.unwrap_or_else(|| wan6.config().wan6_ifname().to_string());
            wan6.down(&ifname).await?;
        }
        Command::Reset => {
            Wan6::new(config, state, sys).reset_vars()?;
        }
        Command::Dhcp6cHook => {
            let dns = std::env::var("new_domain_name_servers").ok();
            let hook = Dhcp6cHook::new(&config, state, sys);
            hook.run(dns.as_deref()).await?;
        }
        Command::Store6rd { value } => {
            if store_ip6rd_from_dhcp(&config.ipv6, &state, &value)? {
                info!("6rd parameters stored");
            }
        }
        Command::Show => {
            let current = state.load()?;
            println!("{}", serde_json::to_string_pretty(&current)?);
        }
    }

    Ok(())
}

fn init_logging(config: &wan6_core::config::LoggingConfig) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format.as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}
