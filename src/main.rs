mod capture;
mod models;
mod report;
mod utils;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use log::{debug, info, warn};

use crate::capture::device::{list_devices, PcapDevice};
use crate::capture::session::CaptureSession;
use crate::models::config::SessionConfig;
use crate::models::filter::{FilterExpression, ProtocolCategory};
use crate::report::StdoutSink;
use crate::utils::logging;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Capture frames and report their protocol layers")]
struct Args {
    /// Network interface to capture from; without a name, list devices
    #[clap(
        short,
        long,
        num_args = 0..=1,
        value_parser = clap::builder::NonEmptyStringValueParser::new()
    )]
    interface: Option<Option<String>>,

    /// Show TCP frames
    #[clap(short, long)]
    tcp: bool,

    /// Show UDP frames
    #[clap(short, long)]
    udp: bool,

    /// Show TCP/UDP frames with this port on either side
    #[clap(short = 'p')]
    port: Option<u16>,

    /// Show TCP/UDP frames with this source port
    #[clap(long)]
    port_source: Option<u16>,

    /// Show TCP/UDP frames with this destination port
    #[clap(long)]
    port_destination: Option<u16>,

    /// Show ICMPv4 frames
    #[clap(long)]
    icmp4: bool,

    /// Show ICMPv6 frames (including NDP and MLD)
    #[clap(long)]
    icmp6: bool,

    /// Show ARP frames
    #[clap(long)]
    arp: bool,

    /// Show neighbor discovery frames
    #[clap(long)]
    ndp: bool,

    /// Show IGMP frames
    #[clap(long)]
    igmp: bool,

    /// Show multicast listener discovery frames
    #[clap(long)]
    mld: bool,

    /// Number of frames to report before exiting
    #[clap(short = 'n', value_parser = clap::value_parser!(u64).range(1..))]
    count: Option<u64>,

    /// Enable promiscuous mode
    #[clap(short = 'P', long)]
    promiscuous: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[clap(long, default_value = "warn")]
    log_level: String,
}

/// What the parsed arguments ask for
#[derive(Debug, PartialEq, Eq)]
enum Command {
    ListDevices,
    Capture(SessionConfig, FilterExpression),
}

impl Args {
    fn categories(&self) -> ProtocolCategory {
        [
            (self.tcp, ProtocolCategory::TCP),
            (self.udp, ProtocolCategory::UDP),
            (self.icmp4, ProtocolCategory::ICMPV4),
            (self.icmp6, ProtocolCategory::ICMPV6),
            (self.arp, ProtocolCategory::ARP),
            (self.ndp, ProtocolCategory::NDP),
            (self.igmp, ProtocolCategory::IGMP),
            (self.mld, ProtocolCategory::MLD),
        ]
        .into_iter()
        .filter(|(set, _)| *set)
        .fold(ProtocolCategory::empty(), |acc, (_, category)| acc | category)
    }

    fn has_capture_options(&self) -> bool {
        !self.categories().is_empty()
            || self.port.is_some()
            || self.port_source.is_some()
            || self.port_destination.is_some()
            || self.count.is_some()
            || self.promiscuous
    }

    fn into_command(self) -> Result<Command> {
        let interface = match &self.interface {
            Some(Some(name)) => name.clone(),
            Some(None) if self.has_capture_options() => {
                anyhow::bail!("Expected an interface name after '-i'")
            }
            Some(None) => return Ok(Command::ListDevices),
            None if self.has_capture_options() => {
                anyhow::bail!("Missing interface (use '-i')")
            }
            None => return Ok(Command::ListDevices),
        };

        let filter = FilterExpression::new(
            self.categories(),
            self.port,
            self.port_source,
            self.port_destination,
        )?;

        let mut config = SessionConfig::new(interface);
        config.promiscuous = self.promiscuous;
        if let Some(count) = self.count {
            config.max_count = count;
        }

        Ok(Command::Capture(config, filter))
    }
}

fn parse_args() -> Args {
    match Args::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => e.exit(),
            _ => {
                let _ = e.print();
                std::process::exit(1);
            }
        },
    }
}

#[tokio::main]
async fn main() {
    let args = parse_args();

    logging::init_logger(logging::get_log_level(&args.log_level));
    debug!("Arguments: {:?}", args);

    #[cfg(target_os = "windows")]
    warn_if_not_elevated();

    if let Err(e) = run(args).await {
        eprintln!("Failure: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    match args.into_command()? {
        Command::ListDevices => {
            let devices = list_devices().context("Failed to list devices")?;
            if devices.is_empty() {
                warn!("No capture devices found; capturing may require elevated privileges");
            }
            for name in devices {
                println!("{}", name);
            }
        }
        Command::Capture(config, filter) => {
            info!(
                "Starting {} v{} on {} (filter: {}, count: {})",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION"),
                config.interface,
                filter,
                config.max_count
            );

            let device = PcapDevice::open(&config)?;
            let session = CaptureSession::new(device, StdoutSink::stdout(), filter, &config);
            let summary = session
                .run(async {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        warn!("Unable to listen for interrupt: {}", e);
                        std::future::pending::<()>().await;
                    }
                })
                .await?;

            info!(
                "Session ended ({:?}) after {} ms",
                summary.reason,
                summary.stats.elapsed_ms().unwrap_or_default()
            );
        }
    }

    Ok(())
}

/// Capturing on Windows needs administrator rights
#[cfg(target_os = "windows")]
fn warn_if_not_elevated() {
    let is_admin = std::process::Command::new("powershell")
        .args([
            "-Command",
            "[bool](([System.Security.Principal.WindowsIdentity]::GetCurrent()).groups -match 'S-1-5-32-544')",
        ])
        .output()
        .map(|output| String::from_utf8_lossy(&output.stdout).trim() == "True")
        .unwrap_or(false);

    if !is_admin {
        warn!("Not running with administrator privileges; capture may fail");
    }
}
