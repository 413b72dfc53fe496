// fmradio command-line application -- runs the radio server against the
// simulated tuner, scans the band, or drives a running server as a client.
//
// Usage:
//   fmradio-app serve --port 9502 --max-clients 10
//   fmradio-app scan
//   fmradio-app client volume 8
//   fmradio-app client --host 192.168.1.20 channel 1021
//   fmradio-app client seek up
//   fmradio-app client monitor --duration 30
//
// Log verbosity follows RUST_LOG (default: info).

mod scan;

use std::net::IpAddr;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use fmradio::server::{DEFAULT_TICK_INTERVAL, RadioSession, ServerBuilder, ShutdownCoordinator};
use fmradio::wire::{RadioClient, ServerEvent};
use fmradio::{Band, Error, SeekDirection, format_channel_mhz};
use fmradio_test_harness::SimulatedTuner;

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// fmradio -- networked FM radio control.
#[derive(Parser)]
#[command(name = "fmradio-app", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the radio server on the simulated tuner until Ctrl-C.
    Serve {
        /// Address to listen on.
        #[arg(long, default_value = "0.0.0.0")]
        bind: IpAddr,

        /// Port to listen on.
        #[arg(short, long, default_value_t = 9502)]
        port: u16,

        /// Maximum number of simultaneous clients.
        #[arg(short, long, default_value_t = 10)]
        max_clients: usize,

        /// Readiness wait bound of the server loop, in milliseconds.
        #[arg(long, default_value_t = 1)]
        poll_timeout_ms: u64,

        /// Minimum time between RDS polls and broadcasts, in milliseconds.
        #[arg(long, default_value_t = DEFAULT_TICK_INTERVAL.as_millis() as u64)]
        tick_ms: u64,
    },

    /// Seek through the band and list stations by signal strength.
    Scan,

    /// Talk to a running server.
    Client {
        /// Server host name or address.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Server port.
        #[arg(short, long, default_value_t = 9502)]
        port: u16,

        #[command(subcommand)]
        action: ClientAction,
    },
}

#[derive(Subcommand)]
enum ClientAction {
    /// Set the volume (0-15; larger values are clamped by the server).
    Volume { value: u8 },

    /// Tune to a channel in 100 kHz units (e.g. 1021 for 102.1 MHz).
    Channel { value: u16 },

    /// Seek to the next station.
    Seek {
        #[arg(value_enum)]
        direction: Direction,
    },

    /// Print everything the server broadcasts.
    Monitor {
        /// Stop after this many seconds (0 = until Ctrl-C or disconnect).
        #[arg(long, default_value_t = 0)]
        duration: u64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Direction {
    Up,
    Down,
}

impl From<Direction> for SeekDirection {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Up => SeekDirection::Up,
            Direction::Down => SeekDirection::Down,
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const REPLY_TIMEOUT: Duration = Duration::from_secs(2);

fn describe(event: &ServerEvent) -> String {
    match event {
        ServerEvent::Channel(channel) => format!("channel {}", format_channel_mhz(*channel)),
        other => other.to_string(),
    }
}

fn print_events(events: &[ServerEvent]) {
    for event in events {
        println!("  {}", describe(event));
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

async fn cmd_serve(
    bind: IpAddr,
    port: u16,
    max_clients: usize,
    poll_timeout_ms: u64,
    tick_ms: u64,
) -> Result<()> {
    let server = ServerBuilder::new()
        .bind_addr(bind)
        .port(port)
        .max_clients(max_clients)
        .poll_timeout(Duration::from_millis(poll_timeout_ms))
        .bind()
        .await
        .context("failed to start server")?;

    let session = RadioSession::new(SimulatedTuner::demo())
        .with_tick_interval(Duration::from_millis(tick_ms));
    let shutdown = ShutdownCoordinator::install();

    server.run(session, shutdown).await?;
    info!("server stopped");
    Ok(())
}

async fn cmd_scan() -> Result<()> {
    let mut tuner = SimulatedTuner::demo();
    println!("Scanning {} - {}...", format_channel_mhz(Band::FM.start), format_channel_mhz(Band::FM.end));

    let stations = scan::scan_band(&mut tuner, Band::FM, Duration::from_millis(1))
        .await
        .context("scan failed")?;

    if stations.is_empty() {
        println!("No stations found.");
        return Ok(());
    }
    for station in &stations {
        println!(
            "  {:>10}  signal {:>3}%",
            format_channel_mhz(station.channel),
            station.signal_percent
        );
    }
    println!("{} stations found.", stations.len());
    Ok(())
}

async fn cmd_client(host: &str, port: u16, action: ClientAction) -> Result<()> {
    let mut client = RadioClient::connect_with_timeout((host, port), REPLY_TIMEOUT)
        .await
        .with_context(|| format!("unable to connect to {host}:{port}"))?;

    let snapshot = client
        .next_events(REPLY_TIMEOUT)
        .await
        .context("no state received from server")?;
    println!("Connected to {}", client.peer_addr());
    print_events(&snapshot);

    match action {
        ClientAction::Volume { value } => client.set_volume(value).await?,
        ClientAction::Channel { value } => client.set_channel(value).await?,
        ClientAction::Seek { direction } => client.seek(direction.into()).await?,
        ClientAction::Monitor { duration } => return cmd_monitor(client, duration).await,
    }

    let reply = client
        .next_events(REPLY_TIMEOUT)
        .await
        .context("no reply from server")?;
    println!("Server reported:");
    print_events(&reply);
    client.close().await?;
    Ok(())
}

async fn cmd_monitor(mut client: RadioClient, duration_secs: u64) -> Result<()> {
    println!("Monitoring broadcasts (Ctrl-C to stop)...");

    let deadline = (duration_secs > 0).then(|| Instant::now() + Duration::from_secs(duration_secs));

    loop {
        let timeout = match deadline {
            Some(dl) => {
                let remaining = dl.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    println!("Monitor duration elapsed.");
                    break;
                }
                remaining
            }
            None => Duration::from_secs(3600),
        };

        match client.next_events(timeout).await {
            Ok(events) => print_events(&events),
            Err(Error::Timeout) => continue,
            Err(Error::ConnectionLost) => {
                println!("Server closed the connection.");
                break;
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            bind,
            port,
            max_clients,
            poll_timeout_ms,
            tick_ms,
        } => cmd_serve(bind, port, max_clients, poll_timeout_ms, tick_ms).await,
        Command::Scan => cmd_scan().await,
        Command::Client { host, port, action } => cmd_client(&host, port, action).await,
    }
}
