//! farsync - push one file, sending only the chunks the destination lacks.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser};
use tracing_subscriber::EnvFilter;

use farsync::{server, sync, Config, SyncPath};

#[derive(Debug, Parser)]
#[command(name = "farsync", version, about)]
struct Cli {
    /// File to send
    #[arg(required_unless_present = "server")]
    source: Option<PathBuf>,

    /// Destination directory: DIR or [user@]host:DIR
    #[arg(required_unless_present = "server")]
    dest: Option<String>,

    /// Receive one file on stdin/stdout into DIR (used by the sending side)
    #[arg(long, value_name = "DIR", hide = true, conflicts_with_all = ["source", "dest"])]
    server: Option<PathBuf>,

    /// Chunk size in bytes (must match on both ends)
    #[arg(short = 'c', long)]
    chunk_size: Option<usize>,

    /// Scan-ahead window, in chunks
    #[arg(long)]
    scan_window_chunks: Option<usize>,

    /// Config file (default: ~/.config/farsync/config.toml)
    #[arg(long, env = "FARSYNC_CONFIG")]
    config: Option<PathBuf>,

    /// Verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn load_config(&self) -> farsync::Result<Config> {
        let mut config = Config::load(self.config.as_deref())?;
        if let Some(size) = self.chunk_size {
            config.chunk_size = size;
        }
        if let Some(chunks) = self.scan_window_chunks {
            config.scan_window_chunks = chunks;
        }
        config.validate()?;
        Ok(config)
    }
}

/// Logs always go to stderr: stdout is the protocol stream in server mode.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = cli.load_config()?;

    if let Some(root) = &cli.server {
        server::run_server(root, config).await?;
        return Ok(());
    }

    // clap guarantees both are present outside server mode
    let (Some(source), Some(dest)) = (&cli.source, &cli.dest) else {
        anyhow::bail!("SOURCE and DEST are required");
    };
    let dest = SyncPath::parse(dest);

    tracing::info!(
        source = %source.display(),
        dest = %dest,
        chunk_size = config.chunk_size,
        "farsync starting"
    );

    let stats = sync::sync_push(source, &dest, &config).await?;

    println!(
        "{}: {} chunks, {} reused, {} sent ({} bytes sent, {} bytes reused)",
        source.display(),
        stats.chunks,
        stats.chunks_reused,
        stats.chunks_fetched,
        stats.bytes_fetched,
        stats.bytes_reused
    );
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "transfer failed");
            eprintln!("farsync: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
