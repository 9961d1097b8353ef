//! depthlink sender — entry point.
//!
//! ```text
//! depthlink-sender                  Run with the interactive prompt
//! depthlink-sender --config <path>  Load a custom config TOML
//! depthlink-sender --gen-config     Write default config to stdout
//! ```
//!
//! The prompt loop never exits on a session failure: the error is
//! printed and the operator is asked for a port again.

use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use depthlink_core::DepthResolution;
use depthlink_sender::config::SenderConfig;
use depthlink_sender::session;

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "depthlink-sender", about = "depthlink depth-camera streaming sender")]
struct Cli {
    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "depthlink-sender.toml")]
    config: PathBuf,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // --gen-config: dump defaults and exit.
    if cli.gen_config {
        let text = toml::to_string_pretty(&SenderConfig::default())?;
        println!("{text}");
        return Ok(());
    }

    let config = SenderConfig::load(&cli.config);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    loop {
        let Some(line) = prompt("Enter a port number to start sending frames: ")? else {
            break; // stdin closed
        };
        let port = if line.is_empty() {
            config.network.port
        } else {
            match line.parse::<u16>() {
                Ok(p) => p,
                Err(_) => {
                    println!("not a port number: {line}");
                    continue;
                }
            }
        };

        let Some(line) = prompt("Choose depth resolution (1: Full, 2: Half): ")? else {
            break;
        };
        let resolution = if line == "2" {
            DepthResolution::Half
        } else {
            DepthResolution::Full
        };

        // Session failures are printed, never propagated — the prompt
        // restarts.
        if let Err(e) = session::run(&config, port, resolution).await {
            println!("{e}");
        }
    }

    Ok(())
}

/// Read one trimmed line from stdin; `None` when stdin is closed.
fn prompt(message: &str) -> std::io::Result<Option<String>> {
    print!("{message}");
    std::io::stdout().flush()?;

    let mut line = String::new();
    if std::io::stdin().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}
