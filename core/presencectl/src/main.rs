//! presencectl: CLI control client for the presenced daemon.
//!
//! Talks to the daemon over its control socket. Every subcommand maps to
//! one protocol method; the daemon stays the authority on mode gating and
//! validation.

mod daemon_client;

use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};

#[derive(Parser)]
#[command(name = "presencectl")]
#[command(about = "Control the presenced status daemon")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the current mode and last published status
    Status,

    /// List the selectable status catalog
    Statuses,

    /// Toggle between auto and manual mode
    Toggle,

    /// Select a status by catalog key (manual mode only)
    Set {
        /// Catalog key, e.g. "meeting" or "lunch"
        #[arg(value_name = "KEY")]
        key: String,
    },

    /// Clear the published status (manual mode only)
    Clear,

    /// Replace the daemon's API token (prompts when not given)
    SetToken {
        #[arg(value_name = "TOKEN")]
        token: Option<String>,
    },

    /// Check that the daemon is up
    Health,
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Status => show_status(),
        Commands::Statuses => show_statuses(),
        Commands::Toggle => daemon_client::toggle_mode().map(|mode| {
            println!("mode: {}", mode);
        }),
        Commands::Set { key } => daemon_client::set_status(&key).map(|_| {
            println!("status set: {}", key);
        }),
        Commands::Clear => daemon_client::clear_status().map(|_| {
            println!("status cleared");
        }),
        Commands::SetToken { token } => set_token(token),
        Commands::Health => daemon_client::get_health().map(|data| {
            println!("{}", data);
        }),
    };

    if let Err(err) = result {
        eprintln!("presencectl: {}", err);
        std::process::exit(1);
    }
}

fn show_status() -> Result<(), String> {
    let report = daemon_client::get_status()?;
    println!("mode: {}", mode_label(report.mode));
    match report.last_status {
        Some(status) if !status.text.is_empty() => {
            println!("status: {} {} ({})", status.text, status.emoji, status.key);
        }
        Some(status) => {
            println!("status: (cleared) ({})", status.key);
        }
        None => {
            println!("status: (none dispatched yet)");
        }
    }
    println!("poll interval: {}s", report.poll_interval_secs);
    Ok(())
}

fn show_statuses() -> Result<(), String> {
    let entries = daemon_client::list_statuses()?;
    for entry in entries {
        println!("{}\t{} {}", entry.key, entry.text, entry.emoji);
    }
    Ok(())
}

fn set_token(token: Option<String>) -> Result<(), String> {
    let token = match token {
        Some(token) => token,
        None => prompt_token()?,
    };
    if token.trim().is_empty() {
        return Err("token must not be empty".to_string());
    }
    daemon_client::set_token(token.trim())?;
    println!("token updated");
    Ok(())
}

fn prompt_token() -> Result<String, String> {
    print!("Enter token: ");
    io::stdout()
        .flush()
        .map_err(|err| format!("Failed to flush prompt: {}", err))?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|err| format!("Failed to read token: {}", err))?;
    Ok(line)
}

fn mode_label(mode: presenced_protocol::ModeView) -> &'static str {
    match mode {
        presenced_protocol::ModeView::Auto => "auto",
        presenced_protocol::ModeView::Manual => "manual",
    }
}
