// Copyright 2026 Splitcap Contributors
// SPDX-License-Identifier: Apache-2.0

#![allow(dead_code, unused_imports)]

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

mod batch;
mod capture;
mod classify;
mod cli;
mod colors;
mod fallback;
mod harvest;
mod http;
mod manifest;
mod renderer;
mod store;

#[derive(Parser)]
#[command(
    name = "splitcap",
    about = "Splitcap — capture race-timing feeds from live results sites",
    version,
    after_help = "Run 'splitcap <command> --help' for details on each command."
)]
struct Cli {
    /// Enable verbose/debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Suppress non-essential logging
    #[arg(long, short, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture both feeds and team colors for one event
    Capture {
        /// Event URL (e.g. https://live.xpresstiming.com/meets/57259/events/xc/2149044)
        #[arg(long)]
        url: String,
        /// Root folder for cached event JSON
        #[arg(long, default_value = "data")]
        out_dir: PathBuf,
        /// Ignore cached output and re-capture
        #[arg(long)]
        force: bool,
        /// Open a visible browser window
        #[arg(long)]
        headful: bool,
        /// Overall capture deadline in seconds
        #[arg(long, default_value = "120")]
        deadline_secs: u64,
    },
    /// Capture every race in a curated input list
    Batch {
        /// Race list file (3-line blocks separated by blank lines)
        #[arg(long, default_value = "race_input.txt")]
        input: PathBuf,
        /// Root folder for cached event JSON
        #[arg(long, default_value = "data")]
        out_dir: PathBuf,
        /// Ignore cached output and re-capture every race
        #[arg(long)]
        force: bool,
        /// Open a visible browser window
        #[arg(long)]
        headful: bool,
        /// Overall capture deadline per race, in seconds
        #[arg(long, default_value = "120")]
        deadline_secs: u64,
        /// Parse the list but do not capture
        #[arg(long)]
        dry_run: bool,
        /// Delay between races in seconds
        #[arg(long, default_value = "2")]
        delay_secs: u64,
    },
    /// Rebuild events.json from captured event directories
    Manifest {
        /// Root folder holding captured event directories
        #[arg(long, default_value = "data")]
        out_dir: PathBuf,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: Shell,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Capture {
            url,
            out_dir,
            force,
            headful,
            deadline_secs,
        } => cli::capture_cmd::run(&url, &out_dir, force, headful, deadline_secs).await,
        Commands::Batch {
            input,
            out_dir,
            force,
            headful,
            deadline_secs,
            dry_run,
            delay_secs,
        } => {
            cli::batch_cmd::run(
                &input,
                &out_dir,
                force,
                headful,
                deadline_secs,
                dry_run,
                delay_secs,
            )
            .await
        }
        Commands::Manifest { out_dir } => cli::manifest_cmd::run(&out_dir).await,
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "splitcap", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        // Exit 2 when the split feed could not be captured, so an upstream
        // batch driver knows to retry; 1 for everything else.
        let code = if e.downcast_ref::<capture::CaptureError>().is_some() {
            2
        } else {
            1
        };
        std::process::exit(code);
    }
}

fn init_tracing(verbose: bool, quiet: bool) {
    let directive = if verbose {
        "splitcap=debug"
    } else if quiet {
        "splitcap=warn"
    } else {
        "splitcap=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(directive.parse().expect("valid logging directive")),
        )
        .init();
}
