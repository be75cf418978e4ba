use std::io;

use clap::{Parser, Subcommand};
use git_client::GitEnvironment;
use push_guard_cli::commands::{
    pre_receive::{self, PreReceiveArgs, EXIT_INTERNAL_ERROR},
    validate::{self, ValidateArgs},
};
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// push-guard: accept or reject pushes according to branch and tag protection
#[derive(Parser)]
#[command(name = "push-guard")]
#[command(about = "Accept or reject git pushes using protection rules", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a push; reads `<old> <new> <ref>` lines from standard input
    PreReceive(PreReceiveArgs),

    /// Check a configuration file
    Validate(ValidateArgs),

    /// Show the CLI version
    Version,
}

#[tokio::main]
async fn main() {
    // Standard output is reserved for the JSON response
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::from_env("PUSH_GUARD_LOG"))
        .init();

    let cli = Cli::parse();
    match &cli.command {
        Commands::PreReceive(args) => {
            let env = GitEnvironment::from_process();
            let result = pre_receive::execute(args, env, io::stdin().lock()).await;
            match result {
                Ok(decision) => {
                    if args.json {
                        match serde_json::to_string(&decision.response()) {
                            Ok(body) => println!("{body}"),
                            Err(e) => {
                                error!("Error: {e}");
                                std::process::exit(EXIT_INTERNAL_ERROR);
                            }
                        }
                    } else if let Some(reason) = decision.reason() {
                        eprintln!("{reason}");
                    }
                    std::process::exit(pre_receive::exit_code(&decision));
                }
                Err(e) => {
                    error!("Error: {e}");
                    eprintln!("Error: {e}");
                    std::process::exit(EXIT_INTERNAL_ERROR);
                }
            }
        }
        Commands::Validate(args) => match validate::execute(args) {
            Ok(summary) => {
                println!(
                    "Configuration is valid: {} branch rules, {} tag rules, {} users",
                    summary.branch_rules, summary.tag_rules, summary.users
                );
                std::process::exit(0);
            }
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        },
        Commands::Version => {
            println!("push-guard version {}", env!("CARGO_PKG_VERSION"));
            std::process::exit(0);
        }
    }
}
