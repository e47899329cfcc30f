//! greendots CLI - run work in forked worker processes.

mod count;
mod echo;
mod output;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "greendots")]
#[command(about = "Run work in forked worker processes")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Count bytes, lines and words, one forked worker per file
    Count {
        /// Files to count
        #[arg(required = true)]
        files: Vec<String>,

        /// Print results as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Fork workers that each echo a message back to the parent
    Echo {
        /// Message each worker writes
        message: String,

        /// Number of workers to fork
        #[arg(short, long, default_value = "1")]
        jobs: usize,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::DEBUG.into())
    } else {
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Count { files, json } => count::execute(&files, json)?,
        Commands::Echo { message, jobs } => echo::execute(&message, jobs)?,
    }

    Ok(())
}
