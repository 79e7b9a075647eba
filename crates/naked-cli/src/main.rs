//! Naked Objects CLI
//!
//! Builds a metamodel from a JSON domain model description and a TOML
//! reflector configuration, then prints what the reflector found.
//!
//! Set `NAKED_LOG` (error|warn|info|debug|trace) to see reflection logs.

mod commands;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use output::{init_logger, resolve_color_choice, StyledOutput};

#[derive(Parser)]
#[command(name = "naked")]
#[command(about = "Naked Objects metamodel toolkit", long_about = None)]
#[command(version)]
struct Cli {
    /// When to use colors: auto, always or never
    #[arg(long, global = true)]
    color: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reflect over a domain model and summarise the metamodel
    Reflect {
        /// Domain model (JSON)
        model: PathBuf,
        /// Reflector configuration (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Use the parallel reflector
        #[arg(long)]
        parallel: bool,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Show one specification in detail
    Show {
        /// Domain model (JSON)
        model: PathBuf,
        /// Full type name
        type_name: String,
        /// Reflector configuration (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// List the standard facet factories in execution order
    Factories {
        /// Only list the recognised method prefixes
        #[arg(long)]
        prefixes: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let choice = resolve_color_choice(cli.color.as_deref());
    init_logger(choice)?;
    let mut out = StyledOutput::new(choice);

    match cli.command {
        Commands::Reflect {
            model,
            config,
            parallel,
            json,
        } => commands::reflect::execute(&model, config.as_deref(), parallel, json, &mut out),

        Commands::Show {
            model,
            type_name,
            config,
            json,
        } => commands::show::execute(&model, config.as_deref(), &type_name, json, &mut out),

        Commands::Factories { prefixes } => commands::factories::execute(prefixes, &mut out),
    }
}
