mod commands;

use clap::{Parser, Subcommand};
use log::LevelFilter;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "quire")]
#[command(about = "Compiles a tree of markdown documents into a static site or a PDF", long_about = None)]
struct Cli {
    /// Log every step, not just written files
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter README.md, SUMMARY.md and quire.toml
    Init { directory: Option<PathBuf> },
    /// Build the site, or a PDF with --pdf
    Build {
        #[arg(long, short)]
        input: Option<PathBuf>,

        #[arg(long, short)]
        output: Option<PathBuf>,

        #[arg(long, short)]
        config: Option<PathBuf>,

        /// Produce a single paginated document at this path instead of a site
        #[arg(long)]
        pdf: Option<PathBuf>,

        /// Keep running and rebuild when sources change
        #[arg(long, short)]
        watch: bool,

        #[arg(long)]
        minify: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(if cli.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .init();

    let result = match cli.command {
        Commands::Init { directory } => commands::init_book(directory.as_deref()),
        Commands::Build {
            input,
            output,
            config,
            pdf,
            watch,
            minify,
        } => commands::build_book(&commands::BuildOptions {
            input,
            output,
            config,
            pdf,
            watch,
            minify,
        }),
    };

    if let Err(error) = result {
        log::error!("{error}");
        std::process::exit(1);
    }
}
