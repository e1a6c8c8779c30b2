use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod classify;
mod fetch;
mod logger;
mod models;
mod names;
mod report;
mod scrape;
mod stats;
mod store;

const DEFAULT_INDEX_URL: &str = "https://escolar1.rhon.itam.mx/titulacion/programas.asp";

#[derive(Parser)]
#[command(name = "titulados-stats")]
#[command(about = "Scrape, classify and aggregate university graduate listings", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape every program listing into one CSV per program
    Scrape {
        #[arg(long, default_value = DEFAULT_INDEX_URL)]
        index_url: String,
        #[arg(long, default_value = "output")]
        out_dir: PathBuf,
    },
    /// Build the name-gender dictionary and write the female subset tables
    Classify {
        #[arg(long, default_value = "output")]
        out_dir: PathBuf,
        /// Name->label lexicon CSV with columns `name,label`
        #[arg(long)]
        lexicon: PathBuf,
        #[arg(long, default_value = ".")]
        dict_dir: PathBuf,
    },
    /// Aggregate full and subset tables into summary statistics and a report
    Stats {
        #[arg(long, default_value = "output")]
        out_dir: PathBuf,
        #[arg(long, default_value = "analisis")]
        analysis_dir: PathBuf,
    },
    /// Run all three stages in order
    Run {
        #[arg(long, default_value = DEFAULT_INDEX_URL)]
        index_url: String,
        #[arg(long, default_value = "output")]
        out_dir: PathBuf,
        #[arg(long)]
        lexicon: PathBuf,
        #[arg(long, default_value = ".")]
        dict_dir: PathBuf,
        #[arg(long, default_value = "analisis")]
        analysis_dir: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Scrape { index_url, out_dir } => {
            let fetcher = fetch::HttpFetcher::new()?;
            scrape::run(&fetcher, &index_url, &out_dir)?;
            println!("Program tables written to {}.", out_dir.display());
        }
        Commands::Classify {
            out_dir,
            lexicon,
            dict_dir,
        } => {
            let classifier = names::LexiconClassifier::from_path(&lexicon)?;
            classify::run(&out_dir, &dict_dir, &classifier)?;
            println!("Subset tables written to {}.", out_dir.display());
        }
        Commands::Stats {
            out_dir,
            analysis_dir,
        } => {
            stats::run(&out_dir, &analysis_dir)?;
            println!("Analysis written to {}.", analysis_dir.display());
        }
        Commands::Run {
            index_url,
            out_dir,
            lexicon,
            dict_dir,
            analysis_dir,
        } => {
            let fetcher = fetch::HttpFetcher::new()?;
            scrape::run(&fetcher, &index_url, &out_dir)?;
            let classifier = names::LexiconClassifier::from_path(&lexicon)?;
            classify::run(&out_dir, &dict_dir, &classifier)?;
            stats::run(&out_dir, &analysis_dir)?;
            println!("Pipeline complete; analysis in {}.", analysis_dir.display());
        }
    }

    Ok(())
}
