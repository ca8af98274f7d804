use anyhow::Context;
use clap::{Parser, Subcommand};
use flexi_logger::Logger;
use std::path::PathBuf;
use threes_td::config::parse_size_list;
use threes_td::weights::WeightStore;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let _logger = Logger::try_with_env_or_str("info")?.start()?;

    match args.cmd {
        Cmd::Init { sizes, out } => {
            let sizes = parse_size_list(&sizes)?;
            let store = WeightStore::with_sizes(&sizes)?;
            store.save(&out).with_context(|| format!("writing {}", out.display()))?;
            log::info!("wrote {} zeroed tables {:?} to {}", sizes.len(), sizes, out.display());
        }
        Cmd::Stats { file, json } => {
            let store = WeightStore::load(&file).with_context(|| format!("reading {}", file.display()))?;
            for idx in 0..store.table_count() {
                let s = store.summary(idx);
                if json {
                    println!("{}", serde_json::to_string(&s)?);
                } else {
                    println!(
                        "table {idx}: size {} | nonzero {} | min {:.4} | max {:.4} | mean {:.6}",
                        s.size, s.nonzero, s.min, s.max, s.mean
                    );
                }
            }
        }
    }
    Ok(())
}

#[derive(Debug, Parser)]
#[command(name = "weights", about = "Create and inspect n-tuple weight files")]
struct Args {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Debug, Subcommand)]
enum Cmd {
    /// Write a zero-filled weight file
    Init {
        /// Comma-separated table sizes, each a power of two
        #[arg(long, default_value = "65536,65536")]
        sizes: String,
        /// Output path
        #[arg(long)]
        out: PathBuf,
    },
    /// Print per-table summaries of a weight file
    Stats {
        file: PathBuf,
        /// One JSON object per table
        #[arg(long)]
        json: bool,
    },
}
