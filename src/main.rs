use anyhow::Context;
use clap::Parser;
use flexi_logger::Logger;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use threes_td::agent::{Agent, RandomPlacer, Slider, SliderKind};
use threes_td::engine as GameEngine;
use threes_td::episode::Episode;
use threes_td::statistic::{BlockReport, Statistic};

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let _logger = Logger::try_with_env_or_str("info")?
        .format(flexi_logger::colored_default_format)
        .start()?;
    GameEngine::new();

    // Weight files are opened here; a bad path ends the run before any episode.
    let mut slider = Slider::new(args.slider, &args.slide).context("building the slider")?;
    let mut placer = RandomPlacer::new(&args.place).context("building the placer")?;
    log::info!(
        "{} ({}) against {} for {} episodes",
        slider.name(),
        args.slider,
        placer.name(),
        args.total
    );

    let pb = if args.quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(args.total as u64);
        pb.set_style(
            ProgressStyle::with_template("{spinner} {elapsed_precise} [{bar:32}] {pos}/{len} | {msg}")?
                .tick_chars("⠁⠃⠇⠧⠷⠿⠻⠟⠯⠷⠧⠇⠃"),
        );
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    };

    let mut stats = Statistic::new(args.block);
    for _ in 0..args.total {
        let summary = Episode::new().play(&mut slider, &mut placer);
        pb.inc(1);
        pb.set_message(format!("score: {} | tile: {}", summary.score, summary.highest_tile));
        if let Some(report) = stats.push(summary) {
            pb.suspend(|| emit(&report, args.json))?;
        }
    }
    if let Some(report) = stats.flush() {
        pb.suspend(|| emit(&report, args.json))?;
    }
    pb.finish_and_clear();

    slider.persist().context("saving the slider")?;
    Ok(())
}

fn emit(report: &BlockReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(report)?);
    } else {
        log::info!("episodes {}..={}\n{}", report.first_episode, report.last_episode, report);
    }
    Ok(())
}

#[derive(Debug, Parser)]
#[command(name = "threes-td", about = "Train and evaluate Threes! sliders against a random placer")]
struct Args {
    /// Episodes to play
    #[arg(long, default_value_t = 1000)]
    total: usize,

    /// Episodes per statistics block
    #[arg(long, default_value_t = 1000)]
    block: usize,

    /// Slider variant: random, heuristic or td
    #[arg(long, default_value = "td")]
    slider: SliderKind,

    /// Slider configuration, e.g. "init=65536,65536 alpha=0.1 save=weights.bin"
    #[arg(long, default_value = "init=65536,65536 alpha=0.1")]
    slide: String,

    /// Placer configuration, e.g. "seed=7"
    #[arg(long, default_value = "")]
    place: String,

    /// Suppress the progress bar
    #[arg(long)]
    quiet: bool,

    /// Print block reports as JSON lines on stdout
    #[arg(long)]
    json: bool,
}
