use std::path::PathBuf;

use clap::Parser;
use image::RgbaImage;

use circle_evolve::evaluator::EvaluationMode;
use circle_evolve::{Driver, Engine, LogObserver, Pacing, ReferenceImage, RunSettings};

/// Approximate an image with evolving translucent circles.
#[derive(Parser, Debug)]
#[command(name = "circle-evolve")]
#[command(about = "Evolve a population of circle genomes toward a target image")]
struct Cli {
    /// Target image (any format the image crate can decode).
    #[arg(long)]
    image: PathBuf,

    /// JSON settings file. Missing fields use defaults.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Generation budget, overrides the settings file.
    #[arg(long)]
    generations: Option<u64>,

    /// RNG seed, overrides the settings file.
    #[arg(long)]
    seed: Option<u64>,

    /// Fitness worker threads. 0 = one per core; omit to evaluate on the main thread.
    #[arg(long)]
    workers: Option<usize>,

    /// Where to write the best render (PNG).
    #[arg(long, default_value = "best.png")]
    output: PathBuf,

    /// Also write the best chromosome as JSON.
    #[arg(long)]
    genome_out: Option<PathBuf>,

    /// Milliseconds to sleep between generations.
    #[arg(long, default_value_t = 0)]
    interval_ms: u64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let mut settings = match &cli.settings {
        Some(path) => RunSettings::load_strict(path)?,
        None => RunSettings::default(),
    };
    if let Some(generations) = cli.generations {
        settings.max_generation = generations;
    }
    if let Some(seed) = cli.seed {
        settings.seed = seed;
    }
    if let Some(workers) = cli.workers {
        let timeout_ms = match settings.evaluation {
            EvaluationMode::Parallel { timeout_ms, .. } => timeout_ms,
            EvaluationMode::Synchronous => None,
        };
        settings.evaluation = EvaluationMode::Parallel { workers, timeout_ms };
    }

    let reference = ReferenceImage::open(&cli.image)?;
    log::info!("loaded {} ({}x{})", cli.image.display(), reference.width(), reference.height());

    let log_interval = settings.log_interval;
    let mut engine = Engine::new(reference, settings)?;
    let pacing = match cli.interval_ms {
        0 => Pacing::Immediate,
        ms => Pacing::Interval(std::time::Duration::from_millis(ms)),
    };
    let report = Driver::new(pacing).run_to_completion(&mut engine, &mut LogObserver::new(log_interval))?;

    let (width, height) = engine.display_size();
    let best = RgbaImage::from_raw(width, height, engine.render_best())
        .ok_or("best render does not match the display size")?;
    best.save(&cli.output)?;
    log::info!(
        "wrote {} after {} generations (best fitness {:.5})",
        cli.output.display(),
        report.generation,
        report.best_fitness
    );

    if let Some(path) = &cli.genome_out {
        engine.save_best(path)?;
        log::info!("wrote genome to {}", path.display());
    }
    Ok(())
}
