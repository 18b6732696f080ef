use clap::{Parser, ValueEnum};
use relocalization_judger::JudgerConfig;
use relocalization_judger::data_loader::load_samples;
use relocalization_judger::evaluation::RocSubset;
use relocalization_judger::io::object_from_json;
use relocalization_judger::pipeline;
use relocalization_judger::util::local_timestamp;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Clone, Copy, ValueEnum)]
enum RocSubsetArg {
    Train,
    Test,
}

impl From<RocSubsetArg> for RocSubset {
    fn from(value: RocSubsetArg) -> Self {
        match value {
            RocSubsetArg::Train => RocSubset::Train,
            RocSubsetArg::Test => RocSubset::Test,
        }
    }
}

#[derive(Parser)]
#[command(version, about, author)]
struct RJudgeCli {
    /// work directory holding the `Data` tree
    work_dir: PathBuf,

    /// JSON configuration; absent keys keep their defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// output directory, defaults to `<work_dir>/RelocalizationAnalysis/<timestamp>`
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(long)]
    seed: Option<u64>,

    /// fraction of samples held out for testing
    #[arg(long)]
    test_fraction: Option<f64>,

    /// number of shuffle splits used for cross-validation
    #[arg(long)]
    cv_splits: Option<usize>,

    /// subset the ROC curve is computed on
    #[arg(long, value_enum)]
    roc_subset: Option<RocSubsetArg>,

    /// skip rendering LearningCurve.png and ROC.png
    #[arg(long)]
    no_plots: bool,
}

fn load_config(cli: &RJudgeCli) -> Result<JudgerConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => object_from_json::<JudgerConfig>(path)?,
        None => JudgerConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.random_seed = seed;
    }
    if let Some(f) = cli.test_fraction {
        config.split.test_fraction = f;
    }
    if let Some(n) = cli.cv_splits {
        config.search.cv_splits = n;
    }
    if let Some(subset) = cli.roc_subset {
        config.curves.roc_subset = subset.into();
    }
    config.validate()?;
    Ok(config)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = RJudgeCli::parse();
    let config = load_config(&cli)?;
    let timestamp = local_timestamp();
    let output_dir = cli.output.clone().unwrap_or_else(|| {
        Path::new(&cli.work_dir)
            .join("RelocalizationAnalysis")
            .join(&timestamp)
    });

    let now = Instant::now();
    let samples = load_samples(&cli.work_dir, &config.layout, &config.thresholds)?;
    log::info!(
        "loaded {} samples in {:.3} sec",
        samples.len(),
        now.elapsed().as_secs_f64()
    );

    let now = Instant::now();
    let outcome = pipeline::run(&samples, &config)?;
    log::info!("analysis took {:.3} sec", now.elapsed().as_secs_f64());
    println!(
        "best C = {}, gamma = {}, cv accuracy = {:.4}",
        outcome.search.best.c, outcome.search.best.gamma, outcome.search.best_score
    );
    println!(
        "held-out accuracy = {:.4} over {} samples",
        outcome.held_out.confusion.accuracy(),
        outcome.held_out.confusion.total()
    );

    pipeline::write_artifacts(&outcome, &config, &output_dir, !cli.no_plots, &timestamp)?;
    Ok(())
}
