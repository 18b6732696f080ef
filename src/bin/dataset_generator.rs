use clap::{Parser, Subcommand};
use relocalization_judger::JudgerConfig;
use relocalization_judger::synthetic::{SyntheticConfig, generate_samples, write_samples};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a synthetic relocalization work directory
    Generate {
        /// Work directory; the `Data` tree is created inside it
        #[arg(short, long)]
        output: PathBuf,

        /// Number of scenes
        #[arg(long, default_value = "4")]
        scenes: usize,

        /// Positions per scene
        #[arg(long, default_value = "25")]
        positions: usize,

        /// Features unrelated to the label
        #[arg(long, default_value = "1")]
        noise_features: usize,

        #[arg(long, default_value = "0")]
        seed: u64,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    match args.command {
        Commands::Generate {
            output,
            scenes,
            positions,
            noise_features,
            seed,
        } => {
            let config = JudgerConfig::default();
            let synthetic = SyntheticConfig {
                scenes,
                positions_per_scene: positions,
                noise_features,
                seed,
            };
            let samples = generate_samples(&synthetic, &config.thresholds);
            let successes = samples.iter().filter(|s| s.label.as_u8() == 1).count();
            write_samples(&output, &config.layout, &samples)?;
            println!(
                "wrote {} samples ({} successes) to {}",
                samples.len(),
                successes,
                output.display()
            );
        }
    }

    Ok(())
}
