use crate::{AppOptions, Mode, create_app, load_config};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "arena")]
#[command(version = "0.1")]
#[command(about = "Tennis and target-seek agent arenas")]
#[command(long_about = "
Tennis and target-seek agent arenas

EXAMPLES:
    cargo run --bin launcher -- tennis --heuristic              # Watch two heuristic agents rally
    cargo run --bin launcher -- tennis --headless --heuristic   # Headless heuristic rallies
    cargo run --bin launcher -- roller --heuristic              # Drive the roller with arrow keys
    cargo run --bin launcher -- train --envs 16 --steps 100000  # Train on 16 environments
    cargo run --bin launcher -- train --config training.json    # Train with a settings file
")]
pub struct Cli {
    #[arg(value_enum)]
    pub mode: Mode,

    #[arg(long, default_value_t = false)]
    pub headless: bool,

    #[arg(long, default_value_t = false)]
    #[arg(help = "Use the built-in heuristic instead of the learned policy")]
    pub heuristic: bool,

    #[arg(long, default_value_t = 10_000)]
    #[arg(help = "Fixed steps to run headless, 0 for no limit outside of training")]
    pub steps: u64,

    #[arg(long)]
    #[arg(help = "Number of environments to train on")]
    pub envs: Option<usize>,

    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long)]
    #[arg(help = "JSON file with training and reward settings")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Loads the config file and applies command line overrides.
    pub fn into_options(self) -> anyhow::Result<AppOptions> {
        let mut config = load_config(self.config.as_deref())?;
        if let Some(envs) = self.envs {
            config.training.num_envs = envs;
        }
        if let Some(seed) = self.seed {
            config.training.seed = seed;
        }

        Ok(AppOptions {
            mode: self.mode,
            headless: self.headless,
            heuristic: self.heuristic,
            steps: self.steps,
            log: true,
            config,
        })
    }
}

pub fn run() -> anyhow::Result<()> {
    let options = Cli::parse().into_options()?;

    create_app(&options).run();
    Ok(())
}
