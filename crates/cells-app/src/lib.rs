//! Command-line runner: builds worlds from flags or a JSON config, steps
//! them, writes PNG frames and reports run statistics.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cells_core::{RandomSource, RunSummary, World, WorldConfig};
use cells_render::{Encoding, default_color, render};
use clap::Parser;
use serde::Serialize;
use tracing::{debug, info};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "cells",
    version,
    about = "Simulate genetically encoded cells on a wrapping grid"
)]
pub struct Cli {
    /// JSON file holding a world configuration; flags override its values.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Grid width in tiles.
    #[arg(long)]
    pub width: Option<u32>,

    /// Grid height in tiles.
    #[arg(long)]
    pub height: Option<u32>,

    /// Ticks between food generation passes.
    #[arg(long)]
    pub food_interval: Option<u32>,

    /// Agents seeded into each world.
    #[arg(long)]
    pub population: Option<u32>,

    /// Energy each seeded agent starts with.
    #[arg(long)]
    pub initial_energy: Option<u32>,

    /// Energy a surviving agent pays every tick.
    #[arg(long)]
    pub metabolism_cost: Option<u32>,

    /// Age at which agents die.
    #[arg(long)]
    pub max_age: Option<u32>,

    /// Energy at which an agent spawns a child.
    #[arg(long)]
    pub reproduction_threshold: Option<u32>,

    /// Seed for reproducible runs; world `n` uses `seed + n`.
    #[arg(long, env = "CELLS_SEED")]
    pub seed: Option<u64>,

    /// Ticks to simulate per world.
    #[arg(long, default_value_t = 3_600)]
    pub ticks: u64,

    /// Number of independent worlds to run.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    pub worlds: u64,

    /// Ticks between written frames.
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    pub frame_interval: u64,

    /// Directory receiving `{world}-{tick}.png` frames; no frames without it.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Write RGB frames instead of RGBA.
    #[arg(long)]
    pub rgb: bool,

    /// Stop a world as soon as no agent is left.
    #[arg(long)]
    pub stop_at_extinction: bool,

    /// Number given to the first world in frame names.
    #[arg(long, default_value_t = 0)]
    pub first_world: u64,

    /// Number given to the first tick in frame names.
    #[arg(long, default_value_t = 0)]
    pub first_tick: u64,

    /// Write every world's run summary to this JSON file.
    #[arg(long)]
    pub summary: Option<PathBuf>,
}

impl Cli {
    /// Base configuration: the JSON file if given, defaults otherwise, with
    /// flags applied on top.
    pub fn world_config(&self) -> Result<WorldConfig> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => WorldConfig::default(),
        };
        let overrides = [
            (&mut config.width, self.width),
            (&mut config.height, self.height),
            (&mut config.food_interval, self.food_interval),
            (&mut config.initial_population, self.population),
            (&mut config.initial_energy, self.initial_energy),
            (&mut config.metabolism_cost, self.metabolism_cost),
        ];
        for (field, value) in overrides {
            if let Some(value) = value {
                *field = value;
            }
        }
        if self.max_age.is_some() {
            config.max_age = self.max_age;
        }
        if self.reproduction_threshold.is_some() {
            config.reproduction_threshold = self.reproduction_threshold;
        }
        if self.seed.is_some() {
            config.rng_seed = self.seed;
        }
        config.validate()?;
        Ok(config)
    }

    #[must_use]
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            ticks: self.ticks,
            frame_interval: self.frame_interval.max(1),
            output: self.output.clone(),
            encoding: if self.rgb { Encoding::Rgb } else { Encoding::Rgba },
            stop_at_extinction: self.stop_at_extinction,
            first_tick: self.first_tick,
        }
    }
}

/// Read a [`WorldConfig`] from a JSON file; missing fields take defaults.
pub fn load_config(path: &Path) -> Result<WorldConfig> {
    let file = File::open(path)
        .with_context(|| format!("failed to open config {}", path.display()))?;
    serde_json::from_reader(file)
        .with_context(|| format!("failed to parse config {}", path.display()))
}

/// Per-world settings that do not affect the simulation itself.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub ticks: u64,
    pub frame_interval: u64,
    pub output: Option<PathBuf>,
    pub encoding: Encoding,
    pub stop_at_extinction: bool,
    pub first_tick: u64,
}

/// Outcome of one world's run.
#[derive(Debug, Clone, Serialize)]
pub struct WorldReport {
    pub world: u64,
    pub seed: Option<u64>,
    pub summary: RunSummary,
    /// Tick after which no agent was left, if that happened.
    pub extinct_after: Option<u64>,
    pub frames_written: u64,
}

/// Frame file for `world` at `tick` inside `dir`.
#[must_use]
pub fn frame_path(dir: &Path, world: u64, tick: u64) -> PathBuf {
    dir.join(format!("{world}-{tick}.png"))
}

/// Configuration for the world numbered `index`: seeded runs offset the
/// seed so every world differs but stays reproducible.
#[must_use]
pub fn config_for_world(base: &WorldConfig, index: u64) -> WorldConfig {
    WorldConfig {
        rng_seed: base.rng_seed.map(|seed| seed.wrapping_add(index)),
        ..base.clone()
    }
}

/// Create and step one world, writing frames into `options.output`.
pub fn run_world(
    index: u64,
    config: WorldConfig,
    options: &RunOptions,
    rng: &mut dyn RandomSource,
) -> Result<WorldReport> {
    let seed = config.rng_seed;
    let mut world = World::new(config, rng).context("failed to create world")?;
    if let Some(dir) = &options.output {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create output directory {}", dir.display()))?;
    }

    let mut summary = RunSummary::default();
    let mut frames_written = 0;
    let mut extinct_after = None;
    for tick in 0..options.ticks {
        if let Some(dir) = &options.output
            && tick.is_multiple_of(options.frame_interval)
        {
            let path = frame_path(dir, index, options.first_tick.saturating_add(tick));
            render(&world, default_color)
                .save_png(&path, options.encoding)
                .with_context(|| format!("failed to write frame {}", path.display()))?;
            frames_written += 1;
        }

        let stats = world.step(rng);
        summary.record(&stats);

        if !world.has_life() {
            extinct_after.get_or_insert(tick);
            if options.stop_at_extinction {
                debug!(world = index, tick, "population extinct, stopping");
                break;
            }
        }
    }

    info!(
        world = index,
        ticks = summary.ticks,
        peak_population = summary.highest.population,
        mean_population = summary.mean_population(),
        births = summary.totals.births,
        deaths = summary.totals.deaths(),
        food = summary.totals.food_placed,
        frames = frames_written,
        "world finished"
    );
    Ok(WorldReport {
        world: index,
        seed,
        summary,
        extinct_after,
        frames_written,
    })
}

/// Run every world requested by `cli`, optionally saving the summaries.
pub fn run(cli: &Cli) -> Result<Vec<WorldReport>> {
    let base = cli.world_config()?;
    let options = cli.run_options();
    let mut reports = Vec::new();

    for offset in 0..cli.worlds {
        let index = cli.first_world + offset;
        let config = config_for_world(&base, offset);
        let mut rng = config.seeded_rng().context("failed to create random source")?;
        info!(
            world = index,
            of = cli.worlds,
            width = config.width,
            height = config.height,
            population = config.initial_population,
            "starting world"
        );
        reports.push(run_world(index, config, &options, &mut rng)?);
    }

    if let Some(path) = &cli.summary {
        write_summaries(path, &reports)?;
    }
    Ok(reports)
}

fn write_summaries(path: &Path, reports: &[WorldReport]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create summary {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), reports)
        .with_context(|| format!("failed to write summary {}", path.display()))?;
    info!(path = %path.display(), worlds = reports.len(), "summaries written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("cells").chain(args.iter().copied()))
            .expect("valid arguments")
    }

    #[test]
    fn flags_override_defaults() {
        let cli = parse(&["--width", "50", "--height", "20", "--population", "30", "--seed", "9"]);
        let config = cli.world_config().expect("config");
        assert_eq!((config.width, config.height), (50, 20));
        assert_eq!(config.initial_population, 30);
        assert_eq!(config.rng_seed, Some(9));
        assert_eq!(config.food_interval, WorldConfig::default().food_interval);
    }

    #[test]
    fn invalid_overrides_are_rejected() {
        let cli = parse(&["--width", "0"]);
        assert!(cli.world_config().is_err());
        assert!(Cli::try_parse_from(["cells", "--worlds", "0"]).is_err());
        assert!(Cli::try_parse_from(["cells", "--frame-interval", "0"]).is_err());
    }

    #[test]
    fn run_options_follow_flags() {
        let options = parse(&["--rgb", "--ticks", "5", "--output", "frames"]).run_options();
        assert_eq!(options.encoding, Encoding::Rgb);
        assert_eq!(options.ticks, 5);
        assert_eq!(options.output, Some(PathBuf::from("frames")));
        assert!(!options.stop_at_extinction);
        assert_eq!(parse(&[]).run_options().encoding, Encoding::Rgba);
    }

    #[test]
    fn frame_names_combine_world_and_tick() {
        let path = frame_path(Path::new("out"), 2, 40);
        assert_eq!(path, Path::new("out").join("2-40.png"));
    }

    #[test]
    fn worlds_get_distinct_seeds() {
        let base = WorldConfig::default().with_seed(u64::MAX);
        assert_eq!(config_for_world(&base, 0).rng_seed, Some(u64::MAX));
        assert_eq!(config_for_world(&base, 1).rng_seed, Some(0));
        let unseeded = WorldConfig::default();
        assert_eq!(config_for_world(&unseeded, 3).rng_seed, None);
    }
}
