//! Command-line arguments

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use tripreplay_core::clock::PlaybackSpeed;

pub const USAGE: &str = "Usage: tripreplay [CONFIG] [--demo] [--seed N] [--speed 1|2|5] [--until-end]";

#[derive(Debug, Clone, PartialEq)]
pub struct Args {
    /// Fleet configuration file; built-in defaults when absent
    pub config: Option<PathBuf>,
    /// Play a generated demo fleet instead of recorded logs
    pub demo: bool,
    /// Seed for the demo generator
    pub seed: u64,
    /// Overrides the configured initial speed
    pub speed: Option<PlaybackSpeed>,
    /// Exit once simulated time reaches the end
    pub until_end: bool,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            config: None,
            demo: false,
            seed: 42,
            speed: None,
            until_end: false,
        }
    }
}

impl Args {
    /// Parse arguments, excluding the program name
    pub fn parse<I: IntoIterator<Item = String>>(args: I) -> Result<Self> {
        let mut parsed = Args::default();
        let mut iter = args.into_iter();

        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--demo" => parsed.demo = true,
                "--until-end" => parsed.until_end = true,
                "--seed" => {
                    let value = iter.next().context("--seed needs a value")?;
                    parsed.seed = value
                        .parse()
                        .with_context(|| format!("invalid seed '{value}'"))?;
                }
                "--speed" => {
                    let value = iter.next().context("--speed needs a value")?;
                    let multiplier: u32 = value
                        .parse()
                        .with_context(|| format!("invalid speed '{value}'"))?;
                    parsed.speed = Some(PlaybackSpeed::from_multiplier(multiplier)?);
                }
                flag if flag.starts_with("--") => bail!("unknown option {flag}\n{USAGE}"),
                path => {
                    if parsed.config.is_some() {
                        bail!("more than one config file given\n{USAGE}");
                    }
                    parsed.config = Some(PathBuf::from(path));
                }
            }
        }
        Ok(parsed)
    }
}
