use std::io;
use std::path::PathBuf;

use clap::Parser;

use pinion_static::EnvVars;

use crate::Cache;

#[derive(Parser, Debug, Clone)]
pub struct CacheArgs {
    /// Avoid reading from or writing to the cache, using a temporary directory for the duration
    /// of the operation instead.
    #[arg(global = true, long, short, env = EnvVars::PINION_NO_CACHE, value_parser = clap::builder::BoolishValueParser::new())]
    pub no_cache: bool,

    /// Path to the cache directory.
    #[arg(global = true, long, env = EnvVars::PINION_CACHE_DIR)]
    pub cache_dir: Option<PathBuf>,
}

impl TryFrom<CacheArgs> for Cache {
    type Error = io::Error;

    /// Prefer, in order:
    /// 1. A temporary cache directory, if the user requested `--no-cache`.
    /// 2. The specific cache directory specified by the user via `--cache-dir` or
    ///    `PINION_CACHE_DIR`.
    /// 3. The system-appropriate cache directory.
    /// 4. A `.pinion_cache` directory in the current working directory.
    fn try_from(value: CacheArgs) -> Result<Self, Self::Error> {
        if value.no_cache {
            Self::temp()
        } else if let Some(cache_dir) = value.cache_dir {
            Self::from_path(cache_dir)
        } else if let Some(cache_dir) = user_cache_dir() {
            Self::from_path(cache_dir)
        } else {
            Self::from_path(".pinion_cache")
        }
    }
}

/// Returns an appropriate user-level directory for storing the cache, e.g.
/// `$XDG_CACHE_HOME/pinion` on Unix.
fn user_cache_dir() -> Option<PathBuf> {
    etcetera::base_strategy::choose_base_strategy()
        .ok()
        .map(|dirs| etcetera::BaseStrategy::cache_dir(&dirs).join("pinion"))
}
