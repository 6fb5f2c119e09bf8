use std::process::ExitCode;

use anstream::eprintln;
use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use owo_colors::OwoColorize;

use pinion_cache::{Cache, CacheArgs};
use pinion_pypi_types::{HashAlgorithm, IndexUrl, IndexUrls};
use pinion_static::EnvVars;

use crate::commands::{ExitStatus, RepositorySettings};
use crate::printer::Printer;

mod commands;
mod logging;
mod printer;

#[derive(Parser)]
#[command(author, version, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Do not print any output.
    #[arg(global = true, long, short, conflicts_with = "verbose")]
    quiet: bool,

    /// Use verbose output.
    #[arg(global = true, long, short, conflicts_with = "quiet")]
    verbose: bool,

    #[command(flatten)]
    cache_args: CacheArgs,

    #[command(flatten)]
    repository_args: RepositoryArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the best version that satisfies a requirement, e.g. `flask>=2`.
    BestMatch(BestMatchArgs),
    /// Print the direct dependencies of a pinned (`==`) or editable (`-e <path>`) requirement.
    Dependencies(DependenciesArgs),
    /// Print `--hash` options for the artifacts of a pinned requirement.
    Hashes(HashesArgs),
    /// Clear the cache.
    Clean,
}

#[derive(Args)]
struct BestMatchArgs {
    /// The requirement to match.
    requirement: String,

    /// Allow pre-release versions, even if the requirement doesn't mention one.
    #[arg(long, overrides_with = "no_pre")]
    pre: bool,

    /// Never select pre-release versions, even if the requirement mentions one.
    #[arg(long, overrides_with = "pre", hide = true)]
    no_pre: bool,
}

#[derive(Args)]
struct DependenciesArgs {
    /// The pinned or editable requirement, e.g. `flask==3.0.0` or `-e ./project`.
    #[arg(allow_hyphen_values = true)]
    requirement: String,
}

#[derive(Args)]
struct HashesArgs {
    /// The pinned requirement, e.g. `flask==3.0.0`.
    requirement: String,

    /// Include artifacts for every platform, not just this one.
    #[arg(long)]
    all_platforms: bool,
}

#[derive(Args, Debug, Clone)]
struct RepositoryArgs {
    /// The URL of the Python package index (by default: <https://pypi.org/simple>).
    #[arg(global = true, long, short, env = EnvVars::PINION_INDEX_URL)]
    index_url: Option<IndexUrl>,

    /// Extra URLs of package indexes to use, in addition to `--index-url`.
    #[arg(global = true, long, env = EnvVars::PINION_EXTRA_INDEX_URL, value_delimiter = ' ')]
    extra_index_url: Vec<IndexUrl>,

    /// Ignore the package index, instead relying on local files given as requirements.
    #[arg(
        global = true,
        long,
        conflicts_with = "index_url",
        conflicts_with = "extra_index_url"
    )]
    no_index: bool,

    /// The Python version that candidates must support, e.g. `3.12.1`.
    ///
    /// By default, the version of the `python3` (or `python`) in `PATH` is used.
    #[arg(global = true, long, short, env = EnvVars::PINION_PYTHON_VERSION)]
    python_version: Option<String>,

    /// Also ask the index's JSON API for dependencies (only available on PyPI).
    #[arg(global = true, long, env = EnvVars::PINION_USE_JSON, value_parser = clap::builder::BoolishValueParser::new())]
    use_json: bool,

    /// The digest to compute for artifact hashes.
    #[arg(global = true, long, env = EnvVars::PINION_HASH_ALGORITHM, default_value_t = HashAlgorithm::Sha256)]
    favorite_hash: HashAlgorithm,
}

impl From<RepositoryArgs> for RepositorySettings {
    fn from(args: RepositoryArgs) -> Self {
        Self {
            index_urls: IndexUrls::from_args(args.index_url, args.extra_index_url, args.no_index),
            python_version: args.python_version,
            use_json: args.use_json,
            favorite_hash: args.favorite_hash,
        }
    }
}

/// Resolve a `--flag`/`--no-flag` pair, where the last one given wins.
fn flag(yes: bool, no: bool) -> Option<bool> {
    match (yes, no) {
        (true, false) => Some(true),
        (false, true) => Some(false),
        _ => None,
    }
}

async fn run() -> Result<ExitStatus> {
    let cli = Cli::parse();

    logging::setup_logging(if cli.verbose {
        logging::Level::Verbose
    } else {
        logging::Level::Default
    })?;

    let printer = if cli.quiet {
        Printer::Quiet
    } else {
        Printer::Default
    };

    let cache = Cache::try_from(cli.cache_args)?;
    let settings = RepositorySettings::from(cli.repository_args);

    match cli.command {
        Commands::BestMatch(args) => {
            commands::best_match(
                &args.requirement,
                flag(args.pre, args.no_pre),
                settings,
                cache,
                printer,
            )
            .await
        }
        Commands::Dependencies(args) => {
            commands::dependencies(&args.requirement, settings, cache, printer).await
        }
        Commands::Hashes(args) => {
            commands::hashes(
                &args.requirement,
                args.all_platforms,
                settings,
                cache,
                printer,
            )
            .await
        }
        Commands::Clean => commands::clean(&cache, printer),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(status) => status.into(),
        Err(err) => {
            #[allow(clippy::print_stderr)]
            {
                let mut causes = err.chain();
                if let Some(cause) = causes.next() {
                    eprintln!("{}: {}", "error".red().bold(), cause);
                }
                for cause in causes {
                    eprintln!("  {}: {}", "Caused by".red().bold(), cause);
                }
            }
            if commands::is_user_error(&err) {
                ExitStatus::Failure.into()
            } else {
                ExitStatus::Error.into()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn prerelease_flags() {
        let cli = Cli::try_parse_from(["pinion", "best-match", "flask", "--pre"]).unwrap();
        let Commands::BestMatch(args) = cli.command else {
            panic!("expected `best-match`");
        };
        assert_eq!(flag(args.pre, args.no_pre), Some(true));

        let cli =
            Cli::try_parse_from(["pinion", "best-match", "flask", "--pre", "--no-pre"]).unwrap();
        let Commands::BestMatch(args) = cli.command else {
            panic!("expected `best-match`");
        };
        assert_eq!(flag(args.pre, args.no_pre), Some(false));
    }

    #[test]
    fn editable_requirement() {
        let cli = Cli::try_parse_from(["pinion", "dependencies", "-e ./project"]).unwrap();
        let Commands::Dependencies(args) = cli.command else {
            panic!("expected `dependencies`");
        };
        assert_eq!(args.requirement, "-e ./project");
    }

    #[test]
    fn index_settings() {
        let cli = Cli::try_parse_from([
            "pinion",
            "hashes",
            "flask==3.0.0",
            "--index-url",
            "https://mirror.example.com/simple",
            "--favorite-hash",
            "sha512",
        ])
        .unwrap();
        let settings = RepositorySettings::from(cli.repository_args);
        assert!(!settings.index_urls.includes_pypi());
        assert_eq!(settings.favorite_hash, HashAlgorithm::Sha512);
    }
}
