/// Declares all environment variables read by `pinion` and its crates.
pub struct EnvVars;

impl EnvVars {
    /// Equivalent to the `--cache-dir` command-line argument. If set, pinion will use this
    /// directory for the hash cache, downloaded artifacts and build scratch space.
    pub const PINION_CACHE_DIR: &'static str = "PINION_CACHE_DIR";

    /// Equivalent to the `--no-cache` command-line argument. If set, pinion will use a
    /// temporary cache directory that is removed on exit.
    pub const PINION_NO_CACHE: &'static str = "PINION_NO_CACHE";

    /// Equivalent to the `--index-url` command-line argument. If set, pinion will use this
    /// URL as the default index when searching for packages.
    pub const PINION_INDEX_URL: &'static str = "PINION_INDEX_URL";

    /// Equivalent to the `--extra-index-url` command-line argument. If set, pinion will use
    /// this space-separated list of URLs as additional indexes when searching for packages.
    pub const PINION_EXTRA_INDEX_URL: &'static str = "PINION_EXTRA_INDEX_URL";

    /// Overrides the Python version that candidates are checked against, e.g. `3.12.1`.
    ///
    /// When unset, the version is queried from the first `python3` or `python` found on
    /// `PATH`.
    pub const PINION_PYTHON_VERSION: &'static str = "PINION_PYTHON_VERSION";

    /// Equivalent to the `--use-json` command-line argument. If set, dependency lookups also
    /// consult the index's JSON API.
    pub const PINION_USE_JSON: &'static str = "PINION_USE_JSON";

    /// The digest algorithm used for artifact hashes, one of `md5`, `sha256`, `sha384` or
    /// `sha512`.
    pub const PINION_HASH_ALGORITHM: &'static str = "PINION_HASH_ALGORITHM";

    /// The standard `RUST_LOG` filter, used to configure tracing output.
    pub const RUST_LOG: &'static str = "RUST_LOG";
}
