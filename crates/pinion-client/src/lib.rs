pub use error::Error;
pub use fetch::open_local_or_remote_file;
pub use hash::{Hasher, hash_reader};
pub use registry_client::{DEFAULT_RETRIES, RegistryClient, RegistryClientBuilder};

mod error;
mod fetch;
mod hash;
mod registry_client;
