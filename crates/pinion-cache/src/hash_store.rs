use std::io;
use std::io::Write;
use std::path::PathBuf;

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::{Cache, CacheBucket, CacheEntry};

/// A persistent string-to-string store for artifact hashes.
///
/// Each key is stored in its own file, named by the SHA-256 of the key and sharded by the first
/// two characters of that name. The file holds the key on its first line and the value on its
/// second, so that a (vanishingly unlikely) name collision reads as a miss.
#[derive(Debug, Clone)]
pub struct HashStore {
    root: PathBuf,
}

impl HashStore {
    pub fn new(cache: &Cache) -> Self {
        Self {
            root: cache.bucket(CacheBucket::Hashes),
        }
    }

    fn entry(&self, key: &str) -> CacheEntry {
        let digest = format!("{:x}", Sha256::digest(key.as_bytes()));
        CacheEntry::new(self.root.join(&digest[..2]), &digest)
    }

    /// Read the value stored for `key`. Missing or unreadable entries are a miss.
    pub fn get(&self, key: &str) -> Option<String> {
        let entry = self.entry(key);
        let contents = match fs_err::read_to_string(entry.path()) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return None,
            Err(err) => {
                debug!("Ignoring unreadable hash cache entry: {err}");
                return None;
            }
        };
        let (stored_key, value) = contents.split_once('\n')?;
        if stored_key != key || value.is_empty() {
            debug!("Ignoring corrupt hash cache entry: {}", entry.path().display());
            return None;
        }
        Some(value.trim_end().to_string())
    }

    /// Store `value` for `key`, replacing any previous value.
    ///
    /// The entry is written to a temporary file and renamed into place, so readers never observe
    /// a partial write.
    pub fn insert(&self, key: &str, value: &str) -> io::Result<()> {
        let entry = self.entry(key);
        fs_err::create_dir_all(entry.dir())?;
        let mut temp_file = tempfile::NamedTempFile::new_in(entry.dir())?;
        temp_file.write_all(key.as_bytes())?;
        temp_file.write_all(b"\n")?;
        temp_file.write_all(value.as_bytes())?;
        temp_file
            .persist(entry.path())
            .map_err(|err| err.error)?;
        Ok(())
    }
}
