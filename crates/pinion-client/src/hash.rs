use sha2::Digest;
use tokio::io::{AsyncRead, AsyncReadExt};

use pinion_pypi_types::{HashAlgorithm, HashDigest};

/// The size of the chunks artifacts are read in while hashing.
const CHUNK_SIZE: usize = 8192;

#[derive(Debug)]
pub enum Hasher {
    Md5(md5::Md5),
    Sha256(sha2::Sha256),
    Sha384(sha2::Sha384),
    Sha512(sha2::Sha512),
}

impl Hasher {
    pub fn update(&mut self, data: &[u8]) {
        match self {
            Self::Md5(hasher) => hasher.update(data),
            Self::Sha256(hasher) => hasher.update(data),
            Self::Sha384(hasher) => hasher.update(data),
            Self::Sha512(hasher) => hasher.update(data),
        }
    }
}

impl From<HashAlgorithm> for Hasher {
    fn from(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Md5 => Self::Md5(md5::Md5::new()),
            HashAlgorithm::Sha256 => Self::Sha256(sha2::Sha256::new()),
            HashAlgorithm::Sha384 => Self::Sha384(sha2::Sha384::new()),
            HashAlgorithm::Sha512 => Self::Sha512(sha2::Sha512::new()),
        }
    }
}

impl From<Hasher> for HashDigest {
    fn from(hasher: Hasher) -> Self {
        match hasher {
            Hasher::Md5(hasher) => Self::new(HashAlgorithm::Md5, format!("{:x}", hasher.finalize())),
            Hasher::Sha256(hasher) => {
                Self::new(HashAlgorithm::Sha256, format!("{:x}", hasher.finalize()))
            }
            Hasher::Sha384(hasher) => {
                Self::new(HashAlgorithm::Sha384, format!("{:x}", hasher.finalize()))
            }
            Hasher::Sha512(hasher) => {
                Self::new(HashAlgorithm::Sha512, format!("{:x}", hasher.finalize()))
            }
        }
    }
}

/// Exhaust the reader, feeding it through a hasher for `algorithm` in fixed-size chunks.
pub async fn hash_reader<R>(mut reader: R, algorithm: HashAlgorithm) -> std::io::Result<HashDigest>
where
    R: AsyncRead + Unpin,
{
    let mut hasher = Hasher::from(algorithm);
    let mut buffer = vec![0; CHUNK_SIZE];
    loop {
        let read = reader.read(&mut buffer).await?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(HashDigest::from(hasher))
}
