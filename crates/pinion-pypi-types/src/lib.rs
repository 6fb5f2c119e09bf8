pub use hash::{HashAlgorithm, HashDigest, HashError};
pub use index_url::{IndexUrl, IndexUrls};
pub use lenient_requirement::LenientVersionSpecifiers;
pub use location::Location;
pub use metadata::{Metadata, MetadataError, RequiresTxt, RequiresTxtSection};
pub use pypi_json::{ProjectJson, ReleaseInfo, ReleaseJson};
pub use requirement::{Requirement, RequirementError, RequirementKey, RequirementSource};
pub use simple_json::{File, Hashes, SimpleJson, Yanked};

mod hash;
mod index_url;
mod lenient_requirement;
mod location;
mod metadata;
mod pypi_json;
mod requirement;
mod simple_json;
