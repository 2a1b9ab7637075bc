pub mod document;
pub mod errors;
pub mod metadata;
pub mod repository;

pub use document::{decode_linkage, encode_linkage, LinkageDocument, FORMAT_NAME, FORMAT_VERSION};
pub use errors::StoreError;
pub use metadata::LinkageMetadata;
pub use repository::{LinkageRepository, MemoryRepository};
