use linkage_solver::{Linkage, LinkageRecord};
use serde::{Deserialize, Serialize};

use crate::errors::StoreError;
use crate::metadata::LinkageMetadata;

/// Format identifier written into every document.
pub const FORMAT_NAME: &str = "linkage";

/// Current document format version.
pub const FORMAT_VERSION: u32 = 1;

/// The top-level document structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinkageDocument {
    pub format: String,
    pub version: u32,
    pub metadata: LinkageMetadata,
    /// Joints and rods in canonical order.
    pub linkage: LinkageRecord,
}

/// Serialize a linkage to a pretty-printed JSON document.
pub fn encode_linkage(linkage: &Linkage, metadata: &LinkageMetadata) -> Result<String, StoreError> {
    let document = LinkageDocument {
        format: FORMAT_NAME.to_string(),
        version: FORMAT_VERSION,
        metadata: metadata.clone(),
        linkage: LinkageRecord::from(linkage),
    };
    serde_json::to_string_pretty(&document).map_err(|e| StoreError::SerializeError(e.to_string()))
}

/// Parse a JSON document back into a validated linkage.
///
/// The format identifier and version are checked before the linkage is built,
/// and a document that fails any check yields no linkage at all.
pub fn decode_linkage(json: &str) -> Result<(Linkage, LinkageMetadata), StoreError> {
    let document: LinkageDocument =
        serde_json::from_str(json).map_err(|e| StoreError::ParseError(e.to_string()))?;

    if document.format != FORMAT_NAME {
        return Err(StoreError::UnknownFormat(document.format));
    }
    if document.version > FORMAT_VERSION {
        return Err(StoreError::FutureVersion {
            file_version: document.version,
            supported_version: FORMAT_VERSION,
        });
    }

    let linkage = document.linkage.into_linkage()?;
    Ok((linkage, document.metadata))
}
