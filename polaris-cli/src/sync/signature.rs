//! Entity change signatures
//!
//! Overwriting an entity on the target means deleting and recreating it,
//! which is too destructive to do blindly on every run. Instead both
//! copies are hashed over their canonical JSON form; only a differing
//! signature triggers an overwrite, everything else reports NOT_MODIFIED.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// SHA-256 over the entity's canonical JSON serialization. Map fields use
/// ordered maps, so equal entities always hash equally.
pub fn entity_signature<T: Serialize>(entity: &T) -> String {
    let json = serde_json::to_vec(entity).unwrap_or_default();
    hex::encode(Sha256::digest(&json))
}

/// Whether the source and target copies of an entity differ.
pub fn has_changed<T: Serialize>(source: &T, target: &T) -> bool {
    entity_signature(source) != entity_signature(target)
}
