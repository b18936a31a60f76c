use sha2::{Digest, Sha256};

use crate::content::SceneDescriptor;

/// SHA-256 over the scene list. Reordering scenes changes the hash.
pub fn hash_scene_list(descriptors: &[SceneDescriptor]) -> String {
    let mut hasher = Sha256::new();
    for descriptor in descriptors {
        hasher.update(descriptor.scenario_id.as_bytes());
        hasher.update([0u8]);
        hasher.update([
            u8::from(descriptor.is_train),
            u8::from(descriptor.is_occluded),
            u8::from(descriptor.is_static),
            descriptor.n_tricks,
        ]);
    }
    to_hex_lower(&hasher.finalize())
}

pub fn to_hex_lower(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(HEX[(byte >> 4) as usize] as char);
        out.push(HEX[(byte & 0x0f) as usize] as char);
    }
    out
}
