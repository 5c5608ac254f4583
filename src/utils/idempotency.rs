/// Stable keys for diagnostic artifacts
use sha2::{Digest, Sha256};

/// SHA-256 over the components, separated so that `["ab", "c"]` and `["a", "bc"]` differ
pub fn generate_idempotency_key(components: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for component in components {
        hasher.update(component.as_bytes());
        hasher.update([0x1f]);
    }
    let result = hasher.finalize();
    format!("{:x}", result)
}
