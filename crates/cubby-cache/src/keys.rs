//! Cache key builders.

use cubby_core::Owner;

/// Key of an owner's disk usage entry.
pub fn disk_usage(owner: &Owner) -> String {
    format!("du:{}", owner.key())
}
