//! Short random identifiers for requests and segments

use uuid::Uuid;

/// `prefix` followed by 12 random hex characters
pub fn short_id(prefix: &str) -> String {
    let uuid = Uuid::new_v4().simple().to_string();
    format!("{}{}", prefix, &uuid[..12])
}
