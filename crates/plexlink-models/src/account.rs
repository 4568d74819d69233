use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Entry of the plex.tv home user directory
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct HomeUser {
    pub id: u64,
    pub title: Option<String>,
    pub username: Option<String>,
    pub friendly_name: Option<String>,
}

impl HomeUser {
    /// Normalized (trimmed, lower-cased, non-empty) name variants of this user
    pub fn name_variants(&self) -> HashSet<String> {
        [&self.friendly_name, &self.title, &self.username]
            .into_iter()
            .filter_map(|name| name.as_deref())
            .filter_map(normalize_name)
            .collect()
    }
}

/// Account known to a single media server (`/accounts`)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerAccount {
    pub id: u64,
    pub name: String,
}

/// Trim and lower-case a display name; blank names yield None
pub fn normalize_name(name: &str) -> Option<String> {
    let normalized = name.trim().to_lowercase();
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_variants_normalized() {
        let user = HomeUser {
            id: 7,
            title: Some("  Alice ".to_string()),
            username: Some("ALICE_W".to_string()),
            friendly_name: Some("".to_string()),
        };
        let variants = user.name_variants();
        assert_eq!(variants.len(), 2);
        assert!(variants.contains("alice"));
        assert!(variants.contains("alice_w"));
    }
}
