use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identity of a placed asset.
///
/// Display names (`"LDU 2"`) are reused after deletion, so everything that
/// must survive a rename or a reused index refers to assets by `UID`.
#[derive(Eq, PartialEq, Hash, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct UID(Uuid);

impl Default for UID {
    fn default() -> Self {
        Self::new()
    }
}

impl UID {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for UID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
