//! Identity models consumed from the external identity provider.

use serde::{Deserialize, Serialize};

/// The signed-in user as reported by the identity provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub full_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl UserProfile {
    pub fn with_full_name(name: impl Into<String>) -> Self {
        Self {
            full_name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Full name, else "first last", else nothing.
    pub fn display_name(&self) -> Option<String> {
        if let Some(full) = self.full_name.as_deref().map(str::trim) {
            if !full.is_empty() {
                return Some(full.to_string());
            }
        }

        let joined = format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or(""),
            self.last_name.as_deref().unwrap_or("")
        );
        let joined = joined.trim();
        if joined.is_empty() {
            None
        } else {
            Some(joined.to_string())
        }
    }
}

/// All the rest of the system knows about identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub is_signed_in: bool,
    pub display_name: Option<String>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }
}
