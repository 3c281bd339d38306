//! General application configuration.

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Upper bound on one page of audit entries.
pub const MAX_AUDIT_PAGE_LIMIT: u32 = 50;

const fn default_audit_page_limit() -> u32 {
    MAX_AUDIT_PAGE_LIMIT
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneralConfig {
    /// Default page size for audit listings.
    #[serde(default = "default_audit_page_limit")]
    pub audit_page_limit: u32,

    /// Actor id used by the CLI when `--actor` is not given.
    #[serde(default)]
    pub actor_id: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            audit_page_limit: default_audit_page_limit(),
            actor_id: String::new(),
        }
    }
}

impl GeneralConfig {
    /// The configured actor, if any.
    #[must_use]
    pub fn actor(&self) -> Option<&str> {
        if self.actor_id.is_empty() {
            None
        } else {
            Some(&self.actor_id)
        }
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.audit_page_limit == 0 || self.audit_page_limit > MAX_AUDIT_PAGE_LIMIT {
            return Err(ConfigError::invalid(
                "general.audit_page_limit",
                format!("must be between 1 and {MAX_AUDIT_PAGE_LIMIT}"),
            ));
        }
        Ok(())
    }
}
