//! Table options
//!
//! Options are read from a JSON file. Every field is optional:
//!
//! ```json
//! {
//!   "temp_suffix": ".rebuild",
//!   "sync_writes": true,
//!   "validate_on_open": true
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::observability::{log_event_with_fields, Event};
use crate::table::{TableError, TableResult};

/// Options controlling how a table handle behaves
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableOptions {
    /// Suffix appended to the table name for the rebuild file
    #[serde(default = "default_temp_suffix")]
    pub temp_suffix: String,

    /// Sync after every record write, not only after header writes
    #[serde(default = "default_true")]
    pub sync_writes: bool,

    /// Reject files whose header flag is not the table sentinel
    #[serde(default = "default_true")]
    pub validate_on_open: bool,
}

fn default_temp_suffix() -> String {
    ".rebuild".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            temp_suffix: default_temp_suffix(),
            sync_writes: true,
            validate_on_open: true,
        }
    }
}

impl TableOptions {
    /// Load options from a JSON file
    pub fn load(path: &Path) -> TableResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            TableError::config_io(format!("Failed to read options: {}", path.display()), e)
        })?;

        let options = Self::from_json(&content)?;
        log_event_with_fields(
            Event::OptionsLoaded,
            &[("path", &path.display().to_string())],
        );
        Ok(options)
    }

    /// Parse and validate options from a JSON string
    pub fn from_json(content: &str) -> TableResult<Self> {
        let options: TableOptions = serde_json::from_str(content)
            .map_err(|e| TableError::config(format!("Invalid options JSON: {}", e)))?;
        options.validate()?;
        Ok(options)
    }

    /// Returns the rebuild file name for table `name`
    pub fn temp_name(&self, name: &str) -> String {
        format!("{}{}", name, self.temp_suffix)
    }

    fn validate(&self) -> TableResult<()> {
        if self.temp_suffix.is_empty() {
            return Err(TableError::config("temp_suffix must not be empty"));
        }
        if self.temp_suffix.contains(['/', '\\', '\0']) {
            return Err(TableError::config(format!(
                "temp_suffix must not contain path separators: '{}'",
                self.temp_suffix
            )));
        }
        Ok(())
    }
}
