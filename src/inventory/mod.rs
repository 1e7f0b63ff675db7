//! Worker inventory configuration.
//!
//! Parses and validates the worker inventory file at
//! `~/.config/gplay/workers.toml`. Each worker entry describes a remote
//! build machine whose workspace holds uploadable artifacts.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Worker inventory configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerInventory {
    /// Schema version for forward compatibility.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// List of workers.
    #[serde(default, rename = "worker")]
    pub workers: Vec<WorkerEntry>,
}

fn default_schema_version() -> u32 {
    1
}

/// A single worker entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerEntry {
    /// Unique identifier for this worker (must be unique across inventory).
    pub name: String,

    /// SSH hostname or IP address.
    pub host: String,

    /// SSH port (default: 22).
    #[serde(default = "default_port")]
    pub port: u16,

    /// SSH user (default: "gplay").
    #[serde(default = "default_user")]
    pub user: String,

    /// Tags for filtering (e.g., ["android", "release"]).
    #[serde(default)]
    pub tags: Vec<String>,

    /// Path to SSH private key.
    #[serde(alias = "identity_file")]
    pub ssh_key_path: Option<String>,

    /// Workspace root on the worker where build artifacts land.
    pub workspace_root: Option<String>,

    /// Priority for deterministic worker selection (lower = higher priority).
    #[serde(default = "default_priority")]
    pub priority: i32,
}

fn default_port() -> u16 {
    22
}

fn default_user() -> String {
    "gplay".to_string()
}

fn default_priority() -> i32 {
    100
}

/// Errors that can occur when loading or validating worker inventory.
#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("failed to read inventory file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("duplicate worker name: '{0}'")]
    DuplicateName(String),

    #[error("worker '{name}': missing required field '{field}'")]
    MissingField { name: String, field: String },

    #[error("worker '{name}': invalid value for '{field}': {reason}")]
    InvalidValue {
        name: String,
        field: String,
        reason: String,
    },

    #[error("inventory file not found: {0}")]
    NotFound(PathBuf),
}

impl WorkerInventory {
    /// Load worker inventory from the default location.
    pub fn load_default() -> Result<Self, InventoryError> {
        let path = Self::default_path()?;
        Self::load(&path)
    }

    /// Get the default inventory file path (~/.config/gplay/workers.toml).
    pub fn default_path() -> Result<PathBuf, InventoryError> {
        let home = std::env::var("HOME").map_err(|_| {
            InventoryError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "HOME environment variable not set",
            ))
        })?;
        Ok(PathBuf::from(home).join(".config/gplay/workers.toml"))
    }

    /// Load worker inventory from a specific path.
    pub fn load(path: &Path) -> Result<Self, InventoryError> {
        if !path.exists() {
            return Err(InventoryError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse worker inventory from a TOML string.
    pub fn parse(content: &str) -> Result<Self, InventoryError> {
        let inventory: WorkerInventory = toml::from_str(content)?;
        inventory.validate()?;
        Ok(inventory)
    }

    fn validate(&self) -> Result<(), InventoryError> {
        let mut seen_names = HashSet::new();
        for worker in &self.workers {
            if !seen_names.insert(&worker.name) {
                return Err(InventoryError::DuplicateName(worker.name.clone()));
            }
        }
        for worker in &self.workers {
            worker.validate()?;
        }
        Ok(())
    }

    /// Get a worker by name.
    pub fn get(&self, name: &str) -> Option<&WorkerEntry> {
        self.workers.iter().find(|w| w.name == name)
    }

    /// Filter workers by tags (all tags must match).
    pub fn filter_by_tags(&self, required_tags: &[&str]) -> Vec<&WorkerEntry> {
        self.workers
            .iter()
            .filter(|w| required_tags.iter().all(|tag| w.tags.contains(&tag.to_string())))
            .collect()
    }

    /// Workers sorted by priority, then name.
    pub fn sorted_by_priority(&self) -> Vec<&WorkerEntry> {
        let mut workers: Vec<_> = self.workers.iter().collect();
        workers.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.name.cmp(&b.name)));
        workers
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }
}

impl WorkerEntry {
    fn validate(&self) -> Result<(), InventoryError> {
        if self.name.is_empty() {
            return Err(InventoryError::MissingField {
                name: "(unnamed)".to_string(),
                field: "name".to_string(),
            });
        }

        if self.host.is_empty() {
            return Err(InventoryError::MissingField {
                name: self.name.clone(),
                field: "host".to_string(),
            });
        }

        if self.port == 0 {
            return Err(InventoryError::InvalidValue {
                name: self.name.clone(),
                field: "port".to_string(),
                reason: "port cannot be 0".to_string(),
            });
        }

        if self.user.is_empty() {
            return Err(InventoryError::InvalidValue {
                name: self.name.clone(),
                field: "user".to_string(),
                reason: "user cannot be empty".to_string(),
            });
        }

        if !self
            .name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
        {
            return Err(InventoryError::InvalidValue {
                name: self.name.clone(),
                field: "name".to_string(),
                reason: "name must contain only alphanumeric characters, dashes, and underscores"
                    .to_string(),
            });
        }

        Ok(())
    }

    /// Get the expanded SSH key path (resolves ~ to home directory).
    pub fn expanded_ssh_key_path(&self) -> Option<PathBuf> {
        self.ssh_key_path.as_ref().map(|p| {
            if let Some(rest) = p.strip_prefix("~/") {
                if let Ok(home) = std::env::var("HOME") {
                    return PathBuf::from(home).join(rest);
                }
            }
            PathBuf::from(p)
        })
    }
}

impl Default for WorkerInventory {
    fn default() -> Self {
        Self {
            schema_version: 1,
            workers: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_inventory() {
        let content = r#"
            schema_version = 1

            [[worker]]
            name = "builder-01"
            host = "builder.local"
            user = "gplay"
            port = 22
            tags = ["android", "release"]
            ssh_key_path = "~/.ssh/gplay_builder"
            workspace_root = "/srv/builds/app"
            priority = 10
        "#;

        let inventory = WorkerInventory::parse(content).unwrap();
        assert_eq!(inventory.workers.len(), 1);

        let worker = &inventory.workers[0];
        assert_eq!(worker.name, "builder-01");
        assert_eq!(worker.host, "builder.local");
        assert_eq!(worker.workspace_root.as_deref(), Some("/srv/builds/app"));
        assert_eq!(worker.priority, 10);
    }

    #[test]
    fn test_default_values() {
        let content = r#"
            [[worker]]
            name = "minimal"
            host = "host.local"
        "#;

        let inventory = WorkerInventory::parse(content).unwrap();
        let worker = &inventory.workers[0];
        assert_eq!(worker.port, 22);
        assert_eq!(worker.user, "gplay");
        assert_eq!(worker.priority, 100);
        assert!(worker.workspace_root.is_none());
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let content = r#"
            [[worker]]
            name = "same-name"
            host = "host1.local"

            [[worker]]
            name = "same-name"
            host = "host2.local"
        "#;

        let result = WorkerInventory::parse(content);
        assert!(matches!(result, Err(InventoryError::DuplicateName(_))));
    }

    #[test]
    fn test_empty_host_rejected() {
        let content = r#"
            [[worker]]
            name = "worker"
            host = ""
        "#;

        let result = WorkerInventory::parse(content);
        assert!(matches!(result, Err(InventoryError::MissingField { .. })));
    }

    #[test]
    fn test_invalid_name_rejected() {
        let content = r#"
            [[worker]]
            name = "worker name with spaces"
            host = "host.local"
        "#;

        let result = WorkerInventory::parse(content);
        assert!(matches!(result, Err(InventoryError::InvalidValue { .. })));
    }

    #[test]
    fn test_filter_by_tags() {
        let content = r#"
            [[worker]]
            name = "android-1"
            host = "host1.local"
            tags = ["android", "release"]

            [[worker]]
            name = "android-2"
            host = "host2.local"
            tags = ["android"]

            [[worker]]
            name = "other"
            host = "host3.local"
            tags = ["ios"]
        "#;

        let inventory = WorkerInventory::parse(content).unwrap();
        assert_eq!(inventory.filter_by_tags(&["android"]).len(), 2);
        assert_eq!(inventory.filter_by_tags(&["android", "release"]).len(), 1);
        assert_eq!(inventory.filter_by_tags(&["ios"]).len(), 1);
    }

    #[test]
    fn test_sorted_by_priority_then_name() {
        let content = r#"
            [[worker]]
            name = "worker-b"
            host = "host1.local"
            priority = 20

            [[worker]]
            name = "worker-a"
            host = "host2.local"
            priority = 10

            [[worker]]
            name = "worker-c"
            host = "host3.local"
            priority = 10
        "#;

        let inventory = WorkerInventory::parse(content).unwrap();
        let sorted = inventory.sorted_by_priority();
        assert_eq!(sorted[0].name, "worker-a");
        assert_eq!(sorted[1].name, "worker-c");
        assert_eq!(sorted[2].name, "worker-b");
    }

    #[test]
    fn test_identity_file_alias() {
        let content = r#"
            [[worker]]
            name = "worker"
            host = "host.local"
            identity_file = "/path/to/key"
        "#;

        let inventory = WorkerInventory::parse(content).unwrap();
        assert_eq!(
            inventory.workers[0].ssh_key_path,
            Some("/path/to/key".to_string())
        );
    }

    #[test]
    fn test_expanded_ssh_key_path() {
        let content = r#"
            [[worker]]
            name = "worker"
            host = "host.local"
            ssh_key_path = "~/.ssh/key"
        "#;

        let inventory = WorkerInventory::parse(content).unwrap();
        let expanded = inventory.workers[0].expanded_ssh_key_path().unwrap();
        assert!(!expanded.to_string_lossy().starts_with('~'));
    }
}
