//! Repository location settings

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where schema checkouts live and which branch is the baseline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryOptions {
    /// Directory holding one checkout per schema branch
    #[serde(default = "default_path")]
    pub path: PathBuf,

    /// Baseline branch, never synchronized
    #[serde(default = "default_branch")]
    pub default_branch: String,
}

fn default_path() -> PathBuf {
    PathBuf::from("repository")
}

fn default_branch() -> String {
    "master".to_string()
}

impl Default for RepositoryOptions {
    fn default() -> Self {
        Self {
            path: default_path(),
            default_branch: default_branch(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let options: RepositoryOptions = serde_yaml::from_str("path: /srv/schemas\n").unwrap();
        assert_eq!(options.path, PathBuf::from("/srv/schemas"));
        assert_eq!(options.default_branch, "master");
    }
}
