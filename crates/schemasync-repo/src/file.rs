//! Filesystem-backed repository
//!
//! Every subdirectory of the root is the checkout of one schema branch. A
//! snapshot is the set of YAML resource documents found below it.

use async_trait::async_trait;
use schemasync_core::{
    RepositorySettings, RepositorySnapshot, ResourceDocument, ResourceType,
};
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use crate::error::{RepoError, Result};
use crate::service::RepositoryService;

/// Repository reading schema checkouts from a local directory
#[derive(Debug, Clone)]
pub struct FileRepository {
    root: PathBuf,
}

impl FileRepository {
    /// Open a repository rooted at an existing directory
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(RepoError::InvalidConfig {
                message: format!("repository path {} is not a directory", root.display()),
            });
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Checkout directory of a schema
    pub fn schema_dir(&self, schema: &str) -> Result<PathBuf> {
        if schema.is_empty()
            || schema.starts_with('.')
            || schema.contains(['/', '\\'])
        {
            return Err(RepoError::InvalidSchemaName {
                name: schema.to_string(),
            });
        }
        Ok(self.root.join(schema))
    }

    fn load_snapshot(&self, schema: &str) -> Result<RepositorySnapshot> {
        let dir = self.schema_dir(schema)?;
        if !dir.is_dir() {
            return Err(RepoError::SchemaNotFound {
                name: schema.to_string(),
            });
        }

        let mut resources = Vec::new();
        let mut settings: Option<RepositorySettings> = None;
        let mut seen = HashSet::new();

        let walker = WalkDir::new(&dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e));

        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() || !is_yaml(entry.path()) {
                continue;
            }

            let path = entry.path();
            let content = std::fs::read_to_string(path)?;
            let entry = ResourceDocument::from_yaml(&content)
                .and_then(ResourceDocument::into_entry)
                .map_err(|e| RepoError::InvalidResource {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;

            // Each kind lives in its own directory of the checkout
            let expected = dir.join(entry.kind.directory());
            if path.parent() != Some(expected.as_path()) {
                return Err(RepoError::MisplacedResource {
                    path: path.to_path_buf(),
                    kind: entry.kind.to_string(),
                    expected,
                });
            }

            if !seen.insert((entry.kind, entry.name.clone())) {
                return Err(RepoError::DuplicateResource {
                    schema: schema.to_string(),
                    kind: entry.kind.to_string(),
                    name: entry.name,
                });
            }

            if entry.kind == ResourceType::SettingsFile {
                if settings.is_some() {
                    tracing::warn!(
                        schema,
                        path = %path.display(),
                        "ignoring additional settings file"
                    );
                } else {
                    settings = Some(RepositorySettings::from_spec(&entry.spec)?);
                }
            }

            resources.push(entry);
        }

        Ok(RepositorySnapshot::new(resources, settings))
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

#[async_trait]
impl RepositoryService for FileRepository {
    async fn list_schemas(&self) -> Result<BTreeSet<String>> {
        let mut schemas = BTreeSet::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if !name.starts_with('.') {
                    schemas.insert(name.to_string());
                }
            }
        }
        Ok(schemas)
    }

    async fn snapshot(&self, schema: &str) -> Result<RepositorySnapshot> {
        self.load_snapshot(schema)
    }
}
