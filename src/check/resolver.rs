// src/check/resolver.rs
use super::CheckError;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One script inside a group directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupMember {
    pub name: String,
    pub path: PathBuf,
}

/// A directory of scripts run together as one check. Never empty.
#[derive(Debug, Clone)]
pub struct ScriptGroup {
    dir: PathBuf,
    members: Vec<GroupMember>,
}

impl ScriptGroup {
    pub fn new(dir: PathBuf, members: Vec<GroupMember>) -> Result<Self, CheckError> {
        if members.is_empty() {
            return Err(CheckError::EmptyGroup(dir));
        }
        Ok(Self { dir, members })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Members in directory listing order.
    pub fn members(&self) -> &[GroupMember] {
        &self.members
    }
}

#[derive(Debug, Clone)]
pub enum Target {
    Script(PathBuf),
    ScriptGroup(ScriptGroup),
}

/// Maps request paths onto entries directly under the scripts root.
#[derive(Debug, Clone)]
pub struct TargetResolver {
    root: PathBuf,
}

impl TargetResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Names of every check currently available under the root.
    pub async fn list_names(&self) -> Result<BTreeSet<String>, CheckError> {
        Ok(list_entries(&self.root).await?.into_iter().collect())
    }

    /// Resolve a request path to a script or a group of scripts.
    ///
    /// Only names that appear verbatim in the root listing are accepted,
    /// which also rules out any traversal outside the root.
    pub async fn resolve(&self, request_path: &str) -> Result<Target, CheckError> {
        let name = normalize_name(request_path);
        let entries = list_entries(&self.root).await?;
        if !entries.iter().any(|entry| entry == name) {
            return Err(CheckError::NotFound(name.to_string()));
        }

        let path = self.root.join(name);
        // Follows symlinks. Anything unreadable is treated as a script and
        // will surface as a launch failure.
        let is_dir = tokio::fs::metadata(&path)
            .await
            .map(|meta| meta.is_dir())
            .unwrap_or(false);

        if !is_dir {
            return Ok(Target::Script(path));
        }

        let members = list_entries(&path)
            .await?
            .into_iter()
            .map(|name| GroupMember {
                path: path.join(&name),
                name,
            })
            .collect();

        Ok(Target::ScriptGroup(ScriptGroup::new(path, members)?))
    }
}

/// Strip leading and trailing separators from a request path.
pub fn normalize_name(request_path: &str) -> &str {
    request_path.trim_matches('/')
}

async fn list_entries(dir: &Path) -> Result<Vec<String>, CheckError> {
    let listing_error = |source: std::io::Error| CheckError::Listing {
        path: dir.to_path_buf(),
        source,
    };

    let mut read_dir = tokio::fs::read_dir(dir).await.map_err(listing_error)?;
    let mut names = Vec::new();
    while let Some(entry) = read_dir.next_entry().await.map_err(listing_error)? {
        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(raw) => debug!(dir = %dir.display(), name = ?raw, "skipping non UTF-8 entry"),
        }
    }
    Ok(names)
}
