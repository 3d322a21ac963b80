//! Repository-to-object association consulted before serving.
//!
//! The server only needs one question answered: does this repository know
//! about this oid, and if so, what is its pointer. Anything that can answer it
//! implements [`MetaStore`].

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::RwLock;

use async_trait::async_trait;
use depot_types::{Oid, Pointer};
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

/// An `owner/name` repository reference.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    /// Build a reference; a trailing `.git` on the name is dropped.
    pub fn new(owner: impl Into<String>, name: impl AsRef<str>) -> Self {
        let name = name.as_ref();
        Self {
            owner: owner.into(),
            name: name.strip_suffix(".git").unwrap_or(name).to_string(),
        }
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepoRef {
    type Err = ServerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
                Ok(Self::new(owner, name))
            }
            _ => Err(ServerError::Catalog(format!(
                "invalid repository reference {s:?}, expected owner/name"
            ))),
        }
    }
}

/// Resolves an oid within a repository to its pointer.
#[async_trait]
pub trait MetaStore: Send + Sync {
    /// `Ok(None)` when the repository does not reference the oid.
    async fn resolve(&self, repo: &RepoRef, oid: &Oid) -> ServerResult<Option<Pointer>>;
}

/// In-memory association table.
#[derive(Default)]
pub struct InMemoryMetaStore {
    repos: RwLock<HashMap<RepoRef, HashMap<Oid, Pointer>>>,
}

impl InMemoryMetaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a catalog. Invalid repository keys are rejected.
    pub fn from_catalog(catalog: &Catalog) -> ServerResult<Self> {
        let store = Self::new();
        for (repo, pointers) in &catalog.repositories {
            let repo: RepoRef = repo.parse()?;
            for pointer in pointers {
                store.associate(&repo, *pointer);
            }
        }
        Ok(store)
    }

    /// Record that `repo` references `pointer`.
    pub fn associate(&self, repo: &RepoRef, pointer: Pointer) {
        let mut repos = self.repos.write().expect("lock poisoned");
        repos
            .entry(repo.clone())
            .or_default()
            .insert(pointer.oid, pointer);
    }

    /// Drop the association. Returns `true` if it existed.
    pub fn dissociate(&self, repo: &RepoRef, oid: &Oid) -> bool {
        let mut repos = self.repos.write().expect("lock poisoned");
        repos
            .get_mut(repo)
            .is_some_and(|objects| objects.remove(oid).is_some())
    }

    /// Number of associations across all repositories.
    pub fn len(&self) -> usize {
        self.repos
            .read()
            .expect("lock poisoned")
            .values()
            .map(HashMap::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl MetaStore for InMemoryMetaStore {
    async fn resolve(&self, repo: &RepoRef, oid: &Oid) -> ServerResult<Option<Pointer>> {
        let repos = self.repos.read().expect("lock poisoned");
        Ok(repos.get(repo).and_then(|objects| objects.get(oid)).copied())
    }
}

impl fmt::Debug for InMemoryMetaStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryMetaStore")
            .field("associations", &self.len())
            .finish()
    }
}

/// On-disk JSON catalog: `{"repositories": {"owner/name": [pointer, ...]}}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub repositories: BTreeMap<String, Vec<Pointer>>,
}

impl Catalog {
    /// Load a catalog; a missing file is an empty catalog.
    pub fn load(path: &Path) -> ServerResult<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(ServerError::Io(e)),
        };
        serde_json::from_str(&text)
            .map_err(|e| ServerError::Catalog(format!("{}: {e}", path.display())))
    }

    /// Write the catalog as pretty JSON, replacing the file atomically.
    pub fn save(&self, path: &Path) -> ServerResult<()> {
        let json = serde_json::to_vec_pretty(self)
            .map_err(|e| ServerError::Catalog(e.to_string()))?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Add a pointer to a repository. Returns `false` if already listed.
    pub fn add(&mut self, repo: &RepoRef, pointer: Pointer) -> bool {
        let pointers = self.repositories.entry(repo.to_string()).or_default();
        if pointers.iter().any(|p| p.oid == pointer.oid) {
            return false;
        }
        pointers.push(pointer);
        true
    }
}
