//! Seams to the managed backend.
//!
//! The data store and the identity provider are external collaborators; the
//! views only ever see them through [`DataClient`] and [`AuthProvider`]. Both
//! handles are built once per process by [`connect`] and passed down
//! explicitly.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::datastore::LocalBackend;
use crate::error::BackendError;
use crate::model::{Candidate, CandidateFilter, Collection, CreateTodo, Identity, Todo};
use crate::subscription::Subscription;

const FILE_SCHEME: &str = "file://";

pub trait DataClient: Send + Sync {
    fn list_todos(&self) -> Result<Vec<Todo>, BackendError>;

    /// Standing query on the todo collection. The first push carries the
    /// current snapshot.
    fn observe_todos(&self) -> Result<Subscription<Todo>, BackendError>;

    fn create_todo(&self, input: CreateTodo) -> Result<Todo, BackendError>;

    fn delete_todo(&self, id: &str) -> Result<(), BackendError>;

    fn list_candidates(&self, filter: &CandidateFilter) -> Result<Vec<Candidate>, BackendError>;
}

pub trait AuthProvider: Send + Sync {
    /// `BackendError::NotAuthenticated` when nobody is signed in.
    fn current_identity(&self) -> Result<Identity, BackendError>;

    fn sign_out(&self) -> Result<(), BackendError>;
}

/// The pair of handles every view receives.
#[derive(Clone)]
pub struct Clients {
    pub data: Arc<dyn DataClient>,
    pub auth: Arc<dyn AuthProvider>,
}

impl Clients {
    pub fn from_local(backend: Arc<LocalBackend>) -> Self {
        Self {
            data: backend.clone(),
            auth: backend,
        }
    }

    /// Current identity, with "nobody signed in" mapped to `None`.
    pub fn identity(&self) -> Result<Option<Identity>, BackendError> {
        match self.auth.current_identity() {
            Ok(identity) => Ok(Some(identity)),
            Err(BackendError::NotAuthenticated) => Ok(None),
            Err(err) => Err(err),
        }
    }
}

/// Generated artifact describing where the backend lives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BackendOutputs {
    #[serde(default)]
    pub version: Option<String>,

    pub data: DataOutputs,

    #[serde(default)]
    pub auth: Option<AuthOutputs>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DataOutputs {
    pub url: String,

    #[serde(default)]
    pub default_authorization_type: Option<String>,

    #[serde(default)]
    pub models: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthOutputs {
    #[serde(default)]
    pub user_pool_id: Option<String>,

    #[serde(default)]
    pub username_attributes: Vec<String>,
}

impl BackendOutputs {
    #[tracing::instrument]
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read backend outputs {}", path.display()))?;
        let outputs: Self = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse backend outputs {}", path.display()))?;
        debug!(url = %outputs.data.url, models = ?outputs.data.models, "loaded backend outputs");
        Ok(outputs)
    }

    /// Both collections must be declared by the schema.
    pub fn validate(&self) -> Result<(), BackendError> {
        for collection in Collection::ALL {
            if !self.data.models.iter().any(|model| model == collection.name()) {
                return Err(BackendError::UnknownCollection(collection.name().to_string()));
            }
        }
        Ok(())
    }

    /// Store location for a `file://` endpoint. Relative paths resolve
    /// against `base_dir`.
    pub fn store_path(&self, base_dir: &Path) -> Result<PathBuf, BackendError> {
        let url = self.data.url.trim();
        let rest = url
            .strip_prefix(FILE_SCHEME)
            .ok_or_else(|| BackendError::UnsupportedEndpoint(url.to_string()))?;
        if rest.is_empty() {
            return Err(BackendError::UnsupportedEndpoint(url.to_string()));
        }

        let path = PathBuf::from(rest);
        if path.is_absolute() {
            Ok(path)
        } else {
            Ok(base_dir.join(path))
        }
    }
}

/// Opens the backend named by `outputs`, or the local store in `data_dir`
/// when no artifact is configured.
#[tracing::instrument(skip(outputs))]
pub fn connect(
    outputs: Option<(&BackendOutputs, &Path)>,
    data_dir: &Path,
) -> Result<Arc<LocalBackend>, BackendError> {
    let store_dir = match outputs {
        Some((outputs, base_dir)) => {
            outputs.validate()?;
            outputs.store_path(base_dir)?
        }
        None => data_dir.to_path_buf(),
    };

    let backend = LocalBackend::open(&store_dir)?;
    info!(store = %store_dir.display(), "connected to backend");
    Ok(Arc::new(backend))
}
