use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use chrono::Utc;
use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::backend::{AuthProvider, DataClient};
use crate::error::{BackendError, SubscriptionError};
use crate::model::{
    Candidate, CandidateFilter, Collection, CreateTodo, Identity, SignInDetails, Todo,
};
use crate::subscription::{Push, Subscription, SubscriptionHub};

/// File-backed stand-in for the managed backend.
///
/// One directory holds both collections as JSON lines plus the current
/// session. Every mutation rewrites the whole file atomically and pushes a
/// fresh snapshot to the todo subscribers.
#[derive(Debug)]
pub struct LocalBackend {
    data_dir: PathBuf,
    todos_path: PathBuf,
    candidates_path: PathBuf,
    session_path: PathBuf,
    todo_hub: SubscriptionHub<Todo>,
    write_lock: Mutex<()>,
}

impl LocalBackend {
    #[tracing::instrument(skip(data_dir))]
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        let data_dir = data_dir.to_path_buf();
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;

        let todos_path = data_dir.join("todos.data");
        let candidates_path = data_dir.join("candidates.data");
        let session_path = data_dir.join("session.json");

        if !todos_path.exists() {
            fs::write(&todos_path, "")?;
        }
        if !candidates_path.exists() {
            fs::write(&candidates_path, "")?;
        }

        info!(
            data_dir = %data_dir.display(),
            todos = %todos_path.display(),
            candidates = %candidates_path.display(),
            "opened local backend"
        );

        Ok(Self {
            data_dir,
            todos_path,
            candidates_path,
            session_path,
            todo_hub: SubscriptionHub::new(Collection::Todo),
            write_lock: Mutex::new(()),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn todo_hub(&self) -> &SubscriptionHub<Todo> {
        &self.todo_hub
    }

    #[tracing::instrument(skip(self))]
    pub fn load_todos(&self) -> anyhow::Result<Vec<Todo>> {
        let mut todos: Vec<Todo> =
            load_jsonl(&self.todos_path).context("failed to load todos.data")?;
        todos.sort_by_key(|todo| todo.created_at);
        Ok(todos)
    }

    #[tracing::instrument(skip(self))]
    pub fn load_candidates(&self) -> anyhow::Result<Vec<Candidate>> {
        load_jsonl(&self.candidates_path).context("failed to load candidates.data")
    }

    /// Appends candidates, assigning ids to records that have none.
    #[tracing::instrument(skip(self, incoming), fields(count = incoming.len()))]
    pub fn import_candidates(&self, incoming: Vec<Candidate>) -> anyhow::Result<usize> {
        let _guard = self.write_lock.lock();
        let mut candidates = self.load_candidates()?;
        let added = incoming.len();
        for mut candidate in incoming {
            if candidate.id.trim().is_empty() {
                candidate.id = Uuid::new_v4().to_string();
            }
            candidates.push(candidate);
        }
        save_jsonl_atomic(&self.candidates_path, &candidates)
            .context("failed to save candidates.data")?;
        info!(added, total = candidates.len(), "imported candidates");
        Ok(added)
    }

    /// Starts a session for `login_id`, replacing any previous one.
    #[tracing::instrument(skip(self))]
    pub fn sign_in(&self, login_id: &str) -> anyhow::Result<Identity> {
        let login_id = login_id.trim();
        if login_id.is_empty() {
            return Err(anyhow!("login id cannot be empty"));
        }

        let identity = Identity {
            username: login_id.to_string(),
            sign_in_details: Some(SignInDetails {
                login_id: Some(login_id.to_string()),
                auth_flow_type: Some("USER_SRP_AUTH".to_string()),
            }),
        };

        let mut temp = NamedTempFile::new_in(&self.data_dir)?;
        serde_json::to_writer_pretty(&mut temp, &identity)?;
        temp.flush()?;
        temp.persist(&self.session_path).map_err(|err| {
            anyhow!("failed to persist {}: {}", self.session_path.display(), err)
        })?;

        info!(login_id, "signed in");
        Ok(identity)
    }

    fn snapshot(&self) -> Push<Todo> {
        self.load_todos().map_err(|err| {
            warn!(error = %format!("{err:#}"), "failed to load todo snapshot");
            SubscriptionError {
                collection: Collection::Todo,
                message: format!("{err:#}"),
            }
        })
    }

    fn publish_todos(&self) {
        let delivered = self.todo_hub.publish(self.snapshot());
        debug!(delivered, "pushed todo snapshot");
    }
}

impl DataClient for LocalBackend {
    fn list_todos(&self) -> Result<Vec<Todo>, BackendError> {
        Ok(self.load_todos()?)
    }

    #[tracing::instrument(skip(self))]
    fn observe_todos(&self) -> Result<Subscription<Todo>, BackendError> {
        Ok(self.todo_hub.subscribe_with(self.snapshot()))
    }

    #[tracing::instrument(skip(self, input))]
    fn create_todo(&self, input: CreateTodo) -> Result<Todo, BackendError> {
        let todo = {
            let _guard = self.write_lock.lock();
            let mut todos = self.load_todos()?;
            let todo = Todo::new(input.content, Utc::now());
            todos.push(todo.clone());
            save_jsonl_atomic(&self.todos_path, &todos).context("failed to save todos.data")?;
            todo
        };

        info!(id = %todo.id, "created todo");
        self.publish_todos();
        Ok(todo)
    }

    #[tracing::instrument(skip(self))]
    fn delete_todo(&self, id: &str) -> Result<(), BackendError> {
        {
            let _guard = self.write_lock.lock();
            let mut todos = self.load_todos()?;
            let idx = todos
                .iter()
                .position(|todo| todo.id == id)
                .ok_or_else(|| BackendError::NotFound {
                    collection: Collection::Todo,
                    id: id.to_string(),
                })?;
            todos.remove(idx);
            save_jsonl_atomic(&self.todos_path, &todos).context("failed to save todos.data")?;
        }

        info!(id, "deleted todo");
        self.publish_todos();
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    fn list_candidates(&self, filter: &CandidateFilter) -> Result<Vec<Candidate>, BackendError> {
        let candidates: Vec<Candidate> = self
            .load_candidates()?
            .into_iter()
            .filter(|candidate| filter.matches(candidate))
            .collect();
        debug!(count = candidates.len(), "listed candidates");
        Ok(candidates)
    }
}

impl AuthProvider for LocalBackend {
    #[tracing::instrument(skip(self))]
    fn current_identity(&self) -> Result<Identity, BackendError> {
        if !self.session_path.exists() {
            return Err(BackendError::NotAuthenticated);
        }

        let raw = fs::read_to_string(&self.session_path)
            .with_context(|| format!("failed reading {}", self.session_path.display()))?;
        let identity: Identity = serde_json::from_str(&raw)
            .with_context(|| format!("failed parsing {}", self.session_path.display()))?;
        Ok(identity)
    }

    #[tracing::instrument(skip(self))]
    fn sign_out(&self) -> Result<(), BackendError> {
        if self.session_path.exists() {
            fs::remove_file(&self.session_path)
                .with_context(|| format!("failed removing {}", self.session_path.display()))?;
        }
        info!("signed out");
        Ok(())
    }
}

#[tracing::instrument(skip(path))]
fn load_jsonl<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Vec<T>> {
    debug!(file = %path.display(), "loading jsonl");
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);

    let mut out = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let record: T = serde_json::from_str(trimmed)
            .with_context(|| format!("failed parsing {} line {}", path.display(), idx + 1))?;
        out.push(record);
    }

    debug!(count = out.len(), "loaded records from jsonl");
    Ok(out)
}

#[tracing::instrument(skip(path, records))]
fn save_jsonl_atomic<T: Serialize>(path: &Path, records: &[T]) -> anyhow::Result<()> {
    debug!(file = %path.display(), count = records.len(), "saving jsonl atomically");

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(dir)?;
    for record in records {
        let serialized = serde_json::to_string(record)?;
        writeln!(temp, "{serialized}")?;
    }
    temp.flush()?;

    temp.persist(path)
        .map_err(|err| anyhow!("failed to persist {}: {}", path.display(), err))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open() -> (tempfile::TempDir, LocalBackend) {
        let temp = tempfile::tempdir().expect("tempdir");
        let backend = LocalBackend::open(temp.path()).expect("open backend");
        (temp, backend)
    }

    #[test]
    fn observe_pushes_current_snapshot_first() {
        let (_temp, backend) = open();
        backend
            .create_todo(CreateTodo {
                content: Some("Buy milk".to_string()),
            })
            .expect("create");

        let sub = backend.observe_todos().expect("observe");
        let snapshot = sub.try_next().expect("initial push").expect("ok push");
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].content.as_deref(), Some("Buy milk"));
    }

    #[test]
    fn mutations_push_wholesale_snapshots() {
        let (_temp, backend) = open();
        let sub = backend.observe_todos().expect("observe");
        assert_eq!(sub.drain_latest(), Some(Ok(vec![])));

        let first = backend
            .create_todo(CreateTodo { content: None })
            .expect("create");
        backend
            .create_todo(CreateTodo {
                content: Some(String::new()),
            })
            .expect("create");
        let latest = sub.drain_latest().expect("push").expect("ok");
        assert_eq!(latest.len(), 2);

        backend.delete_todo(&first.id).expect("delete");
        let latest = sub.drain_latest().expect("push").expect("ok");
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].content.as_deref(), Some(""));
    }

    #[test]
    fn deleting_unknown_id_is_not_found() {
        let (_temp, backend) = open();
        let err = backend.delete_todo("missing").expect_err("not found");
        assert!(matches!(err, BackendError::NotFound { collection: Collection::Todo, .. }));
    }

    #[test]
    fn corrupt_store_is_pushed_as_subscription_error() {
        let (temp, backend) = open();
        fs::write(temp.path().join("todos.data"), "{not json}\n").expect("corrupt");

        let sub = backend.observe_todos().expect("observe");
        let push = sub.try_next().expect("initial push");
        assert!(push.is_err());
    }

    #[test]
    fn session_round_trip() {
        let (_temp, backend) = open();
        assert!(matches!(
            backend.current_identity(),
            Err(BackendError::NotAuthenticated)
        ));

        backend.sign_in("ana@example.com").expect("sign in");
        let identity = backend.current_identity().expect("identity");
        assert_eq!(identity.login_id(), Some("ana@example.com"));

        backend.sign_out().expect("sign out");
        assert!(matches!(
            backend.current_identity(),
            Err(BackendError::NotAuthenticated)
        ));
        backend.sign_out().expect("second sign out is harmless");
    }

    #[test]
    fn candidate_listing_applies_owner_filter() {
        let (_temp, backend) = open();
        let imported = backend
            .import_candidates(vec![
                Candidate {
                    name: Some("Alice".to_string()),
                    recruiter: Some("ana@example.com".to_string()),
                    ..Candidate::default()
                },
                Candidate {
                    name: Some("Bob".to_string()),
                    recruiter: Some("someone@else.io".to_string()),
                    ..Candidate::default()
                },
            ])
            .expect("import");
        assert_eq!(imported, 2);

        let mine = backend
            .list_candidates(&CandidateFilter::recruiter_eq("ana@example.com"))
            .expect("list");
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].name.as_deref(), Some("Alice"));
        assert!(!mine[0].id.is_empty());
    }
}
