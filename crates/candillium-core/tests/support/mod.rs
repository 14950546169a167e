#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use candillium_core::backend::{AuthProvider, DataClient};
use candillium_core::error::BackendError;
use candillium_core::model::{
    Candidate, CandidateFilter, Collection, CreateTodo, Identity, SignInDetails, Todo,
};
use candillium_core::subscription::{Subscription, SubscriptionHub};
use chrono::Utc;
use parking_lot::Mutex;

/// In-memory backend that counts every request it receives.
pub struct FakeBackend {
    pub identity: Mutex<Option<Identity>>,
    pub candidates: Mutex<Vec<Candidate>>,
    pub todos: Mutex<Vec<Todo>>,
    pub hub: SubscriptionHub<Todo>,
    pub fail_list: bool,
    pub fail_sign_out: bool,
    pub creates: Mutex<Vec<CreateTodo>>,
    pub deletes: Mutex<Vec<String>>,
    pub list_calls: AtomicUsize,
    pub sign_outs: AtomicUsize,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            identity: Mutex::new(None),
            candidates: Mutex::new(Vec::new()),
            todos: Mutex::new(Vec::new()),
            hub: SubscriptionHub::new(Collection::Todo),
            fail_list: false,
            fail_sign_out: false,
            creates: Mutex::new(Vec::new()),
            deletes: Mutex::new(Vec::new()),
            list_calls: AtomicUsize::new(0),
            sign_outs: AtomicUsize::new(0),
        }
    }

    pub fn signed_in(login_id: &str) -> Self {
        let backend = Self::new();
        *backend.identity.lock() = Some(identity(login_id));
        backend
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn push_snapshot(&self) {
        let snapshot = self.todos.lock().clone();
        self.hub.publish(Ok(snapshot));
    }
}

pub fn identity(login_id: &str) -> Identity {
    Identity {
        username: format!("user-{login_id}"),
        sign_in_details: Some(SignInDetails {
            login_id: Some(login_id.to_string()),
            auth_flow_type: None,
        }),
    }
}

pub fn candidate(name: &str, last_interview: Option<&str>, recruiter: &str) -> Candidate {
    Candidate {
        id: name.to_lowercase(),
        name: Some(name.to_string()),
        last_interview: last_interview.map(str::to_string),
        recruiter: Some(recruiter.to_string()),
    }
}

impl DataClient for FakeBackend {
    fn list_todos(&self) -> Result<Vec<Todo>, BackendError> {
        Ok(self.todos.lock().clone())
    }

    fn observe_todos(&self) -> Result<Subscription<Todo>, BackendError> {
        Ok(self.hub.subscribe_with(Ok(self.todos.lock().clone())))
    }

    fn create_todo(&self, input: CreateTodo) -> Result<Todo, BackendError> {
        self.creates.lock().push(input.clone());
        let todo = Todo::new(input.content, Utc::now());
        self.todos.lock().push(todo.clone());
        Ok(todo)
    }

    fn delete_todo(&self, id: &str) -> Result<(), BackendError> {
        self.deletes.lock().push(id.to_string());
        self.todos.lock().retain(|todo| todo.id != id);
        Ok(())
    }

    fn list_candidates(&self, filter: &CandidateFilter) -> Result<Vec<Candidate>, BackendError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_list {
            return Err(BackendError::Storage(anyhow::anyhow!("network unreachable")));
        }
        Ok(self
            .candidates
            .lock()
            .iter()
            .filter(|candidate| filter.matches(candidate))
            .cloned()
            .collect())
    }
}

impl AuthProvider for FakeBackend {
    fn current_identity(&self) -> Result<Identity, BackendError> {
        self.identity
            .lock()
            .clone()
            .ok_or(BackendError::NotAuthenticated)
    }

    fn sign_out(&self) -> Result<(), BackendError> {
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        if self.fail_sign_out {
            return Err(BackendError::Storage(anyhow::anyhow!("token revoke failed")));
        }
        *self.identity.lock() = None;
        Ok(())
    }
}
