use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Collection {
    Todo,
    Candidate,
}

impl Collection {
    pub const ALL: [Collection; 2] = [Collection::Todo, Collection::Candidate];

    pub fn name(self) -> &'static str {
        match self {
            Collection::Todo => "Todo",
            Collection::Candidate => "Candidate",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: String,

    #[serde(default)]
    pub content: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Todo {
    pub fn new(content: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Input of a todo create request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateTodo {
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub name: Option<String>,

    /// Date-like text exactly as stored; parsed lazily when sorting or
    /// displaying.
    #[serde(default)]
    pub last_interview: Option<String>,

    /// Ownership key, the login id of the recruiter who owns the record.
    #[serde(default)]
    pub recruiter: Option<String>,
}

/// Equality filter on the ownership key, shaped after the hosted
/// `filter: { recruiter: { eq } }` argument.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateFilter {
    pub recruiter_eq: Option<String>,
}

impl CandidateFilter {
    pub fn recruiter_eq(login_id: impl Into<String>) -> Self {
        Self {
            recruiter_eq: Some(login_id.into()),
        }
    }

    pub fn matches(&self, candidate: &Candidate) -> bool {
        match self.recruiter_eq.as_deref() {
            Some(expected) => candidate.recruiter.as_deref() == Some(expected),
            None => true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SignInDetails {
    #[serde(default)]
    pub login_id: Option<String>,

    #[serde(default)]
    pub auth_flow_type: Option<String>,
}

/// Identity as handed out by the authentication provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub username: String,

    #[serde(default)]
    pub sign_in_details: Option<SignInDetails>,
}

impl Identity {
    pub fn login_id(&self) -> Option<&str> {
        self.sign_in_details
            .as_ref()
            .and_then(|details| details.login_id.as_deref())
    }
}

/// The identity fields the dashboard needs, both guaranteed non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    pub login_id: String,
    pub email: String,
}

impl Viewer {
    /// Both fields come from the sign-in login id. The username alone is not
    /// enough since it carries no email.
    pub fn from_identity(identity: &Identity) -> Option<Self> {
        let login_id = identity.login_id().filter(|value| !value.is_empty())?;

        Some(Self {
            login_id: login_id.to_string(),
            email: login_id.to_string(),
        })
    }
}
