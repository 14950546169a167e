use thiserror::Error;

use crate::model::Collection;

/// A failure reported by a push on a live query.
///
/// Cloneable so one failure can be broadcast to every subscriber of a
/// collection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("subscription error on {collection}: {message}")]
pub struct SubscriptionError {
    pub collection: Collection,
    pub message: String,
}

/// Errors returned by the backend client and identity provider.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("not signed in")]
    NotAuthenticated,

    #[error("{collection} record not found: {id}")]
    NotFound { collection: Collection, id: String },

    #[error("collection {0} is not part of the backend schema")]
    UnknownCollection(String),

    #[error("unsupported backend endpoint: {0}")]
    UnsupportedEndpoint(String),

    #[error(transparent)]
    Subscription(#[from] SubscriptionError),

    #[error("storage failure: {0:#}")]
    Storage(#[from] anyhow::Error),
}

#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("User not authenticated or loginId missing")]
    MissingLoginId,

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Why a dashboard mount ended in the error state.
#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("identity resolution failed: {0}")]
    Identity(#[from] IdentityError),

    #[error("candidate query failed: {0}")]
    Fetch(#[source] BackendError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_login_id_keeps_provider_wording() {
        assert_eq!(
            IdentityError::MissingLoginId.to_string(),
            "User not authenticated or loginId missing"
        );
    }

    #[test]
    fn subscription_error_converts_into_backend_error() {
        let err: BackendError = SubscriptionError {
            collection: Collection::Todo,
            message: "socket closed".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "subscription error on Todo: socket closed");
    }
}
