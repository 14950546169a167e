//! Todo slice: a local mirror of the remote todo collection.
//!
//! The mirror holds a standing subscription while an identity is present and
//! replaces its list wholesale on every push. Losing the identity clears the
//! list and drops the subscription handle, which unregisters it from the
//! backend, so nothing pushed afterwards can reach the mirror.

use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, error, info, instrument};

use crate::backend::{AuthProvider, DataClient};
use crate::error::BackendError;
use crate::model::{CreateTodo, Identity, Todo};
use crate::prompt::Prompt;
use crate::subscription::Subscription;

pub const CONTENT_PROMPT: &str = "Todo content";

pub struct TodoApp {
    client: Arc<dyn DataClient>,
    identity: Option<Identity>,
    subscription: Option<Subscription<Todo>>,
    failed: bool,
    items: Vec<Todo>,
}

impl TodoApp {
    pub fn new(client: Arc<dyn DataClient>) -> Self {
        Self {
            client,
            identity: None,
            subscription: None,
            failed: false,
            items: Vec::new(),
        }
    }

    pub fn items(&self) -> &[Todo] {
        &self.items
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// True while a healthy subscription is held.
    pub fn is_live(&self) -> bool {
        self.subscription.is_some() && !self.failed
    }

    pub fn heading(&self) -> String {
        let login_id = self
            .identity
            .as_ref()
            .and_then(Identity::login_id)
            .unwrap_or_default();
        format!("{login_id}'s Todos")
    }

    /// Binds the mirror to the current identity.
    ///
    /// A different identity releases the old subscription before acquiring a
    /// new one; `None` clears the list. Passing the identity already bound is
    /// a no-op, including after a subscription failure.
    #[instrument(skip_all, fields(present = identity.is_some()))]
    pub fn sync_identity(&mut self, identity: Option<Identity>) -> Result<(), BackendError> {
        if self.identity == identity {
            return Ok(());
        }

        self.release();
        self.items.clear();

        let Some(identity) = identity else {
            self.identity = None;
            info!("identity gone; cleared todo mirror");
            return Ok(());
        };

        self.identity = Some(identity);
        match self.client.observe_todos() {
            Ok(subscription) => {
                debug!(subscription = subscription.id(), "todo mirror subscribed");
                self.subscription = Some(subscription);
                Ok(())
            }
            Err(err) => {
                error!(error = %err, "failed to subscribe to todos");
                self.failed = true;
                Err(err)
            }
        }
    }

    /// Applies queued pushes. Returns whether the list changed.
    ///
    /// A failed push is logged and returned once; the stale list stays and
    /// later pushes are ignored until the identity changes.
    pub fn pump(&mut self) -> Result<bool, BackendError> {
        if self.failed {
            return Ok(false);
        }
        let Some(subscription) = self.subscription.as_ref() else {
            return Ok(false);
        };

        match subscription.drain_latest() {
            None => Ok(false),
            Some(Ok(items)) => {
                debug!(count = items.len(), "todo snapshot applied");
                self.items = items;
                Ok(true)
            }
            Some(Err(err)) => {
                error!(error = %err, "Subscription error");
                self.failed = true;
                Err(err.into())
            }
        }
    }

    /// Issues one create request; the mirror itself only changes on push.
    #[instrument(skip(self))]
    pub fn create(&self, content: Option<String>) -> Result<Todo, BackendError> {
        self.client
            .create_todo(CreateTodo { content })
            .inspect_err(|err| error!(error = %err, "failed to create todo"))
    }

    /// Asks for content and creates a todo with exactly what was typed. A
    /// cancelled prompt issues nothing.
    pub fn create_from_prompt(&self, prompt: &mut dyn Prompt) -> anyhow::Result<Option<Todo>> {
        let Some(content) = prompt.ask(CONTENT_PROMPT)? else {
            debug!("todo prompt cancelled");
            return Ok(None);
        };

        let todo = self
            .create(Some(content))
            .context("failed to create todo")?;
        Ok(Some(todo))
    }

    #[instrument(skip(self))]
    pub fn delete(&self, id: &str) -> Result<(), BackendError> {
        self.client
            .delete_todo(id)
            .inspect_err(|err| error!(error = %err, "failed to delete todo"))
    }

    /// Signs out through the provider, then drops the mirror.
    pub fn sign_out(&mut self, auth: &dyn AuthProvider) -> Result<(), BackendError> {
        auth.sign_out()
            .inspect_err(|err| error!(error = %err, "failed to sign out"))?;
        self.sync_identity(None)
    }

    fn release(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            debug!(subscription = subscription.id(), "releasing todo subscription");
            subscription.unsubscribe();
        }
        self.failed = false;
    }
}
