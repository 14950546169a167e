//! Dashboard slice: one owner-filtered fetch per mount, then local search,
//! sort and selection over the fetched set.

use tracing::{debug, error, info, instrument};

use crate::backend::{AuthProvider, DataClient};
use crate::error::{BackendError, DashboardError, IdentityError};
use crate::filter::{SortDirection, visible_candidates};
use crate::lifecycle::{Lifecycle, MountToken};
use crate::model::{Candidate, CandidateFilter, Viewer};

pub const FETCH_ERROR_MESSAGE: &str = "An error occurred while fetching data. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Root,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Route::Root => "/",
        }
    }
}

pub trait Navigator {
    fn push(&mut self, route: Route);
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DashboardState {
    #[default]
    Loading,
    Error(String),
    Ready(Vec<Candidate>),
}

/// Result of one mount's fetch, stamped with the mount it belongs to.
#[derive(Debug)]
pub struct FetchOutcome {
    token: MountToken,
    viewer: Option<Viewer>,
    result: Result<Vec<Candidate>, DashboardError>,
}

impl FetchOutcome {
    pub fn token(&self) -> MountToken {
        self.token
    }
}

#[derive(Debug, Default)]
pub struct Dashboard {
    lifecycle: Lifecycle,
    state: DashboardState,
    viewer: Option<Viewer>,
    search: String,
    direction: SortDirection,
    selected: Option<usize>,
    menu_open: bool,
    last_error: Option<DashboardError>,
}

impl Dashboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mounts and runs the single fetch to completion.
    pub fn mount(&mut self, auth: &dyn AuthProvider, client: &dyn DataClient) {
        let token = self.begin_mount();
        let outcome = Self::load(token, auth, client);
        self.apply(outcome);
    }

    /// Resets every piece of view state and enters `Loading`.
    pub fn begin_mount(&mut self) -> MountToken {
        let token = self.lifecycle.begin();
        self.state = DashboardState::Loading;
        self.viewer = None;
        self.search.clear();
        self.direction = SortDirection::default();
        self.selected = None;
        self.menu_open = false;
        self.last_error = None;
        token
    }

    /// Resolves the viewer, then lists the candidates they own. Identity
    /// failure returns before any list query is issued.
    #[instrument(skip(auth, client))]
    pub fn load(
        token: MountToken,
        auth: &dyn AuthProvider,
        client: &dyn DataClient,
    ) -> FetchOutcome {
        let viewer = match resolve_viewer(auth) {
            Ok(viewer) => viewer,
            Err(err) => {
                return FetchOutcome {
                    token,
                    viewer: None,
                    result: Err(err.into()),
                };
            }
        };

        info!(recruiter = %viewer.login_id, "fetching candidates for recruiter");
        let result = client
            .list_candidates(&CandidateFilter::recruiter_eq(viewer.login_id.clone()))
            .map_err(DashboardError::Fetch);
        if let Ok(candidates) = &result {
            debug!(count = candidates.len(), "fetched candidates");
        }

        FetchOutcome {
            token,
            viewer: Some(viewer),
            result,
        }
    }

    /// Applies an outcome if it belongs to the current mount. Returns
    /// whether it was applied.
    pub fn apply(&mut self, outcome: FetchOutcome) -> bool {
        if !self.lifecycle.is_current(outcome.token) {
            debug!(token = ?outcome.token, "discarding stale candidate fetch");
            return false;
        }

        self.viewer = outcome.viewer;
        match outcome.result {
            Ok(candidates) => {
                self.state = DashboardState::Ready(candidates);
            }
            Err(err) => {
                error!(error = %err, "Error fetching candidates");
                self.state = DashboardState::Error(FETCH_ERROR_MESSAGE.to_string());
                self.last_error = Some(err);
            }
        }
        true
    }

    pub fn unmount(&mut self) {
        self.lifecycle.end();
        debug!("dashboard unmounted");
    }

    /// `Loading` until the first outcome of a mount is applied.
    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn viewer(&self) -> Option<&Viewer> {
        self.viewer.as_ref()
    }

    pub fn last_error(&self) -> Option<&DashboardError> {
        self.last_error.as_ref()
    }

    pub fn candidates(&self) -> &[Candidate] {
        match &self.state {
            DashboardState::Ready(candidates) => candidates,
            _ => &[],
        }
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    pub fn toggle_sort(&mut self) {
        self.direction = self.direction.toggled();
    }

    pub fn menu_open(&self) -> bool {
        self.menu_open
    }

    pub fn toggle_menu(&mut self) {
        self.menu_open = !self.menu_open;
    }

    /// Derived view, recomputed on every call.
    pub fn visible(&self) -> Vec<&Candidate> {
        visible_candidates(self.candidates(), &self.search, self.direction)
    }

    /// Selects the record at `position` in the current derived view.
    pub fn select_visible(&mut self, position: usize) -> Option<&Candidate> {
        let index = {
            let visible = self.visible();
            let chosen = *visible.get(position)?;
            self.candidates()
                .iter()
                .position(|candidate| std::ptr::eq(candidate, chosen))?
        };
        self.selected = Some(index);
        self.selected()
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<&Candidate> {
        self.selected.and_then(|idx| self.candidates().get(idx))
    }

    pub fn is_selected(&self, candidate: &Candidate) -> bool {
        self.selected()
            .map(|selected| std::ptr::eq(selected, candidate))
            .unwrap_or(false)
    }

    /// Signs out, then navigates to the root route. On failure nothing
    /// navigates and the error is handed back.
    #[instrument(skip_all)]
    pub fn logout(
        &mut self,
        auth: &dyn AuthProvider,
        navigator: &mut dyn Navigator,
    ) -> Result<(), BackendError> {
        auth.sign_out()
            .inspect_err(|err| error!(error = %err, "Error during sign out"))?;
        self.menu_open = false;
        navigator.push(Route::Root);
        Ok(())
    }
}

fn resolve_viewer(auth: &dyn AuthProvider) -> Result<Viewer, IdentityError> {
    let identity = auth.current_identity()?;
    debug!(username = %identity.username, "resolved current identity");
    Viewer::from_identity(&identity).ok_or(IdentityError::MissingLoginId)
}
