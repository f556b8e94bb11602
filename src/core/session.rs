//! Session store - who is logged in, with what role, and whether the session expired.
//!
//! The session is anchored by the `sessionStartTime` storage key. A successful
//! identity fetch adopts an existing anchor unchanged (so a restart keeps the same
//! budget) or writes a new one. A 401 from the identity endpoint expires the session
//! and drops the anchor; transient failures never change state.
//!
//! ```text
//! Anonymous --identity ok--> Authenticated --401 / timer--> Expired --reset--> Anonymous
//! ```

use crate::{
    api::ApiClient,
    core::{clock::Clock, storage},
    errors::{Error, Result},
    models::Identity,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument, warn};

/// Observable session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No session anchor; the user is treated as logged out
    Anonymous,
    /// Identity known and a session anchor is set
    Authenticated,
    /// The session ended by 401 or by the client-side budget
    Expired,
}

/// What an identity fetch did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityOutcome {
    /// Identity recorded; the session is anchored at `started_at`
    Authenticated {
        /// Session anchor, epoch milliseconds
        started_at: i64,
    },
    /// The backend answered 401; the session is now expired
    Unauthenticated,
    /// Transient failure or ignored response; nothing changed
    Unchanged,
}

#[derive(Debug, Default)]
struct SessionInner {
    identity: Option<Identity>,
    started_at: Option<i64>,
    expired: bool,
    // One "no active session" log line per expiry episode.
    expiry_reported: bool,
}

/// Holds identity and session state for the current user.
pub struct SessionStore {
    api: ApiClient,
    db: DatabaseConnection,
    clock: Arc<dyn Clock>,
    inner: RwLock<SessionInner>,
}

impl SessionStore {
    /// Creates an anonymous session store.
    #[must_use]
    pub fn new(api: ApiClient, db: DatabaseConnection, clock: Arc<dyn Clock>) -> Self {
        Self {
            api,
            db,
            clock,
            inner: RwLock::new(SessionInner::default()),
        }
    }

    /// Fetches `/account-details` and updates the session accordingly.
    ///
    /// # Errors
    /// Only local storage failures are returned; network and server errors are
    /// logged and reported as [`IdentityOutcome::Unchanged`].
    #[instrument(skip(self))]
    pub async fn fetch_identity(&self) -> Result<IdentityOutcome> {
        let response = match self.api.account_details().await {
            Ok(response) => response,
            Err(e) => {
                error!("Network error: {e}");
                return Ok(IdentityOutcome::Unchanged);
            }
        };

        if response.is_unauthorized() {
            self.expire_unauthorized().await?;
            return Ok(IdentityOutcome::Unauthenticated);
        }

        if !response.is_success_status() {
            error!(
                "Error {}: {}",
                response.status,
                response.message().unwrap_or("unknown error")
            );
            return Ok(IdentityOutcome::Unchanged);
        }

        if response.success_flag() != Some(true) {
            warn!("Identity response did not report success; session unchanged");
            return Ok(IdentityOutcome::Unchanged);
        }

        let identity = match response.data().map(|d| serde_json::from_value::<Identity>(d.clone())) {
            Some(Ok(identity)) => identity,
            Some(Err(e)) => {
                warn!("Unreadable identity payload: {e}");
                return Ok(IdentityOutcome::Unchanged);
            }
            None => {
                warn!("Identity response carried no data");
                return Ok(IdentityOutcome::Unchanged);
            }
        };

        self.record_identity(identity).await
    }

    async fn record_identity(&self, identity: Identity) -> Result<IdentityOutcome> {
        let mut inner = self.inner.write().await;
        if inner.expired {
            debug!("Session is expired; identity ignored until a fresh login");
            return Ok(IdentityOutcome::Unchanged);
        }

        let started_at = match storage::session_start(&self.db).await {
            Ok(Some(started_at)) => started_at,
            Ok(None) => self.begin_session().await?,
            Err(e @ Error::Storage { .. }) => {
                warn!("{e}; starting a new session");
                self.begin_session().await?
            }
            Err(e) => return Err(e),
        };

        info!(
            user_id = identity.user_id.as_deref().unwrap_or("-"),
            role = ?identity.role,
            started_at,
            "Session authenticated"
        );
        inner.identity = Some(identity);
        inner.started_at = Some(started_at);
        inner.expiry_reported = false;
        Ok(IdentityOutcome::Authenticated { started_at })
    }

    async fn begin_session(&self) -> Result<i64> {
        let now = self.clock.now_millis();
        storage::set_session_start(&self.db, now).await?;
        Ok(now)
    }

    async fn expire_unauthorized(&self) -> Result<()> {
        let mut inner = self.inner.write().await;
        if !inner.expiry_reported {
            inner.expiry_reported = true;
            info!("No active session detected. User is not logged in.");
        }
        inner.expired = true;
        inner.identity = None;
        inner.started_at = None;
        storage::remove_value(&self.db, storage::SESSION_START_KEY).await?;
        Ok(())
    }

    /// Ends the session because the client-side budget ran out.
    ///
    /// Clears the session anchor and countdown cache. Returns `true` if this call
    /// performed the transition, `false` if the session was already expired.
    pub async fn mark_expired(&self) -> bool {
        let mut inner = self.inner.write().await;
        if inner.expired {
            return false;
        }
        inner.expired = true;
        inner.expiry_reported = true;
        inner.identity = None;
        inner.started_at = None;
        if let Err(e) = storage::clear_session_keys(&self.db).await {
            warn!("Failed to clear session keys on expiry: {e}");
        }
        info!("Session budget exhausted; session expired");
        true
    }

    /// Logs out: clears every persisted key and the in-memory session anchor, then
    /// invalidates the server session. If the server confirms, every remaining
    /// session flag is reset too. Navigation is up to the caller.
    ///
    /// An unconfirmed logout leaves the store `Anonymous`; the next successful
    /// identity fetch starts a new session.
    ///
    /// # Errors
    /// The server or network failure when logout was not confirmed; local state
    /// is cleared either way.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<()> {
        {
            let mut inner = self.inner.write().await;
            storage::clear_all(&self.db).await?;
            inner.identity = None;
            inner.started_at = None;
        }
        self.api
            .logout()
            .await
            .inspect_err(|e| warn!("Logout failed: {e}"))?;
        self.reset().await;
        info!("Logout Successful");
        Ok(())
    }

    /// Drops all in-memory session state, returning to `Anonymous`.
    pub async fn reset(&self) {
        *self.inner.write().await = SessionInner::default();
    }

    /// Current state.
    pub async fn state(&self) -> SessionState {
        let inner = self.inner.read().await;
        if inner.expired {
            SessionState::Expired
        } else if inner.started_at.is_some() && inner.identity.is_some() {
            SessionState::Authenticated
        } else {
            SessionState::Anonymous
        }
    }

    /// Identity of the authenticated user.
    pub async fn identity(&self) -> Option<Identity> {
        let inner = self.inner.read().await;
        if inner.started_at.is_some() {
            inner.identity.clone()
        } else {
            None
        }
    }

    /// Session anchor, epoch milliseconds.
    pub async fn started_at(&self) -> Option<i64> {
        self.inner.read().await.started_at
    }

    /// Whether the authenticated user is an administrator.
    pub async fn is_admin(&self) -> bool {
        self.identity().await.is_some_and(|identity| identity.is_admin())
    }
}
