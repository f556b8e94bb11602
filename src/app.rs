//! The storefront application object: one instance wires the session store, the
//! shopping context and the session timer together and owns the timer task.

use crate::{
    api::{ApiClient, Transport},
    config::settings::SessionSettings,
    core::{
        checkout::{self, CheckoutSummary},
        clock::Clock,
        notice::{Notice, Notifier},
        session::{IdentityOutcome, SessionState, SessionStore},
        shop::ShopContext,
        timer::{SessionTimer, TimerExit},
    },
    errors::Result,
    models::Address,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

/// Shown while the storefront rebuilds after session expiry.
pub const REFRESHING_MESSAGE: &str = "Refreshing...";

// Gap between the expiry notice and the refresh notice.
const REFRESH_NOTICE_DELAY: Duration = Duration::from_secs(1);

struct TimerTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Client-side storefront state shared by every view.
pub struct Storefront {
    session: Arc<SessionStore>,
    shop: ShopContext,
    timer: SessionTimer,
    notifier: Arc<dyn Notifier>,
    db: DatabaseConnection,
    settings: SessionSettings,
    shutdown: CancellationToken,
    timer_task: Mutex<Option<TimerTask>>,
}

impl Storefront {
    /// Builds the storefront over a backend transport and a storage database.
    /// Nothing is fetched until [`Storefront::start`].
    pub fn new(
        transport: Arc<dyn Transport>,
        db: DatabaseConnection,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn Notifier>,
        settings: SessionSettings,
    ) -> Arc<Self> {
        let api = ApiClient::new(transport);
        let session = Arc::new(SessionStore::new(
            api.clone(),
            db.clone(),
            Arc::clone(&clock),
        ));
        let shop = ShopContext::new(api, Arc::clone(&notifier));
        let timer = SessionTimer::new(
            Arc::clone(&session),
            db.clone(),
            clock,
            Arc::clone(&notifier),
            settings,
        );
        Arc::new(Self {
            session,
            shop,
            timer,
            notifier,
            db,
            settings,
            shutdown: CancellationToken::new(),
            timer_task: Mutex::new(None),
        })
    }

    /// Identity and session state.
    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Cart and wishlist state.
    #[must_use]
    pub fn shop(&self) -> &ShopContext {
        &self.shop
    }

    /// Fetches identity and, for an authenticated user, the cart and wishlist,
    /// then starts the session timer.
    pub async fn start(self: &Arc<Self>) -> Result<SessionState> {
        info!("Starting storefront");
        self.resync().await
    }

    /// Throws away all in-memory state and rebuilds it from the backend, then
    /// restarts the session timer. Used after a login and after session expiry.
    /// Persisted keys are kept, so a live session keeps its original start time.
    #[instrument(skip(self))]
    pub async fn resync(self: &Arc<Self>) -> Result<SessionState> {
        self.stop_timer().await;
        let rebuilt = self.rebuild().await;
        self.spawn_timer().await;
        rebuilt?;
        Ok(self.session.state().await)
    }

    /// Clears mirrors and session, refetches identity and, when authenticated,
    /// every snapshot.
    async fn rebuild(&self) -> Result<()> {
        self.shop.clear().await;
        self.session.reset().await;
        if let IdentityOutcome::Authenticated { .. } = self.session.fetch_identity().await? {
            self.shop.refresh_all().await;
        }
        Ok(())
    }

    async fn spawn_timer(self: &Arc<Self>) {
        let cancel = self.shutdown.child_token();
        let this = Arc::clone(self);
        let token = cancel.clone();
        let handle = tokio::spawn(async move { this.run_timer(token).await });
        *self.timer_task.lock().await = Some(TimerTask { cancel, handle });
    }

    /// Runs the timer until cancelled. After each expiry it announces the refresh,
    /// waits out `resync_delay` and rebuilds; the timer then follows whatever
    /// session the backend reports.
    async fn run_timer(&self, cancel: CancellationToken) {
        let delay = self.settings.resync_delay();
        let notice_after = REFRESH_NOTICE_DELAY.min(delay);
        loop {
            if self.timer.run(cancel.clone()).await == TimerExit::Cancelled {
                return;
            }

            tokio::select! {
                () = cancel.cancelled() => return,
                () = tokio::time::sleep(notice_after) => {}
            }
            self.notifier.notify(Notice::info(REFRESHING_MESSAGE));
            tokio::select! {
                () = cancel.cancelled() => return,
                () = tokio::time::sleep(delay - notice_after) => {}
            }

            info!("Resynchronising after session expiry");
            if let Err(e) = self.rebuild().await {
                error!("Resync after session expiry failed: {e}");
            }
        }
    }

    async fn stop_timer(&self) {
        let task = self.timer_task.lock().await.take();
        if let Some(task) = task {
            task.cancel.cancel();
            if let Err(e) = task.handle.await {
                warn!("Session timer task ended abnormally: {e}");
            }
        }
    }

    /// Logs out on the backend and clears local state.
    ///
    /// # Errors
    /// The backend or network failure when logout was not confirmed.
    pub async fn logout(&self) -> Result<()> {
        match self.session.logout().await {
            Ok(()) => {
                self.stop_timer().await;
                self.shop.clear().await;
                self.notifier.notify(Notice::success("Logout Successful"));
                Ok(())
            }
            Err(e) => {
                self.notifier.notify(Notice::error("Something went wrong"));
                Err(e)
            }
        }
    }

    /// Toggles the delivery address used at checkout.
    pub async fn select_address(&self, address: &Address) -> Result<Option<Address>> {
        checkout::select_address(&self.db, address).await
    }

    /// Validates the cart and selected address for payment.
    ///
    /// # Errors
    /// [`crate::errors::Error::Checkout`] with a user-facing reason.
    pub async fn prepare_checkout(&self) -> Result<CheckoutSummary> {
        let selected = checkout::selected_address(&self.db).await?;
        checkout::prepare(selected, &self.shop.cart_items().await)
    }

    /// Cancels the timer, waits for it to finish, and drops in-memory state.
    pub async fn shutdown(&self) {
        info!("Shutting down storefront");
        self.shutdown.cancel();
        self.stop_timer().await;
        self.shop.clear().await;
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::clock::{ManualClock, SystemClock};
    use crate::core::mutations::MutationOutcome;
    use crate::core::notice::NoticeLevel;
    use crate::core::storage;
    use crate::core::timer::SESSION_EXPIRED_MESSAGE;
    use crate::errors::Error;
    use crate::test_utils::{
        FakeBackend, RecordingNotifier, init_test_tracing, sample_address, sample_catalog,
        setup_test_db,
    };

    const T0: i64 = 1_700_000_000_000;

    async fn storefront(
        backend: &Arc<FakeBackend>,
        clock: Arc<dyn Clock>,
    ) -> Result<(Arc<Storefront>, Arc<RecordingNotifier>, DatabaseConnection)> {
        storefront_with(backend, clock, SessionSettings::default()).await
    }

    async fn storefront_with(
        backend: &Arc<FakeBackend>,
        clock: Arc<dyn Clock>,
        settings: SessionSettings,
    ) -> Result<(Arc<Storefront>, Arc<RecordingNotifier>, DatabaseConnection)> {
        let db = setup_test_db().await?;
        let notifier = Arc::new(RecordingNotifier::default());
        let app = Storefront::new(backend.clone(), db.clone(), clock, notifier.clone(), settings);
        Ok((app, notifier, db))
    }

    fn fast_settings() -> SessionSettings {
        SessionSettings {
            tick_millis: 10,
            resync_delay_millis: 200,
            ..SessionSettings::default()
        }
    }

    #[tokio::test]
    async fn test_start_authenticated_loads_everything() -> Result<()> {
        init_test_tracing();
        let backend = FakeBackend::new(sample_catalog());
        backend.log_in("u1");
        let (app, _, db) = storefront(&backend, Arc::new(ManualClock::new(T0))).await?;

        assert_eq!(app.start().await?, SessionState::Authenticated);
        assert_eq!(storage::session_start(&db).await?, Some(T0));
        assert_eq!(app.shop().cart_count().await, 0);
        assert!(app.timer_task.lock().await.is_some());

        app.shutdown().await;
        assert!(app.timer_task.lock().await.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_start_anonymous_fetches_nothing_else() -> Result<()> {
        let backend = FakeBackend::new(sample_catalog());
        let (app, _, db) = storefront(&backend, Arc::new(ManualClock::new(T0))).await?;

        assert_eq!(app.start().await?, SessionState::Expired);
        assert_eq!(storage::session_start(&db).await?, None);
        assert_eq!(backend.request_count(crate::api::endpoints::FETCH_CART), 0);
        assert!(app.session().started_at().await.is_none());

        app.shutdown().await;
        assert!(app.timer_task.lock().await.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_mutation_unauthorized_keeps_session_anchor() -> Result<()> {
        let backend = FakeBackend::new(sample_catalog());
        backend.log_in("u1");
        let (app, notifier, db) = storefront(&backend, Arc::new(ManualClock::new(T0))).await?;
        app.start().await?;

        // Cookie dies server-side; only the identity fetch may end the session
        backend.log_out();
        let outcome = app.shop().add_to_cart("saree-1").await;

        assert_eq!(outcome, MutationOutcome::AuthenticationRequired);
        assert_eq!(storage::session_start(&db).await?, Some(T0));
        assert_eq!(app.session().state().await, SessionState::Authenticated);
        assert_eq!(
            notifier.messages(),
            vec!["Kindly login to add products to your cart".to_string()]
        );
        app.shutdown().await;
        Ok(())
    }

    #[tokio::test]
    async fn test_session_expires_in_real_time() -> Result<()> {
        init_test_tracing();
        let backend = FakeBackend::new(sample_catalog());
        backend.log_in("u1");
        let (app, notifier, db) = storefront(&backend, Arc::new(SystemClock)).await?;
        let started_at = SystemClock.now_millis() - 3_599_000;
        storage::set_session_start(&db, started_at).await?;

        assert_eq!(app.start().await?, SessionState::Authenticated);
        assert_eq!(app.session().started_at().await, Some(started_at));

        tokio::time::sleep(Duration::from_secs(2)).await;

        let expiry_notices = notifier
            .messages()
            .into_iter()
            .filter(|m| m == SESSION_EXPIRED_MESSAGE)
            .count();
        assert_eq!(expiry_notices, 1);
        assert_eq!(storage::session_start(&db).await?, None);
        assert_eq!(storage::remaining_time(&db).await?, None);
        assert_eq!(app.session().state().await, SessionState::Expired);

        app.shutdown().await;
        Ok(())
    }

    #[tokio::test]
    async fn test_resync_after_expiry_starts_new_session() -> Result<()> {
        let backend = FakeBackend::new(sample_catalog());
        backend.log_in("u1");
        let clock = ManualClock::new(T0);
        let (app, _, db) = storefront(&backend, Arc::new(clock.clone())).await?;
        app.start().await?;

        assert!(app.session().mark_expired().await);
        clock.advance(60_000);
        assert_eq!(app.resync().await?, SessionState::Authenticated);
        assert_eq!(storage::session_start(&db).await?, Some(T0 + 60_000));

        app.shutdown().await;
        Ok(())
    }

    #[tokio::test]
    async fn test_logout_clears_everything() -> Result<()> {
        let backend = FakeBackend::new(sample_catalog());
        backend.log_in("u1");
        let (app, notifier, db) = storefront(&backend, Arc::new(ManualClock::new(T0))).await?;
        app.start().await?;
        app.shop().add_to_cart("saree-1").await;
        app.select_address(&sample_address("a1")).await?;

        app.logout().await?;

        assert_eq!(app.session().state().await, SessionState::Anonymous);
        assert!(!app.shop().is_in_cart("saree-1").await);
        assert_eq!(storage::selected_address(&db).await?, None);
        assert_eq!(notifier.messages().last().unwrap(), "Logout Successful");
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_logout_keeps_enforcing_budget() -> Result<()> {
        let backend = FakeBackend::new(sample_catalog());
        backend.log_in("u1");
        let clock = ManualClock::new(T0);
        let (app, notifier, db) =
            storefront_with(&backend, Arc::new(clock.clone()), fast_settings()).await?;
        app.start().await?;

        backend.force_status(crate::api::endpoints::LOGOUT, 500, None);
        assert!(app.logout().await.is_err());

        assert_eq!(notifier.messages(), vec!["Something went wrong".to_string()]);
        assert_eq!(app.session().state().await, SessionState::Anonymous);
        assert_eq!(storage::session_start(&db).await?, None);

        // Still logged in server-side: the next identity fetch anchors a new session
        clock.advance(5_000);
        app.session().fetch_identity().await?;
        assert_eq!(app.session().started_at().await, Some(T0 + 5_000));

        clock.advance(3_600_000);
        tokio::time::sleep(Duration::from_millis(60)).await;

        assert_eq!(app.session().state().await, SessionState::Expired);
        assert!(
            notifier
                .messages()
                .contains(&SESSION_EXPIRED_MESSAGE.to_string())
        );
        app.shutdown().await;
        Ok(())
    }

    #[tokio::test]
    async fn test_expiry_announces_refresh_and_resyncs() -> Result<()> {
        let backend = FakeBackend::new(sample_catalog());
        backend.log_in("u1");
        let clock = ManualClock::new(T0);
        let (app, notifier, db) =
            storefront_with(&backend, Arc::new(clock.clone()), fast_settings()).await?;
        app.start().await?;

        clock.advance(3_600_000);
        tokio::time::sleep(Duration::from_millis(400)).await;

        let notices = notifier.notices();
        let levels: Vec<_> = notices.iter().map(|n| n.level).collect();
        assert_eq!(levels, vec![NoticeLevel::Error, NoticeLevel::Info]);
        assert_eq!(notices[0].message, SESSION_EXPIRED_MESSAGE);
        assert_eq!(notices[1].message, REFRESHING_MESSAGE);

        // The cookie is still valid, so the resync anchored a fresh session
        assert_eq!(app.session().state().await, SessionState::Authenticated);
        assert_eq!(storage::session_start(&db).await?, Some(T0 + 3_600_000));

        app.shutdown().await;
        Ok(())
    }

    #[tokio::test]
    async fn test_prepare_checkout() -> Result<()> {
        let backend = FakeBackend::new(sample_catalog());
        backend.log_in("u1");
        let (app, _, _) = storefront(&backend, Arc::new(ManualClock::new(T0))).await?;
        app.start().await?;

        assert!(matches!(
            app.prepare_checkout().await,
            Err(Error::Checkout { .. })
        ));

        app.shop().add_to_cart("saree-2").await;
        app.select_address(&sample_address("a1")).await?;
        let summary = app.prepare_checkout().await?;
        assert_eq!(summary.items.len(), 1);
        assert_eq!(summary.address.id.as_deref(), Some("a1"));

        app.shutdown().await;
        Ok(())
    }
}
