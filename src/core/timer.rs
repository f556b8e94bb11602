//! Session timer - enforces the client-side session budget.
//!
//! Each tick compares the wall clock with the persisted session anchor; there is
//! no decrementing counter, so delayed or skipped ticks cannot make the session
//! expire early or late by more than one tick.

use crate::{
    config::settings::SessionSettings,
    core::{
        clock::Clock,
        notice::{Notice, Notifier},
        session::SessionStore,
        storage,
    },
    errors::Result,
    models::RemainingTime,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, trace, warn};

/// Shown when the budget runs out.
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again.";

/// Result of evaluating the budget at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTick {
    /// Budget left
    Running(RemainingTime),
    /// Budget used up
    Expired,
}

/// Why [`SessionTimer::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerExit {
    /// This timer expired the session
    Expired,
    /// The cancellation token fired
    Cancelled,
}

/// Milliseconds of budget left at `now`; zero or negative once expired.
#[must_use]
pub fn remaining_millis(started_at: i64, budget: Duration, now: i64) -> i64 {
    let budget_ms = i64::try_from(budget.as_millis()).unwrap_or(i64::MAX);
    started_at.saturating_add(budget_ms).saturating_sub(now)
}

/// Expired exactly when `now - started_at >= budget`.
#[must_use]
pub fn evaluate(started_at: i64, budget: Duration, now: i64) -> TimerTick {
    let remaining = remaining_millis(started_at, budget, now);
    if remaining > 0 {
        TimerTick::Running(RemainingTime::from_millis(remaining))
    } else {
        TimerTick::Expired
    }
}

/// Polls the session budget and expires the session when it runs out.
pub struct SessionTimer {
    session: Arc<SessionStore>,
    db: DatabaseConnection,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
    settings: SessionSettings,
}

impl SessionTimer {
    /// Creates a timer over the given session.
    #[must_use]
    pub fn new(
        session: Arc<SessionStore>,
        db: DatabaseConnection,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn Notifier>,
        settings: SessionSettings,
    ) -> Self {
        Self {
            session,
            db,
            clock,
            notifier,
            settings,
        }
    }

    /// One tick: cache the countdown while running, or expire the session.
    ///
    /// The expiry notice is emitted only by the tick that performs the transition.
    pub async fn tick(&self, started_at: i64) -> Result<TimerTick> {
        let tick = evaluate(started_at, self.settings.budget(), self.clock.now_millis());
        match tick {
            TimerTick::Running(remaining) => {
                trace!(?remaining, "session countdown");
                storage::set_remaining_time(&self.db, remaining).await?;
            }
            TimerTick::Expired => {
                if self.session.mark_expired().await {
                    self.notifier.notify(Notice::error(SESSION_EXPIRED_MESSAGE));
                }
            }
        }
        Ok(tick)
    }

    /// Ticks every `tick_millis` until the session expires or `cancel` fires.
    /// The first tick happens one period after start.
    ///
    /// Each tick reads the session's current anchor, so a session started after a
    /// logout or a fresh identity fetch is enforced by the same loop. Ticks without
    /// an anchor do nothing.
    #[instrument(skip(self, cancel))]
    pub async fn run(&self, cancel: CancellationToken) -> TimerExit {
        let period = self.settings.tick();
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut tracked = None;

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    debug!("Session timer cancelled");
                    return TimerExit::Cancelled;
                }
                _ = interval.tick() => {}
            }

            let Some(started_at) = self.session.started_at().await else {
                trace!("No session anchor; tick skipped");
                continue;
            };
            if tracked != Some(started_at) {
                debug!(started_at, "Tracking session anchor");
                tracked = Some(started_at);
            }

            match self.tick(started_at).await {
                Ok(TimerTick::Running(_)) => {}
                Ok(TimerTick::Expired) => return TimerExit::Expired,
                Err(e) => warn!("Session timer tick failed: {e}"),
            }
        }
    }
}
