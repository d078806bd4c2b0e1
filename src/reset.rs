//! Daily counter reset at JST midnight.
//!
//! A one-minute poll checks the wall clock in UTC+9; the single tick that
//! lands in the 00:00 window announces the day's total (when nonzero) and
//! writes the counter back to zero. A skipped window while the process is
//! down stays skipped.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Timelike, Utc};
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{info, warn};

use crate::dispatcher::CounterGate;
use crate::messages;
use crate::sink::OutputSink;
use crate::store::{CounterDocument, CounterStore, StoreError, CONFLICT_RETRY_ATTEMPTS};

const POLL_INTERVAL: Duration = Duration::from_secs(60);

pub fn jst() -> FixedOffset {
    FixedOffset::east_opt(9 * 3600).expect("JST offset is valid")
}

/// True within the one-minute window at local midnight.
pub fn is_jst_midnight(now: DateTime<FixedOffset>) -> bool {
    now.hour() == 0 && now.minute() == 0
}

/// Poll once per minute forever. Armed only after the gateway is ready.
pub async fn run_daily_reset(
    store: Arc<dyn CounterStore>,
    sink: Arc<dyn OutputSink>,
    gate: CounterGate,
) {
    let mut ticker = interval(POLL_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        ticker.tick().await;
        let now = Utc::now().with_timezone(&jst());
        if !is_jst_midnight(now) {
            continue;
        }
        if let Err(err) = reset_counter(store.as_ref(), sink.as_ref(), &gate).await {
            warn!("daily reset failed: {}", err);
        }
    }
}

/// Announce the current total (when nonzero) and persist a zeroed document.
/// Retries the whole sequence on a remote-store conflict.
pub async fn reset_counter(
    store: &dyn CounterStore,
    sink: &dyn OutputSink,
    gate: &CounterGate,
) -> Result<(), StoreError> {
    let _guard = gate.lock().await;
    let (doc, mut token) = store.load().await?;

    if doc.count > 0 {
        // Failed announcements do not stop the reset; the count for the
        // new day must start at zero either way.
        let text = messages::format_daily_total(doc.count);
        if let Err(err) = sink.announce(&text).await {
            warn!("daily announcement failed: {}", err);
        }
    }

    for attempt in 1..=CONFLICT_RETRY_ATTEMPTS {
        match store.save(&CounterDocument::zero(), token.as_ref()).await {
            Ok(()) => {
                info!("daily reset complete (previous count {})", doc.count);
                return Ok(());
            }
            Err(StoreError::Conflict) => {
                warn!(
                    "daily reset save conflicted (attempt {}/{})",
                    attempt, CONFLICT_RETRY_ATTEMPTS
                );
                // Refresh the version token; the announced total stands.
                let (_, fresh) = store.load().await?;
                token = fresh;
            }
            Err(err) => return Err(err),
        }
    }
    Err(StoreError::Conflict)
}
