// service/polling.rs
use std::sync::Arc;
use std::time::Duration;

use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    models::turnmodel::TicketViewModel,
    service::{
        assembler::assemble,
        error::{ErrorReason, ResolutionError},
        ticket_fetcher::TicketFetcher,
    },
};

pub type UpdateCallback = Arc<dyn Fn(Arc<TicketViewModel>) + Send + Sync>;
pub type ErrorCallback = Arc<dyn Fn(PollFailure) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    /// Consecutive connection failures after which a failure is flagged persistent.
    pub failure_threshold: u32,
}

impl PollSettings {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(15);
    pub const DEFAULT_FAILURE_THRESHOLD: u32 = 3;
    const MIN_INTERVAL: Duration = Duration::from_millis(1);

    pub fn new(interval: Duration, failure_threshold: u32) -> Self {
        Self {
            interval: interval.max(Self::MIN_INTERVAL),
            failure_threshold: failure_threshold.max(1),
        }
    }
}

impl Default for PollSettings {
    fn default() -> Self {
        Self::new(Self::DEFAULT_INTERVAL, Self::DEFAULT_FAILURE_THRESHOLD)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Fetching,
    Terminated,
}

/// What `on_error` receives.
#[derive(Debug, Clone, PartialEq)]
pub struct PollFailure {
    pub error: ResolutionError,
    /// Connection failures in a row, this one included. Zero for other reasons.
    pub consecutive_failures: u32,
    /// The store has been unreachable for at least the configured number of cycles.
    pub persistent: bool,
}

impl PollFailure {
    pub fn reason(&self) -> ErrorReason {
        self.error.reason()
    }
}

/// Decides which failures reach `on_error`. Connection failures always do and
/// are counted; "not found" and schema failures are reported once per streak.
#[derive(Debug)]
struct FailureTracker {
    threshold: u32,
    consecutive_connection: u32,
    last_reported: Option<ErrorReason>,
}

impl FailureTracker {
    fn new(threshold: u32) -> Self {
        Self {
            threshold,
            consecutive_connection: 0,
            last_reported: None,
        }
    }

    fn succeeded(&mut self) {
        self.consecutive_connection = 0;
        self.last_reported = None;
    }

    fn failed(&mut self, error: ResolutionError) -> Option<PollFailure> {
        let reason = error.reason();
        match reason {
            ErrorReason::Connection => {
                self.consecutive_connection += 1;
                self.last_reported = Some(reason);
                Some(PollFailure {
                    error,
                    consecutive_failures: self.consecutive_connection,
                    persistent: self.consecutive_connection >= self.threshold,
                })
            }
            ErrorReason::NotFound | ErrorReason::Schema => {
                self.consecutive_connection = 0;
                if self.last_reported == Some(reason) {
                    return None;
                }
                self.last_reported = Some(reason);
                Some(PollFailure {
                    error,
                    consecutive_failures: 0,
                    persistent: false,
                })
            }
        }
    }
}

/// Handle to one polling subject. Cancelling, or dropping the handle, stops the
/// timer and discards any fetch still in flight.
pub struct PollingHandle {
    code: String,
    token: CancellationToken,
    state: Arc<watch::Sender<PollState>>,
    latest: watch::Receiver<Option<Arc<TicketViewModel>>>,
    task: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for PollingHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollingHandle")
            .field("code", &self.code)
            .field("state", &self.state())
            .finish()
    }
}

impl PollingHandle {
    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn cancel(&self) {
        if !self.token.is_cancelled() {
            info!(code = %self.code, "polling cancelled");
        }
        self.token.cancel();
        self.state.send_replace(PollState::Terminated);
    }

    pub fn is_live(&self) -> bool {
        !self.token.is_cancelled()
    }

    pub fn state(&self) -> PollState {
        *self.state.borrow()
    }

    /// Last successfully resolved view model, kept across failed cycles.
    pub fn latest(&self) -> Option<Arc<TicketViewModel>> {
        self.latest.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<TicketViewModel>>> {
        self.latest.clone()
    }

    /// Cancel and wait for the polling task to exit.
    pub async fn stop(mut self) {
        self.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(code = %self.code, error = %e, "polling task ended abnormally");
            }
        }
    }
}

impl Drop for PollingHandle {
    fn drop(&mut self) {
        self.token.cancel();
        self.state.send_replace(PollState::Terminated);
    }
}

/// Poll `code` every `settings.interval`, starting immediately.
///
/// At most one fetch is outstanding: ticks that fall due while a fetch runs are
/// skipped, not queued. Results are checked against the handle's liveness right
/// before delivery, so nothing is delivered once the handle is cancelled.
pub fn start_polling<U, E>(
    fetcher: TicketFetcher,
    code: impl Into<String>,
    settings: PollSettings,
    on_update: U,
    on_error: E,
) -> PollingHandle
where
    U: Fn(Arc<TicketViewModel>) + Send + Sync + 'static,
    E: Fn(PollFailure) + Send + Sync + 'static,
{
    start_polling_shared(fetcher, code.into(), settings, Arc::new(on_update), Arc::new(on_error))
}

fn start_polling_shared(
    fetcher: TicketFetcher,
    code: String,
    settings: PollSettings,
    on_update: UpdateCallback,
    on_error: ErrorCallback,
) -> PollingHandle {
    let token = CancellationToken::new();
    let (state_tx, _) = watch::channel(PollState::Idle);
    let state = Arc::new(state_tx);
    let (latest_tx, latest_rx) = watch::channel(None);

    info!(code = %code, interval_ms = settings.interval.as_millis() as u64, "polling started");

    let task = tokio::spawn(run_polling(
        fetcher,
        code.clone(),
        settings,
        token.clone(),
        state.clone(),
        latest_tx,
        on_update,
        on_error,
    ));

    PollingHandle {
        code,
        token,
        state,
        latest: latest_rx,
        task: Some(task),
    }
}

// Never moves a terminated subject back to Idle or Fetching.
fn set_state(state: &watch::Sender<PollState>, next: PollState) {
    state.send_if_modified(|current| {
        if *current == PollState::Terminated || *current == next {
            false
        } else {
            *current = next;
            true
        }
    });
}

// Checked immediately before a callback fires.
fn deliverable(token: &CancellationToken, code: &str) -> bool {
    if token.is_cancelled() {
        debug!(code, "discarding result for cancelled subject");
        return false;
    }
    true
}

#[allow(clippy::too_many_arguments)]
async fn run_polling(
    fetcher: TicketFetcher,
    code: String,
    settings: PollSettings,
    token: CancellationToken,
    state: Arc<watch::Sender<PollState>>,
    latest: watch::Sender<Option<Arc<TicketViewModel>>>,
    on_update: UpdateCallback,
    on_error: ErrorCallback,
) {
    let mut ticker = interval(settings.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut failures = FailureTracker::new(settings.failure_threshold);

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        set_state(&state, PollState::Fetching);
        debug!(code = %code, "polling fetch issued");

        let outcome = tokio::select! {
            biased;
            _ = token.cancelled() => break,
            outcome = fetcher.fetch_by_code(&code) => outcome,
        };

        match outcome {
            Ok(record) => {
                let view = Arc::new(assemble(&record));
                failures.succeeded();
                if !deliverable(&token, &code) {
                    break;
                }
                latest.send_replace(Some(view.clone()));
                on_update(view);
            }
            Err(error) => {
                match error.reason() {
                    ErrorReason::Connection => {
                        warn!(code = %code, error = %error, "polling fetch failed, keeping last view")
                    }
                    ErrorReason::NotFound => info!(code = %code, "polled ticket not found"),
                    ErrorReason::Schema => {}
                }
                let failure = failures.failed(error);
                if !deliverable(&token, &code) {
                    break;
                }
                if let Some(failure) = failure {
                    on_error(failure);
                }
            }
        }

        set_state(&state, PollState::Idle);
    }

    state.send_replace(PollState::Terminated);
    debug!(code = %code, "polling task exited");
}

/// Keeps at most one polling subject alive. Switching codes cancels the old
/// subject before the new one starts, so results never mix.
pub struct TurnWatcher {
    fetcher: TicketFetcher,
    settings: PollSettings,
    on_update: UpdateCallback,
    on_error: ErrorCallback,
    active: Option<PollingHandle>,
}

impl TurnWatcher {
    pub fn new<U, E>(fetcher: TicketFetcher, settings: PollSettings, on_update: U, on_error: E) -> Self
    where
        U: Fn(Arc<TicketViewModel>) + Send + Sync + 'static,
        E: Fn(PollFailure) + Send + Sync + 'static,
    {
        Self {
            fetcher,
            settings,
            on_update: Arc::new(on_update),
            on_error: Arc::new(on_error),
            active: None,
        }
    }

    pub fn watch(&mut self, code: &str) -> &PollingHandle {
        let code = code.trim();
        let keep = self
            .active
            .as_ref()
            .map(|handle| handle.is_live() && handle.code() == code)
            .unwrap_or(false);

        if !keep {
            if let Some(previous) = self.active.take() {
                previous.cancel();
            }
        }

        let (fetcher, settings) = (&self.fetcher, self.settings);
        let (on_update, on_error) = (&self.on_update, &self.on_error);
        self.active.get_or_insert_with(|| {
            start_polling_shared(
                fetcher.clone(),
                code.to_string(),
                settings,
                on_update.clone(),
                on_error.clone(),
            )
        })
    }

    pub fn current(&self) -> Option<&PollingHandle> {
        self.active.as_ref()
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.active.take() {
            handle.cancel();
        }
    }
}
