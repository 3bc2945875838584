// service/turn_service.rs
use std::sync::Arc;

use tracing::debug;

use crate::{
    models::turnmodel::TicketViewModel,
    service::{
        assembler::assemble,
        error::ResolutionError,
        polling::{start_polling, PollFailure, PollSettings, PollingHandle, TurnWatcher},
        ticket_fetcher::TicketFetcher,
    },
};

/// Entry point for the rendering layer: one-shot resolution and continuous polling.
#[derive(Debug, Clone)]
pub struct TurnService {
    fetcher: TicketFetcher,
    poll_settings: PollSettings,
}

impl TurnService {
    pub fn new(fetcher: TicketFetcher, poll_settings: PollSettings) -> Self {
        Self {
            fetcher,
            poll_settings,
        }
    }

    pub fn poll_settings(&self) -> PollSettings {
        self.poll_settings
    }

    pub async fn resolve_ticket(&self, code: &str) -> Result<TicketViewModel, ResolutionError> {
        let record = self.fetcher.fetch_by_code(code).await?;
        let view = assemble(&record);
        debug!(code = %view.number, status = view.status.to_str(), tier = view.tier.to_str(), "ticket resolved");
        Ok(view)
    }

    pub async fn resolve_now_serving(&self) -> Result<TicketViewModel, ResolutionError> {
        let record = self.fetcher.fetch_now_serving().await?;
        Ok(assemble(&record))
    }

    pub fn start_polling<U, E>(&self, code: &str, on_update: U, on_error: E) -> PollingHandle
    where
        U: Fn(Arc<TicketViewModel>) + Send + Sync + 'static,
        E: Fn(PollFailure) + Send + Sync + 'static,
    {
        start_polling(
            self.fetcher.clone(),
            code.trim(),
            self.poll_settings,
            on_update,
            on_error,
        )
    }

    pub fn watcher<U, E>(&self, on_update: U, on_error: E) -> TurnWatcher
    where
        U: Fn(Arc<TicketViewModel>) + Send + Sync + 'static,
        E: Fn(PollFailure) + Send + Sync + 'static,
    {
        TurnWatcher::new(self.fetcher.clone(), self.poll_settings, on_update, on_error)
    }
}
