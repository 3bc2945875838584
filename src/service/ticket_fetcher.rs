// service/ticket_fetcher.rs
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error};

use crate::{
    db::{query_timeout::QueryTimeout, turndb::TurnExt},
    models::{schemamodel::SchemaMapping, turnmodel::RawTicketRecord},
    service::{error::ResolutionError, schema_adapter::adapt},
};

/// Looks tickets up in the store, one schema generation after another.
///
/// A generation that answers with zero rows hands over to the next one. A store
/// failure ends the lookup at once as `Connection`: falling through to another
/// generation would guess at data the store never confirmed.
#[derive(Clone)]
pub struct TicketFetcher {
    store: Arc<dyn TurnExt>,
    mappings: Vec<SchemaMapping>,
    query_timeout: Duration,
}

impl std::fmt::Debug for TicketFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TicketFetcher")
            .field(
                "generations",
                &self.mappings.iter().map(|m| m.generation).collect::<Vec<_>>(),
            )
            .field("query_timeout", &self.query_timeout)
            .finish()
    }
}

impl TicketFetcher {
    pub fn new(store: Arc<dyn TurnExt>, mappings: Vec<SchemaMapping>) -> Self {
        Self {
            store,
            mappings,
            query_timeout: QueryTimeout::DEFAULT_TIMEOUT,
        }
    }

    pub fn with_query_timeout(mut self, query_timeout: Duration) -> Self {
        self.query_timeout = query_timeout;
        self
    }

    /// Most recently issued ticket for `code`.
    pub async fn fetch_by_code(&self, code: &str) -> Result<RawTicketRecord, ResolutionError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(ResolutionError::NotFound(String::new()));
        }

        for mapping in &self.mappings {
            let row = QueryTimeout::execute_with_timeout(
                self.store.query_most_recent_ticket_by_code(mapping, code),
                self.query_timeout,
            )
            .await?;

            match row {
                Some(row) => {
                    debug!(code, generation = mapping.generation.to_str(), "ticket row found");
                    return adapt(&row, mapping).map_err(|source| {
                        error!(code, generation = mapping.generation.to_str(), error = %source, "unreadable ticket row");
                        ResolutionError::Schema {
                            code: code.to_string(),
                            source,
                        }
                    });
                }
                None => {
                    debug!(code, generation = mapping.generation.to_str(), "no ticket row, trying next generation");
                }
            }
        }

        Err(ResolutionError::NotFound(code.to_string()))
    }

    /// Ticket currently being served, from the first generation that has any.
    pub async fn fetch_now_serving(&self) -> Result<RawTicketRecord, ResolutionError> {
        for mapping in &self.mappings {
            let row = QueryTimeout::execute_with_timeout(
                self.store.query_now_serving(mapping),
                self.query_timeout,
            )
            .await?;

            if let Some(row) = row {
                return adapt(&row, mapping).map_err(|source| {
                    error!(generation = mapping.generation.to_str(), error = %source, "unreadable now-serving row");
                    ResolutionError::Schema {
                        code: String::new(),
                        source,
                    }
                });
            }
        }

        Err(ResolutionError::NotFound(String::new()))
    }
}
