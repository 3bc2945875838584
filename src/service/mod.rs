pub mod assembler;
pub mod category_resolver;
pub mod error;
pub mod polling;
pub mod schema_adapter;
pub mod status_normalizer;
pub mod ticket_fetcher;
pub mod turn_service;
pub mod wait_time;
