pub mod config;
pub mod db;
pub mod dtos;
pub mod error;
pub mod handler;
pub mod models;
pub mod routes;
pub mod service;
pub mod utils;

use config::Config;
use service::turn_service::TurnService;

#[derive(Debug, Clone)]
pub struct AppState {
    pub env: Config,
    pub turn_service: TurnService,
}
