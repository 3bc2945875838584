// config.rs
use std::time::Duration;

use chrono::{FixedOffset, Offset, Utc};
use tracing::warn;

use crate::{
    models::{
        schemamodel::{SchemaGeneration, SchemaMapping},
        turnmodel::DurationUnit,
    },
    service::polling::PollSettings,
};

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub port: u16,
    pub schema_generations: Vec<SchemaGeneration>,
    pub legacy_wait_unit: DurationUnit,
    pub current_wait_unit: DurationUnit,
    pub poll_interval: Duration,
    pub fetch_timeout: Duration,
    pub connection_failure_threshold: u32,
    pub display_offset: FixedOffset,
    pub watch_ticket_code: Option<String>,
}

impl Config {
    pub fn init() -> Config {
        Config::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Config
    where
        F: Fn(&str) -> Option<String>,
    {
        let present = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let display_offset_minutes: i32 = parse_or(present("DISPLAY_UTC_OFFSET_MINUTES"), "DISPLAY_UTC_OFFSET_MINUTES", 0);
        let display_offset = FixedOffset::east_opt(display_offset_minutes.saturating_mul(60))
            .unwrap_or_else(|| {
                warn!(value = display_offset_minutes, "DISPLAY_UTC_OFFSET_MINUTES out of range, using UTC");
                Utc.fix()
            });

        Config {
            database_url: present("DATABASE_URL"),
            port: parse_or(present("PORT"), "PORT", 8000),
            schema_generations: parse_generations(present("SCHEMA_GENERATIONS")),
            legacy_wait_unit: parse_unit(present("LEGACY_WAIT_UNIT"), "LEGACY_WAIT_UNIT", DurationUnit::Minutes),
            current_wait_unit: parse_unit(present("CURRENT_WAIT_UNIT"), "CURRENT_WAIT_UNIT", DurationUnit::Seconds),
            poll_interval: Duration::from_millis(parse_or(present("POLL_INTERVAL_MS"), "POLL_INTERVAL_MS", 15_000)),
            fetch_timeout: Duration::from_millis(parse_or(present("FETCH_TIMEOUT_MS"), "FETCH_TIMEOUT_MS", 5_000)),
            connection_failure_threshold: parse_or(
                present("CONNECTION_FAILURE_THRESHOLD"),
                "CONNECTION_FAILURE_THRESHOLD",
                PollSettings::DEFAULT_FAILURE_THRESHOLD,
            ),
            display_offset,
            watch_ticket_code: present("WATCH_TICKET_CODE"),
        }
    }

    /// Schema mappings in lookup order, with the configured wait units applied.
    pub fn schema_mappings(&self) -> Vec<SchemaMapping> {
        self.schema_generations
            .iter()
            .map(|generation| {
                let unit = match generation {
                    SchemaGeneration::Legacy => self.legacy_wait_unit,
                    SchemaGeneration::Current => self.current_wait_unit,
                };
                SchemaMapping::for_generation(*generation).with_wait_unit(unit)
            })
            .collect()
    }

    pub fn poll_settings(&self) -> PollSettings {
        PollSettings::new(self.poll_interval, self.connection_failure_threshold)
    }
}

fn parse_or<T: std::str::FromStr>(raw: Option<String>, key: &str, default: T) -> T {
    match raw {
        None => default,
        Some(raw) => raw.parse::<T>().unwrap_or_else(|_| {
            warn!(key, value = %raw, "malformed setting, using default");
            default
        }),
    }
}

fn parse_unit(raw: Option<String>, key: &str, default: DurationUnit) -> DurationUnit {
    match raw {
        None => default,
        Some(raw) => DurationUnit::parse(&raw).unwrap_or_else(|| {
            warn!(key, value = %raw, "unknown wait unit, using default");
            default
        }),
    }
}

fn parse_generations(raw: Option<String>) -> Vec<SchemaGeneration> {
    let default = vec![SchemaGeneration::Current, SchemaGeneration::Legacy];
    let Some(raw) = raw else {
        return default;
    };

    let mut generations = Vec::new();
    for token in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        match SchemaGeneration::parse(token) {
            Some(generation) if !generations.contains(&generation) => generations.push(generation),
            Some(_) => {}
            None => warn!(value = token, "unknown schema generation ignored"),
        }
    }

    if generations.is_empty() {
        warn!(value = %raw, "SCHEMA_GENERATIONS names no known generation, using default");
        return default;
    }
    generations
}
