// src/models/schemamodel.rs
use serde::Serialize;

use super::turnmodel::DurationUnit;

/// Generations of the ticket table seen in production.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaGeneration {
    /// `turns` table, wait stored in minutes, no category join.
    Legacy,
    /// `turnos` table joined to `categorias`, durations stored in seconds.
    Current,
}

impl SchemaGeneration {
    pub fn to_str(&self) -> &str {
        match self {
            SchemaGeneration::Legacy => "legacy",
            SchemaGeneration::Current => "current",
        }
    }

    pub fn parse(raw: &str) -> Option<SchemaGeneration> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "legacy" | "v1" => Some(SchemaGeneration::Legacy),
            "current" | "v2" => Some(SchemaGeneration::Current),
            _ => None,
        }
    }
}

/// Column layout of one schema generation. Every name here is interpolated into SQL
/// and is therefore only ever a compile-time constant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaMapping {
    pub generation: SchemaGeneration,
    pub table: &'static str,
    pub id_column: &'static str,
    pub code_column: &'static str,
    pub status_column: &'static str,
    pub wait_column: &'static str,
    pub wait_unit: DurationUnit,
    pub issued_column: &'static str,
    pub called_column: &'static str,
    /// Key the category join is exposed under in the row, if the generation has one.
    pub category_key: Option<&'static str>,
    pub category_table: Option<&'static str>,
    pub category_fk_column: Option<&'static str>,
    /// Raw status marking the ticket currently being served.
    pub serving_status: &'static str,
}

impl SchemaMapping {
    pub fn legacy() -> Self {
        SchemaMapping {
            generation: SchemaGeneration::Legacy,
            table: "turns",
            id_column: "id",
            code_column: "number",
            status_column: "status",
            wait_column: "tiempo_espera",
            wait_unit: DurationUnit::Minutes,
            issued_column: "created_at",
            called_column: "fecha_llamado",
            category_key: None,
            category_table: None,
            category_fk_column: None,
            serving_status: "current",
        }
    }

    pub fn current() -> Self {
        SchemaMapping {
            generation: SchemaGeneration::Current,
            table: "turnos",
            id_column: "id",
            code_column: "numero",
            status_column: "estado",
            wait_column: "tiempo_espera",
            wait_unit: DurationUnit::Seconds,
            issued_column: "fecha_creacion",
            called_column: "fecha_llamado",
            category_key: Some("categorias"),
            category_table: Some("categorias"),
            category_fk_column: Some("categoria_id"),
            serving_status: "llamado",
        }
    }

    pub fn for_generation(generation: SchemaGeneration) -> Self {
        match generation {
            SchemaGeneration::Legacy => Self::legacy(),
            SchemaGeneration::Current => Self::current(),
        }
    }

    pub fn with_wait_unit(mut self, unit: DurationUnit) -> Self {
        self.wait_unit = unit;
        self
    }
}
