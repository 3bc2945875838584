// service/schema_adapter.rs
use serde_json::Value;

use crate::{
    models::{
        schemamodel::{SchemaGeneration, SchemaMapping},
        turnmodel::{RawRow, RawTicketRecord, TaggedDuration},
    },
    service::error::SchemaError,
    utils::rowfields,
};

/// Guess the generation from the code column that is present.
pub fn detect_generation(row: &RawRow) -> Option<SchemaGeneration> {
    let current = SchemaMapping::current();
    let legacy = SchemaMapping::legacy();

    if rowfields::text(row, current.code_column).is_some() {
        Some(SchemaGeneration::Current)
    } else if rowfields::text(row, legacy.code_column).is_some() {
        Some(SchemaGeneration::Legacy)
    } else {
        None
    }
}

/// Normalize a store row into a `RawTicketRecord` using the supplied mapping.
///
/// Only a missing ticket code is an error. Every other column degrades to `None`
/// (or `Value::Null` for the category join) so that partial rows still render.
pub fn adapt(row: &RawRow, mapping: &SchemaMapping) -> Result<RawTicketRecord, SchemaError> {
    if !row.is_object() {
        return Err(SchemaError::NotAnObject);
    }

    let code = rowfields::text(row, mapping.code_column)
        .ok_or(SchemaError::MissingCode(mapping.code_column))?;

    let raw_wait_duration = rowfields::number(row, mapping.wait_column).map(|value| TaggedDuration {
        value,
        unit: mapping.wait_unit,
    });

    let category_ref = mapping
        .category_key
        .and_then(|key| row.get(key))
        .cloned()
        .unwrap_or(Value::Null);

    Ok(RawTicketRecord {
        id: rowfields::text(row, mapping.id_column),
        code,
        raw_status: rowfields::text(row, mapping.status_column),
        raw_wait_duration,
        issued_at: rowfields::timestamp(row, mapping.issued_column),
        called_at: rowfields::timestamp(row, mapping.called_column),
        category_ref,
    })
}

/// Adapt a row of unknown origin: detect its generation, then adapt with the
/// default mapping of that generation.
pub fn adapt_detected(row: &RawRow) -> Result<RawTicketRecord, SchemaError> {
    if !row.is_object() {
        return Err(SchemaError::NotAnObject);
    }
    let generation = detect_generation(row).ok_or(SchemaError::UnknownGeneration)?;
    adapt(row, &SchemaMapping::for_generation(generation))
}
