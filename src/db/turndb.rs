// src/db/turndb.rs
use async_trait::async_trait;

use super::db::DBClient;
use crate::models::{schemamodel::SchemaMapping, turnmodel::RawRow};

/// Read access to the ticket store. Rows come back as JSON objects keyed by the
/// generation's column names; interpreting them is the schema adapter's job.
#[async_trait]
pub trait TurnExt: Send + Sync {
    /// Most recently issued row for `code`, if any.
    async fn query_most_recent_ticket_by_code(
        &self,
        mapping: &SchemaMapping,
        code: &str,
    ) -> Result<Option<RawRow>, sqlx::Error>;

    /// Ticket currently being served, falling back to the most recently issued one.
    async fn query_now_serving(
        &self,
        mapping: &SchemaMapping,
    ) -> Result<Option<RawRow>, sqlx::Error>;
}

fn row_projection(mapping: &SchemaMapping) -> String {
    match (mapping.category_key, mapping.category_table, mapping.category_fk_column) {
        (Some(key), Some(table), Some(fk)) => format!(
            r#"
            SELECT to_jsonb(t) || jsonb_build_object(
                '{key}',
                CASE WHEN c.id IS NULL THEN NULL ELSE to_jsonb(c) END
            ) AS row
            FROM {ticket_table} t
            LEFT JOIN {table} c ON c.id = t.{fk}
            "#,
            ticket_table = mapping.table,
        ),
        _ => format!(
            r#"
            SELECT to_jsonb(t) AS row
            FROM {ticket_table} t
            "#,
            ticket_table = mapping.table,
        ),
    }
}

/// A code can be reused across days, so the newest issuance must win.
pub fn ticket_by_code_sql(mapping: &SchemaMapping) -> String {
    format!(
        r#"{projection}
            WHERE t.{code} = $1
            ORDER BY t.{issued} DESC NULLS LAST
            LIMIT 1
        "#,
        projection = row_projection(mapping),
        code = mapping.code_column,
        issued = mapping.issued_column,
    )
}

pub fn now_serving_sql(mapping: &SchemaMapping) -> String {
    format!(
        r#"{projection}
            ORDER BY
                COALESCE(lower(t.{status}) = $1, false) DESC,
                CASE WHEN lower(t.{status}) = $1 THEN t.{called} END DESC NULLS LAST,
                t.{issued} DESC NULLS LAST
            LIMIT 1
        "#,
        projection = row_projection(mapping),
        status = mapping.status_column,
        called = mapping.called_column,
        issued = mapping.issued_column,
    )
}

#[async_trait]
impl TurnExt for DBClient {
    async fn query_most_recent_ticket_by_code(
        &self,
        mapping: &SchemaMapping,
        code: &str,
    ) -> Result<Option<RawRow>, sqlx::Error> {
        let sql = ticket_by_code_sql(mapping);

        let row = sqlx::query_scalar::<_, RawRow>(&sql)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn query_now_serving(
        &self,
        mapping: &SchemaMapping,
    ) -> Result<Option<RawRow>, sqlx::Error> {
        let sql = now_serving_sql(mapping);

        let row = sqlx::query_scalar::<_, RawRow>(&sql)
            .bind(mapping.serving_status)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }
}

/// Installed when no database is configured: every query fails as a connection
/// error so callers see "store unavailable" rather than "not found".
#[derive(Debug, Clone, Default)]
pub struct OfflineTurnStore;

#[async_trait]
impl TurnExt for OfflineTurnStore {
    async fn query_most_recent_ticket_by_code(
        &self,
        _mapping: &SchemaMapping,
        _code: &str,
    ) -> Result<Option<RawRow>, sqlx::Error> {
        Err(sqlx::Error::Configuration("DATABASE_URL is not set".into()))
    }

    async fn query_now_serving(
        &self,
        _mapping: &SchemaMapping,
    ) -> Result<Option<RawRow>, sqlx::Error> {
        Err(sqlx::Error::Configuration("DATABASE_URL is not set".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn squash(sql: &str) -> String {
        sql.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn current_lookup_joins_categories_and_orders_by_issuance() {
        let sql = squash(&ticket_by_code_sql(&SchemaMapping::current()));
        assert!(sql.contains("FROM turnos t LEFT JOIN categorias c ON c.id = t.categoria_id"));
        assert!(sql.contains("'categorias'"));
        assert!(sql.contains("WHERE t.numero = $1"));
        assert!(sql.contains("ORDER BY t.fecha_creacion DESC NULLS LAST LIMIT 1"));
    }

    #[test]
    fn legacy_lookup_has_no_join() {
        let sql = squash(&ticket_by_code_sql(&SchemaMapping::legacy()));
        assert!(sql.starts_with("SELECT to_jsonb(t) AS row FROM turns t"));
        assert!(!sql.contains("JOIN"));
        assert!(sql.contains("WHERE t.number = $1"));
        assert!(sql.contains("ORDER BY t.created_at DESC NULLS LAST"));
    }

    #[test]
    fn now_serving_prefers_called_tickets() {
        let sql = squash(&now_serving_sql(&SchemaMapping::current()));
        assert!(sql.contains("ORDER BY COALESCE(lower(t.estado) = $1, false) DESC,"));
        assert!(!sql.contains("(lower(t.estado) = $1) DESC"));

        let legacy = squash(&now_serving_sql(&SchemaMapping::legacy()));
        assert!(legacy.contains("ORDER BY COALESCE(lower(t.status) = $1, false) DESC,"));
        assert!(sql.contains("t.fecha_llamado END DESC NULLS LAST"));
        assert!(sql.ends_with("t.fecha_creacion DESC NULLS LAST LIMIT 1"));
    }

    #[tokio::test]
    async fn offline_store_reports_connection_failure() {
        let store = OfflineTurnStore;
        let err = store
            .query_most_recent_ticket_by_code(&SchemaMapping::current(), "A-1")
            .await
            .unwrap_err();
        assert!(matches!(err, sqlx::Error::Configuration(_)));
    }
}
