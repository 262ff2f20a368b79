//! SQL sources over any configured database

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use sqlx::any::{AnyArguments, AnyRow};
use sqlx::query::Query;
use sqlx::{Any, AnyConnection, Column, Connection, Row};
use tracing::{debug, info};

use crate::domain::source::{CheckResult, SourceAdapter, SourceData, SqlQuery};
use crate::domain::{Context, DomainError};

/// `:name` placeholders, ignoring `::type` casts
static PARAMETER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(^|[^:\w]):([A-Za-z_]\w*)").expect("valid parameter regex"));

/// How rows become source data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlShape {
    /// First row only; no rows gives an empty record
    Record,
    /// Every row
    Recordset,
    /// One record mapping `key_field` to `value_field` across rows
    Transpose {
        key_field: String,
        value_field: String,
    },
}

/// SQL text rewritten for the driver, with parameter names in bind order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundSql {
    pub sql: String,
    pub parameters: Vec<String>,
}

/// Rewrite named parameters into positional placeholders
pub fn bind_named_parameters(sql: &str, numbered: bool) -> BoundSql {
    let mut parameters = Vec::new();
    let rewritten = PARAMETER.replace_all(sql, |caps: &regex::Captures<'_>| {
        parameters.push(caps[2].to_string());
        let placeholder = if numbered {
            format!("${}", parameters.len())
        } else {
            "?".to_string()
        };
        format!("{}{}", &caps[1], placeholder)
    });

    BoundSql {
        sql: rewritten.into_owned(),
        parameters,
    }
}

#[derive(Debug)]
pub struct SqlSource {
    name: String,
    query: SqlQuery,
    shape: SqlShape,
}

impl SqlSource {
    pub fn new(name: impl Into<String>, query: SqlQuery, shape: SqlShape) -> Self {
        sqlx::any::install_default_drivers();
        Self {
            name: name.into(),
            query,
            shape,
        }
    }

    fn error(&self, message: impl std::fmt::Display) -> DomainError {
        DomainError::source(&self.name, message.to_string())
    }

    fn uses_numbered_placeholders(&self) -> bool {
        self.query.connection_string.starts_with("postgres")
    }

    async fn connect(&self) -> Result<AnyConnection, sqlx::Error> {
        AnyConnection::connect(&self.query.connection_string).await
    }

    async fn fetch(&self, current_data: &Context) -> Result<Vec<Context>, DomainError> {
        let bound = bind_named_parameters(&self.query.sql, self.uses_numbered_placeholders());
        debug!(source = %self.name, parameters = ?bound.parameters, "Running source query");

        let mut query = sqlx::query::<Any>(&bound.sql);
        for parameter in &bound.parameters {
            let value = current_data
                .get(parameter)
                .ok_or_else(|| self.error(format!("missing query parameter :{}", parameter)))?;
            query = bind_value(query, value);
        }

        let mut connection = self.connect().await.map_err(|e| self.error(e))?;
        let rows = query
            .fetch_all(&mut connection)
            .await
            .map_err(|e| self.error(e))?;
        connection.close().await.map_err(|e| self.error(e))?;

        Ok(rows.iter().map(row_to_context).collect())
    }
}

fn bind_value<'q>(
    query: Query<'q, Any, AnyArguments<'q>>,
    value: &Value,
) -> Query<'q, Any, AnyArguments<'q>> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Number(n) => match n.as_i64() {
            Some(int) => query.bind(int),
            None => query.bind(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => query.bind(s.clone()),
        other => query.bind(other.to_string()),
    }
}

fn row_to_context(row: &AnyRow) -> Context {
    row.columns()
        .iter()
        .map(|column| (column.name().to_string(), column_value(row, column.ordinal())))
        .collect()
}

fn column_value(row: &AnyRow, index: usize) -> Value {
    if let Ok(value) = row.try_get::<Option<i64>, _>(index) {
        return value.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(value) = row.try_get::<Option<f64>, _>(index) {
        return value.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(value) = row.try_get::<Option<bool>, _>(index) {
        return value.map(Value::Bool).unwrap_or(Value::Null);
    }
    row.try_get::<Option<String>, _>(index)
        .ok()
        .flatten()
        .map(Value::String)
        .unwrap_or(Value::Null)
}

fn transpose(
    rows: Vec<Context>,
    key_field: &str,
    value_field: &str,
) -> Result<Context, String> {
    let mut record = Context::new();
    for row in rows {
        let key = match row.get(key_field) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => {
                return Err(format!("row has no value for key field '{}'", key_field));
            }
            Some(other) => other.to_string(),
        };
        let value = row.get(value_field).cloned().unwrap_or(Value::Null);
        record.insert(key, value);
    }
    Ok(record)
}

#[async_trait]
impl SourceAdapter for SqlSource {
    fn is_multi_record(&self) -> bool {
        self.shape == SqlShape::Recordset
    }

    async fn check(&self) -> CheckResult {
        match self.connect().await {
            Ok(connection) => {
                let _ = connection.close().await;
                CheckResult::ok()
            }
            Err(e) => CheckResult::failed(format!(
                "Cannot connect to database for source '{}': {}",
                self.name, e
            )),
        }
    }

    async fn load(&self, current_data: &Context) -> Result<SourceData, DomainError> {
        let rows = self.fetch(current_data).await?;
        info!(source = %self.name, rows = rows.len(), "Loaded SQL source");

        match &self.shape {
            SqlShape::Record => Ok(SourceData::Record(rows.into_iter().next().unwrap_or_default())),
            SqlShape::Recordset => Ok(SourceData::Records(rows)),
            SqlShape::Transpose {
                key_field,
                value_field,
            } => transpose(rows, key_field, value_field)
                .map(SourceData::Record)
                .map_err(|e| self.error(e)),
        }
    }
}
