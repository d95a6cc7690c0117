//! Warehouse backend (BigQuery).
//!
//! Submits one query job per call and materializes every result row into
//! column-name-keyed mappings, typing cells from the result schema. Jobs that
//! are still running, and results spread over several pages, are followed
//! through `jobs.getQueryResults`.

use crate::config::Config;
use crate::db::{QueryBackend, Row, Value};
use crate::error::{AgentError, Result};
use async_trait::async_trait;
use gcp_bigquery_client::model::field_type::FieldType;
use gcp_bigquery_client::model::get_query_results_parameters::GetQueryResultsParameters;
use gcp_bigquery_client::model::query_request::QueryRequest;
use gcp_bigquery_client::model::table_row::TableRow;
use gcp_bigquery_client::model::table_schema::TableSchema;
use std::future::Future;
use std::path::PathBuf;
use tracing::debug;

/// How many consecutive "job not complete" answers are tolerated. Each
/// `getQueryResults` call waits server-side before answering.
const MAX_INCOMPLETE_POLLS: usize = 30;

/// BigQuery backend.
#[derive(Debug, Clone)]
pub struct WarehouseBackend {
    project: Option<String>,
    credentials: Option<PathBuf>,
}

impl WarehouseBackend {
    /// Creates a backend running jobs under `project`, authenticated with the
    /// service-account key at `credentials`.
    pub fn new(project: Option<String>, credentials: Option<PathBuf>) -> Self {
        Self {
            project,
            credentials,
        }
    }

    /// Creates a backend from the resolved configuration.
    ///
    /// Falls back to the model project and credentials when the warehouse
    /// section leaves them unset.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config
                .warehouse
                .project
                .clone()
                .or_else(|| config.model.project.clone()),
            config
                .warehouse
                .credentials
                .clone()
                .or_else(|| config.model.credentials.clone()),
        )
    }

    async fn client(&self, sql: &str) -> Result<gcp_bigquery_client::Client> {
        let path = self.credentials.as_ref().ok_or_else(|| {
            AgentError::config("Warehouse credentials are required (GOOGLE_APPLICATION_CREDENTIALS)")
        })?;

        let key = yup_oauth2::read_service_account_key(path)
            .await
            .map_err(|e| {
                AgentError::config(format!(
                    "Failed to read service account key {}: {e}",
                    path.display()
                ))
            })?;

        gcp_bigquery_client::Client::from_service_account_key(key, false)
            .await
            .map_err(|e| AgentError::execution(sql, format!("BigQuery authentication failed: {e}")))
    }
}

#[async_trait]
impl QueryBackend for WarehouseBackend {
    async fn fetch_rows(&self, sql: &str) -> Result<Vec<Row>> {
        let project = self
            .project
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| AgentError::config("Warehouse project is required (PROJECT_ID)"))?;

        let client = self.client(sql).await?;
        debug!("Submitting warehouse query job under project {}", project);

        let rs = client
            .job()
            .query(project, QueryRequest::new(sql.to_string()))
            .await
            .map_err(|e| AgentError::execution(sql, format!("BigQuery execution failed: {e}")))?;

        let response = rs.query_response();
        let first = ResultPage {
            complete: response.job_complete.unwrap_or(true),
            page_token: response.page_token.clone(),
            schema: response.schema.clone(),
            rows: response.rows.clone().unwrap_or_default(),
        };
        let job_id = response
            .job_reference
            .as_ref()
            .and_then(|r| r.job_id.clone());
        let location = response
            .job_reference
            .as_ref()
            .and_then(|r| r.location.clone());

        let job = client.job();
        let job_id = job_id.as_deref();
        let location = location.as_deref();
        let (schema, raw_rows) = collect_pages(sql, first, |page_token| {
            let params = GetQueryResultsParameters {
                page_token,
                location: location.map(String::from),
                ..Default::default()
            };
            async move {
                let job_id = job_id.ok_or_else(|| {
                    AgentError::execution(sql, "BigQuery returned no job reference for a pending result")
                })?;
                let page = job
                    .get_query_results(project, job_id, params)
                    .await
                    .map_err(|e| {
                        AgentError::execution(sql, format!("BigQuery result fetch failed: {e}"))
                    })?;
                Ok(ResultPage {
                    complete: page.job_complete.unwrap_or(true),
                    page_token: page.page_token,
                    schema: page.schema,
                    rows: page.rows.unwrap_or_default(),
                })
            }
        })
        .await?;

        let rows = convert_rows(raw_rows, &result_columns(schema.as_ref()));
        debug!("Warehouse query returned {} rows", rows.len());
        Ok(rows)
    }
}

/// One `jobs.query` or `jobs.getQueryResults` answer.
#[derive(Debug)]
struct ResultPage {
    complete: bool,
    page_token: Option<String>,
    schema: Option<TableSchema>,
    rows: Vec<TableRow>,
}

/// Follows a result until the job is complete and no page token remains.
///
/// `next_page` is called with the page token to fetch (`None` while the job
/// is still running).
async fn collect_pages<F, Fut>(
    sql: &str,
    first: ResultPage,
    mut next_page: F,
) -> Result<(Option<TableSchema>, Vec<TableRow>)>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<ResultPage>>,
{
    let mut schema = first.schema;
    let mut rows = Vec::new();
    let mut page = ResultPage {
        schema: None,
        ..first
    };
    let mut incomplete_polls = 0;

    loop {
        if !page.complete {
            incomplete_polls += 1;
            if incomplete_polls > MAX_INCOMPLETE_POLLS {
                return Err(AgentError::execution(
                    sql,
                    "BigQuery job did not complete in time",
                ));
            }
            debug!("Warehouse job still running, polling for results");
            page = next_page(None).await?;
        } else {
            incomplete_polls = 0;
            if schema.is_none() {
                schema = page.schema.take();
            }
            rows.append(&mut page.rows);
            match page.page_token.take() {
                Some(token) => {
                    debug!("Fetching next warehouse result page");
                    page = next_page(Some(token)).await?;
                }
                None => break,
            }
        }
    }

    Ok((schema, rows))
}

/// Column names and declared types, in result order.
fn result_columns(schema: Option<&TableSchema>) -> Vec<(String, Option<FieldType>)> {
    schema
        .and_then(|s| s.fields.as_ref())
        .map(|fields| {
            fields
                .iter()
                .map(|f| (f.name.clone(), Some(f.r#type.clone())))
                .collect()
        })
        .unwrap_or_default()
}

/// Converts positional result rows into column-name-keyed rows.
fn convert_rows(rows: Vec<TableRow>, columns: &[(String, Option<FieldType>)]) -> Vec<Row> {
    rows.into_iter()
        .map(|row| {
            let cells = row.columns.unwrap_or_default();
            let mut converted = Row::with_capacity(columns.len());
            for (i, (name, field_type)) in columns.iter().enumerate() {
                let raw = cells.get(i).and_then(|cell| cell.value.clone());
                converted.insert(name.clone(), convert_cell(raw, field_type.as_ref()));
            }
            converted
        })
        .collect()
}

/// Converts one JSON cell into a `Value`.
///
/// The REST API returns scalars as strings, so numeric and boolean columns
/// are parsed according to their declared field type.
fn convert_cell(raw: Option<serde_json::Value>, field_type: Option<&FieldType>) -> Value {
    let Some(raw) = raw else {
        return Value::Null;
    };

    match (raw, field_type) {
        (serde_json::Value::String(s), Some(FieldType::Integer | FieldType::Int64)) => s
            .parse::<i64>()
            .map(Value::Int)
            .unwrap_or_else(|_| Value::String(s)),
        (
            serde_json::Value::String(s),
            Some(FieldType::Float | FieldType::Float64 | FieldType::Numeric | FieldType::Bignumeric),
        ) => s
            .parse::<f64>()
            .map(Value::Float)
            .unwrap_or_else(|_| Value::String(s)),
        (serde_json::Value::String(s), Some(FieldType::Boolean | FieldType::Bool)) => {
            match s.to_lowercase().as_str() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ => Value::String(s),
            }
        }
        (other, _) => Value::from(other),
    }
}
