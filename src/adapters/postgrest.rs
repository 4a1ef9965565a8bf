use crate::domain::ports::{Backend, BackendConfig};
use crate::utils::error::{Result, UnitError};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use std::time::Duration;

/// `Backend` over the PostgREST HTTP dialect served by Supabase.
#[derive(Clone)]
pub struct PostgrestBackend {
    client: Client,
    base_url: String,
    api_key: String,
}

impl PostgrestBackend {
    pub fn new<C: BackendConfig>(config: &C) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds()))
            .build()?;

        Ok(Self {
            client,
            base_url: config.backend_url().trim_end_matches('/').to_string(),
            api_key: config.api_key().to_string(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    async fn check(table: &str, response: Response) -> Result<Response> {
        let status = response.status();
        tracing::debug!(table, status = status.as_u16(), "backend response");
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
            .unwrap_or(body);

        Err(UnitError::BackendError {
            table: table.to_string(),
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl Backend for PostgrestBackend {
    async fn select(
        &self,
        table: &str,
        columns: &str,
        eq: &[(&str, String)],
    ) -> Result<Vec<Value>> {
        let mut query = vec![("select".to_string(), columns.to_string())];
        query.extend(
            eq.iter()
                .map(|(column, value)| (column.to_string(), format!("eq.{}", value))),
        );

        tracing::debug!(table, ?query, "select");
        let request = self.authorized(self.client.get(self.table_url(table)).query(&query));
        let response = Self::check(table, request.send().await?).await?;
        let rows: Vec<Value> = response.json().await?;
        Ok(rows)
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value> {
        tracing::debug!(table, %row, "insert");
        let request = self.authorized(
            self.client
                .post(self.table_url(table))
                .header("Prefer", "return=representation")
                .json(&row),
        );
        let response = Self::check(table, request.send().await?).await?;
        let created: Value = response.json().await?;

        match created {
            Value::Array(mut rows) if !rows.is_empty() => Ok(rows.swap_remove(0)),
            Value::Object(_) => Ok(created),
            _ => Err(UnitError::MissingGeneratedId {
                table: table.to_string(),
            }),
        }
    }

    async fn update(&self, table: &str, id: i64, row: Value) -> Result<()> {
        tracing::debug!(table, id, %row, "update");
        let request = self.authorized(
            self.client
                .patch(self.table_url(table))
                .query(&[("id", format!("eq.{}", id))])
                .json(&row),
        );
        Self::check(table, request.send().await?).await?;
        Ok(())
    }

    async fn delete(&self, table: &str, id: i64) -> Result<()> {
        tracing::debug!(table, id, "delete");
        let request = self.authorized(
            self.client
                .delete(self.table_url(table))
                .query(&[("id", format!("eq.{}", id))]),
        );
        Self::check(table, request.send().await?).await?;
        Ok(())
    }
}
