use super::config::MonitorConfig;
use super::truncate_sql_bytes;
use super::types::{QueryContext, QueryOutcome};
use crate::client::GenericClient;
use crate::error::{JoblyError, JoblyResult};
use std::future::Future;
use std::time::{Duration, Instant};
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

/// A [`GenericClient`] wrapper that logs every statement through `tracing`
/// and enforces the configured timeout.
pub struct InstrumentedClient<C> {
    client: C,
    config: MonitorConfig,
}

impl<C: GenericClient> InstrumentedClient<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            config: MonitorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: MonitorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn inner(&self) -> &C {
        &self.client
    }

    pub fn into_inner(self) -> C {
        self.client
    }

    fn display_sql<'a>(&self, sql: &'a str) -> std::borrow::Cow<'a, str> {
        match self.config.max_sql_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)).into(),
            _ => sql.into(),
        }
    }

    fn report(&self, ctx: &QueryContext, elapsed: Duration, outcome: &QueryOutcome) {
        let tag = ctx.tag.as_deref().unwrap_or("-");
        let sql = self.display_sql(&ctx.sql);
        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;

        if let QueryOutcome::Error(error) = outcome {
            tracing::error!(
                target: "jobly.sql",
                query_type = ?ctx.query_type,
                tag,
                param_count = ctx.param_count,
                elapsed_ms,
                sql = %sql,
                error = %error,
                "statement failed"
            );
            return;
        }

        match self.config.slow_query_threshold {
            Some(threshold) if elapsed > threshold => tracing::warn!(
                target: "jobly.sql",
                query_type = ?ctx.query_type,
                tag,
                param_count = ctx.param_count,
                elapsed_ms,
                sql = %sql,
                outcome = %outcome,
                "slow statement"
            ),
            _ => tracing::debug!(
                target: "jobly.sql",
                query_type = ?ctx.query_type,
                tag,
                param_count = ctx.param_count,
                elapsed_ms,
                sql = %sql,
                outcome = %outcome,
            ),
        }
    }

    async fn with_timeout<T, F>(&self, future: F) -> JoblyResult<T>
    where
        F: Future<Output = JoblyResult<T>> + Send,
    {
        let Some(timeout) = self.config.query_timeout else {
            return future.await;
        };
        match tokio::time::timeout(timeout, future).await {
            Ok(result) => result,
            Err(_) => {
                if let Some(cancel_token) = self.client.cancel_token() {
                    tokio::spawn(async move {
                        let _ = cancel_token.cancel_query(tokio_postgres::NoTls).await;
                    });
                }
                Err(JoblyError::Timeout(timeout))
            }
        }
    }

    async fn query_inner(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
        tag: Option<&str>,
    ) -> JoblyResult<Vec<Row>> {
        let ctx = QueryContext::new(sql, params.len()).with_tag(tag);
        let start = Instant::now();
        let result = self.with_timeout(self.client.query(sql, params)).await;
        let outcome = match &result {
            Ok(rows) => QueryOutcome::Rows(rows.len()),
            Err(e) => QueryOutcome::Error(e.to_string()),
        };
        self.report(&ctx, start.elapsed(), &outcome);
        result
    }

    async fn execute_inner(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
        tag: Option<&str>,
    ) -> JoblyResult<u64> {
        let ctx = QueryContext::new(sql, params.len()).with_tag(tag);
        let start = Instant::now();
        let result = self.with_timeout(self.client.execute(sql, params)).await;
        let outcome = match &result {
            Ok(n) => QueryOutcome::Affected(*n),
            Err(e) => QueryOutcome::Error(e.to_string()),
        };
        self.report(&ctx, start.elapsed(), &outcome);
        result
    }
}

impl<C: GenericClient> GenericClient for InstrumentedClient<C> {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> JoblyResult<Vec<Row>> {
        self.query_inner(sql, params, None).await
    }

    async fn query_tagged(
        &self,
        tag: &str,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> JoblyResult<Vec<Row>> {
        self.query_inner(sql, params, Some(tag)).await
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> JoblyResult<u64> {
        self.execute_inner(sql, params, None).await
    }

    async fn execute_tagged(
        &self,
        tag: &str,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> JoblyResult<u64> {
        self.execute_inner(sql, params, Some(tag)).await
    }

    fn cancel_token(&self) -> Option<tokio_postgres::CancelToken> {
        self.client.cancel_token()
    }
}
