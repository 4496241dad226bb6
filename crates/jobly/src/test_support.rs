//! In-memory client for unit tests.

use crate::client::GenericClient;
use crate::error::JoblyResult;
use std::sync::Mutex;
use std::time::Duration;
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

/// One statement as the client received it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Recorded {
    pub tag: Option<String>,
    pub sql: String,
    /// `Debug` rendering of each bound parameter.
    pub params: Vec<String>,
}

/// Records every statement and answers with no rows.
#[derive(Default)]
pub(crate) struct RecordingClient {
    pub delay: Option<Duration>,
    pub affected: u64,
    seen: Mutex<Vec<Recorded>>,
}

impl RecordingClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn affecting(affected: u64) -> Self {
        Self {
            affected,
            ..Self::default()
        }
    }

    pub fn delayed(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn recorded(&self) -> Vec<Recorded> {
        self.seen.lock().unwrap().clone()
    }

    fn record(&self, tag: Option<&str>, sql: &str, params: &[&(dyn ToSql + Sync)]) {
        self.seen.lock().unwrap().push(Recorded {
            tag: tag.map(str::to_string),
            sql: sql.to_string(),
            params: params.iter().map(|p| format!("{p:?}")).collect(),
        });
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

impl GenericClient for RecordingClient {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> JoblyResult<Vec<Row>> {
        self.record(None, sql, params);
        self.pause().await;
        Ok(vec![])
    }

    async fn query_tagged(
        &self,
        tag: &str,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> JoblyResult<Vec<Row>> {
        self.record(Some(tag), sql, params);
        self.pause().await;
        Ok(vec![])
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> JoblyResult<u64> {
        self.record(None, sql, params);
        self.pause().await;
        Ok(self.affected)
    }

    async fn execute_tagged(
        &self,
        tag: &str,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> JoblyResult<u64> {
        self.record(Some(tag), sql, params);
        self.pause().await;
        Ok(self.affected)
    }
}
