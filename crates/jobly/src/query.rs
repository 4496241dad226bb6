//! Fixed SQL statements with pre-numbered placeholders.

use crate::client::GenericClient;
use crate::error::JoblyResult;
use crate::row::FromRow;
use crate::value::Value;
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

/// Create a new pre-numbered query.
///
/// # Example
/// ```ignore
/// let company: Option<Company> = jobly::query("SELECT * FROM companies WHERE handle = $1")
///     .tag("companies.get")
///     .bind("acme")
///     .fetch_opt_as(&conn)
///     .await?;
/// ```
pub fn query(sql: impl Into<String>) -> Query {
    Query::new(sql)
}

/// A SQL string with pre-numbered placeholders (`$1, $2, ...`) plus bound values.
#[must_use]
#[derive(Debug, Clone)]
pub struct Query {
    sql: String,
    params: Vec<Value>,
    tag: Option<String>,
}

impl Query {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
            tag: None,
        }
    }

    /// Associate a tag for monitoring.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Bind the next parameter. The SQL must already contain its placeholder.
    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.params.push(value.into());
        self
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Parameter refs compatible with `tokio-postgres`.
    pub fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params.iter().map(|p| p as &(dyn ToSql + Sync)).collect()
    }

    /// Execute the query and return all rows.
    pub async fn fetch_all(&self, conn: &impl GenericClient) -> JoblyResult<Vec<Row>> {
        let params = self.params_ref();
        match self.tag.as_deref() {
            Some(tag) => conn.query_tagged(tag, &self.sql, &params).await,
            None => conn.query(&self.sql, &params).await,
        }
    }

    /// Execute the query and return all rows mapped to `T`.
    pub async fn fetch_all_as<T: FromRow>(&self, conn: &impl GenericClient) -> JoblyResult<Vec<T>> {
        let rows = self.fetch_all(conn).await?;
        rows.iter().map(T::from_row).collect()
    }

    /// Execute the query and return the first row, if any.
    pub async fn fetch_opt(&self, conn: &impl GenericClient) -> JoblyResult<Option<Row>> {
        let params = self.params_ref();
        match self.tag.as_deref() {
            Some(tag) => conn.query_opt_tagged(tag, &self.sql, &params).await,
            None => conn.query_opt(&self.sql, &params).await,
        }
    }

    /// Execute the query and return at most one row mapped to `T`.
    pub async fn fetch_opt_as<T: FromRow>(
        &self,
        conn: &impl GenericClient,
    ) -> JoblyResult<Option<T>> {
        let row = self.fetch_opt(conn).await?;
        row.as_ref().map(T::from_row).transpose()
    }

    /// Execute the query and return the first row.
    ///
    /// 0 rows is [`crate::JoblyError::NotFound`].
    pub async fn fetch_one(&self, conn: &impl GenericClient) -> JoblyResult<Row> {
        let params = self.params_ref();
        match self.tag.as_deref() {
            Some(tag) => conn.query_one_tagged(tag, &self.sql, &params).await,
            None => conn.query_one(&self.sql, &params).await,
        }
    }

    /// Execute the query and return the first row mapped to `T`.
    pub async fn fetch_one_as<T: FromRow>(&self, conn: &impl GenericClient) -> JoblyResult<T> {
        let row = self.fetch_one(conn).await?;
        T::from_row(&row)
    }

    /// Execute the statement and return the affected row count.
    pub async fn execute(&self, conn: &impl GenericClient) -> JoblyResult<u64> {
        let params = self.params_ref();
        match self.tag.as_deref() {
            Some(tag) => conn.execute_tagged(tag, &self.sql, &params).await,
            None => conn.execute(&self.sql, &params).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binds_in_order() {
        let q = query("SELECT * FROM jobs WHERE title ILIKE $1 AND salary > $2")
            .tag("jobs.search")
            .bind("%dev%")
            .bind(10.5);
        assert_eq!(q.params(), [Value::from("%dev%"), Value::Float(10.5)]);
        assert_eq!(q.params_ref().len(), 2);
        assert_eq!(q.tag.as_deref(), Some("jobs.search"));
    }
}
