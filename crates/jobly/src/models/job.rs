use crate::client::GenericClient;
use crate::error::{JoblyError, JoblyResult};
use crate::ident::Table;
use crate::partial_update::sql_for_partial_update;
use crate::query::query;
use crate::row::{FromRow, RowExt};
use crate::validate::{JOB_RULES, Mode};
use crate::value::UpdateFields;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;

const JOB_COLUMNS: &str = "id, title, salary, equity, company_handle, date_posted";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSummary {
    pub title: String,
    pub company_handle: String,
}

impl FromRow for JobSummary {
    fn from_row(row: &Row) -> JoblyResult<Self> {
        Ok(Self {
            title: row.try_get_column("title")?,
            company_handle: row.try_get_column("company_handle")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: i32,
    pub title: String,
    pub salary: f64,
    /// Fraction of the company, `0.0..=1.0`.
    pub equity: f64,
    pub company_handle: String,
    pub date_posted: DateTime<Utc>,
}

impl FromRow for Job {
    fn from_row(row: &Row) -> JoblyResult<Self> {
        Ok(Self {
            id: row.try_get_column("id")?,
            title: row.try_get_column("title")?,
            salary: row.try_get_column("salary")?,
            equity: row.try_get_column("equity")?,
            company_handle: row.try_get_column("company_handle")?,
            date_posted: row.try_get_column("date_posted")?,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewJob {
    pub title: String,
    pub salary: f64,
    pub equity: f64,
    pub company_handle: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobSearch {
    pub search: Option<String>,
    pub min_salary: Option<f64>,
    pub min_equity: Option<f64>,
}

impl JobSearch {
    pub fn is_empty(&self) -> bool {
        self.search.is_none() && self.min_salary.is_none() && self.min_equity.is_none()
    }
}

impl Job {
    pub async fn get_all(conn: &impl GenericClient) -> JoblyResult<Vec<JobSummary>> {
        query("SELECT title, company_handle FROM jobs ORDER BY id")
            .tag("jobs.get_all")
            .fetch_all_as(conn)
            .await
    }

    /// Case-insensitive title match with salary and equity strictly above the
    /// given minimums.
    pub async fn search(
        conn: &impl GenericClient,
        filter: &JobSearch,
    ) -> JoblyResult<Vec<JobSummary>> {
        query(
            "SELECT title, company_handle FROM jobs \
             WHERE title ILIKE $1 AND salary > $2 AND equity > $3 \
             ORDER BY id",
        )
        .tag("jobs.search")
        .bind(format!("%{}%", filter.search.as_deref().unwrap_or("")))
        .bind(filter.min_salary.unwrap_or(0.0))
        .bind(filter.min_equity.unwrap_or(0.0))
        .fetch_all_as(conn)
        .await
    }

    pub async fn create(conn: &impl GenericClient, new: &NewJob) -> JoblyResult<Job> {
        query(format!(
            "INSERT INTO jobs (title, salary, equity, company_handle) \
             VALUES ($1, $2, $3, $4) RETURNING {JOB_COLUMNS}"
        ))
        .tag("jobs.create")
        .bind(new.title.as_str())
        .bind(new.salary)
        .bind(new.equity)
        .bind(new.company_handle.as_str())
        .fetch_one_as(conn)
        .await
    }

    pub async fn get(conn: &impl GenericClient, id: i32) -> JoblyResult<Job> {
        query(format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1"))
            .tag("jobs.get")
            .bind(id)
            .fetch_opt_as(conn)
            .await?
            .ok_or_else(|| JoblyError::not_found(format!("No job with id '{id}'")))
    }

    /// Jobs posted by one company, oldest first.
    pub async fn for_company(conn: &impl GenericClient, handle: &str) -> JoblyResult<Vec<Job>> {
        query(format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE company_handle = $1 ORDER BY id"
        ))
        .tag("jobs.for_company")
        .bind(handle)
        .fetch_all_as(conn)
        .await
    }

    pub async fn update(
        conn: &impl GenericClient,
        id: i32,
        fields: &UpdateFields,
    ) -> JoblyResult<Job> {
        JOB_RULES.check(fields, Mode::Update)?;
        let table = Table::Jobs;
        sql_for_partial_update(table, fields, table.key_column(), id)?
            .fetch_opt_as(conn, "jobs.update")
            .await?
            .ok_or_else(|| JoblyError::not_found(format!("No job with id '{id}' found")))
    }

    pub async fn delete(conn: &impl GenericClient, id: i32) -> JoblyResult<()> {
        query("DELETE FROM jobs WHERE id = $1 RETURNING id")
            .tag("jobs.delete")
            .bind(id)
            .fetch_opt(conn)
            .await?
            .map(|_| ())
            .ok_or_else(|| JoblyError::not_found(format!("No job with id '{id}' found")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::RecordingClient;
    use crate::value::Value;

    #[tokio::test]
    async fn search_binds_defaults() {
        let conn = RecordingClient::new();
        let jobs = Job::search(&conn, &JobSearch::default()).await.unwrap();
        assert!(jobs.is_empty());

        let seen = conn.recorded();
        assert_eq!(seen[0].tag.as_deref(), Some("jobs.search"));
        assert_eq!(
            seen[0].params,
            [
                format!("{:?}", Value::from("%%")),
                format!("{:?}", Value::Float(0.0)),
                format!("{:?}", Value::Float(0.0)),
            ]
        );
    }

    #[tokio::test]
    async fn update_is_keyed_by_id() {
        let conn = RecordingClient::new();
        let fields = UpdateFields::new().with("salary", 95_000).with("_token", "t");

        let err = Job::update(&conn, 7, &fields).await.unwrap_err();
        assert_eq!(err.to_string(), "Not found: No job with id '7' found");
        assert_eq!(
            conn.recorded()[0].sql,
            "UPDATE jobs SET salary=$1 WHERE id=$2 RETURNING *"
        );
    }

    #[tokio::test]
    async fn update_enforces_equity_range() {
        let conn = RecordingClient::new();
        let fields = UpdateFields::new().with("equity", 2.0);
        let err = Job::update(&conn, 1, &fields).await.unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(conn.recorded().is_empty());
    }

    #[test]
    fn empty_search() {
        assert!(JobSearch::default().is_empty());
        let filter = JobSearch {
            min_equity: Some(0.1),
            ..Default::default()
        };
        assert!(!filter.is_empty());
    }
}
