use crate::client::GenericClient;
use crate::error::{JoblyError, JoblyResult};
use crate::ident::Table;
use crate::models::job::Job;
use crate::partial_update::sql_for_partial_update;
use crate::query::query;
use crate::row::{FromRow, RowExt};
use crate::validate::{COMPANY_RULES, Mode};
use crate::value::UpdateFields;
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;

const DEFAULT_MAX_EMPLOYEES: i32 = 10_000_000;

const COMPANY_COLUMNS: &str = "handle, name, num_employees, description, logo_url";

/// Handle and name, as listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanySummary {
    pub handle: String,
    pub name: String,
}

impl FromRow for CompanySummary {
    fn from_row(row: &Row) -> JoblyResult<Self> {
        Ok(Self {
            handle: row.try_get_column("handle")?,
            name: row.try_get_column("name")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub handle: String,
    pub name: String,
    pub num_employees: Option<i32>,
    pub description: Option<String>,
    pub logo_url: Option<String>,
}

impl FromRow for Company {
    fn from_row(row: &Row) -> JoblyResult<Self> {
        Ok(Self {
            handle: row.try_get_column("handle")?,
            name: row.try_get_column("name")?,
            num_employees: row.try_get_column("num_employees")?,
            description: row.try_get_column("description")?,
            logo_url: row.try_get_column("logo_url")?,
        })
    }
}

/// A company together with the jobs it posted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyDetail {
    #[serde(flatten)]
    pub company: Company,
    pub jobs: Vec<Job>,
}

/// Body of a create request.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCompany {
    pub handle: String,
    pub name: String,
    #[serde(default)]
    pub num_employees: Option<i32>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
}

/// Listing filters. Absent filters match everything.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompanySearch {
    pub search: Option<String>,
    pub min_employees: Option<i32>,
    pub max_employees: Option<i32>,
}

impl CompanySearch {
    /// No filter was given; callers list with [`Company::get_all`] instead.
    pub fn is_empty(&self) -> bool {
        self.search.is_none() && self.min_employees.is_none() && self.max_employees.is_none()
    }

    /// `(LIKE pattern, min, max)` with defaults applied.
    fn bounds(&self) -> JoblyResult<(String, i32, i32)> {
        let min = self.min_employees.unwrap_or(0);
        let max = self.max_employees.unwrap_or(DEFAULT_MAX_EMPLOYEES);
        if min > max {
            return Err(JoblyError::invalid_argument(
                "The minimum employees cannot be more than the maximum employees.",
            ));
        }
        let pattern = format!("%{}%", self.search.as_deref().unwrap_or(""));
        Ok((pattern, min, max))
    }
}

impl Company {
    pub async fn get_all(conn: &impl GenericClient) -> JoblyResult<Vec<CompanySummary>> {
        query("SELECT handle, name FROM companies ORDER BY handle")
            .tag("companies.get_all")
            .fetch_all_as(conn)
            .await
    }

    /// Companies whose name contains `search` and whose head count lies
    /// strictly between the bounds. An empty result is an empty `Vec`.
    pub async fn search(
        conn: &impl GenericClient,
        filter: &CompanySearch,
    ) -> JoblyResult<Vec<CompanySummary>> {
        let (pattern, min, max) = filter.bounds()?;
        query(
            "SELECT handle, name FROM companies \
             WHERE name LIKE $1 AND num_employees > $2 AND num_employees < $3 \
             ORDER BY handle",
        )
        .tag("companies.search")
        .bind(pattern)
        .bind(min)
        .bind(max)
        .fetch_all_as(conn)
        .await
    }

    pub async fn create(conn: &impl GenericClient, new: &NewCompany) -> JoblyResult<Company> {
        query(format!(
            "INSERT INTO companies ({COMPANY_COLUMNS}) VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COMPANY_COLUMNS}"
        ))
        .tag("companies.create")
        .bind(new.handle.as_str())
        .bind(new.name.as_str())
        .bind(new.num_employees)
        .bind(new.description.as_deref())
        .bind(new.logo_url.as_deref())
        .fetch_one_as(conn)
        .await
    }

    pub async fn get(conn: &impl GenericClient, handle: &str) -> JoblyResult<CompanyDetail> {
        let company: Company = query(format!(
            "SELECT {COMPANY_COLUMNS} FROM companies WHERE handle = $1"
        ))
        .tag("companies.get")
        .bind(handle)
        .fetch_opt_as(conn)
        .await?
        .ok_or_else(|| JoblyError::not_found(format!("No company with handle '{handle}'")))?;

        let jobs = Job::for_company(conn, handle).await?;
        Ok(CompanyDetail { company, jobs })
    }

    /// Patch the columns present in `fields`.
    pub async fn update(
        conn: &impl GenericClient,
        handle: &str,
        fields: &UpdateFields,
    ) -> JoblyResult<Company> {
        COMPANY_RULES.check(fields, Mode::Update)?;
        let table = Table::Companies;
        sql_for_partial_update(table, fields, table.key_column(), handle)?
            .fetch_opt_as(conn, "companies.update")
            .await?
            .ok_or_else(|| JoblyError::not_found(format!("No company with handle '{handle}' found")))
    }

    /// Delete a company and, by cascade, its jobs.
    pub async fn delete(conn: &impl GenericClient, handle: &str) -> JoblyResult<()> {
        query("DELETE FROM companies WHERE handle = $1 RETURNING handle")
            .tag("companies.delete")
            .bind(handle)
            .fetch_opt(conn)
            .await?
            .map(|_| ())
            .ok_or_else(|| JoblyError::not_found(format!("No company with handle '{handle}' found")))
    }
}
