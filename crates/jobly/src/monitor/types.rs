use std::fmt;

/// The kind of SQL statement being executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    Select,
    Insert,
    Update,
    Delete,
    /// DDL or anything else
    Other,
}

impl QueryType {
    /// Detect the statement kind from its leading keyword.
    pub fn from_sql(sql: &str) -> Self {
        let keyword = sql
            .trim_start_matches(|c: char| c.is_whitespace() || c == '(')
            .split(|c: char| !c.is_ascii_alphabetic())
            .next()
            .unwrap_or_default();

        if keyword.eq_ignore_ascii_case("SELECT") {
            QueryType::Select
        } else if keyword.eq_ignore_ascii_case("INSERT") {
            QueryType::Insert
        } else if keyword.eq_ignore_ascii_case("UPDATE") {
            QueryType::Update
        } else if keyword.eq_ignore_ascii_case("DELETE") {
            QueryType::Delete
        } else {
            QueryType::Other
        }
    }
}

/// What is known about a statement before it runs.
#[derive(Debug, Clone)]
pub struct QueryContext {
    pub sql: String,
    pub param_count: usize,
    pub query_type: QueryType,
    pub tag: Option<String>,
}

impl QueryContext {
    pub fn new(sql: &str, param_count: usize) -> Self {
        Self {
            sql: sql.to_string(),
            param_count,
            query_type: QueryType::from_sql(sql),
            tag: None,
        }
    }

    pub fn with_tag(mut self, tag: Option<&str>) -> Self {
        self.tag = tag.map(str::to_string);
        self
    }
}

/// How a statement finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    /// Rows returned
    Rows(usize),
    /// Rows affected by a mutation
    Affected(u64),
    Error(String),
}

impl fmt::Display for QueryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryOutcome::Rows(n) => write!(f, "{n} rows"),
            QueryOutcome::Affected(n) => write!(f, "{n} affected"),
            QueryOutcome::Error(e) => write!(f, "error: {e}"),
        }
    }
}
