//! Partial-update statement builder.
//!
//! Turns an ordered set of changed fields into a single
//! `UPDATE <table> SET a=$1, b=$2 WHERE <key>=$3 RETURNING *` statement.
//! Only the columns present in the request are touched.
//!
//! ```ignore
//! use jobly::{Table, UpdateFields, sql_for_partial_update};
//!
//! let fields = UpdateFields::new().with("name", "Acme").with("_token", token);
//! let stmt = sql_for_partial_update(Table::Companies, &fields, "handle", "acme")?;
//! assert_eq!(stmt.sql(), "UPDATE companies SET name=$1 WHERE handle=$2 RETURNING *");
//! ```

use crate::client::GenericClient;
use crate::error::{JoblyError, JoblyResult};
use crate::ident::{Ident, IntoIdent};
use crate::row::FromRow;
use crate::value::{UpdateFields, Value, is_reserved};
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

/// A built UPDATE statement and its positional parameters.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct UpdateStatement {
    sql: String,
    params: Vec<Value>,
}

impl UpdateStatement {
    /// The statement text. Contains identifiers and placeholders only.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Bound values: SET values in order, then the key value.
    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Parameter refs compatible with `tokio-postgres`.
    pub fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params.iter().map(|p| p as &(dyn ToSql + Sync)).collect()
    }

    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.sql, self.params)
    }

    /// Execute and return the updated row, or `None` when no row has the key.
    pub async fn fetch_opt(
        &self,
        conn: &impl GenericClient,
        tag: &str,
    ) -> JoblyResult<Option<Row>> {
        let params = self.params_ref();
        conn.query_opt_tagged(tag, &self.sql, &params).await
    }

    /// Execute and map the updated row to `T`.
    pub async fn fetch_opt_as<T: FromRow>(
        &self,
        conn: &impl GenericClient,
        tag: &str,
    ) -> JoblyResult<Option<T>> {
        let row = self.fetch_opt(conn, tag).await?;
        row.as_ref().map(T::from_row).transpose()
    }
}

/// Build a partial UPDATE for the row where `key_column = key_value`.
///
/// Fields whose name starts with `_` are transport metadata and are skipped.
/// Column names are validated as identifiers; values are never written into
/// the statement text.
///
/// # Errors
///
/// [`JoblyError::InvalidArgument`] if `table`, `key_column` or a column name is
/// not a valid identifier, if a quoted column name is reserved (`"_token"`),
/// or if no updatable field remains after filtering.
pub fn sql_for_partial_update(
    table: impl IntoIdent,
    fields: &UpdateFields,
    key_column: impl IntoIdent,
    key_value: impl Into<Value>,
) -> JoblyResult<UpdateStatement> {
    let table = table.into_ident()?;
    let key_column = key_column.into_ident()?;

    let mut set_clause = String::new();
    let mut params = Vec::with_capacity(fields.len() + 1);
    for (name, value) in fields.columns() {
        let column = Ident::parse(name)
            .map_err(|e| JoblyError::invalid_argument(format!("column {name:?}: {e}")))?;
        // A quoted key such as `"_token"` still names a reserved field.
        if column.parts().last().is_some_and(|part| is_reserved(part.name())) {
            return Err(JoblyError::invalid_argument(format!(
                "column {name:?} names a reserved field"
            )));
        }
        params.push(value.clone());
        if params.len() > 1 {
            set_clause.push_str(", ");
        }
        column.write_sql(&mut set_clause);
        set_clause.push_str(&format!("=${}", params.len()));
    }

    if params.is_empty() {
        return Err(JoblyError::invalid_argument(format!(
            "no fields to update in {table}"
        )));
    }

    params.push(key_value.into());
    let sql = format!(
        "UPDATE {table} SET {set_clause} WHERE {key_column}=${} RETURNING *",
        params.len()
    );

    Ok(UpdateStatement { sql, params })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ident::Table;

    #[test]
    fn single_field() {
        let fields = UpdateFields::new().with("first_name", "Jessica");
        let stmt = sql_for_partial_update("users", &fields, "id", 1).unwrap();
        assert_eq!(stmt.sql(), "UPDATE users SET first_name=$1 WHERE id=$2 RETURNING *");
        assert_eq!(stmt.params(), [Value::from("Jessica"), Value::Int(1)]);
    }

    #[test]
    fn accepts_table_enum() {
        let fields = UpdateFields::new().with("name", "Acme");
        let stmt =
            sql_for_partial_update(Table::Companies, &fields, Table::Companies.key_column(), "acme")
                .unwrap();
        assert_eq!(
            stmt.sql(),
            "UPDATE companies SET name=$1 WHERE handle=$2 RETURNING *"
        );
    }

    #[test]
    fn quoted_columns_are_escaped() {
        let fields = UpdateFields::new().with(r#""Odd""Name""#, true);
        let stmt = sql_for_partial_update("t", &fields, "id", 1).unwrap();
        assert_eq!(
            stmt.sql(),
            r#"UPDATE t SET "Odd""Name"=$1 WHERE id=$2 RETURNING *"#
        );
    }

    #[test]
    fn params_ref_matches_params() {
        let fields = UpdateFields::new().with("a", 1).with("b", "x");
        let stmt = sql_for_partial_update("t", &fields, "id", 9).unwrap();
        assert_eq!(stmt.params_ref().len(), 3);
        let (sql, params) = stmt.into_parts();
        assert!(sql.ends_with("WHERE id=$3 RETURNING *"));
        assert_eq!(params.last(), Some(&Value::Int(9)));
    }

    #[test]
    fn quoted_reserved_names_are_rejected() {
        for key in [r#""_token""#, r#"users."_token""#, "users._token"] {
            let fields = UpdateFields::new().with(key, "t").with("name", "x");
            let err = sql_for_partial_update("users", &fields, "id", 1).unwrap_err();
            assert!(err.is_invalid_argument(), "{key:?} was accepted");
        }
    }

    #[test]
    fn bad_identifiers_are_invalid_arguments() {
        let fields = UpdateFields::new().with("name", "x");
        assert!(sql_for_partial_update("", &fields, "id", 1).unwrap_err().is_invalid_argument());
        assert!(sql_for_partial_update("t", &fields, "", 1).unwrap_err().is_invalid_argument());
        assert!(
            sql_for_partial_update("t; DROP TABLE t", &fields, "id", 1)
                .unwrap_err()
                .is_invalid_argument()
        );
    }
}
