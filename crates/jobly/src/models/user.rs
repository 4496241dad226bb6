use crate::auth::{Claims, PasswordHasher};
use crate::client::GenericClient;
use crate::error::{JoblyError, JoblyResult};
use crate::ident::Table;
use crate::partial_update::sql_for_partial_update;
use crate::query::query;
use crate::row::{FromRow, RowExt};
use crate::validate::{Mode, USER_RULES};
use crate::value::{UpdateFields, Value};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use tokio_postgres::Row;

const USER_COLUMNS: &str = "username, first_name, last_name, email, photo_url, is_admin";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl FromRow for UserSummary {
    fn from_row(row: &Row) -> JoblyResult<Self> {
        Ok(Self {
            username: row.try_get_column("username")?,
            first_name: row.try_get_column("first_name")?,
            last_name: row.try_get_column("last_name")?,
            email: row.try_get_column("email")?,
        })
    }
}

/// A user as returned to callers. The password hash is never read into it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub photo_url: Option<String>,
    pub is_admin: bool,
}

impl FromRow for User {
    fn from_row(row: &Row) -> JoblyResult<Self> {
        Ok(Self {
            username: row.try_get_column("username")?,
            first_name: row.try_get_column("first_name")?,
            last_name: row.try_get_column("last_name")?,
            email: row.try_get_column("email")?,
            photo_url: row.try_get_column("photo_url")?,
            is_admin: row.try_get_column("is_admin")?,
        })
    }
}

/// Registration body. New users are never admins.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub photo_url: Option<String>,
}

impl User {
    pub async fn get_all(conn: &impl GenericClient) -> JoblyResult<Vec<UserSummary>> {
        query("SELECT username, first_name, last_name, email FROM users ORDER BY username")
            .tag("users.get_all")
            .fetch_all_as(conn)
            .await
    }

    pub async fn get(conn: &impl GenericClient, username: &str) -> JoblyResult<User> {
        query(format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1"))
            .tag("users.get")
            .bind(username)
            .fetch_opt_as(conn)
            .await?
            .ok_or_else(|| JoblyError::not_found(format!("No user with username '{username}'")))
    }

    pub async fn create(
        conn: &impl GenericClient,
        new: &NewUser,
        hasher: &impl PasswordHasher,
    ) -> JoblyResult<User> {
        let hashed = hasher.hash(&new.password)?;
        query(format!(
            "INSERT INTO users (username, password, first_name, last_name, email, photo_url) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {USER_COLUMNS}"
        ))
        .tag("users.create")
        .bind(new.username.as_str())
        .bind(hashed)
        .bind(new.first_name.as_str())
        .bind(new.last_name.as_str())
        .bind(new.email.as_str())
        .bind(new.photo_url.as_deref())
        .fetch_one_as(conn)
        .await
    }

    /// Check a password. `None` when the user does not exist or the password
    /// does not match; the two cases are indistinguishable to the caller.
    pub async fn authenticate(
        conn: &impl GenericClient,
        username: &str,
        password: &str,
        hasher: &impl PasswordHasher,
    ) -> JoblyResult<Option<Claims>> {
        let Some(row) = query("SELECT password, is_admin FROM users WHERE username = $1")
            .tag("users.authenticate")
            .bind(username)
            .fetch_opt(conn)
            .await?
        else {
            return Ok(None);
        };

        let hash: String = row.try_get_column("password")?;
        if !hasher.verify(password, &hash)? {
            return Ok(None);
        }
        Ok(Some(Claims {
            username: username.to_string(),
            is_admin: row.try_get_column("is_admin")?,
        }))
    }

    /// Patch the columns present in `fields`. A new `password` is hashed
    /// before it reaches the statement.
    pub async fn update(
        conn: &impl GenericClient,
        username: &str,
        fields: &UpdateFields,
        hasher: &impl PasswordHasher,
    ) -> JoblyResult<User> {
        USER_RULES.check(fields, Mode::Update)?;

        let fields = match fields.get("password") {
            Some(Value::Text(password)) => {
                let hashed = hasher.hash(password)?;
                let mut owned = fields.clone();
                owned.insert("password", hashed);
                Cow::Owned(owned)
            }
            _ => Cow::Borrowed(fields),
        };

        let table = Table::Users;
        sql_for_partial_update(table, fields.as_ref(), table.key_column(), username)?
            .fetch_opt_as(conn, "users.update")
            .await?
            .ok_or_else(|| {
                JoblyError::not_found(format!("No user with username '{username}' found"))
            })
    }

    pub async fn delete(conn: &impl GenericClient, username: &str) -> JoblyResult<()> {
        query("DELETE FROM users WHERE username = $1 RETURNING username")
            .tag("users.delete")
            .bind(username)
            .fetch_opt(conn)
            .await?
            .map(|_| ())
            .ok_or_else(|| {
                JoblyError::not_found(format!("No user with username '{username}' found"))
            })
    }
}
