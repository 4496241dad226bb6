//! # jobly
//!
//! Data layer for a small job board: companies, the jobs they post, and the
//! users who apply.
//!
//! ## Features
//!
//! - **Partial updates**: [`sql_for_partial_update`] turns the fields present
//!   in a PATCH body into one parameterized `UPDATE ... RETURNING *`
//! - **SQL explicit**: fixed statements go through [`query()`] with
//!   pre-numbered placeholders
//! - **Type-safe mapping**: Row → Struct via the [`FromRow`] trait
//! - **Transaction-friendly**: pass a transaction anywhere a [`GenericClient`]
//!   is expected
//! - **Query monitoring**: [`InstrumentedClient`] logs, times and bounds every
//!   statement through `tracing`
//!
//! ## Partial updates
//!
//! ```ignore
//! use jobly::{Table, UpdateFields, sql_for_partial_update};
//!
//! let fields = UpdateFields::from_json(body)?; // {"first_name": "Jo", "_token": "..."}
//! let user: Option<User> = sql_for_partial_update(Table::Users, &fields, "username", "jo")?
//!     .fetch_opt_as(&client, "users.update")
//!     .await?;
//! ```
//!
//! Entity operations in [`models`] validate the body against the entity's
//! [`validate::FieldRules`] before building the statement.

pub mod auth;
pub mod changeset;
pub mod client;
pub mod config;
pub mod error;
pub mod ident;
pub mod models;
pub mod monitor;
pub mod partial_update;
pub mod prelude;
pub mod query;
pub mod row;
pub mod schema;
pub mod validate;
pub mod value;

#[cfg(feature = "pool")]
pub mod pool;

#[cfg(test)]
mod test_support;

pub use auth::{Claims, PasswordHasher, TokenSigner};
pub use changeset::{ValidationCode, ValidationError, ValidationErrors};
pub use client::GenericClient;
pub use config::{Environment, JoblyConfig};
pub use error::{JoblyError, JoblyResult};
pub use ident::{Ident, IntoIdent, Table};
pub use monitor::{InstrumentedClient, MonitorConfig, QueryContext, QueryOutcome, QueryType};
pub use partial_update::{UpdateStatement, sql_for_partial_update};
pub use query::{Query, query};
pub use row::{FromRow, RowExt};
pub use value::{UpdateFields, Value};

#[cfg(feature = "pool")]
pub use pool::{create_pool, create_pool_from_config, create_pool_with_size};

