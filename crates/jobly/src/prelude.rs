//! Convenient imports for typical `jobly` usage.
//!
//! ```ignore
//! use jobly::prelude::*;
//! ```

pub use crate::models::{Company, Job, User};
pub use crate::{
    FromRow, GenericClient, JoblyError, JoblyResult, RowExt, Table, UpdateFields, Value, query,
    sql_for_partial_update,
};

#[cfg(feature = "pool")]
pub use crate::{create_pool, create_pool_from_config};
