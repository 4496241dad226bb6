//! Statement logging, slow-query warnings and timeouts.
//!
//! Wrap any [`GenericClient`](crate::GenericClient) in an [`InstrumentedClient`] to get one
//! `tracing` event per statement on the `jobly.sql` target:
//!
//! ```rust,ignore
//! use jobly::monitor::{InstrumentedClient, MonitorConfig};
//! use std::time::Duration;
//!
//! let config = MonitorConfig::new()
//!     .with_query_timeout(Duration::from_secs(30))
//!     .with_slow_query_threshold(Duration::from_millis(500));
//!
//! let conn = InstrumentedClient::new(pool.get().await?).with_config(config);
//! let company = jobly::models::Company::get(&conn, "acme").await?;
//! ```

mod config;
mod instrumented;
mod types;


pub use config::MonitorConfig;
pub use instrumented::InstrumentedClient;
pub use types::{QueryContext, QueryOutcome, QueryType};

pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}
