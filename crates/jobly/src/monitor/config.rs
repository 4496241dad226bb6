use std::time::Duration;

/// Configuration for statement logging and timeouts.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Statement timeout. `None` means no timeout (default).
    pub query_timeout: Option<Duration>,
    /// Statements slower than this are logged at WARN.
    pub slow_query_threshold: Option<Duration>,
    /// Truncate logged SQL to this many bytes. `None` logs it in full.
    pub max_sql_length: Option<usize>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            query_timeout: None,
            slow_query_threshold: None,
            max_sql_length: Some(200),
        }
    }
}

impl MonitorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the statement timeout.
    ///
    /// Statements exceeding it are cancelled and return [`crate::JoblyError::Timeout`].
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = Some(timeout);
        self
    }

    pub fn with_slow_query_threshold(mut self, threshold: Duration) -> Self {
        self.slow_query_threshold = Some(threshold);
        self
    }

    pub fn with_max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Log SQL without truncation.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }
}
