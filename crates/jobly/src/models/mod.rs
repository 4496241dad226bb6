//! Row types and database operations for companies, jobs and users.
//!
//! Every operation takes `&impl GenericClient`, so callers choose whether it
//! runs on a pooled connection, inside a transaction, or through an
//! [`InstrumentedClient`](crate::monitor::InstrumentedClient).

pub mod company;
pub mod job;
pub mod user;

pub use company::{Company, CompanyDetail, CompanySearch, CompanySummary, NewCompany};
pub use job::{Job, JobSearch, JobSummary, NewJob};
pub use user::{NewUser, User, UserSummary};
