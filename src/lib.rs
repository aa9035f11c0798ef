//! Personnel core library crate.
//!
//! This crate holds the access-control and report-aggregation logic of
//! a personnel-management application.  The [`policy`] and [`catalog`]
//! modules decide who may do what; the [`report`] module turns raw
//! attendance, payroll and leave records into CSV tables.  The [`api`]
//! module wires both behind an HTTP router, reaching sessions and
//! records through the traits in [`store`].

pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod models;
pub mod policy;
pub mod report;
pub mod store;

pub use catalog::{Capability, PermissionCatalog};
pub use error::CoreError;
pub use models::{Principal, ReportRequest, ReportType, Role};
pub use policy::{Decision, PolicyEngine, PolicyTable, RouteRule};
pub use report::{DelimitedTable, RecordSet};
