//! Collaborator seams for authentication and persistence.
//!
//! The core never verifies credentials or queries storage.  The HTTP
//! adapter reaches both through the [`SessionResolver`] and
//! [`RecordStore`] traits.  [`JsonFixtures`] implements the two from a
//! single JSON document loaded at startup, which is enough to run the
//! service locally and to drive the router tests.

use crate::models::{Principal, ReportRequest, ReportType};
use crate::report::RecordSet;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Maps a session token to the principal that owns it.
///
/// Implementations must be thread-safe (`Send + Sync`) because the
/// dispatcher resolves sessions concurrently.
pub trait SessionResolver: Send + Sync {
    fn resolve(&self, token: &str) -> Option<Principal>;
}

/// Supplies the records a report run needs.
///
/// Implementations may push the request's filters down to storage but
/// are not required to; the report builders filter again.
pub trait RecordStore: Send + Sync {
    fn records_for(&self, request: &ReportRequest) -> Result<RecordSet>;
}

/// Sessions and records read from a JSON document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JsonFixtures {
    #[serde(default)]
    pub sessions: HashMap<String, Principal>,
    #[serde(default)]
    pub records: RecordSet,
}

impl JsonFixtures {
    pub fn from_json(data: &str) -> Result<Self> {
        serde_json::from_str(data).context("malformed fixture document")
    }

    /// Loads fixtures from `path`.  A missing file yields an empty
    /// store so the service can start without seed data.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read fixtures from {}", path.display()))?;
        Self::from_json(&data)
            .with_context(|| format!("failed to parse fixtures in {}", path.display()))
    }
}

impl SessionResolver for JsonFixtures {
    fn resolve(&self, token: &str) -> Option<Principal> {
        self.sessions.get(token).cloned()
    }
}

impl RecordStore for JsonFixtures {
    fn records_for(&self, request: &ReportRequest) -> Result<RecordSet> {
        let all = &self.records;
        let mut set = RecordSet::default();
        match request.report_type {
            ReportType::Attendance => set.attendance = all.attendance.clone(),
            ReportType::Payroll => set.payslips = all.payslips.clone(),
            ReportType::Leave => {
                set.leave_balances = all.leave_balances.clone();
                set.leave_requests = all.leave_requests.clone();
            }
        }
        Ok(set)
    }
}
