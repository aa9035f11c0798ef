//! Data models for the personnel core.
//!
//! The `models` module defines the serialisable types shared by the
//! policy engine, the report builders and the HTTP adapter: roles and
//! principals on the access-control side, and the raw records and
//! report requests on the reporting side.  Records are read-only views
//! materialised by the persistence collaborator for a single call.

use crate::error::CoreError;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role of an authenticated user.  The set is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Full access, including system settings.
    Admin,
    /// Human resources staff: employees, payroll and leave administration.
    Hr,
    /// Team lead: approves leave and reads reports for their people.
    Manager,
    /// Regular staff member with self-service access.
    Employee,
}

impl Role {
    /// Every role, in declaration order.
    pub const ALL: [Role; 4] = [Role::Admin, Role::Hr, Role::Manager, Role::Employee];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Hr => "HR",
            Role::Manager => "MANAGER",
            Role::Employee => "EMPLOYEE",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated caller for one request.
///
/// Principals are produced by the authentication collaborator and are
/// never mutated by the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: String,
    pub email: String,
    pub role: Role,
    /// The employee record linked to this account, if any.  Admin
    /// accounts frequently have none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<String>,
}

/// One day of attendance for an employee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub employee_id: String,
    pub employee_name: String,
    pub department_id: String,
    pub department_name: String,
    pub date: NaiveDate,
    /// Local wall-clock time of the clock-in, if the employee clocked in.
    #[serde(default)]
    pub clock_in: Option<NaiveDateTime>,
    #[serde(default)]
    pub clock_out: Option<NaiveDateTime>,
}

/// Processing state of a payslip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayslipStatus {
    Draft,
    Processed,
    Paid,
}

impl fmt::Display for PayslipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PayslipStatus::Draft => "DRAFT",
            PayslipStatus::Processed => "PROCESSED",
            PayslipStatus::Paid => "PAID",
        })
    }
}

/// A payslip for one employee and one pay period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayslipRecord {
    pub employee_id: String,
    pub employee_name: String,
    pub department_id: String,
    pub department_name: String,
    /// Inclusive start of the pay period.
    pub period_start: NaiveDate,
    /// Inclusive end of the pay period.
    pub period_end: NaiveDate,
    pub base_salary: f64,
    pub overtime_pay: f64,
    pub deductions: f64,
    pub net_salary: f64,
    pub status: PayslipStatus,
}

/// Leave entitlement of one employee for one leave type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaveBalanceRecord {
    pub employee_id: String,
    pub employee_name: String,
    pub department_id: String,
    pub department_name: String,
    /// Joins the balance to [`LeaveRequestRecord::leave_type_id`].
    pub leave_type_id: String,
    pub leave_type_name: String,
    pub total_days: f64,
    pub used_days: f64,
    pub remaining_days: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

/// A leave request as filed by an employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveRequestRecord {
    pub employee_id: String,
    pub leave_type_id: String,
    pub status: LeaveStatus,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// The three exportable reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportType {
    Attendance,
    Payroll,
    Leave,
}

impl ReportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::Attendance => "attendance",
            ReportType::Payroll => "payroll",
            ReportType::Leave => "leave",
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Exact match only: the route rules guarding each report are
        // case-sensitive prefixes, so `PAYROLL` must not alias `payroll`.
        match s {
            "attendance" => Ok(ReportType::Attendance),
            "payroll" => Ok(ReportType::Payroll),
            "leave" => Ok(ReportType::Leave),
            _ => Err(CoreError::InvalidReportType(s.to_string())),
        }
    }
}

/// Parameters of a single report run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRequest {
    pub report_type: ReportType,
    #[serde(default)]
    pub department_id: Option<String>,
    #[serde(default)]
    pub date_from: Option<NaiveDate>,
    #[serde(default)]
    pub date_to: Option<NaiveDate>,
}

impl ReportRequest {
    /// An unfiltered request for the given report.
    pub fn new(report_type: ReportType) -> Self {
        Self {
            report_type,
            department_id: None,
            date_from: None,
            date_to: None,
        }
    }

    /// Builds a request from raw caller input.
    ///
    /// The report type is validated first, so an unknown type is
    /// reported even when the dates are malformed too.  Empty strings
    /// count as absent.
    pub fn parse(
        report_type: &str,
        department_id: Option<&str>,
        date_from: Option<&str>,
        date_to: Option<&str>,
    ) -> Result<Self, CoreError> {
        let report_type = report_type.parse::<ReportType>()?;
        Ok(Self {
            report_type,
            department_id: non_empty(department_id).map(str::to_string),
            date_from: non_empty(date_from).map(parse_date).transpose()?,
            date_to: non_empty(date_to).map(parse_date).transpose()?,
        })
    }

    /// The inclusive date window, present only when both bounds are set.
    pub fn date_window(&self) -> Option<(NaiveDate, NaiveDate)> {
        match (self.date_from, self.date_to) {
            (Some(from), Some(to)) => Some((from, to)),
            _ => None,
        }
    }

    pub fn matches_department(&self, department_id: &str) -> bool {
        self.department_id
            .as_deref()
            .map_or(true, |wanted| wanted == department_id)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_date(value: &str) -> Result<NaiveDate, CoreError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| CoreError::InvalidDate(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_type_parsing() {
        assert_eq!("attendance".parse::<ReportType>(), Ok(ReportType::Attendance));
        assert_eq!("payroll".parse::<ReportType>(), Ok(ReportType::Payroll));
        assert_eq!("leave".parse::<ReportType>(), Ok(ReportType::Leave));
        assert_eq!(
            "overtime".parse::<ReportType>(),
            Err(CoreError::InvalidReportType("overtime".into()))
        );
    }

    #[test]
    fn test_report_type_is_case_sensitive() {
        for name in ["PAYROLL", "Payroll", "Attendance", "LEAVE"] {
            assert_eq!(
                name.parse::<ReportType>(),
                Err(CoreError::InvalidReportType(name.into()))
            );
        }
    }

    #[test]
    fn test_request_parse_checks_type_before_dates() {
        let err = ReportRequest::parse("bonus", None, Some("not-a-date"), None).unwrap_err();
        assert_eq!(err, CoreError::InvalidReportType("bonus".into()));

        let err = ReportRequest::parse("leave", None, Some("2024/01/01"), None).unwrap_err();
        assert_eq!(err, CoreError::InvalidDate("2024/01/01".into()));
    }

    #[test]
    fn test_request_parse_treats_empty_as_absent() {
        let request =
            ReportRequest::parse("attendance", Some(""), Some("2024-03-01"), Some(" ")).unwrap();
        assert_eq!(request.department_id, None);
        assert_eq!(request.date_from, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(request.date_to, None);
        // One bound alone does not open a window.
        assert_eq!(request.date_window(), None);
        assert!(request.matches_department("anything"));
    }

    #[test]
    fn test_role_serde_names() {
        let json = serde_json::to_string(&Role::Hr).unwrap();
        assert_eq!(json, "\"HR\"");
        let role: Role = serde_json::from_str("\"MANAGER\"").unwrap();
        assert_eq!(role, Role::Manager);
    }
}
