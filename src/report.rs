//! Report aggregation.
//!
//! The `report` module turns raw record sequences into a
//! [`DelimitedTable`].  Builders are pure: they never look at the
//! caller's role, never perform I/O and produce identical output for
//! identical input.  Department and date filtering is re-applied here
//! even if the persistence layer already pushed it down.
//!
//! The leave builder counts pending requests per balance row with
//! [`rayon`]; `collect` keeps the rows in input order.

use crate::models::{
    AttendanceRecord, LeaveBalanceRecord, LeaveRequestRecord, LeaveStatus, PayslipRecord,
    ReportRequest, ReportType,
};
use chrono::{NaiveDate, Timelike};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Content type of exported reports.
pub const CSV_CONTENT_TYPE: &str = "text/csv";

/// Clock-ins at or after this local hour count as late.
pub const LATE_HOUR: u32 = 9;

const ATTENDANCE_HEADERS: [&str; 7] = [
    "Employee Name",
    "Department",
    "Total Days",
    "Present Days",
    "Late Days",
    "Absent Days",
    "Attendance Rate (%)",
];

const PAYROLL_HEADERS: [&str; 8] = [
    "Employee Name",
    "Department",
    "Period",
    "Base Salary",
    "Overtime",
    "Deductions",
    "Net Salary",
    "Status",
];

const LEAVE_HEADERS: [&str; 7] = [
    "Employee Name",
    "Department",
    "Leave Type",
    "Total Days",
    "Used Days",
    "Remaining Days",
    "Pending Requests",
];

/// Header row plus data rows, ready for delimited export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelimitedTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl DelimitedTable {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn with_rows(headers: &[&str], rows: Vec<Vec<String>>) -> Self {
        let mut table = Self::new(headers);
        table.rows = rows;
        table
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of data rows, excluding the header.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Renders the table as comma-separated text.
    ///
    /// Lines are joined with `\n` and the output has no trailing
    /// newline.  Fields containing a comma, a double quote or a line
    /// break are quoted with inner quotes doubled.
    pub fn to_csv(&self) -> String {
        std::iter::once(&self.headers)
            .chain(self.rows.iter())
            .map(|line| line.iter().map(|field| escape_field(field)).collect::<Vec<_>>().join(","))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Suggested download name, e.g. `payroll_report_2024-05-31.csv`.
pub fn export_filename(report_type: ReportType, date: NaiveDate) -> String {
    format!("{}_report_{}.csv", report_type, date.format("%Y-%m-%d"))
}

/// Records materialised by the persistence collaborator for one call.
/// Each builder only reads the sequences relevant to its report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordSet {
    #[serde(default)]
    pub attendance: Vec<AttendanceRecord>,
    #[serde(default)]
    pub payslips: Vec<PayslipRecord>,
    #[serde(default)]
    pub leave_balances: Vec<LeaveBalanceRecord>,
    #[serde(default)]
    pub leave_requests: Vec<LeaveRequestRecord>,
}

/// Attendance summary for one employee in one report run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeAttendanceStat {
    pub employee_id: String,
    pub employee_name: String,
    pub department_name: String,
    pub total_days: u32,
    pub present_days: u32,
    pub late_days: u32,
    pub absent_days: u32,
    pub attendance_rate_percent: f64,
}

impl EmployeeAttendanceStat {
    fn start(record: &AttendanceRecord) -> Self {
        Self {
            employee_id: record.employee_id.clone(),
            employee_name: record.employee_name.clone(),
            department_name: record.department_name.clone(),
            total_days: 0,
            present_days: 0,
            late_days: 0,
            absent_days: 0,
            attendance_rate_percent: 0.0,
        }
    }

    fn add(&mut self, record: &AttendanceRecord) {
        self.total_days += 1;
        if let (Some(clock_in), Some(_)) = (record.clock_in, record.clock_out) {
            self.present_days += 1;
            if clock_in.hour() >= LATE_HOUR {
                self.late_days += 1;
            }
        }
    }

    fn finish(&mut self) {
        self.absent_days = self.total_days - self.present_days;
        self.attendance_rate_percent = if self.total_days > 0 {
            let rate = f64::from(self.present_days) / f64::from(self.total_days) * 100.0;
            (rate * 10.0).round() / 10.0
        } else {
            0.0
        };
    }

    /// The rate with one decimal, or a bare `0` for an employee with no
    /// days in the window.
    pub fn rate_label(&self) -> String {
        if self.total_days > 0 {
            format!("{:.1}", self.attendance_rate_percent)
        } else {
            "0".to_string()
        }
    }

    fn to_row(&self) -> Vec<String> {
        vec![
            self.employee_name.clone(),
            self.department_name.clone(),
            self.total_days.to_string(),
            self.present_days.to_string(),
            self.late_days.to_string(),
            self.absent_days.to_string(),
            self.rate_label(),
        ]
    }
}

fn within(window: Option<(NaiveDate, NaiveDate)>, start: NaiveDate, end: NaiveDate) -> bool {
    window.map_or(true, |(from, to)| start >= from && end <= to)
}

/// Builds the report named by `request.report_type` from `records`.
pub fn build(request: &ReportRequest, records: &RecordSet) -> DelimitedTable {
    match request.report_type {
        ReportType::Attendance => attendance_report(request, &records.attendance),
        ReportType::Payroll => payroll_report(request, &records.payslips),
        ReportType::Leave => {
            leave_report(request, &records.leave_balances, &records.leave_requests)
        }
    }
}

/// Per-employee attendance statistics, in first-seen employee order.
pub fn attendance_stats(
    request: &ReportRequest,
    records: &[AttendanceRecord],
) -> Vec<EmployeeAttendanceStat> {
    let window = request.date_window();
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut stats: Vec<EmployeeAttendanceStat> = Vec::new();

    for record in records
        .iter()
        .filter(|r| request.matches_department(&r.department_id))
        .filter(|r| within(window, r.date, r.date))
    {
        let slot = *index.entry(record.employee_id.as_str()).or_insert_with(|| {
            stats.push(EmployeeAttendanceStat::start(record));
            stats.len() - 1
        });
        stats[slot].add(record);
    }

    stats.iter_mut().for_each(EmployeeAttendanceStat::finish);
    stats
}

pub fn attendance_report(request: &ReportRequest, records: &[AttendanceRecord]) -> DelimitedTable {
    let rows = attendance_stats(request, records)
        .iter()
        .map(EmployeeAttendanceStat::to_row)
        .collect();
    DelimitedTable::with_rows(&ATTENDANCE_HEADERS, rows)
}

/// One row per payslip, in input order.
pub fn payroll_report(request: &ReportRequest, records: &[PayslipRecord]) -> DelimitedTable {
    let window = request.date_window();
    let rows = records
        .iter()
        .filter(|p| request.matches_department(&p.department_id))
        .filter(|p| within(window, p.period_start, p.period_end))
        .map(|p| {
            vec![
                p.employee_name.clone(),
                p.department_name.clone(),
                format!("{} to {}", p.period_start, p.period_end),
                p.base_salary.to_string(),
                p.overtime_pay.to_string(),
                p.deductions.to_string(),
                p.net_salary.to_string(),
                p.status.to_string(),
            ]
        })
        .collect();
    DelimitedTable::with_rows(&PAYROLL_HEADERS, rows)
}

/// One row per leave balance, annotated with the number of pending
/// requests for the same employee and leave type.
pub fn leave_report(
    request: &ReportRequest,
    balances: &[LeaveBalanceRecord],
    requests: &[LeaveRequestRecord],
) -> DelimitedTable {
    let window = request.date_window();
    let pending: Vec<&LeaveRequestRecord> = requests
        .iter()
        .filter(|r| r.status == LeaveStatus::Pending)
        .filter(|r| within(window, r.start_date, r.end_date))
        .collect();

    let rows = balances
        .par_iter()
        .filter(|b| request.matches_department(&b.department_id))
        .map(|b| {
            let pending_requests = pending
                .iter()
                .filter(|r| r.employee_id == b.employee_id && r.leave_type_id == b.leave_type_id)
                .count();
            vec![
                b.employee_name.clone(),
                b.department_name.clone(),
                b.leave_type_name.clone(),
                b.total_days.to_string(),
                b.used_days.to_string(),
                b.remaining_days.to_string(),
                pending_requests.to_string(),
            ]
        })
        .collect();
    DelimitedTable::with_rows(&LEAVE_HEADERS, rows)
}
