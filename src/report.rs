//! User-visible status messages
//!
//! The queue reports progress the way an operator in the host UI would: short
//! info lines at batch start, per scene, and at the end, plus warnings. Every
//! report is mirrored to the `log` facade.

use std::sync::Mutex;

/// Severity of a user-visible report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportLevel {
    Info,
    Warning,
}

/// A single user-visible message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub level: ReportLevel,
    pub message: String,
}

/// Destination for user-visible messages
pub trait ReportSink: Send + Sync {
    fn report(&self, level: ReportLevel, message: &str);

    fn info(&self, message: &str) {
        self.report(ReportLevel::Info, message);
    }

    fn warning(&self, message: &str) {
        self.report(ReportLevel::Warning, message);
    }
}

/// Sends reports to the `log` facade only
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl ReportSink for LogReporter {
    fn report(&self, level: ReportLevel, message: &str) {
        match level {
            ReportLevel::Info => log::info!("{}", message),
            ReportLevel::Warning => log::warn!("{}", message),
        }
    }
}

/// Keeps every report in memory (and logs it); used by tests and the CLI
#[derive(Debug, Default)]
pub struct CollectingReporter {
    reports: Mutex<Vec<Report>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything reported so far
    pub fn reports(&self) -> Vec<Report> {
        match self.reports.lock() {
            Ok(reports) => reports.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Messages only, in order
    pub fn messages(&self) -> Vec<String> {
        self.reports().into_iter().map(|r| r.message).collect()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.reports()
            .into_iter()
            .filter(|r| r.level == ReportLevel::Warning)
            .map(|r| r.message)
            .collect()
    }
}

impl ReportSink for CollectingReporter {
    fn report(&self, level: ReportLevel, message: &str) {
        LogReporter.report(level, message);
        if let Ok(mut reports) = self.reports.lock() {
            reports.push(Report {
                level,
                message: message.to_string(),
            });
        }
    }
}
