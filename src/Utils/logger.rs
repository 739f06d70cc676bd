//! Logging set-up and console reports of a Taylor run.
use crate::numerical::Taylor::{TaylorError, TaylorRecord};
use crate::symbolic::symbolic_engine_derivatives::DerivativeTable;
use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, SharedLogger, TermLogger, TerminalMode, WriteLogger,
};
use std::fs::File;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Installs a terminal logger and, when `log_file` is given, a file logger next to it.
/// A second call keeps the loggers installed first.
pub fn init_logger(level: LevelFilter, log_file: Option<&str>) -> Result<(), TaylorError> {
    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();

    // Console logger
    loggers.push(TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    ));

    // File logger
    if let Some(filename) = log_file {
        let file = File::create(filename)?;
        loggers.push(WriteLogger::new(level, Config::default(), file));
    }

    let _ = CombinedLogger::init(loggers);
    Ok(())
}

#[derive(Tabled, Debug, Clone, PartialEq)]
pub struct ReportRow {
    t: String,
    #[tabled(rename = "exact")]
    exact: String,
    #[tabled(rename = "taylor")]
    taylor: String,
    #[tabled(rename = "|exact - taylor|")]
    error: String,
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| format!("{:.13}", v)).unwrap_or_else(|| "-".to_string())
}

/// every `every`-th record, `t` with 2 decimals and values with 13
pub fn report_rows(records: &[TaylorRecord], every: usize) -> Vec<ReportRow> {
    records
        .iter()
        .step_by(every.max(1))
        .map(|record| ReportRow {
            t: format!("{:.2}", record.t),
            exact: optional(record.exact),
            taylor: format!("{:.13}", record.x),
            error: optional(record.error),
        })
        .collect()
}

pub fn report_table(records: &[TaylorRecord], every: usize) -> String {
    let mut table = Table::new(report_rows(records, every));
    table.with(Style::modern_rounded());
    table.to_string()
}

#[derive(Tabled)]
struct DerivativeRow {
    derivative: String,
    expression: String,
}

/// the derivative table as a two-column console table
pub fn derivative_report(table: &DerivativeTable) -> String {
    let rows: Vec<DerivativeRow> = table.symbols()[1..]
        .iter()
        .zip(table.rendered())
        .map(|(symbol, expression)| DerivativeRow {
            derivative: symbol.to_string(),
            expression,
        })
        .collect();
    let mut report = Table::new(rows);
    report.with(Style::modern_rounded());
    report.to_string()
}
