#![allow(non_snake_case)]
use SymbTaylor::Utils::logger::{derivative_report, init_logger, report_table};
use SymbTaylor::Utils::task_parser::TaylorTask;
use SymbTaylor::numerical::Taylor::TaylorError;
use log::info;

/// Runs the task file given as the first argument, or `x' = x+x^2` on `[1, 2.77]`
/// with Taylor order 4 when no file is given.
fn main() -> Result<(), TaylorError> {
    let task = match std::env::args().nth(1) {
        Some(path) => TaylorTask::from_file(&path)?,
        None => TaylorTask::default(),
    };
    init_logger(task.log_level, task.log_file.as_deref())?;

    let (table, solution) = task.problem.solve()?;
    println!("{}", derivative_report(&table));
    println!("{}", report_table(&solution.records, task.report_every));
    if let Some(max_error) = solution.max_error() {
        info!("max |exact - taylor| = {:e}", max_error);
    }
    if let Some(csv) = task.csv.as_deref() {
        solution.save_result(csv)?;
    }
    Ok(())
}
