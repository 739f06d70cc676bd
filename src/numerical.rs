/// # Taylor-series method
/// fixed-step integrator of `x' = f(t, x)` built on a symbolic derivative table
///
/// Example#1
/// ```
/// use SymbTaylor::numerical::Taylor::{Direction, TaylorProblem};
/// // x' = x+x^2 on [1, 2.77], x(1) = e/(16-e), 4 terms of the series
/// let problem = TaylorProblem::new("x+pow(x,2)", 4, 1.0, 2.77, 0.01, "exp(1)/(16-exp(1))", Direction::Forward)
///     .with_exact("exp(t)/(16-exp(t))");
/// let (table, solution) = problem.solve().unwrap();
/// println!("{}", table);
/// println!("max error = {:?}", solution.max_error());
/// ```
pub mod Taylor;
