use SymbTaylor::numerical::Taylor::{Direction, TaylorProblem, TaylorSolver};
use SymbTaylor::symbolic::symbolic_engine_derivatives::DerivativeTable;
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

fn bench_derivative_table(c: &mut Criterion) {
    let mut group = c.benchmark_group("derivative table");
    for order in [2, 4, 6] {
        group.bench_function(format!("x+pow(x,2), order {}", order), |b| {
            b.iter(|| DerivativeTable::from_text(black_box("x+pow(x,2)"), order))
        });
    }
    group.finish();
}

fn bench_integration(c: &mut Criterion) {
    let table = DerivativeTable::from_text("x+pow(x,2)", 4).unwrap();
    let x0 = 1f64.exp() / (16.0 - 1f64.exp());
    c.bench_function("taylor order 4, 177 steps", |b| {
        b.iter(|| {
            let mut solver = TaylorSolver::new(&table);
            solver
                .set_initial(1.0, black_box(x0), 0.01, 177, Direction::Forward)
                .unwrap();
            solver.solve().unwrap();
        })
    });
}

fn bench_problem(c: &mut Criterion) {
    let problem = TaylorProblem::new("exp(t)*x", 3, 0.0, 2.0, 0.01, "1", Direction::Backward)
        .with_exact("exp(exp(t)-exp(2))");
    c.bench_function("exp(t)*x backward, order 3", |b| {
        b.iter(|| problem.solve().unwrap())
    });
}

criterion_group!(benches, bench_derivative_table, bench_integration, bench_problem);
criterion_main!(benches);
