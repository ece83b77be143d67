//! Solver benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use linea_solver::{LinearSystem, Strength, VariableId, VariableKind};

/// A row of `count` widgets, centered in a 2000-wide parent with soft sizes.
///
/// Returns the left edge of the first widget.
fn build_row(system: &mut LinearSystem, count: usize) -> Option<VariableId> {
    let parent_left = system.create_variable(VariableKind::External, "pl");
    let parent_right = system.create_variable(VariableKind::External, "pr");
    system.add_equality_to_value(parent_left, 0.0, Strength::Fixed).unwrap();
    system.add_equality_to_value(parent_right, 2000.0, Strength::Fixed).unwrap();

    let mut previous = parent_left;
    let mut first = None;
    for i in 0..count {
        let left = system.create_variable(VariableKind::External, "l");
        let right = system.create_variable(VariableKind::External, "r");
        system.add_greater_than(left, previous, 8.0, Strength::Fixed).unwrap();
        system.add_greater_than(right, left, 10.0, Strength::Fixed).unwrap();
        let width = 40.0 + (i % 5) as f32 * 10.0;
        system.add_equality(right, left, width, Strength::Medium).unwrap();
        first.get_or_insert(left);
        previous = right;
    }
    system.add_lower_than(previous, parent_right, -8.0, Strength::Fixed).unwrap();
    if let Some(first) = first {
        system
            .add_centering(
                first,
                parent_left,
                8.0,
                0.5,
                parent_right,
                previous,
                8.0,
                Strength::Centering,
            )
            .unwrap();
    }
    first
}

fn solve_fresh(c: &mut Criterion) {
    let mut group = c.benchmark_group("solve_fresh");
    for count in [4usize, 16, 64] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| {
                let mut system = LinearSystem::new();
                build_row(&mut system, black_box(count));
                system.optimize().unwrap();
                system
            })
        });
    }
    group.finish();
}

fn solve_after_reset(c: &mut Criterion) {
    let mut system = LinearSystem::new();
    c.bench_function("solve_after_reset_16", |b| {
        b.iter(|| {
            system.reset();
            build_row(&mut system, black_box(16));
            system.optimize().unwrap();
        })
    });
}

fn nudge_first_widget(c: &mut Criterion) {
    let mut system = LinearSystem::new();
    let first = build_row(&mut system, 16).unwrap();
    system.optimize().unwrap();

    c.bench_function("nudge_first_widget_16", |b| {
        b.iter(|| {
            let id = system
                .add_equality_to_value(first, black_box(120.0), Strength::High)
                .unwrap();
            system.optimize().unwrap();
            system.remove_constraint(id).unwrap();
        })
    });
}

criterion_group!(benches, solve_fresh, solve_after_reset, nudge_first_widget);
criterion_main!(benches);
