//! Property tests for the solver
//!
//! Widgets are laid out inside a parent of fixed width. Each widget has a
//! hard width and a soft target position; the properties check hard-row
//! satisfaction, exact optima where they are unique, reproducibility, and
//! that removals and rejected insertions leave the solution unchanged.

use linea_solver::{LinearSystem, Relation, Strength, VariableId, VariableKind};
use proptest::prelude::*;

const PARENT: f32 = 200.0;
const TOLERANCE: f32 = 1e-2;

#[derive(Debug, Clone, Copy)]
struct WidgetSpec {
    target: f32,
    width: f32,
}

#[derive(Debug, Clone, Copy)]
struct Widget {
    left: VariableId,
    right: VariableId,
}

fn arb_widgets() -> impl Strategy<Value = Vec<WidgetSpec>> {
    prop::collection::vec(
        (-50.0f32..250.0, 1.0f32..40.0).prop_map(|(target, width)| WidgetSpec { target, width }),
        1..8,
    )
}

/// Independent widgets, each kept inside the parent.
fn independent(system: &mut LinearSystem, specs: &[WidgetSpec]) -> Vec<Widget> {
    specs
        .iter()
        .map(|spec| {
            let left = system.create_variable(VariableKind::External, "l");
            let right = system.create_variable(VariableKind::External, "r");
            system.add_equality(right, left, spec.width, Strength::Fixed).unwrap();
            system.add_constraint(system.create_row().with_term(left, 1.0), Relation::Ge).unwrap();
            system
                .add_constraint(
                    system.create_row().with_term(right, 1.0).with_constant(-PARENT),
                    Relation::Le,
                )
                .unwrap();
            system
                .add_equality_to_value(left, spec.target, Strength::Medium)
                .unwrap();
            Widget { left, right }
        })
        .collect()
}

/// Widgets packed left to right, each at least `gap` after the previous one.
fn chained(system: &mut LinearSystem, specs: &[WidgetSpec], gap: f32) -> Vec<Widget> {
    let start = system.create_variable(VariableKind::External, "parent");
    system.add_equality_to_value(start, 0.0, Strength::Fixed).unwrap();

    let mut previous = start;
    let mut widgets = Vec::with_capacity(specs.len());
    for spec in specs {
        let left = system.create_variable(VariableKind::External, "l");
        let right = system.create_variable(VariableKind::External, "r");
        system.add_equality(right, left, spec.width, Strength::Fixed).unwrap();
        system.add_greater_than(left, previous, gap, Strength::Fixed).unwrap();
        system
            .add_equality_to_value(left, spec.target, Strength::Low)
            .unwrap();
        previous = right;
        widgets.push(Widget { left, right });
    }
    widgets
}

fn expected_left(spec: &WidgetSpec) -> f32 {
    spec.target.clamp(0.0, PARENT - spec.width)
}

fn values(system: &LinearSystem, widgets: &[Widget]) -> Vec<(f32, f32)> {
    widgets
        .iter()
        .map(|w| (system.value_of(w.left), system.value_of(w.right)))
        .collect()
}

fn assert_close(actual: &[(f32, f32)], expected: &[(f32, f32)]) -> Result<(), TestCaseError> {
    prop_assert_eq!(actual.len(), expected.len());
    for (a, e) in actual.iter().zip(expected) {
        prop_assert!((a.0 - e.0).abs() < TOLERANCE, "{:?} vs {:?}", actual, expected);
        prop_assert!((a.1 - e.1).abs() < TOLERANCE, "{:?} vs {:?}", actual, expected);
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Every independent widget lands on its target clamped into the parent.
    #[test]
    fn independent_widgets_reach_clamped_targets(specs in arb_widgets()) {
        let mut system = LinearSystem::new();
        let widgets = independent(&mut system, &specs);
        system.optimize().unwrap();

        for (widget, spec) in widgets.iter().zip(&specs) {
            let left = system.value_of(widget.left);
            let right = system.value_of(widget.right);
            prop_assert!((left - expected_left(spec)).abs() < TOLERANCE);
            prop_assert!((right - left - spec.width).abs() < TOLERANCE);
        }
    }

    /// Hard rows hold whatever the soft targets ask for.
    #[test]
    fn chained_widgets_respect_hard_rows(specs in arb_widgets(), gap in 0.0f32..20.0) {
        let mut system = LinearSystem::new();
        let widgets = chained(&mut system, &specs, gap);
        system.optimize().unwrap();

        let mut previous = 0.0f32;
        for (widget, spec) in widgets.iter().zip(&specs) {
            let left = system.value_of(widget.left);
            let right = system.value_of(widget.right);
            prop_assert!(left >= previous + gap - TOLERANCE);
            prop_assert!((right - left - spec.width).abs() < TOLERANCE);
            previous = right;
        }
    }

    /// The same calls produce bit-identical results.
    #[test]
    fn solving_is_deterministic(specs in arb_widgets(), gap in 0.0f32..20.0) {
        let mut first = LinearSystem::new();
        let a = chained(&mut first, &specs, gap);
        first.optimize().unwrap();

        let mut second = LinearSystem::new();
        let b = chained(&mut second, &specs, gap);
        second.optimize().unwrap();

        prop_assert_eq!(values(&first, &a), values(&second, &b));
        prop_assert_eq!(first.to_string(), second.to_string());
        prop_assert_eq!(first.metrics(), second.metrics());
    }

    /// Rebuilding after a reset reuses the same ids, pool slots, and values.
    #[test]
    fn reset_then_rebuild_is_stable(specs in arb_widgets(), gap in 0.0f32..20.0) {
        let mut system = LinearSystem::new();
        let first = chained(&mut system, &specs, gap);
        system.optimize().unwrap();
        let before = values(&system, &first);
        let stats = system.pool_stats();

        system.reset();
        let second = chained(&mut system, &specs, gap);
        system.optimize().unwrap();

        prop_assert_eq!(
            first.iter().map(|w| (w.left, w.right)).collect::<Vec<_>>(),
            second.iter().map(|w| (w.left, w.right)).collect::<Vec<_>>()
        );
        prop_assert_eq!(values(&system, &second), before);
        prop_assert_eq!(system.pool_stats(), stats);
    }

    /// Removing stronger overrides brings back the original solution.
    #[test]
    fn removing_overrides_restores_solution(
        specs in arb_widgets(),
        overrides in prop::collection::vec(-50.0f32..250.0, 8),
    ) {
        let mut system = LinearSystem::new();
        let widgets = independent(&mut system, &specs);
        system.optimize().unwrap();
        let before = values(&system, &widgets);

        let ids: Vec<_> = widgets
            .iter()
            .zip(&overrides)
            .map(|(widget, target)| {
                system.add_equality_to_value(widget.left, *target, Strength::High).unwrap()
            })
            .collect();
        system.optimize().unwrap();
        for id in ids {
            system.remove_constraint(id).unwrap();
        }
        system.optimize().unwrap();

        assert_close(&values(&system, &widgets), &before)?;
    }

    /// A rejected hard row leaves the solution untouched.
    #[test]
    fn rejected_insertion_changes_nothing(specs in arb_widgets(), pick in any::<prop::sample::Index>()) {
        let mut system = LinearSystem::new();
        let widgets = independent(&mut system, &specs);
        system.optimize().unwrap();
        let before = values(&system, &widgets);
        let stats = system.pool_stats();

        let widget = widgets[pick.index(widgets.len())];
        let err = system
            .add_equality_to_value(widget.right, PARENT + 10.0, Strength::Fixed)
            .unwrap_err();
        prop_assert!(err.is_infeasible());
        prop_assert_eq!(system.pool_stats().variables_live, stats.variables_live);
        prop_assert_eq!(system.pool_stats().rows_live, stats.rows_live);

        system.optimize().unwrap();
        assert_close(&values(&system, &widgets), &before)?;
    }
}
