use ndarray::Array1;
use polars::prelude::*;
use scorecard::constraints::SolverConstraint;
use scorecard::data::parse_bin_spec;
use scorecard::design::{StepFilter, default_steps};
use scorecard::{Scorecard, Shape, Variable};

fn frame() -> DataFrame {
    df!(
        "v1" => [0.5, 1.5, 2.5, 1.0],
        "v2" => [-1.0, 1.0, 1.0, -1.0],
    )
    .unwrap()
}

#[test]
fn tie_on_first_variable_lands_on_its_first_two_columns() {
    let v1 = Variable::from_cuts("v1", &[1.0, 2.0], &[], false)
        .unwrap()
        .with_tie(0, 1)
        .unwrap();
    let v2 = Variable::from_cuts("v2", &[0.0], &[], false).unwrap();
    let sc = Scorecard::new([v1, v2]).unwrap();

    let x = sc.to_sparse(Some(&frame()), &default_steps()).unwrap();
    assert_eq!(x.ncols(), 6);
    assert_eq!(
        sc.get_constraints(&default_steps()),
        vec![SolverConstraint::PairEquality { base: 0, target: 1 }]
    );

    let beta = Array1::from(vec![0.4, 0.4, -1.0, 2.0, 3.0, 0.0]);
    for c in sc.get_constraints(&default_steps()) {
        assert_eq!(c.evaluate(&beta), 0.0);
    }
}

#[test]
fn every_constraint_index_fits_inside_the_design_matrix() {
    let spec = r#"
        [[variables]]
        name = "v1"
        cuts = [1.0, 2.0]
        missing = true
        shape = "descending"
        neutral = [3]

        [[variables]]
        name = "v2"
        step = 2
        cuts = [0.0]
        exceptions = [-1.0]
        ties = [[0, 2]]
    "#;
    let sc = Scorecard::new(parse_bin_spec(spec).unwrap()).unwrap();

    for steps in [default_steps(), StepFilter::from([1, 2]), StepFilter::from([2])] {
        let x = sc.to_sparse(Some(&frame()), &steps).unwrap();
        for c in sc.get_constraints(&steps) {
            let indices = match c {
                SolverConstraint::ZeroEquality { index } => vec![index],
                SolverConstraint::PairEquality { base, target }
                | SolverConstraint::PairInequality { base, target } => vec![base, target],
            };
            // The intercept is the last column and is never constrained.
            assert!(indices.iter().all(|&i| i + 1 < x.ncols()), "{c:?} vs {steps:?}");
        }
    }

    let both = StepFilter::from([1, 2]);
    assert_eq!(
        sc.get_constraints(&both),
        vec![
            SolverConstraint::PairInequality { base: 0, target: 1 },
            SolverConstraint::PairInequality { base: 1, target: 2 },
            SolverConstraint::ZeroEquality { index: 3 },
            SolverConstraint::PairEquality { base: 4, target: 6 },
        ]
    );
    assert_eq!(
        sc.get_constraints(&StepFilter::from([2])),
        vec![SolverConstraint::PairEquality { base: 0, target: 2 }]
    );
}

#[test]
fn shape_changes_show_up_in_the_next_compilation() {
    let v = Variable::from_cuts("v1", &[1.0, 2.0], &[], false).unwrap();
    let mut sc = Scorecard::new([v]).unwrap();
    assert!(sc.get_constraints(&default_steps()).is_empty());

    sc.variable_mut("v1").unwrap().set_shape(Shape::Ascending);
    assert_eq!(
        sc.get_constraints(&default_steps()),
        vec![
            SolverConstraint::PairInequality { base: 1, target: 0 },
            SolverConstraint::PairInequality { base: 2, target: 1 },
        ]
    );
}
