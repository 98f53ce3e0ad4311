use lpkit_model::{
    Axis, BoundSpec, BoundType, Direction, LpProblem, ModelError, ProblemModel, Solution,
    SolveFailure, SolvingEngine,
};

/// Engine that records what it was asked and answers with a canned solution
#[derive(Debug, Default)]
struct RecordingEngine {
    solves: usize,
    discards: usize,
    last_problem: Option<LpProblem>,
    answer: Option<Solution>,
}

impl SolvingEngine for RecordingEngine {
    fn solve(&mut self, problem: &LpProblem) -> Solution {
        self.solves += 1;
        self.last_problem = Some(problem.clone());
        self.answer.clone().unwrap_or_else(|| {
            let values = vec![0.0; problem.num_columns()];
            Solution::optimal(problem.shift, values, vec![0.0; problem.num_rows()])
        })
    }

    fn discard_factorization(&mut self) {
        self.discards += 1;
    }
}

#[test]
fn test_box_bounded_maximization_without_rows() {
    let mut model = ProblemModel::create(None, Direction::Maximize).unwrap();
    model.add_columns(2);
    model.set_column_bound(1, BoundType::Double, 0.0, 10.0).unwrap();
    model.set_column_bound(2, BoundType::Double, 0.0, 10.0).unwrap();
    model.set_coefficient(1, 1.0).unwrap();
    model.set_coefficient(2, 1.0).unwrap();

    model.solve().unwrap();

    let obj = model.objective_value().unwrap();
    assert!((obj - 20.0).abs() < 1e-6, "obj = {} (expected 20)", obj);
    assert!((model.primal_value(1).unwrap() - 10.0).abs() < 1e-6);
    assert!((model.primal_value(2).unwrap() - 10.0).abs() < 1e-6);
}

#[test]
fn test_fixed_column_under_upper_row() {
    let mut model = ProblemModel::new();
    model.add_rows(1);
    model.add_columns(1);
    model.set_row_bound(1, BoundType::UpperOnly, 0.0, 10.0).unwrap();
    model.set_column_bound(1, BoundType::Fixed, 5.0, 0.0).unwrap();
    model.load_matrix_by_row(&[[1.0]]).unwrap();
    model.set_coefficient(1, 0.0).unwrap();

    model.solve().unwrap();

    assert!(model.objective_value().unwrap().abs() < 1e-9);
    assert!((model.primal_value(1).unwrap() - 5.0).abs() < 1e-9);
    assert!((model.row_primal_value(1).unwrap() - 5.0).abs() < 1e-9);
}

#[test]
fn test_matrix_taller_than_problem_is_rejected() {
    let mut model = ProblemModel::new();
    model.add_rows(1);
    model.add_columns(2);
    model.load_matrix_by_row(&[[1.0, 2.0]]).unwrap();

    let err = model.load_matrix_by_row(&[[7.0, 7.0], [8.0, 8.0]]).unwrap_err();

    assert_eq!(err, ModelError::DimensionMismatch { axis: Axis::Row, supplied: 2, available: 1 });
    assert_eq!(model.matrix_coefficient(1, 1).unwrap(), 1.0);
    assert_eq!(model.matrix_coefficient(1, 2).unwrap(), 2.0);
}

#[test]
fn test_inverted_double_bound_is_rejected() {
    let mut model = ProblemModel::new();
    model.add_columns(1);

    let err = model.set_column_bound(1, BoundType::Double, 5.0, 2.0).unwrap_err();

    assert_eq!(err, ModelError::InvalidBound { lower: 5.0, upper: 2.0 });
    assert_eq!(model.column_bound(1).unwrap(), BoundSpec::Fixed(0.0));
}

#[test]
fn test_shift_moves_objective_by_exactly_its_value() {
    let build = |shift: f64| {
        let mut model = ProblemModel::new();
        model.add_row_with_bound(Some("demand"), BoundType::LowerOnly, 6.0, 0.0).unwrap();
        model.add_column_with_bound(Some("a"), BoundType::LowerOnly, 0.0, 0.0, 2.0).unwrap();
        model.add_column_with_bound(Some("b"), BoundType::LowerOnly, 0.0, 0.0, 3.0).unwrap();
        model.load_matrix_by_row(&[[1.0, 2.0]]).unwrap();
        model.set_coefficient(0, shift).unwrap();
        model.solve().unwrap();
        model.objective_value().unwrap()
    };

    let base = build(0.0);
    let shifted = build(7.25);
    assert!((base - 9.0).abs() < 1e-6, "base = {} (expected 9)", base);
    assert!((shifted - base - 7.25).abs() < 1e-9, "shifted = {}, base = {}", shifted, base);
}

#[test]
fn test_each_mutation_after_solve_requires_resolve() {
    type Mutation = fn(&mut ProblemModel);
    let mutations: [(&str, Mutation); 9] = [
        ("add_rows", |m: &mut ProblemModel| {
            m.add_rows(1);
        }),
        ("add_columns", |m: &mut ProblemModel| {
            m.add_columns(1);
        }),
        ("set_row_bound", |m: &mut ProblemModel| {
            m.set_row_bound(1, BoundType::UpperOnly, 0.0, 8.0).unwrap()
        }),
        ("set_column_bound", |m: &mut ProblemModel| {
            m.set_column_bound(1, BoundType::Double, 0.0, 3.0).unwrap()
        }),
        ("set_coefficient", |m: &mut ProblemModel| m.set_coefficient(1, 2.0).unwrap()),
        ("set_shift", |m: &mut ProblemModel| m.set_coefficient(0, 1.0).unwrap()),
        ("load_matrix_by_row", |m: &mut ProblemModel| m.load_matrix_by_row(&[[2.0]]).unwrap()),
        ("set_matrix_coefficient", |m: &mut ProblemModel| {
            m.set_matrix_coefficient(1, 1, 3.0).unwrap()
        }),
        ("reset", |m: &mut ProblemModel| m.reset()),
    ];

    for (label, mutate) in mutations {
        let mut model = ProblemModel::create(None, Direction::Maximize).unwrap();
        model.add_row_with_bound(None, BoundType::UpperOnly, 0.0, 4.0).unwrap();
        model.add_column_with_bound(Some("x"), BoundType::LowerOnly, 0.0, 0.0, 1.0).unwrap();
        model.load_matrix_by_row(&[[1.0]]).unwrap();
        model.solve().unwrap();
        assert!(model.objective_value().is_ok(), "{label}: solved model should report");

        mutate(&mut model);

        assert_eq!(model.objective_value(), Err(ModelError::NoSolution), "{label}");
        assert_eq!(model.primal_value_by_name("x"), Err(ModelError::NoSolution), "{label}");
    }
}

#[test]
fn test_infeasible_problem_surfaces_failure() {
    let mut model = ProblemModel::new();
    model.add_row_with_bound(Some("too_much"), BoundType::LowerOnly, 10.0, 0.0).unwrap();
    model.add_column_with_bound(Some("x"), BoundType::Double, 0.0, 3.0, 1.0).unwrap();
    model.load_matrix_by_row(&[[1.0]]).unwrap();

    assert_eq!(model.solve(), Err(ModelError::SolveFailure(SolveFailure::Infeasible)));
    assert_eq!(model.objective_value(), Err(ModelError::NoSolution));
}

#[test]
fn test_adding_rows_discards_engine_factorization() {
    let mut model = ProblemModel::with_engine(RecordingEngine::default());

    model.add_columns(2);
    model.solve().unwrap();
    assert_eq!(model.engine().discards, 0);

    model.add_rows(1);
    model.solve().unwrap();
    assert_eq!(model.engine().discards, 1);

    // Columns keep the factorization valid
    model.add_columns(1);
    model.solve().unwrap();
    assert_eq!(model.engine().discards, 1);
    assert_eq!(model.engine().solves, 3);
}

#[test]
fn test_engine_receives_full_problem() {
    let mut model = ProblemModel::with_engine(RecordingEngine::default());
    model.set_direction(Direction::Maximize);
    model.add_row_with_bound(None, BoundType::Double, -1.0, 1.0).unwrap();
    model.add_column_with_bound(None, BoundType::Free, 0.0, 0.0, 4.0).unwrap();
    model.set_coefficient(0, 2.0).unwrap();
    model.set_matrix_coefficient(1, 1, -3.0).unwrap();

    model.solve().unwrap();

    let problem = model.engine().last_problem.clone().unwrap();
    assert_eq!(problem.direction, Direction::Maximize);
    assert_eq!(problem.shift, 2.0);
    assert_eq!(problem.objective, vec![4.0]);
    assert_eq!(problem.row_bounds, vec![BoundSpec::Double(-1.0, 1.0)]);
    assert_eq!(problem.column_bounds, vec![BoundSpec::Free]);
    assert_eq!(problem.entries.len(), 1);
    assert_eq!(problem.entries[0].value, -3.0);
}

#[test]
fn test_engine_failure_is_not_retried() {
    let engine = RecordingEngine {
        answer: Some(Solution::iteration_limit()),
        ..RecordingEngine::default()
    };
    let mut model = ProblemModel::with_engine(engine);
    model.add_columns(1);

    assert_eq!(model.solve(), Err(ModelError::SolveFailure(SolveFailure::IterationLimit)));
    assert_eq!(model.engine().solves, 1);
    assert!(!model.is_solved());
}

#[test]
fn test_short_engine_answer_is_numerical_failure() {
    let engine = RecordingEngine {
        answer: Some(Solution::optimal(1.0, Vec::new(), Vec::new())),
        ..RecordingEngine::default()
    };
    let mut model = ProblemModel::with_engine(engine);
    model.add_columns(2);

    assert_eq!(model.solve(), Err(ModelError::SolveFailure(SolveFailure::NumericalFailure)));
    assert_eq!(model.primal_value(1), Err(ModelError::NoSolution));
}

#[test]
fn test_row_activity_without_engine_row_values() {
    let engine = RecordingEngine {
        answer: Some(Solution::optimal(7.0, vec![2.0, 3.0], Vec::new())),
        ..RecordingEngine::default()
    };
    let mut model = ProblemModel::with_engine(engine);
    model.add_rows(2);
    model.add_columns(2);
    model.load_matrix_by_row(&[[1.0, 1.0], [4.0, 0.0]]).unwrap();

    model.solve().unwrap();

    assert!((model.row_primal_value(1).unwrap() - 5.0).abs() < 1e-12);
    assert!((model.row_primal_value(2).unwrap() - 8.0).abs() < 1e-12);
    assert!(matches!(model.row_primal_value(3), Err(ModelError::IndexOutOfRange { .. })));
}

#[test]
fn test_infinite_bound_with_nothing_on_its_side_is_rejected() {
    let mut model = ProblemModel::new();
    model.add_columns(1);
    model.set_coefficient(1, 1.0).unwrap();

    let err = model.set_column_bound(1, BoundType::LowerOnly, f64::INFINITY, 0.0).unwrap_err();
    assert!(matches!(err, ModelError::InvalidBound { .. }));

    // The column keeps its default fixed-at-zero bound
    model.solve().unwrap();
    assert!(model.primal_value(1).unwrap().abs() < 1e-12);
}

#[test]
fn test_duplicate_names_resolve_to_first_column() {
    let mut model = ProblemModel::new();
    model.add_column_with_bound(Some("dup"), BoundType::Fixed, 1.0, 0.0, 0.0).unwrap();
    model.add_column_with_bound(Some("dup"), BoundType::Fixed, 2.0, 0.0, 0.0).unwrap();
    model.solve().unwrap();

    assert_eq!(model.find_column("dup"), Some(1));
    assert!((model.primal_value_by_name("dup").unwrap() - 1.0).abs() < 1e-9);
}
