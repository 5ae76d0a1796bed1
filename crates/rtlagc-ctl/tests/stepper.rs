use rtlagc_ctl::{StepController, GainTable};
use rtlagc_core::AgcError;

const T: i32 = 300;

#[test]
fn test_no_step_inside_deadband() {
    let mut s = StepController::new(T, 3, 1, 6);
    for e in [100, -250, 120, 299, -299] {
        s.accumulate(e);
        let idx = s.step();
        assert!(s.accumulated_error().abs() <= T);
        assert_eq!(idx, 3);
    }
    // Exactly T is not past the threshold.
    let mut s = StepController::new(T, 3, 1, 6);
    s.accumulate(T);
    assert_eq!(s.step(), 3);
    assert_eq!(s.accumulated_error(), T);
}

#[test]
fn test_constant_positive_error_steps_up() {
    let mut s = StepController::new(T, 1, 1, 4);
    let mut steps = Vec::new();

    for _ in 0..40 {
        s.accumulate(100);
        let next = s.step();
        if next != s.gain_index() {
            assert_eq!(next, s.gain_index() + 1, "one step at a time");
            steps.push(next);
            s.set_gain_index(next);
        }
        assert!(s.gain_index() <= 4);
    }
    assert_eq!(steps, vec![2, 3, 4]);
    // Pinned: integrator capped at one threshold.
    assert_eq!(s.accumulated_error(), T);
}

#[test]
fn test_large_error_drains_multiple_thresholds() {
    let mut s = StepController::new(T, 2, 1, 10);
    s.accumulate(950);
    assert_eq!(s.step(), 5);
    assert_eq!(s.accumulated_error(), 50);
}

#[test]
fn test_constant_negative_error_steps_down() {
    let mut s = StepController::new(T, 4, 1, 4);
    for _ in 0..40 {
        s.accumulate(-100);
        let next = s.step();
        assert!(next >= 1);
        assert!(next + 1 >= s.gain_index());
        s.set_gain_index(next);
    }
    assert_eq!(s.gain_index(), 1);
    assert_eq!(s.accumulated_error(), -T);
}

#[test]
fn test_lower_bound_pin_and_recovery() {
    let mut s = StepController::new(T, 1, 1, 4);

    // Hammer the floor.
    for _ in 0..1000 {
        s.accumulate(-5000);
        let next = s.step();
        assert_eq!(next, 1);
        s.set_gain_index(next);
        assert!(s.accumulated_error() >= -T, "integrator drifted: {}", s.accumulated_error());
    }

    // Reverse: at most 2T + 1 of positive error lifts it off the floor.
    s.accumulate(2 * T + 1);
    assert_eq!(s.step(), 2);
}

#[test]
fn test_upper_bound_pin_and_recovery() {
    let mut s = StepController::new(T, 4, 1, 4);

    for _ in 0..1000 {
        s.accumulate(5000);
        let next = s.step();
        assert_eq!(next, 4);
        s.set_gain_index(next);
        assert!(s.accumulated_error() <= T, "integrator drifted: {}", s.accumulated_error());
    }

    s.accumulate(-(2 * T + 1));
    assert_eq!(s.step(), 3);
}

#[test]
fn test_initial_index_clamped() {
    let s = StepController::new(T, 0, 1, 4);
    assert_eq!(s.gain_index(), 1);
    let s = StepController::new(T, 9, 1, 4);
    assert_eq!(s.gain_index(), 4);
    assert_eq!(s.bounds(), (1, 4));
}

#[test]
fn test_gain_table_rules() {
    assert_eq!(GainTable::new(vec![]).unwrap_err(), AgcError::EmptyGainTable);

    let one = GainTable::new(vec![0]).unwrap();
    assert_eq!(one.ensure_controllable(), Err(AgcError::GainTableTooShort));

    let g = GainTable::new(vec![0, 10, 20, 30, 40]).unwrap();
    assert!(g.ensure_controllable().is_ok());
    assert_eq!(g.initial_index(), 2);
    assert_eq!((g.min_index(), g.max_index()), (1, 4));
    assert_eq!(g.value(3), Some(30));
    assert_eq!(g.value(5), None);
    assert_eq!(g.to_string(), "0.0 1.0 2.0 3.0 4.0");
}

#[test]
fn test_nearest_gain() {
    let g = GainTable::new(vec![0, 9, 14, 27, 37, 77, 87, 125]).unwrap();
    assert_eq!(g.nearest(100), 87);
    assert_eq!(g.nearest(110), 125);
    assert_eq!(g.nearest(-50), 0);
    assert_eq!(g.nearest(500), 125);
}
