use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use rtlagc_core::{AgcConfig, AgcError, AgcResult};
use rtlagc_ctl::{ControlState, GainTable, PowerTable};
use rtlagc_hal::TunerGain;
use rtlagc_host::{Actuator, ActuatorState, ExitFlag, WakeSignal, start_agc};

// Thread-safe recording tuner
#[derive(Clone)]
struct MockTuner {
    gains: Vec<i32>,
    calls: Arc<Mutex<Vec<i32>>>,
    fail: bool,
}

impl MockTuner {
    fn new(gains: Vec<i32>) -> Self {
        Self { gains, calls: Arc::new(Mutex::new(Vec::new())), fail: false }
    }
    fn calls(&self) -> Vec<i32> {
        self.calls.lock().unwrap().clone()
    }
}

impl TunerGain for MockTuner {
    fn read_gain_table(&mut self) -> AgcResult<Vec<i32>> { Ok(self.gains.clone()) }
    fn apply_gain(&mut self, tenths_db: i32) -> AgcResult<()> {
        self.calls.lock().unwrap().push(tenths_db);
        if self.fail { Err(AgcError::HalError) } else { Ok(()) }
    }
    fn enable_auto_gain(&mut self) -> AgcResult<()> { Ok(()) }
}

fn five_steps() -> Vec<i32> { vec![0, 10, 20, 30, 40] }

fn wait_for(deadline: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let t0 = Instant::now();
    while t0.elapsed() < deadline {
        if cond() { return true; }
        std::thread::sleep(Duration::from_millis(5));
    }
    cond()
}

#[test]
fn test_state_machine_transitions() {
    let gains = GainTable::new(five_steps()).unwrap();
    let cfg = AgcConfig { sample_rate: 20, ..AgcConfig::default() };
    let mut st = ControlState::new(&cfg, &gains, Arc::new(PowerTable::new())).unwrap();

    let tuner = MockTuner::new(five_steps());
    let wake = WakeSignal::new();
    let exit = ExitFlag::new();
    let mut act = Actuator::new(
        st.stepper(), Arc::new(gains), Box::new(tuner.clone()),
        wake.clone(), exit.clone(), Duration::from_millis(10),
    );
    assert_eq!(act.state(), ActuatorState::Waiting);

    // Nothing pending: timeout keeps it waiting.
    assert_eq!(act.tick(), ActuatorState::Waiting);

    // Window at -500 vs target -100: error +400 crosses the threshold.
    for _ in 0..4 { st.observe(-500, &mut |_| wake.set()); }
    assert_eq!(act.tick(), ActuatorState::Applying);
    assert!(!wake.is_set());
    assert_eq!(act.tick(), ActuatorState::Waiting);
    assert_eq!(tuner.calls(), vec![30]);

    exit.raise();
    assert_eq!(act.tick(), ActuatorState::Stopped);
    assert_eq!(act.tick(), ActuatorState::Stopped);
}

#[test]
fn test_failed_write_still_advances() {
    let gains = GainTable::new(five_steps()).unwrap();
    let cfg = AgcConfig { sample_rate: 20, ..AgcConfig::default() };
    let mut st = ControlState::new(&cfg, &gains, Arc::new(PowerTable::new())).unwrap();
    let stepper = st.stepper();

    let mut tuner = MockTuner::new(five_steps());
    tuner.fail = true;
    let mut act = Actuator::new(
        stepper.clone(), Arc::new(gains), Box::new(tuner.clone()),
        WakeSignal::new(), ExitFlag::new(), Duration::from_millis(10),
    );

    for _ in 0..4 { st.observe(-500, &mut |_| {}); }
    assert_eq!(act.apply_pending(), Some(30));
    assert_eq!(stepper.lock().gain_index(), 3);

    // Next step is relative to the intended index, not a replay of 30.
    for _ in 0..4 { st.observe(-500, &mut |_| {}); }
    assert_eq!(act.apply_pending(), Some(40));
    assert_eq!(tuner.calls(), vec![30, 40]);

    // Pinned at the top: nothing more to write.
    for _ in 0..4 { st.observe(-500, &mut |_| {}); }
    assert_eq!(act.apply_pending(), None);
}

#[test]
fn test_three_windows_single_apply() {
    let tuner = MockTuner::new(five_steps());
    let exit = ExitFlag::new();
    // window = 20 / 5 = 4 pairs
    let cfg = AgcConfig { target_level: -99, sample_rate: 20, wake_timeout_ms: 50, ..AgcConfig::default() };
    let mut rt = start_agc(cfg, Box::new(tuner.clone()), &exit).unwrap();

    // Initial gain: index 5/2 = 2
    assert_eq!(tuner.calls(), vec![20]);

    // (188, 138) reads -279: error +180 per window.
    let window: Vec<u8> = [188u8, 138].repeat(4);
    for _ in 0..3 {
        rt.processor.process_block(&window);
        std::thread::sleep(Duration::from_millis(10));
    }
    assert_eq!(rt.processor.windows(), 3);

    assert!(wait_for(Duration::from_secs(2), || tuner.calls().len() >= 2));
    std::thread::sleep(Duration::from_millis(150));

    let stepper = rt.processor.stepper();
    rt.shutdown(&exit).unwrap();

    assert_eq!(tuner.calls(), vec![20, 30]);
    assert_eq!(stepper.lock().gain_index(), 3);
    assert_eq!(stepper.lock().accumulated_error(), 240);
}

#[test]
fn test_exit_while_waiting() {
    let tuner = MockTuner::new(five_steps());
    let exit = ExitFlag::new();
    let rt = start_agc(AgcConfig::default(), Box::new(tuner), &exit).unwrap();

    std::thread::sleep(Duration::from_millis(30));
    assert!(!rt.actuator_finished());

    // No samples, no wake pending: the 1 s timeout alone must notice the flag.
    let t0 = Instant::now();
    rt.shutdown(&exit).unwrap();
    assert!(t0.elapsed() < Duration::from_millis(1500), "took {:?}", t0.elapsed());
}

#[test]
fn test_no_samples_after_exit() {
    let tuner = MockTuner::new(five_steps());
    let exit = ExitFlag::new();
    let cfg = AgcConfig { sample_rate: 20, wake_timeout_ms: 20, ..AgcConfig::default() };
    let mut rt = start_agc(cfg, Box::new(tuner), &exit).unwrap();

    exit.raise();
    rt.processor.process_block(&[0u8; 64]);
    assert_eq!(rt.processor.windows(), 0);
    rt.shutdown(&exit).unwrap();
}
