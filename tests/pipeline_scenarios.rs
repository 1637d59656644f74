use std::collections::VecDeque;
use std::ops::ControlFlow;

use xpt2046_touch::{
    active_config, AffineTransform, CalibrationError, CalibrationHost, CalibrationProgress,
    DebounceState, MatrixError, RawSample, RawSampleSource, RotationFrame, ScreenWindow,
    TouchError, TouchEvent, TouchPipeline, TouchPoint,
};

const WINDOW: ScreenWindow = ScreenWindow::new(800, 480);

// Raw readings that land exactly on the five targets of an 800x480 window
// under screen_x = 2 * raw_x + 10, screen_y = 3 * raw_y - 30.
const CALIBRATION_RAW: [(u16, u16); 5] = [(95, 50), (295, 50), (95, 130), (295, 130), (195, 90)];

/// Replays a fixed list of reads, then reports no touch forever.
struct ScriptedSource {
    reads: VecDeque<Option<RawSample>>,
    rotations: Vec<RotationFrame>,
}

impl ScriptedSource {
    fn calibration_presses(points: &[(u16, u16)], burst: usize) -> Self {
        let mut reads = VecDeque::new();
        for &(x, y) in points {
            for _ in 0..burst {
                reads.push_back(Some(RawSample::new(x, y)));
            }
            reads.push_back(None);
        }
        Self {
            reads,
            rotations: Vec::new(),
        }
    }
}

impl RawSampleSource for ScriptedSource {
    fn read_raw_sample(&mut self, rotation: RotationFrame) -> Option<RawSample> {
        self.rotations.push(rotation);
        self.reads.pop_front().flatten()
    }
}

/// Holds whatever the test is currently pressing.
struct Panel {
    current: Option<RawSample>,
}

impl Panel {
    fn press(&mut self, x: u16, y: u16) {
        self.current = Some(RawSample::new(x, y));
    }

    fn release(&mut self) {
        self.current = None;
    }
}

impl RawSampleSource for Panel {
    fn read_raw_sample(&mut self, _rotation: RotationFrame) -> Option<RawSample> {
        self.current
    }
}

#[derive(Default)]
struct RecordingHost {
    prompts: Vec<(usize, u16, u16)>,
    yields: usize,
    cancel_after: Option<usize>,
}

impl CalibrationHost for RecordingHost {
    fn prompt_user(&mut self, point_index: usize, screen_x: u16, screen_y: u16) {
        self.prompts.push((point_index, screen_x, screen_y));
    }

    fn yield_to_scheduler(&mut self) -> ControlFlow<()> {
        self.yields += 1;
        match self.cancel_after {
            Some(limit) if self.yields >= limit => ControlFlow::Break(()),
            _ => ControlFlow::Continue(()),
        }
    }
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {expected}, got {actual}"
    );
}

fn calibrated_pipeline<const N: usize>() -> TouchPipeline<N> {
    let mut pipeline = TouchPipeline::<N>::new(WINDOW);
    let burst = active_config().sampling.samples_per_read;
    let mut source = ScriptedSource::calibration_presses(&CALIBRATION_RAW, burst);
    pipeline
        .run_calibration(WINDOW, &mut source, &mut RecordingHost::default())
        .expect("calibration should succeed");
    pipeline
}

#[test]
fn calibration_recovers_known_affine_transform() {
    let mut pipeline = TouchPipeline::<10>::new(WINDOW);
    let burst = active_config().sampling.samples_per_read;
    let mut source = ScriptedSource::calibration_presses(&CALIBRATION_RAW, burst);
    let mut host = RecordingHost::default();

    let transform = pipeline
        .run_calibration(WINDOW, &mut source, &mut host)
        .expect("calibration should succeed");

    for (actual, expected) in transform.cal_x.iter().zip([2.0, 0.0, 10.0]) {
        assert_close(*actual, expected);
    }
    for (actual, expected) in transform.cal_y.iter().zip([0.0, 3.0, -30.0]) {
        assert_close(*actual, expected);
    }
    assert_eq!(pipeline.calibration().transform(), Some(&transform));
    assert_eq!(
        host.prompts,
        [
            (0, 200, 120),
            (1, 600, 120),
            (2, 200, 360),
            (3, 600, 360),
            (4, 400, 240)
        ]
    );

    let mut held_out = ScriptedSource::calibration_presses(&[(150, 100)], 1);
    assert_eq!(
        pipeline.get_touch_xy_raw(&mut held_out),
        Ok(Some(TouchPoint { x: 310, y: 270 }))
    );
}

#[test]
fn filtered_read_reports_confidence() {
    let pipeline = calibrated_pipeline::<10>();
    let mut panel = Panel { current: None };
    assert_eq!(pipeline.get_touch_xy_filtered(&mut panel), Ok(None));

    panel.press(150, 100);
    let touch = pipeline
        .get_touch_xy_filtered(&mut panel)
        .expect("stable")
        .expect("pressed");
    assert_eq!(touch.point, TouchPoint { x: 310, y: 270 });
    assert_eq!(touch.confidence, active_config().sampling.samples_per_read);
}

#[test]
fn mapping_before_calibration_is_reported() {
    let mut pipeline = TouchPipeline::<10>::new(WINDOW);
    let mut panel = Panel {
        current: Some(RawSample::new(100, 100)),
    };
    assert_eq!(
        pipeline.get_touch_xy_raw(&mut panel),
        Err(TouchError::Uncalibrated)
    );
    assert_eq!(pipeline.tick(&mut panel), Err(TouchError::Uncalibrated));
    assert_eq!(pipeline.get_touch_key_event(), None);
}

#[test]
fn check_calibrated_runs_calibration_once() {
    let mut pipeline = TouchPipeline::<10>::new(WINDOW);
    let burst = active_config().sampling.samples_per_read;
    let mut source = ScriptedSource::calibration_presses(&CALIBRATION_RAW, burst);
    let mut host = RecordingHost::default();

    pipeline
        .check_calibrated(&mut source, &mut host)
        .expect("first use calibrates");
    assert!(pipeline.is_calibrated());
    let prompts = host.prompts.len();

    pipeline
        .check_calibrated(&mut source, &mut host)
        .expect("already calibrated");
    assert_eq!(host.prompts.len(), prompts);
}

#[test]
fn debounced_press_is_queued_once() {
    let mut pipeline = calibrated_pipeline::<10>();
    let debounce_ticks = active_config().debounce.debounce_ms / active_config().debounce.tick_ms;
    let mut panel = Panel { current: None };

    pipeline.tick(&mut panel).expect("calibrated");
    assert_eq!(pipeline.debounce_state(), DebounceState::WaitingForPress);

    panel.press(150, 100);
    for _ in 0..debounce_ticks * 10 {
        pipeline.tick(&mut panel).expect("calibrated");
    }
    panel.release();
    for _ in 0..debounce_ticks {
        pipeline.tick(&mut panel).expect("calibrated");
    }

    assert_eq!(pipeline.debounce_state(), DebounceState::WaitingForPress);
    assert_eq!(
        pipeline.get_touch_key_event(),
        Some(TouchEvent { x: 310, y: 270 })
    );
    assert_eq!(pipeline.get_touch_key_event(), None);
}

#[test]
fn full_queue_keeps_oldest_events() {
    let mut pipeline = calibrated_pipeline::<2>();
    let debounce_ticks = active_config().debounce.debounce_ms / active_config().debounce.tick_ms;
    let mut panel = Panel { current: None };
    pipeline.tick(&mut panel).expect("calibrated");

    let mut confirmed = 0;
    for raw_x in [100, 120, 140] {
        panel.press(raw_x, 100);
        for _ in 0..debounce_ticks {
            if pipeline.tick(&mut panel).expect("calibrated").is_some() {
                confirmed += 1;
            }
        }
        panel.release();
        for _ in 0..debounce_ticks {
            pipeline.tick(&mut panel).expect("calibrated");
        }
    }

    assert_eq!(confirmed, 3);
    assert_eq!(pipeline.pending_events(), 2);
    assert_eq!(pipeline.dropped_events(), 1);
    assert_eq!(
        pipeline.get_touch_key_event(),
        Some(TouchEvent { x: 210, y: 270 })
    );
    assert_eq!(
        pipeline.get_touch_key_event(),
        Some(TouchEvent { x: 250, y: 270 })
    );
    assert_eq!(pipeline.get_touch_key_event(), None);
}

#[test]
fn resized_window_clips_mapped_points() {
    let mut pipeline = calibrated_pipeline::<10>();
    let mut panel = Panel {
        current: Some(RawSample::new(150, 100)),
    };
    assert_eq!(
        pipeline.get_touch_xy_raw(&mut panel),
        Ok(Some(TouchPoint { x: 310, y: 270 }))
    );

    pipeline.set_window(ScreenWindow::new(200, 200));
    assert_eq!(pipeline.window(), ScreenWindow::new(200, 200));
    assert_eq!(
        pipeline.get_touch_xy_raw(&mut panel),
        Ok(Some(TouchPoint { x: 199, y: 199 }))
    );
}

#[test]
fn flush_discards_pending_events() {
    let mut pipeline = calibrated_pipeline::<10>();
    let debounce_ticks = active_config().debounce.debounce_ms / active_config().debounce.tick_ms;
    let mut panel = Panel { current: None };
    pipeline.tick(&mut panel).expect("calibrated");
    panel.press(150, 100);
    for _ in 0..debounce_ticks {
        pipeline.tick(&mut panel).expect("calibrated");
    }
    assert_eq!(pipeline.pending_events(), 1);
    pipeline.flush_events();
    assert_eq!(pipeline.get_touch_key_event(), None);
}

#[test]
fn host_can_cancel_calibration() {
    let mut pipeline = TouchPipeline::<10>::new(WINDOW);
    let mut source = ScriptedSource::calibration_presses(&CALIBRATION_RAW[..2], 8);
    let mut host = RecordingHost {
        cancel_after: Some(3),
        ..RecordingHost::default()
    };

    assert_eq!(
        pipeline.run_calibration(WINDOW, &mut source, &mut host),
        Err(CalibrationError::Cancelled { captured: 2 })
    );
    assert!(!pipeline.is_calibrated());
}

#[test]
fn failed_solve_keeps_previous_transform() {
    let mut pipeline = TouchPipeline::<10>::new(WINDOW);
    let previous = AffineTransform {
        cal_x: [1.0, 0.0, 0.0],
        cal_y: [0.0, 1.0, 0.0],
    };
    pipeline.apply_calibration(previous);

    let mut source = ScriptedSource::calibration_presses(&[(500, 500); 5], 8);
    assert_eq!(
        pipeline.run_calibration(WINDOW, &mut source, &mut RecordingHost::default()),
        Err(CalibrationError::Matrix(MatrixError::SingularMatrix))
    );
    assert_eq!(pipeline.calibration().transform(), Some(&previous));
}

#[test]
fn stepwise_calibration_is_non_blocking() {
    let mut pipeline = TouchPipeline::<10>::new(WINDOW);
    let mut session = pipeline.start_calibration(WINDOW);
    let mut idle = Panel { current: None };

    for _ in 0..3 {
        assert_eq!(
            pipeline.try_calibration_step(&mut session, &mut idle),
            Ok(CalibrationProgress::Waiting { point_index: 0 })
        );
    }

    let mut source = ScriptedSource::calibration_presses(&CALIBRATION_RAW, 8);
    let mut completed = None;
    for _ in 0..100 {
        match pipeline.try_calibration_step(&mut session, &mut source) {
            Ok(CalibrationProgress::Complete(transform)) => {
                completed = Some(transform);
                break;
            }
            Ok(_) => {}
            Err(err) => panic!("unexpected calibration error: {err}"),
        }
    }
    let transform = completed.expect("calibration should complete");
    assert_eq!(pipeline.calibration().transform(), Some(&transform));
    assert_eq!(
        pipeline.try_calibration_step(&mut session, &mut source),
        Err(CalibrationError::Complete)
    );
}

#[test]
fn rotation_is_passed_to_the_source() {
    let mut pipeline = TouchPipeline::<10>::new(WINDOW);
    pipeline.set_rotation(RotationFrame::SwapReverse);
    let mut session = pipeline.start_calibration(WINDOW);
    let mut source = ScriptedSource::calibration_presses(&[], 0);
    pipeline
        .try_calibration_step(&mut session, &mut source)
        .expect("waiting");
    assert_eq!(source.rotations, [RotationFrame::SwapReverse]);
}
