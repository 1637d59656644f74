//! Raw XPT2046 readings in, calibrated and debounced screen touches out.

pub mod calibrate;
pub mod debounce;
pub mod denoise;
pub mod mapper;
pub mod queue;
pub mod source;
pub mod types;
pub mod xpt2046;

use core::ops::ControlFlow;

use crate::config::{AdcWindow, TouchConfig, TOUCH_EVENT_QUEUE_CAPACITY};
use crate::error::{CalibrationError, TouchError};

use calibrate::{AffineTransform, CalibrationProgress, CalibrationSession, CalibrationState};
use debounce::{DebounceEngine, DebounceState};
use denoise::read_filtered;
use mapper::CoordinateMapper;
use queue::EventQueue;
use source::{CalibrationHost, RawSampleSource};
use types::{FilteredTouch, RotationFrame, ScreenWindow, TouchEvent, TouchPoint};

pub struct TouchPipeline<const N: usize = TOUCH_EVENT_QUEUE_CAPACITY> {
    config: TouchConfig,
    window: ScreenWindow,
    rotation: RotationFrame,
    mapper: CoordinateMapper,
    calibration: CalibrationState,
    debounce: DebounceEngine,
    queue: EventQueue<N>,
    dropped_events: u32,
}

impl<const N: usize> TouchPipeline<N> {
    pub fn new(window: ScreenWindow) -> Self {
        Self::with_config(window, TouchConfig::default())
    }

    pub fn with_config(window: ScreenWindow, config: TouchConfig) -> Self {
        Self {
            config,
            window,
            rotation: RotationFrame::Identity,
            mapper: CoordinateMapper::new(
                config.raw_limits,
                config.map_limits,
                config.sampling.adc_max,
            ),
            calibration: CalibrationState::new(),
            debounce: DebounceEngine::new(config.debounce),
            queue: EventQueue::new(),
            dropped_events: 0,
        }
    }

    pub fn config(&self) -> &TouchConfig {
        &self.config
    }

    pub fn window(&self) -> ScreenWindow {
        self.window
    }

    /// The stored calibration stays valid only if the new window has the
    /// same size it was solved for.
    pub fn set_window(&mut self, window: ScreenWindow) {
        self.window = window;
    }

    pub fn rotation(&self) -> RotationFrame {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: RotationFrame) {
        self.rotation = rotation;
    }

    pub fn set_raw_limits(&mut self, limits: AdcWindow) {
        self.mapper.set_raw_limits(limits);
    }

    pub fn set_map_limits(&mut self, limits: AdcWindow) {
        self.mapper.set_map_limits(limits);
    }

    pub fn calibration(&self) -> &CalibrationState {
        &self.calibration
    }

    pub fn is_calibrated(&self) -> bool {
        self.calibration.is_calibrated()
    }

    /// Installs a transform solved elsewhere, e.g. restored by the caller.
    pub fn apply_calibration(&mut self, transform: AffineTransform) {
        self.calibration.replace(transform);
    }

    pub fn debounce_state(&self) -> DebounceState {
        self.debounce.state()
    }

    /// Single unfiltered reading, mapped to the screen.
    pub fn get_touch_xy_raw<S>(&self, source: &mut S) -> Result<Option<TouchPoint>, TouchError>
    where
        S: RawSampleSource + ?Sized,
    {
        let Some(raw) = source.read_raw_sample(self.rotation) else {
            return Ok(None);
        };
        self.mapper
            .map(raw, self.rotation, &self.calibration, self.window)
            .map(Some)
    }

    /// Denoised reading mapped to the screen, with the filter's run length
    /// as confidence.
    pub fn get_touch_xy_filtered<S>(
        &self,
        source: &mut S,
    ) -> Result<Option<FilteredTouch>, TouchError>
    where
        S: RawSampleSource + ?Sized,
    {
        if !self.calibration.is_calibrated() {
            return Err(TouchError::Uncalibrated);
        }
        let Some(sample) = read_filtered(source, self.rotation, &self.config.sampling)? else {
            return Ok(None);
        };
        let point = self
            .mapper
            .map(sample.raw, self.rotation, &self.calibration, self.window)?;
        Ok(Some(FilteredTouch {
            point,
            confidence: sample.confidence,
        }))
    }

    /// Next debounced event, oldest first.
    pub fn get_touch_key_event(&mut self) -> Option<TouchEvent> {
        self.queue.pop()
    }

    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    /// Confirmed presses that found the queue full, since construction.
    pub fn dropped_events(&self) -> u32 {
        self.dropped_events
    }

    pub fn flush_events(&mut self) {
        self.queue.flush();
    }

    /// One polling tick of the debounce machine. Unstable bursts count as
    /// released. Only a missing calibration is reported.
    ///
    /// A confirmed press is returned even when the queue was full and it was
    /// not queued; `dropped_events` counts those.
    pub fn tick<S>(&mut self, source: &mut S) -> Result<Option<TouchEvent>, TouchError>
    where
        S: RawSampleSource + ?Sized,
    {
        let sample = match self.get_touch_xy_filtered(source) {
            Ok(filtered) => filtered.map(|touch| touch.point),
            Err(TouchError::InsufficientSamples) => None,
            Err(err) => return Err(err),
        };

        let Some(event) = self.debounce.tick(sample).event else {
            return Ok(None);
        };
        if let Err(err) = self.queue.push(event) {
            self.dropped_events = self.dropped_events.saturating_add(1);
            log::warn!(
                "touch_debounce: event dropped err={err} x={} y={} pending={}",
                event.x,
                event.y,
                self.queue.len()
            );
        } else {
            log::debug!("touch_debounce: press x={} y={}", event.x, event.y);
        }
        Ok(Some(event))
    }

    pub fn start_calibration(&self, window: ScreenWindow) -> CalibrationSession {
        CalibrationSession::new(window, self.config.calibration.min_confidence)
    }

    /// One non-blocking acquisition attempt. On completion the new transform
    /// replaces the old one and the session's window becomes active; a
    /// failed solve leaves both untouched.
    pub fn try_calibration_step<S>(
        &mut self,
        session: &mut CalibrationSession,
        source: &mut S,
    ) -> Result<CalibrationProgress, CalibrationError>
    where
        S: RawSampleSource + ?Sized,
    {
        let reading = read_filtered(source, self.rotation, &self.config.sampling);
        let progress = session.advance(reading, &self.mapper, self.rotation)?;
        if let CalibrationProgress::Complete(transform) = progress {
            self.calibration.replace(transform);
            self.window = session.window();
        }
        Ok(progress)
    }

    /// Runs the five-point procedure to completion against `window`, which
    /// becomes the active window on success.
    pub fn run_calibration<S, H>(
        &mut self,
        window: ScreenWindow,
        source: &mut S,
        host: &mut H,
    ) -> Result<AffineTransform, CalibrationError>
    where
        S: RawSampleSource + ?Sized,
        H: CalibrationHost + ?Sized,
    {
        let mut session = self.start_calibration(window);
        let mut prompted = None;
        log::info!(
            "touch_cal: start width={} height={}",
            window.width,
            window.height
        );

        loop {
            let point_index = session.point_index();
            if prompted != Some(point_index) {
                if let Some(target) = session.target(point_index) {
                    host.prompt_user(point_index, target.x, target.y);
                }
                prompted = Some(point_index);
            }

            if let CalibrationProgress::Complete(transform) =
                self.try_calibration_step(&mut session, source)?
            {
                return Ok(transform);
            }

            if let ControlFlow::Break(()) = host.yield_to_scheduler() {
                let captured = session.captured().len();
                log::warn!("touch_cal: cancelled captured={captured}");
                return Err(CalibrationError::Cancelled { captured });
            }
        }
    }

    /// Calibrates against the active window when no transform is stored yet.
    pub fn check_calibrated<S, H>(
        &mut self,
        source: &mut S,
        host: &mut H,
    ) -> Result<(), CalibrationError>
    where
        S: RawSampleSource + ?Sized,
        H: CalibrationHost + ?Sized,
    {
        if self.calibration.is_calibrated() {
            return Ok(());
        }
        self.run_calibration(self.window, source, host).map(|_| ())
    }
}
