//! Five-point least-squares calibration from raw panel space to screen space.

use heapless::Vec;

use crate::error::{CalibrationError, MatrixError, TouchError};
use crate::matrix::Matrix;

use super::denoise::FilteredSample;
use super::mapper::CoordinateMapper;
use super::types::{RawSample, RotationFrame, ScreenWindow, TouchPoint};

pub const CALIBRATION_POINTS: usize = 5;

/// `screen_x = cal_x . [x, y, 1]`, `screen_y = cal_y . [x, y, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AffineTransform {
    pub cal_x: [f64; 3],
    pub cal_y: [f64; 3],
}

impl AffineTransform {
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.cal_x[0] * x + self.cal_x[1] * y + self.cal_x[2],
            self.cal_y[0] * x + self.cal_y[1] * y + self.cal_y[2],
        )
    }
}

/// The transform in use, if any. Only ever replaced whole.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CalibrationState {
    transform: Option<AffineTransform>,
}

impl CalibrationState {
    pub const fn new() -> Self {
        Self { transform: None }
    }

    pub fn is_calibrated(&self) -> bool {
        self.transform.is_some()
    }

    pub fn transform(&self) -> Option<&AffineTransform> {
        self.transform.as_ref()
    }

    pub fn replace(&mut self, transform: AffineTransform) {
        self.transform = Some(transform);
    }

    pub fn clear(&mut self) {
        self.transform = None;
    }
}

/// A screen target and the prepared raw reading captured for it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CalibrationPoint {
    pub screen: TouchPoint,
    pub raw: RawSample,
    pub prepared_x: f64,
    pub prepared_y: f64,
}

/// Quadrant corners first, center last.
pub fn calibration_targets(window: ScreenWindow) -> [TouchPoint; CALIBRATION_POINTS] {
    let (w, h) = (window.width, window.height);
    let (left, right) = (fraction(w, 1, 4), fraction(w, 3, 4));
    let (top, bottom) = (fraction(h, 1, 4), fraction(h, 3, 4));
    [
        TouchPoint { x: left, y: top },
        TouchPoint { x: right, y: top },
        TouchPoint { x: left, y: bottom },
        TouchPoint {
            x: right,
            y: bottom,
        },
        TouchPoint {
            x: fraction(w, 1, 2),
            y: fraction(h, 1, 2),
        },
    ]
}

fn fraction(value: u16, numerator: u32, denominator: u32) -> u16 {
    (u32::from(value) * numerator / denominator) as u16
}

/// Least-squares fit of both screen axes over `[x, y, 1]` rows.
pub fn solve_affine(points: &[CalibrationPoint]) -> Result<AffineTransform, MatrixError> {
    let rows = points.len();
    let mut design = Matrix::alloc(rows, 3)?;
    let mut target_x = Matrix::alloc(rows, 1)?;
    let mut target_y = Matrix::alloc(rows, 1)?;
    for (row, point) in points.iter().enumerate() {
        design[(row, 0)] = point.prepared_x;
        design[(row, 1)] = point.prepared_y;
        design[(row, 2)] = 1.0;
        target_x[(row, 0)] = f64::from(point.screen.x);
        target_y[(row, 0)] = f64::from(point.screen.y);
    }

    let pseudo = design.pseudo_invert()?;
    let cal_x = pseudo.multiply(&target_x)?;
    let cal_y = pseudo.multiply(&target_y)?;
    Ok(AffineTransform {
        cal_x: [cal_x[(0, 0)], cal_x[(1, 0)], cal_x[(2, 0)]],
        cal_y: [cal_y[(0, 0)], cal_y[(1, 0)], cal_y[(2, 0)]],
    })
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CalibrationProgress {
    /// Still waiting for a stable press (or a release) for this target.
    Waiting { point_index: usize },
    Captured { point_index: usize },
    Complete(AffineTransform),
}

/// Non-blocking calibration run. Feed it one filtered reading at a time.
#[derive(Clone, Debug)]
pub struct CalibrationSession {
    window: ScreenWindow,
    targets: [TouchPoint; CALIBRATION_POINTS],
    captured: Vec<CalibrationPoint, CALIBRATION_POINTS>,
    min_confidence: usize,
    awaiting_release: bool,
    finished: bool,
}

impl CalibrationSession {
    pub fn new(window: ScreenWindow, min_confidence: usize) -> Self {
        Self {
            window,
            targets: calibration_targets(window),
            captured: Vec::new(),
            min_confidence: min_confidence.max(1),
            awaiting_release: false,
            finished: false,
        }
    }

    pub fn window(&self) -> ScreenWindow {
        self.window
    }

    /// Index of the target currently being collected.
    pub fn point_index(&self) -> usize {
        self.captured.len().min(CALIBRATION_POINTS - 1)
    }

    pub fn target(&self, index: usize) -> Option<TouchPoint> {
        self.targets.get(index).copied()
    }

    pub fn targets(&self) -> &[TouchPoint; CALIBRATION_POINTS] {
        &self.targets
    }

    pub fn captured(&self) -> &[CalibrationPoint] {
        &self.captured
    }

    pub fn is_complete(&self) -> bool {
        self.finished
    }

    /// `reading` is one filter result: `Ok(None)` released, `Err(_)` touched
    /// but unstable.
    pub(crate) fn advance(
        &mut self,
        reading: Result<Option<FilteredSample>, TouchError>,
        mapper: &CoordinateMapper,
        rotation: RotationFrame,
    ) -> Result<CalibrationProgress, CalibrationError> {
        if self.finished {
            return Err(CalibrationError::Complete);
        }
        let point_index = self.captured.len();

        if self.awaiting_release {
            if matches!(reading, Ok(None)) {
                self.awaiting_release = false;
            }
            return Ok(CalibrationProgress::Waiting { point_index });
        }

        let sample = match reading {
            Ok(Some(sample)) if sample.confidence >= self.min_confidence => sample,
            _ => return Ok(CalibrationProgress::Waiting { point_index }),
        };

        let screen = self.targets[point_index];
        let (prepared_x, prepared_y) = mapper.prepare(sample.raw, rotation);
        let point = CalibrationPoint {
            screen,
            raw: sample.raw,
            prepared_x,
            prepared_y,
        };
        if self.captured.push(point).is_err() {
            return Err(CalibrationError::Complete);
        }
        self.awaiting_release = true;
        log::info!(
            "touch_cal: point captured index={point_index} screen=({},{}) raw=({},{}) confidence={}",
            screen.x,
            screen.y,
            sample.raw.x,
            sample.raw.y,
            sample.confidence
        );

        if self.captured.len() < CALIBRATION_POINTS {
            return Ok(CalibrationProgress::Captured { point_index });
        }

        match solve_affine(&self.captured) {
            Ok(transform) => {
                self.finished = true;
                log::info!(
                    "touch_cal: solved cal_x={:?} cal_y={:?}",
                    transform.cal_x,
                    transform.cal_y
                );
                Ok(CalibrationProgress::Complete(transform))
            }
            Err(err) => {
                log::warn!("touch_cal: solve failed err={err}; restarting points");
                self.captured.clear();
                Err(CalibrationError::Matrix(err))
            }
        }
    }
}
