#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod error;
pub mod matrix;
pub mod touch;

pub use config::{active_config, TouchConfig, TOUCH_EVENT_QUEUE_CAPACITY};
pub use error::{CalibrationError, MatrixError, MatrixParseError, TouchError};
pub use matrix::Matrix;
pub use touch::{
    calibrate::{AffineTransform, CalibrationProgress, CalibrationSession, CalibrationState},
    debounce::DebounceState,
    source::{CalibrationHost, RawSampleSource},
    types::{AdcWindow, FilteredTouch, RawSample, RotationFrame, ScreenWindow, TouchEvent, TouchPoint},
    xpt2046::{Xpt2046, Xpt2046Error},
    TouchPipeline,
};
