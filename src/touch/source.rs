use core::ops::ControlFlow;

use super::types::{RawSample, RotationFrame};

/// Anything that can produce one raw panel reading on demand.
pub trait RawSampleSource {
    /// `None` when the panel is not pressed hard enough to count as a touch.
    fn read_raw_sample(&mut self, rotation: RotationFrame) -> Option<RawSample>;
}

impl<T: RawSampleSource + ?Sized> RawSampleSource for &mut T {
    fn read_raw_sample(&mut self, rotation: RotationFrame) -> Option<RawSample> {
        (**self).read_raw_sample(rotation)
    }
}

/// Display and scheduler hooks used while calibrating.
pub trait CalibrationHost {
    /// Show the target the user should press next.
    fn prompt_user(&mut self, point_index: usize, screen_x: u16, screen_y: u16);

    /// Called between acquisition attempts. `Break` cancels calibration.
    fn yield_to_scheduler(&mut self) -> ControlFlow<()>;
}
