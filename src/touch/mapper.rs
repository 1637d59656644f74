use crate::error::TouchError;

use super::calibrate::CalibrationState;
use super::types::{AdcWindow, RawSample, RotationFrame, ScreenWindow, TouchPoint};

/// Rescales rotated raw readings into the device window and applies the
/// stored calibration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CoordinateMapper {
    raw_limits: AdcWindow,
    map_limits: AdcWindow,
    adc_max: u16,
}

impl CoordinateMapper {
    pub const fn new(raw_limits: AdcWindow, map_limits: AdcWindow, adc_max: u16) -> Self {
        Self {
            raw_limits,
            map_limits,
            adc_max,
        }
    }

    pub fn raw_limits(&self) -> AdcWindow {
        self.raw_limits
    }

    pub fn map_limits(&self) -> AdcWindow {
        self.map_limits
    }

    pub fn set_raw_limits(&mut self, limits: AdcWindow) {
        self.raw_limits = limits;
    }

    pub fn set_map_limits(&mut self, limits: AdcWindow) {
        self.map_limits = limits;
    }

    /// Rescale from the rotated map window into the rotated device window,
    /// clipped to the device window. Calibration fits and lookups both run
    /// on these values.
    pub fn prepare(&self, raw: RawSample, rotation: RotationFrame) -> (f64, f64) {
        let device = rotation.apply_window(self.raw_limits, self.adc_max);
        let map = rotation.apply_window(self.map_limits, self.adc_max);

        let x = rescale(
            f64::from(raw.x),
            f64::from(map.xmin),
            map.x_span(),
            f64::from(device.xmin),
            device.x_span(),
        );
        let y = rescale(
            f64::from(raw.y),
            f64::from(map.ymin),
            map.y_span(),
            f64::from(device.ymin),
            device.y_span(),
        );
        (device.clip_x(x), device.clip_y(y))
    }

    pub fn map(
        &self,
        raw: RawSample,
        rotation: RotationFrame,
        calibration: &CalibrationState,
        window: ScreenWindow,
    ) -> Result<TouchPoint, TouchError> {
        let Some(transform) = calibration.transform() else {
            log::warn!("touch_map: no calibration stored");
            return Err(TouchError::Uncalibrated);
        };
        let (x, y) = self.prepare(raw, rotation);
        let (screen_x, screen_y) = transform.apply(x, y);
        log::trace!(
            "touch_map: raw=({},{}) prepared=({x:.0},{y:.0}) screen=({screen_x:.1},{screen_y:.1})",
            raw.x,
            raw.y
        );
        Ok(window.clip(libm::round(screen_x), libm::round(screen_y)))
    }
}

fn rescale(input: f64, map_min: f64, map_span: f64, device_min: f64, device_span: f64) -> f64 {
    if map_span == 0.0 {
        return device_min;
    }
    device_span * (input - map_min) / map_span + device_min
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::touch::calibrate::AffineTransform;

    const ADC_MAX: u16 = 4095;

    fn full_scale() -> CoordinateMapper {
        CoordinateMapper::new(
            AdcWindow::full_scale(ADC_MAX),
            AdcWindow::full_scale(ADC_MAX),
            ADC_MAX,
        )
    }

    fn calibrated(transform: AffineTransform) -> CalibrationState {
        let mut state = CalibrationState::new();
        state.replace(transform);
        state
    }

    #[test]
    fn identical_windows_pass_raw_values_through() {
        let mapper = full_scale();
        for index in 0..4 {
            let rotation = RotationFrame::from_index(index);
            assert_eq!(
                mapper.prepare(RawSample::new(1234, 567), rotation),
                (1234.0, 567.0)
            );
        }
    }

    #[test]
    fn map_window_is_rescaled_into_device_window() {
        let mapper = CoordinateMapper::new(
            AdcWindow {
                xmin: 200,
                ymin: 200,
                xmax: 3800,
                ymax: 3800,
            },
            AdcWindow::full_scale(ADC_MAX),
            ADC_MAX,
        );
        let (x, y) = mapper.prepare(RawSample::new(0, 4095), RotationFrame::Identity);
        assert_eq!((x, y), (200.0, 3800.0));
        let (x, _) = mapper.prepare(RawSample::new(2048, 0), RotationFrame::Identity);
        assert!((x - 2000.44).abs() < 0.01);
    }

    #[test]
    fn rescale_clips_to_device_window_under_reversal() {
        let mapper = CoordinateMapper::new(
            AdcWindow {
                xmin: 200,
                ymin: 200,
                xmax: 3800,
                ymax: 3800,
            },
            AdcWindow {
                xmin: 400,
                ymin: 400,
                xmax: 3600,
                ymax: 3600,
            },
            ADC_MAX,
        );
        let (x, y) = mapper.prepare(RawSample::new(4095, 0), RotationFrame::Reverse);
        assert_eq!((x, y), (3895.0, 295.0));
    }

    #[test]
    fn uncalibrated_mapping_is_an_error() {
        let mapper = full_scale();
        assert_eq!(
            mapper.map(
                RawSample::new(10, 10),
                RotationFrame::Identity,
                &CalibrationState::new(),
                ScreenWindow::new(320, 240)
            ),
            Err(TouchError::Uncalibrated)
        );
    }

    #[test]
    fn affine_result_is_rounded_and_clipped_to_window() {
        let mapper = full_scale();
        let state = calibrated(AffineTransform {
            cal_x: [0.1, 0.0, 0.0],
            cal_y: [0.0, 0.05, 0.0],
        });
        let window = ScreenWindow::new(320, 240);

        let point = mapper
            .map(RawSample::new(1237, 2010), RotationFrame::Identity, &state, window)
            .expect("calibrated");
        assert_eq!(point, TouchPoint { x: 124, y: 101 });

        let point = mapper
            .map(RawSample::new(4000, 4000), RotationFrame::Identity, &state, window)
            .expect("calibrated");
        assert_eq!(point, TouchPoint { x: 319, y: 200 });
    }
}
