pub use crate::touch::types::AdcWindow;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SamplingConfig {
    /// Raw reads taken for one filtered sample.
    pub samples_per_read: usize,
    /// Shortest run the denoise filter accepts.
    pub min_run: usize,
    pub pressure_threshold: u16,
    pub adc_max: u16,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DebounceConfig {
    pub debounce_ms: u32,
    pub tick_ms: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CalibrationConfig {
    pub min_confidence: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TouchConfig {
    pub sampling: SamplingConfig,
    pub debounce: DebounceConfig,
    /// Device-side ADC window the calibration works in.
    pub raw_limits: AdcWindow,
    /// Caller-side window raw readings are rescaled from.
    pub map_limits: AdcWindow,
    pub calibration: CalibrationConfig,
}

include!(concat!(env!("OUT_DIR"), "/touch_config.rs"));

pub fn active_config() -> &'static TouchConfig {
    &TOUCH_CONFIG
}

impl Default for TouchConfig {
    fn default() -> Self {
        *active_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiled_config_matches_repository_toml() {
        let config = active_config();
        assert_eq!(config.sampling.samples_per_read, 8);
        assert_eq!(config.sampling.min_run, 4);
        assert_eq!(config.sampling.pressure_threshold, 300);
        assert_eq!(config.debounce.debounce_ms, 10);
        assert_eq!(config.debounce.tick_ms, 1);
        assert_eq!(config.raw_limits, AdcWindow::full_scale(4095));
        assert_eq!(config.map_limits, AdcWindow::full_scale(4095));
        assert_eq!(config.calibration.min_confidence, 4);
        assert_eq!(TOUCH_EVENT_QUEUE_CAPACITY, 10);
    }

    #[test]
    fn default_is_the_compiled_config() {
        assert_eq!(TouchConfig::default(), *active_config());
    }
}
