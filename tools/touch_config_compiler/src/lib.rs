//! Compiles `config/touch.toml` into the Rust constants consumed by the
//! touch pipeline at build time.

use std::{fmt, fs, path::Path};

use serde::Deserialize;

pub const MAX_SAMPLES_PER_READ: usize = 16;
pub const MAX_QUEUE_CAPACITY: usize = 64;

#[derive(Debug)]
pub enum ConfigCompilerError {
    Io(String),
    Parse(String),
    Validation(String),
}

impl fmt::Display for ConfigCompilerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "io error: {msg}"),
            Self::Parse(msg) => write!(f, "parse error: {msg}"),
            Self::Validation(msg) => write!(f, "validation error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigCompilerError {}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TouchConfigFile {
    pub sampling: SamplingSection,
    pub debounce: DebounceSection,
    pub limits: LimitsSection,
    #[serde(default)]
    pub calibration: CalibrationSection,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SamplingSection {
    pub samples_per_read: usize,
    pub min_run: usize,
    pub pressure_threshold: u16,
    pub adc_max: u16,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DebounceSection {
    pub debounce_ms: u32,
    pub tick_ms: u32,
    pub queue_capacity: usize,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LimitsSection {
    pub raw: WindowSection,
    pub map: WindowSection,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct WindowSection {
    pub xmin: u16,
    pub ymin: u16,
    pub xmax: u16,
    pub ymax: u16,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CalibrationSection {
    /// Falls back to `sampling.min_run` when absent.
    pub min_confidence: Option<usize>,
}

pub fn parse_touch_config_str(text: &str) -> Result<TouchConfigFile, ConfigCompilerError> {
    toml::from_str(text).map_err(|e| ConfigCompilerError::Parse(e.to_string()))
}

pub fn parse_touch_config_file(path: &Path) -> Result<TouchConfigFile, ConfigCompilerError> {
    let text = fs::read_to_string(path)
        .map_err(|e| ConfigCompilerError::Io(format!("{}: {e}", path.display())))?;
    parse_touch_config_str(&text)
}

pub fn validate_config(config: &TouchConfigFile) -> Result<(), ConfigCompilerError> {
    let sampling = &config.sampling;
    if sampling.samples_per_read == 0 || sampling.samples_per_read > MAX_SAMPLES_PER_READ {
        return Err(validation(format!(
            "sampling.samples_per_read must be in 1..={MAX_SAMPLES_PER_READ}"
        )));
    }
    if sampling.min_run == 0 || sampling.min_run > sampling.samples_per_read {
        return Err(validation(
            "sampling.min_run must be in 1..=sampling.samples_per_read".into(),
        ));
    }
    if sampling.adc_max == 0 {
        return Err(validation("sampling.adc_max must be > 0".into()));
    }

    let debounce = &config.debounce;
    if debounce.tick_ms == 0 {
        return Err(validation("debounce.tick_ms must be > 0".into()));
    }
    if debounce.debounce_ms < debounce.tick_ms {
        return Err(validation(
            "debounce.debounce_ms must be >= debounce.tick_ms".into(),
        ));
    }
    if debounce.queue_capacity == 0 || debounce.queue_capacity > MAX_QUEUE_CAPACITY {
        return Err(validation(format!(
            "debounce.queue_capacity must be in 1..={MAX_QUEUE_CAPACITY}"
        )));
    }

    for (name, window) in [("raw", config.limits.raw), ("map", config.limits.map)] {
        if window.xmin == window.xmax || window.ymin == window.ymax {
            return Err(validation(format!(
                "limits.{name} must span a non-empty range on both axes"
            )));
        }
        if window.xmax > sampling.adc_max || window.ymax > sampling.adc_max {
            return Err(validation(format!(
                "limits.{name} must stay within sampling.adc_max"
            )));
        }
    }

    if let Some(min_confidence) = config.calibration.min_confidence {
        if min_confidence == 0 || min_confidence > sampling.samples_per_read {
            return Err(validation(
                "calibration.min_confidence must be in 1..=sampling.samples_per_read".into(),
            ));
        }
    }
    Ok(())
}

pub fn render_generated_config(config: &TouchConfigFile) -> String {
    let sampling = &config.sampling;
    let debounce = &config.debounce;
    let min_confidence = config
        .calibration
        .min_confidence
        .unwrap_or(sampling.min_run);

    let mut out = String::new();
    out.push_str("// Generated by touch_config_compiler. Edit config/touch.toml instead.\n\n");
    out.push_str(&format!(
        "pub const TOUCH_EVENT_QUEUE_CAPACITY: usize = {};\n\n",
        debounce.queue_capacity
    ));
    out.push_str("pub(crate) const TOUCH_CONFIG: TouchConfig = TouchConfig {\n");
    out.push_str("    sampling: SamplingConfig {\n");
    out.push_str(&format!(
        "        samples_per_read: {},\n",
        sampling.samples_per_read
    ));
    out.push_str(&format!("        min_run: {},\n", sampling.min_run));
    out.push_str(&format!(
        "        pressure_threshold: {},\n",
        sampling.pressure_threshold
    ));
    out.push_str(&format!("        adc_max: {},\n", sampling.adc_max));
    out.push_str("    },\n");
    out.push_str("    debounce: DebounceConfig {\n");
    out.push_str(&format!("        debounce_ms: {},\n", debounce.debounce_ms));
    out.push_str(&format!("        tick_ms: {},\n", debounce.tick_ms));
    out.push_str("    },\n");
    out.push_str(&render_window("raw_limits", config.limits.raw));
    out.push_str(&render_window("map_limits", config.limits.map));
    out.push_str("    calibration: CalibrationConfig {\n");
    out.push_str(&format!("        min_confidence: {min_confidence},\n"));
    out.push_str("    },\n");
    out.push_str("};\n");
    out
}

pub fn generate_from_path(path: &Path) -> Result<String, ConfigCompilerError> {
    let config = parse_touch_config_file(path)?;
    validate_config(&config)?;
    Ok(render_generated_config(&config))
}

fn render_window(field: &str, window: WindowSection) -> String {
    format!(
        "    {field}: AdcWindow {{\n        xmin: {},\n        ymin: {},\n        xmax: {},\n        ymax: {},\n    }},\n",
        window.xmin, window.ymin, window.xmax, window.ymax
    )
}

fn validation(msg: String) -> ConfigCompilerError {
    ConfigCompilerError::Validation(msg)
}
