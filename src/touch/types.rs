/// One acquisition from the panel, already rotation-corrected.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RawSample {
    pub x: u16,
    pub y: u16,
    /// `|(adc_max - Z2) + Z1|` when the source measured it.
    pub pressure: Option<u16>,
}

impl RawSample {
    pub const fn new(x: u16, y: u16) -> Self {
        Self {
            x,
            y,
            pressure: None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TouchPoint {
    pub x: u16,
    pub y: u16,
}

/// Debounced press, in screen coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TouchEvent {
    pub x: u16,
    pub y: u16,
}

impl From<TouchPoint> for TouchEvent {
    fn from(point: TouchPoint) -> Self {
        Self {
            x: point.x,
            y: point.y,
        }
    }
}

/// Denoised, mapped position with the filter's run length as confidence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FilteredTouch {
    pub point: TouchPoint,
    pub confidence: usize,
}

/// How raw device axes line up with window axes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RotationFrame {
    #[default]
    Identity,
    Swap,
    Reverse,
    SwapReverse,
}

impl RotationFrame {
    /// Orientation index as used by display drivers; only the low two bits matter.
    pub const fn from_index(index: u8) -> Self {
        match index & 0x03 {
            0 => Self::Identity,
            1 => Self::Swap,
            2 => Self::Reverse,
            _ => Self::SwapReverse,
        }
    }

    pub const fn index(self) -> u8 {
        match self {
            Self::Identity => 0,
            Self::Swap => 1,
            Self::Reverse => 2,
            Self::SwapReverse => 3,
        }
    }

    pub const fn swaps_axes(self) -> bool {
        matches!(self, Self::Swap | Self::SwapReverse)
    }

    pub const fn reverses_axes(self) -> bool {
        matches!(self, Self::Reverse | Self::SwapReverse)
    }

    /// Every frame is its own inverse.
    pub const fn inverse(self) -> Self {
        self
    }

    pub fn apply(self, x: u16, y: u16, adc_max: u16) -> (u16, u16) {
        let (x, y) = if self.swaps_axes() { (y, x) } else { (x, y) };
        if self.reverses_axes() {
            (adc_max.saturating_sub(x), adc_max.saturating_sub(y))
        } else {
            (x, y)
        }
    }

    /// Rotates both corners of `window`; reversed frames yield min > max.
    pub fn apply_window(self, window: AdcWindow, adc_max: u16) -> AdcWindow {
        let (xmin, ymin) = self.apply(window.xmin, window.ymin, adc_max);
        let (xmax, ymax) = self.apply(window.xmax, window.ymax, adc_max);
        AdcWindow {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }
}

/// ADC-space rectangle. Bounds are corners, not an ordered range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AdcWindow {
    pub xmin: u16,
    pub ymin: u16,
    pub xmax: u16,
    pub ymax: u16,
}

impl AdcWindow {
    pub const fn full_scale(adc_max: u16) -> Self {
        Self {
            xmin: 0,
            ymin: 0,
            xmax: adc_max,
            ymax: adc_max,
        }
    }

    pub fn x_span(&self) -> f64 {
        f64::from(self.xmax) - f64::from(self.xmin)
    }

    pub fn y_span(&self) -> f64 {
        f64::from(self.ymax) - f64::from(self.ymin)
    }

    pub fn clip_x(&self, value: f64) -> f64 {
        clip_between(value, self.xmin, self.xmax)
    }

    pub fn clip_y(&self, value: f64) -> f64 {
        clip_between(value, self.ymin, self.ymax)
    }
}

fn clip_between(value: f64, a: u16, b: u16) -> f64 {
    let lo = f64::from(a.min(b));
    let hi = f64::from(a.max(b));
    value.max(lo).min(hi)
}

/// Active drawing window in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScreenWindow {
    pub width: u16,
    pub height: u16,
}

impl ScreenWindow {
    pub const fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    pub fn clip(&self, x: f64, y: f64) -> TouchPoint {
        let max_x = f64::from(self.width.saturating_sub(1));
        let max_y = f64::from(self.height.saturating_sub(1));
        TouchPoint {
            x: x.max(0.0).min(max_x) as u16,
            y: y.max(0.0).min(max_y) as u16,
        }
    }
}
