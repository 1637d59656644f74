//! Run-based noise rejection over repeated raw readings.
//!
//! Every contiguous window of at least `min_run` samples is scored by the
//! total absolute distance of its samples from the window's first sample,
//! divided by the window length with integer truncation. The lowest score
//! wins; on equal scores a longer (or equally long, later) window replaces
//! the current best, so a perfectly flat burst reports its full length.

use heapless::Vec;

use crate::config::SamplingConfig;
use crate::error::TouchError;

use super::source::RawSampleSource;
use super::types::{RawSample, RotationFrame};

pub const MAX_SAMPLES_PER_READ: usize = 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunEstimate {
    pub average: u16,
    pub length: usize,
}

/// Raw reading averaged over the quietest run on each axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FilteredSample {
    pub raw: RawSample,
    /// Shorter of the two axis runs.
    pub confidence: usize,
}

pub fn nearest_run(samples: &[u16], min_run: usize) -> Result<RunEstimate, TouchError> {
    let min_run = min_run.max(1);
    let mut best: Option<(u32, RunEstimate)> = None;

    for (i, &start) in samples.iter().enumerate() {
        let mut sum = 0u32;
        let mut noise = 0u32;
        for (offset, &value) in samples[i..].iter().enumerate() {
            sum += u32::from(value);
            noise += u32::from(value.abs_diff(start));
            let length = offset + 1;
            if length < min_run {
                continue;
            }
            let ratio = noise / length as u32;
            let replace = match best {
                None => true,
                Some((best_ratio, best_run)) => {
                    ratio < best_ratio || (ratio == best_ratio && length >= best_run.length)
                }
            };
            if replace {
                best = Some((
                    ratio,
                    RunEstimate {
                        average: (sum / length as u32) as u16,
                        length,
                    },
                ));
            }
        }
    }

    best.map(|(_, run)| run)
        .ok_or(TouchError::InsufficientSamples)
}

/// Collects one burst from `source` and filters both axes.
///
/// `Ok(None)` means the first read already saw no touch. A release part way
/// through the burst ends it early; the shortened burst is still filtered.
pub fn read_filtered<S>(
    source: &mut S,
    rotation: RotationFrame,
    sampling: &SamplingConfig,
) -> Result<Option<FilteredSample>, TouchError>
where
    S: RawSampleSource + ?Sized,
{
    let burst = sampling.samples_per_read.clamp(1, MAX_SAMPLES_PER_READ);
    let mut xs: Vec<u16, MAX_SAMPLES_PER_READ> = Vec::new();
    let mut ys: Vec<u16, MAX_SAMPLES_PER_READ> = Vec::new();
    let mut pressure = None;

    for _ in 0..burst {
        let Some(sample) = source.read_raw_sample(rotation) else {
            break;
        };
        // Capacity is MAX_SAMPLES_PER_READ and burst never exceeds it.
        let _ = xs.push(sample.x);
        let _ = ys.push(sample.y);
        pressure = pressure.or(sample.pressure);
    }

    if xs.is_empty() {
        return Ok(None);
    }

    let x = nearest_run(&xs, sampling.min_run)?;
    let y = nearest_run(&ys, sampling.min_run)?;
    log::trace!(
        "touch_filter: burst={} x={} run_x={} y={} run_y={}",
        xs.len(),
        x.average,
        x.length,
        y.average,
        y.length
    );

    Ok(Some(FilteredSample {
        raw: RawSample {
            x: x.average,
            y: y.average,
            pressure,
        },
        confidence: x.length.min(y.length),
    }))
}
