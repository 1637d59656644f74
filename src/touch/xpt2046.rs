//! XPT2046 resistive touch controller over an `embedded-hal` SPI device.

use core::fmt;

use embedded_hal::spi::SpiDevice;

use crate::config::SamplingConfig;

use super::source::RawSampleSource;
use super::types::{RawSample, RotationFrame};

pub const XPT2046_ADC_MAX: u16 = 4095;
pub const XPT2046_PRESSURE_THRESHOLD: u16 = 300;

const XPT2046_READ_X: u8 = 0xD1;
const XPT2046_READ_Y: u8 = 0x91;
const XPT2046_READ_Z1: u8 = 0xB1;
const XPT2046_READ_Z2: u8 = 0xC1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Xpt2046Channel {
    X,
    Y,
    Z1,
    Z2,
}

impl Xpt2046Channel {
    const fn command(self) -> u8 {
        match self {
            Self::X => XPT2046_READ_X,
            Self::Y => XPT2046_READ_Y,
            Self::Z1 => XPT2046_READ_Z1,
            Self::Z2 => XPT2046_READ_Z2,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum Xpt2046Error<E> {
    Spi(E),
}

impl<E: fmt::Debug> fmt::Display for Xpt2046Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spi(err) => write!(f, "xpt2046 spi error: {err:?}"),
        }
    }
}

pub struct Xpt2046<SPI> {
    spi: SPI,
    pressure_threshold: u16,
    adc_max: u16,
}

impl<SPI> Xpt2046<SPI>
where
    SPI: SpiDevice,
{
    pub fn new(spi: SPI) -> Self {
        Self {
            spi,
            pressure_threshold: XPT2046_PRESSURE_THRESHOLD,
            adc_max: XPT2046_ADC_MAX,
        }
    }

    /// Uses the same pressure gate and ADC full scale as the filter and
    /// mapper, so both rotation reversals agree.
    pub fn with_sampling(spi: SPI, sampling: &SamplingConfig) -> Self {
        Self {
            spi,
            pressure_threshold: sampling.pressure_threshold,
            adc_max: sampling.adc_max,
        }
    }

    pub fn adc_max(&self) -> u16 {
        self.adc_max
    }

    pub fn release(self) -> SPI {
        self.spi
    }

    /// One 12-bit conversion. The result starts one bit after the MSB of the
    /// second byte; the first byte clocks out during the command.
    pub fn read_channel(
        &mut self,
        channel: Xpt2046Channel,
    ) -> Result<u16, Xpt2046Error<SPI::Error>> {
        let mut buf = [channel.command(), 0, 0];
        self.spi
            .transfer_in_place(&mut buf)
            .map_err(Xpt2046Error::Spi)?;
        let value = ((u16::from(buf[1]) << 8) | u16::from(buf[2])) >> 3;
        Ok(value.min(self.adc_max))
    }

    /// Reads X, Y, Z1 and Z2 and reports a sample only when the pressure
    /// estimate clears the threshold.
    pub fn try_read_raw(
        &mut self,
        rotation: RotationFrame,
    ) -> Result<Option<RawSample>, Xpt2046Error<SPI::Error>> {
        let x = self.read_channel(Xpt2046Channel::X)?;
        let y = self.read_channel(Xpt2046Channel::Y)?;
        let z1 = self.read_channel(Xpt2046Channel::Z1)?;
        let z2 = self.read_channel(Xpt2046Channel::Z2)?;

        let pressure = pressure_estimate(z1, z2, self.adc_max);
        if pressure <= self.pressure_threshold {
            return Ok(None);
        }

        let (x, y) = rotation.apply(x, y, self.adc_max);
        Ok(Some(RawSample {
            x,
            y,
            pressure: Some(pressure),
        }))
    }
}

fn pressure_estimate(z1: u16, z2: u16, adc_max: u16) -> u16 {
    let z = (i32::from(adc_max) - i32::from(z2)) + i32::from(z1);
    z.unsigned_abs().min(u32::from(u16::MAX)) as u16
}

impl<SPI> RawSampleSource for Xpt2046<SPI>
where
    SPI: SpiDevice,
{
    fn read_raw_sample(&mut self, rotation: RotationFrame) -> Option<RawSample> {
        match self.try_read_raw(rotation) {
            Ok(sample) => sample,
            Err(err) => {
                log::warn!("xpt2046: read failed err={err:?}");
                None
            }
        }
    }
}
