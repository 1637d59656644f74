use core::ops::ControlFlow;

use embedded_hal_bus::spi::ExclusiveDevice;
use esp_hal::{
    delay::Delay,
    gpio::{Level, Output, OutputConfig},
    spi::{
        master::{Config as SpiConfig, Spi},
        Mode as SpiMode,
    },
    time::Rate,
};
use xpt2046_touch::{active_config, CalibrationHost, ScreenWindow, TouchPipeline, Xpt2046};

const SCREEN_WIDTH: u16 = 320;
const SCREEN_HEIGHT: u16 = 240;
// XPT2046 DCLK tops out around 2.5 MHz.
const TOUCH_SPI_KHZ: u32 = 2_000;

/// Calibration targets go to the serial console; there is no display here.
struct SerialPrompt {
    delay: Delay,
    tick_ms: u32,
}

impl CalibrationHost for SerialPrompt {
    fn prompt_user(&mut self, point_index: usize, screen_x: u16, screen_y: u16) {
        log::info!("touch_cal: press target index={point_index} x={screen_x} y={screen_y}");
    }

    fn yield_to_scheduler(&mut self) -> ControlFlow<()> {
        self.delay.delay_millis(self.tick_ms);
        ControlFlow::Continue(())
    }
}

pub(crate) fn run() -> ! {
    esp_println::logger::init_logger(log::LevelFilter::Info);
    let peripherals = esp_hal::init(esp_hal::Config::default());
    let config = active_config();

    let spi_cfg = SpiConfig::default()
        .with_frequency(Rate::from_khz(TOUCH_SPI_KHZ))
        .with_mode(SpiMode::_0);
    let spi = Spi::new(peripherals.SPI2, spi_cfg)
        .expect("failed to init touch SPI")
        .with_sck(peripherals.GPIO25)
        .with_mosi(peripherals.GPIO32)
        .with_miso(peripherals.GPIO39);
    let cs = Output::new(peripherals.GPIO33, Level::High, OutputConfig::default());
    let device =
        ExclusiveDevice::new(spi, cs, Delay::new()).expect("failed to claim touch chip select");

    let mut touch = Xpt2046::with_sampling(device, &config.sampling);
    let mut pipeline: TouchPipeline =
        TouchPipeline::new(ScreenWindow::new(SCREEN_WIDTH, SCREEN_HEIGHT));
    let mut host = SerialPrompt {
        delay: Delay::new(),
        tick_ms: config.debounce.tick_ms,
    };
    let delay = Delay::new();

    log::info!(
        "touch: started width={SCREEN_WIDTH} height={SCREEN_HEIGHT} tick_ms={}",
        config.debounce.tick_ms
    );

    loop {
        if let Err(err) = pipeline.check_calibrated(&mut touch, &mut host) {
            log::warn!("touch_cal: failed err={err}; retrying");
            continue;
        }
        if let Err(err) = pipeline.tick(&mut touch) {
            log::warn!("touch: tick failed err={err}");
        }
        while let Some(event) = pipeline.get_touch_key_event() {
            log::info!("touch: press x={} y={}", event.x, event.y);
        }
        delay.delay_millis(config.debounce.tick_ms);
    }
}
