use std::{
    env,
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
    process,
};

use xpt2046_touch::{
    AffineTransform, RawSample, RawSampleSource, RotationFrame, ScreenWindow, TouchEvent,
    TouchPipeline,
};

const DEFAULT_WINDOW: ScreenWindow = ScreenWindow::new(320, 240);

#[derive(Clone, Copy)]
enum ReplayTick {
    Pressed(RawSample),
    Released,
}

struct ReplayTrace {
    window: ScreenWindow,
    rotation: RotationFrame,
    transform: AffineTransform,
    ticks: Vec<ReplayTick>,
}

/// Feeds the same reading for every read of a tick's burst.
struct ReplaySource {
    current: Option<RawSample>,
}

impl RawSampleSource for ReplaySource {
    fn read_raw_sample(&mut self, _rotation: RotationFrame) -> Option<RawSample> {
        self.current
    }
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        return Err(usage());
    }

    let mut trace_path: Option<PathBuf> = None;
    let mut expect_path: Option<PathBuf> = None;

    let mut idx = 1usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "--expect" => {
                idx += 1;
                let Some(path) = args.get(idx) else {
                    return Err("missing path after --expect".into());
                };
                expect_path = Some(PathBuf::from(path));
            }
            "-h" | "--help" => {
                println!("{}", usage());
                return Ok(());
            }
            value if value.starts_with('-') => {
                return Err(format!("unknown argument: {value}"));
            }
            value => {
                if trace_path.is_some() {
                    return Err("multiple trace paths provided".into());
                }
                trace_path = Some(PathBuf::from(value));
            }
        }
        idx += 1;
    }

    let trace_path = trace_path.ok_or_else(usage)?;
    let trace = parse_trace(&trace_path)?;

    let mut pipeline: TouchPipeline = TouchPipeline::new(trace.window);
    pipeline.set_rotation(trace.rotation);
    pipeline.apply_calibration(trace.transform);

    let mut source = ReplaySource { current: None };
    let mut events: Vec<(usize, TouchEvent)> = Vec::new();
    for (tick, replay) in trace.ticks.iter().enumerate() {
        source.current = match replay {
            ReplayTick::Pressed(sample) => Some(*sample),
            ReplayTick::Released => None,
        };
        let confirmed = pipeline
            .tick(&mut source)
            .map_err(|e| format!("tick {tick}: {e}"))?;
        if let Some(event) = confirmed {
            events.push((tick, event));
        }
    }

    println!("event,tick,x,y");
    for (tick, event) in &events {
        println!("event,{tick},{},{}", event.x, event.y);
    }

    if let Some(expect_path) = expect_path {
        let expected = parse_expected_events(&expect_path)?;
        let actual: Vec<(u16, u16)> = events.iter().map(|(_, e)| (e.x, e.y)).collect();
        if actual != expected {
            eprintln!("expected events: {}", format_points(&expected));
            eprintln!("actual events:   {}", format_points(&actual));
            return Err("event sequence mismatch".into());
        }
    }

    Ok(())
}

fn usage() -> String {
    "usage: touch_replay <trace.txt> [--expect expected_events.txt]".to_string()
}

fn format_points(points: &[(u16, u16)]) -> String {
    points
        .iter()
        .map(|(x, y)| format!("{x}:{y}"))
        .collect::<Vec<_>>()
        .join(",")
}

fn parse_trace(path: &Path) -> Result<ReplayTrace, String> {
    let file = File::open(path).map_err(|e| format!("failed to open {}: {e}", path.display()))?;
    let reader = BufReader::new(file);

    let mut window = DEFAULT_WINDOW;
    let mut rotation = RotationFrame::Identity;
    let mut transform: Option<AffineTransform> = None;
    let mut ticks = Vec::new();
    for (line_no, line_result) in reader.lines().enumerate() {
        let line_no = line_no + 1;
        let line = line_result
            .map_err(|e| format!("failed to read {}:{}: {e}", path.display(), line_no))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = trimmed.split_whitespace().collect();
        match parts.as_slice() {
            ["-"] => ticks.push(ReplayTick::Released),
            ["window", w, h] => {
                window = ScreenWindow::new(
                    parse_u16(w, path, line_no, "width")?,
                    parse_u16(h, path, line_no, "height")?,
                );
            }
            ["rotation", r] => {
                rotation = RotationFrame::from_index(parse_u8(r, path, line_no, "rotation")?);
            }
            ["cal", coeffs @ ..] if coeffs.len() == 6 => {
                let mut values = [0.0f64; 6];
                for (slot, raw) in values.iter_mut().zip(coeffs) {
                    *slot = parse_f64(raw, path, line_no, "coefficient")?;
                }
                transform = Some(AffineTransform {
                    cal_x: [values[0], values[1], values[2]],
                    cal_y: [values[3], values[4], values[5]],
                });
            }
            [x, y] => {
                ticks.push(ReplayTick::Pressed(RawSample::new(
                    parse_u16(x, path, line_no, "x")?,
                    parse_u16(y, path, line_no, "y")?,
                )));
            }
            _ => {
                return Err(format!(
                    "{}:{} invalid trace line '{}'",
                    path.display(),
                    line_no,
                    trimmed
                ));
            }
        }
    }

    let transform =
        transform.ok_or_else(|| format!("{}: missing 'cal' line", path.display()))?;
    Ok(ReplayTrace {
        window,
        rotation,
        transform,
        ticks,
    })
}

fn parse_expected_events(path: &Path) -> Result<Vec<(u16, u16)>, String> {
    let file = File::open(path).map_err(|e| format!("failed to open {}: {e}", path.display()))?;
    let reader = BufReader::new(file);

    let mut events = Vec::new();
    for (line_no, line_result) in reader.lines().enumerate() {
        let line_no = line_no + 1;
        let line = line_result
            .map_err(|e| format!("failed to read {}:{}: {e}", path.display(), line_no))?;
        let token = line.trim();
        if token.is_empty() || token.starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = token.split_whitespace().collect();
        let [x, y] = parts.as_slice() else {
            return Err(format!(
                "{}:{} invalid expected event: {}",
                path.display(),
                line_no,
                token
            ));
        };
        events.push((
            parse_u16(x, path, line_no, "x")?,
            parse_u16(y, path, line_no, "y")?,
        ));
    }

    Ok(events)
}

fn parse_u16(raw: &str, path: &Path, line_no: usize, field: &str) -> Result<u16, String> {
    raw.trim()
        .parse::<u16>()
        .map_err(|e| parse_error(raw, path, line_no, field, e))
}

fn parse_u8(raw: &str, path: &Path, line_no: usize, field: &str) -> Result<u8, String> {
    raw.trim()
        .parse::<u8>()
        .map_err(|e| parse_error(raw, path, line_no, field, e))
}

fn parse_f64(raw: &str, path: &Path, line_no: usize, field: &str) -> Result<f64, String> {
    raw.trim()
        .parse::<f64>()
        .map_err(|e| parse_error(raw, path, line_no, field, e))
}

fn parse_error(
    raw: &str,
    path: &Path,
    line_no: usize,
    field: &str,
    err: impl std::fmt::Display,
) -> String {
    format!(
        "{}:{} invalid {} '{}': {}",
        path.display(),
        line_no,
        field,
        raw.trim(),
        err
    )
}
