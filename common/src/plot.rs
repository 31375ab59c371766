//! Plot geometry: visible ranges, zoom, tick marks and the curve path.
//!
//! Everything is computed in a normalized viewbox, so the UI only has to scale it to the size
//! of the plot area.

use crate::alarm::Bounds;
use crate::sensor::Reading;

/// Side length of the square viewbox the curve path is expressed in.
pub const VIEWBOX_SIZE: f64 = 1000.0;

/// Fraction of the data span added above and below when auto-ranging.
const AUTO_RANGE_PADDING: f64 = 0.05;

/// Aim for about this many labelled ticks per axis.
const TARGET_TICKS: f64 = 5.0;

/// A closed interval on one axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisRange {
    pub lower: f64,
    pub upper: f64,
}

impl AxisRange {
    /// Build a range from two values in any order. A degenerate range is widened to
    /// `min_span` around its center.
    pub fn spanning(a: f64, b: f64, min_span: f64) -> Self {
        let (lower, upper) = if a <= b { (a, b) } else { (b, a) };
        if upper - lower < min_span {
            let center = (lower + upper) / 2.0;
            Self {
                lower: center - min_span / 2.0,
                upper: center + min_span / 2.0,
            }
        } else {
            Self { lower, upper }
        }
    }

    pub fn span(&self) -> f64 {
        self.upper - self.lower
    }

    pub fn center(&self) -> f64 {
        (self.lower + self.upper) / 2.0
    }

    /// Position of `value` in this range: 0 at `lower`, 1 at `upper`.
    pub fn normalize(&self, value: f64) -> f64 {
        (value - self.lower) / self.span()
    }

    /// Scale the span by `factor`, keeping the center fixed.
    pub fn scaled(&self, factor: f64) -> Self {
        let half = self.span() * factor / 2.0;
        let center = self.center();
        Self {
            lower: center - half,
            upper: center + half,
        }
    }

    pub fn padded(&self, fraction: f64) -> Self {
        let pad = self.span() * fraction;
        Self {
            lower: self.lower - pad,
            upper: self.upper + pad,
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        (self.lower..=self.upper).contains(&value)
    }
}

/// A labelled tick on an axis.
#[derive(Clone, Debug, PartialEq)]
pub struct Tick {
    /// Position along the axis in `0.0..=1.0`. For the y axis 0 is the top edge.
    pub position: f64,
    pub label: String,
}

/// One frame worth of plot geometry.
#[derive(Clone, Debug, PartialEq)]
pub struct PlotFrame {
    pub x_range: AxisRange,
    pub y_range: AxisRange,
    /// SVG path commands in a `VIEWBOX_SIZE` square. Empty when there is nothing to draw.
    pub curve: String,
    /// Vertical position of the max limit line, `None` if it is outside the visible range.
    pub upper_limit: Option<f64>,
    pub lower_limit: Option<f64>,
    pub x_ticks: Vec<Tick>,
    pub y_ticks: Vec<Tick>,
}

/// The y-axis viewport. Follows the data until the user zooms, then stays where it was put.
#[derive(Clone, Debug, Default)]
pub struct PlotView {
    manual_y: Option<AxisRange>,
}

impl PlotView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_auto_ranging(&self) -> bool {
        self.manual_y.is_none()
    }

    /// Scale the visible y span by `factor` around its center.
    ///
    /// `current` is the range currently on screen, used as the starting point when the view
    /// was still auto-ranging.
    pub fn zoom(&mut self, factor: f64, current: AxisRange) {
        let base = self.manual_y.unwrap_or(current);
        let zoomed = base.scaled(factor);
        log::debug!(
            "Zoom by {factor}: {:.2}..{:.2} -> {:.2}..{:.2}",
            base.lower,
            base.upper,
            zoomed.lower,
            zoomed.upper
        );
        self.manual_y = Some(zoomed);
    }

    pub fn auto_range(&mut self) {
        self.manual_y = None;
    }

    pub fn y_range<'a>(&self, readings: impl IntoIterator<Item = &'a Reading>, bounds: Bounds) -> AxisRange {
        if let Some(range) = self.manual_y {
            return range;
        }

        let (low, high) = readings
            .into_iter()
            .map(|r| r.temperature_celsius)
            .fold(None, |acc: Option<(f64, f64)>, t| match acc {
                None => Some((t, t)),
                Some((low, high)) => Some((low.min(t), high.max(t))),
            })
            .unwrap_or((bounds.min, bounds.max));

        AxisRange::spanning(low, high, 1.0).padded(AUTO_RANGE_PADDING)
    }

    pub fn frame(&self, readings: &[Reading], bounds: Bounds) -> PlotFrame {
        let x_range = x_range(readings);
        let y_range = self.y_range(readings, bounds);

        let limit_position = |limit: f64| {
            y_range
                .contains(limit)
                .then(|| 1.0 - y_range.normalize(limit))
        };

        PlotFrame {
            x_range,
            y_range,
            curve: curve_path(readings, x_range, y_range),
            upper_limit: limit_position(bounds.max),
            lower_limit: limit_position(bounds.min),
            x_ticks: ticks(x_range, false),
            y_ticks: ticks(y_range, true),
        }
    }
}

fn x_range(readings: &[Reading]) -> AxisRange {
    match (readings.first(), readings.last()) {
        (Some(first), Some(last)) => AxisRange::spanning(first.elapsed_secs, last.elapsed_secs, 1.0),
        _ => AxisRange { lower: 0.0, upper: 1.0 },
    }
}

fn curve_path(readings: &[Reading], x_range: AxisRange, y_range: AxisRange) -> String {
    let mut path = String::with_capacity(readings.len() * 16);

    for (i, reading) in readings.iter().enumerate() {
        let x = x_range.normalize(reading.elapsed_secs) * VIEWBOX_SIZE;
        let y = (1.0 - y_range.normalize(reading.temperature_celsius)) * VIEWBOX_SIZE;
        let command = if i == 0 { "M" } else { " L" };
        path.push_str(&format!("{command} {x:.1} {y:.1}"));
    }

    path
}

/// Pick a step of 1, 2 or 5 times a power of ten that gives roughly `TARGET_TICKS` ticks.
fn nice_step(span: f64) -> f64 {
    let raw = span / TARGET_TICKS;
    let magnitude = 10f64.powf(raw.log10().floor());
    let residual = raw / magnitude;

    let nice = if residual < 1.5 {
        1.0
    } else if residual < 3.5 {
        2.0
    } else if residual < 7.5 {
        5.0
    } else {
        10.0
    };

    nice * magnitude
}

fn ticks(range: AxisRange, top_down: bool) -> Vec<Tick> {
    let span = range.span();
    if !(span.is_finite() && span > 0.0) {
        return Vec::new();
    }

    let step = nice_step(span);
    let decimals = (-step.log10().floor()).max(0.0) as usize;

    // Tolerate rounding noise so ticks exactly on an edge are kept.
    let first = (range.lower / step - 1e-9).ceil() as i64;
    let last = (range.upper / step + 1e-9).floor() as i64;

    (first..=last)
        .map(|i| {
            let value = i as f64 * step;
            let position = range.normalize(value);
            Tick {
                position: if top_down { 1.0 - position } else { position },
                // Avoid printing "-0".
                label: format!("{:.*}", decimals, if value == 0.0 { 0.0 } else { value }),
            }
        })
        .collect()
}
