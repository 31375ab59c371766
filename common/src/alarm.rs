//! Limit checking and the blink state machine that goes with it.

use serde::{Deserialize, Serialize};

/// User-configured alarm thresholds in °C.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AlarmState {
    #[default]
    Normal,
    AboveMax,
    BelowMin,
}

impl AlarmState {
    pub fn is_alarm(self) -> bool {
        self != Self::Normal
    }
}

/// Derive the alarm state of `temperature` against `bounds`.
///
/// Both comparisons are strict and the upper limit is checked first.
pub fn evaluate(temperature: f64, bounds: Bounds) -> AlarmState {
    if temperature > bounds.max {
        AlarmState::AboveMax
    } else if temperature < bounds.min {
        AlarmState::BelowMin
    } else {
        AlarmState::Normal
    }
}

/// What the blink timer has to do after an update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlinkChange {
    Unchanged,
    Started,
    Stopped,
}

/// What the plot background should show.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backdrop {
    Plain,
    Highlight(AlarmState),
}

/// Tracks the alarm state of the latest reading and the blink phase while out of bounds.
#[derive(Clone, Debug, Default)]
pub struct AlarmMonitor {
    state: AlarmState,
    highlighted: bool,
}

impl AlarmMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> AlarmState {
        self.state
    }

    pub fn is_blinking(&self) -> bool {
        self.state.is_alarm()
    }

    pub fn update(&mut self, temperature: f64, bounds: Bounds) -> BlinkChange {
        let next = evaluate(temperature, bounds);
        let previous = std::mem::replace(&mut self.state, next);

        match (previous.is_alarm(), next.is_alarm()) {
            (false, true) => {
                log::info!("Alarm raised: {next:?} at {temperature:.2}°C");
                self.highlighted = false;
                BlinkChange::Started
            }
            (true, false) => {
                log::info!("Alarm cleared at {temperature:.2}°C");
                self.highlighted = false;
                BlinkChange::Stopped
            }
            (true, true) if previous != next => {
                log::info!("Alarm changed from {previous:?} to {next:?} at {temperature:.2}°C");
                BlinkChange::Unchanged
            }
            _ => BlinkChange::Unchanged,
        }
    }

    /// Flip the blink phase. Does nothing unless an alarm is active.
    pub fn toggle_blink(&mut self) {
        if self.is_blinking() {
            self.highlighted = !self.highlighted;
        }
    }

    /// Drop back to `Normal`, e.g. when the feed is stopped.
    pub fn reset(&mut self) -> BlinkChange {
        let was_blinking = self.is_blinking();
        self.state = AlarmState::Normal;
        self.highlighted = false;

        if was_blinking {
            BlinkChange::Stopped
        } else {
            BlinkChange::Unchanged
        }
    }

    pub fn backdrop(&self) -> Backdrop {
        if self.highlighted && self.is_blinking() {
            Backdrop::Highlight(self.state)
        } else {
            Backdrop::Plain
        }
    }
}
