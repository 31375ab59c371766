use crate::alarm::{AlarmMonitor, AlarmState, Backdrop, BlinkChange, Bounds};
use crate::buffer::RollingBuffer;
use crate::plot::{PlotFrame, PlotView};
use crate::sensor::{Reading, SensorError, SimulatedSensor, TemperatureSource};
use crate::settings::{LimitSettings, Settings, ZoomSettings};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunPhase {
    /// Never started.
    Ready,
    Running,
    Stopped,
}

/// Which colour scheme the status line should use.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusTone {
    Idle,
    Ok,
    AboveMax,
    BelowMin,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Status {
    pub tone: StatusTone,
    pub text: String,
}

/// Result of one data tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickOutcome {
    pub reading: Reading,
    pub alarm: AlarmState,
    pub blink: BlinkChange,
}

/// One monitoring session: the feed, its recent history, the alarm limits and the plot view.
///
/// The UI owns exactly one of these and forwards every timer tick and user action to it.
pub struct Monitor<S = SimulatedSensor> {
    source: S,
    history: RollingBuffer<Reading>,
    bounds: Bounds,
    limits: LimitSettings,
    zoom: ZoomSettings,
    alarm: AlarmMonitor,
    view: PlotView,
    phase: RunPhase,
    /// Set by `tick`, cleared by `start`: the latest reading belongs to the current run.
    sampled_since_start: bool,
}

impl Monitor<SimulatedSensor> {
    pub fn new(settings: &Settings) -> Result<Self, SensorError> {
        let sensor = SimulatedSensor::new(&settings.signal, settings.sample_interval())?;
        Ok(Self::with_source(settings, sensor))
    }
}

impl<S: TemperatureSource> Monitor<S> {
    /// Build a session around any temperature source.
    ///
    /// # Panics
    ///
    /// If `settings.history_len` is zero. Use [`Settings::validate`] on untrusted settings first.
    pub fn with_source(settings: &Settings, source: S) -> Self {
        Self {
            source,
            history: RollingBuffer::new(settings.history_len),
            bounds: settings.limits.bounds(),
            limits: settings.limits.clone(),
            zoom: settings.zoom.clone(),
            alarm: AlarmMonitor::new(),
            view: PlotView::new(),
            phase: RunPhase::Ready,
            sampled_since_start: false,
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == RunPhase::Running
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn alarm_state(&self) -> AlarmState {
        self.alarm.state()
    }

    pub fn is_blinking(&self) -> bool {
        self.alarm.is_blinking()
    }

    pub fn latest(&self) -> Option<Reading> {
        self.history.latest().copied()
    }

    pub fn history(&self) -> &RollingBuffer<Reading> {
        &self.history
    }

    /// Start (or resume) the feed. Returns `false` if it was already running.
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            return false;
        }

        log::info!("Simulation started");
        self.phase = RunPhase::Running;
        self.sampled_since_start = false;
        true
    }

    /// Stop the feed. Any active alarm is dropped, so the blink stops with it.
    pub fn stop(&mut self) -> BlinkChange {
        if self.phase == RunPhase::Running {
            log::info!("Simulation stopped after {} readings in view", self.history.len());
        }
        self.phase = RunPhase::Stopped;
        self.alarm.reset()
    }

    /// Take one reading. Does nothing unless the feed is running.
    pub fn tick(&mut self) -> Option<TickOutcome> {
        if !self.is_running() {
            return None;
        }

        let reading = self.source.next_reading();
        self.history.push(reading);
        self.sampled_since_start = true;
        let blink = self.alarm.update(reading.temperature_celsius, self.bounds);

        log::debug!(
            "t={:.1}s temperature={:.2}°C state={:?}",
            reading.elapsed_secs,
            reading.temperature_celsius,
            self.alarm.state()
        );

        Some(TickOutcome {
            reading,
            alarm: self.alarm.state(),
            blink,
        })
    }

    pub fn blink_tick(&mut self) {
        self.alarm.toggle_blink();
    }

    pub fn backdrop(&self) -> Backdrop {
        self.alarm.backdrop()
    }

    pub fn set_min_limit(&mut self, value: f64) -> BlinkChange {
        self.bounds.min = self.limits.clamp(value);
        log::debug!("Min limit set to {:.2}°C", self.bounds.min);
        self.reevaluate()
    }

    pub fn set_max_limit(&mut self, value: f64) -> BlinkChange {
        self.bounds.max = self.limits.clamp(value);
        log::debug!("Max limit set to {:.2}°C", self.bounds.max);
        self.reevaluate()
    }

    /// Move the min limit by `steps` increments of the configured step size.
    pub fn step_min_limit(&mut self, steps: i32) -> BlinkChange {
        self.set_min_limit(self.bounds.min + f64::from(steps) * self.limits.step)
    }

    pub fn step_max_limit(&mut self, steps: i32) -> BlinkChange {
        self.set_max_limit(self.bounds.max + f64::from(steps) * self.limits.step)
    }

    /// Limits changed: the latest reading is judged against the new ones right away.
    fn reevaluate(&mut self) -> BlinkChange {
        match (self.is_running() && self.sampled_since_start, self.history.latest()) {
            (true, Some(latest)) => self.alarm.update(latest.temperature_celsius, self.bounds),
            _ => BlinkChange::Unchanged,
        }
    }

    pub fn zoom_in(&mut self) {
        let current = self.visible_y_range();
        self.view.zoom(self.zoom.in_factor, current);
    }

    pub fn zoom_out(&mut self) {
        let current = self.visible_y_range();
        self.view.zoom(self.zoom.out_factor, current);
    }

    pub fn auto_range(&mut self) {
        self.view.auto_range();
    }

    fn visible_y_range(&self) -> crate::plot::AxisRange {
        self.view.y_range(self.history.iter(), self.bounds)
    }

    pub fn plot_frame(&self) -> PlotFrame {
        self.view.frame(&self.history.snapshot(), self.bounds)
    }

    pub fn status(&self) -> Status {
        let idle = |text: &str| Status {
            tone: StatusTone::Idle,
            text: text.to_string(),
        };

        match self.phase {
            RunPhase::Ready => idle("Ready. Start the simulation."),
            RunPhase::Stopped => idle("Simulation stopped."),
            RunPhase::Running => match self.history.latest().filter(|_| self.sampled_since_start) {
                // Running but no reading taken in this run yet.
                None => Status {
                    tone: StatusTone::Ok,
                    text: "Simulation running...".to_string(),
                },
                Some(latest) => {
                    let temperature = latest.temperature_celsius;
                    match self.alarm.state() {
                        AlarmState::Normal => Status {
                            tone: StatusTone::Ok,
                            text: format!("OK ({temperature:.2}°C)"),
                        },
                        AlarmState::AboveMax => Status {
                            tone: StatusTone::AboveMax,
                            text: format!("ALARM: maximum temperature exceeded! ({temperature:.2}°C)"),
                        },
                        AlarmState::BelowMin => Status {
                            tone: StatusTone::BelowMin,
                            text: format!("ALARM: minimum temperature undercut! ({temperature:.2}°C)"),
                        },
                    }
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;

    /// Replays a fixed list of temperatures, 0.2 s apart.
    struct ScriptedSource {
        temperatures: VecDeque<f64>,
        samples: u32,
    }

    impl ScriptedSource {
        fn new(temperatures: &[f64]) -> Self {
            Self {
                temperatures: temperatures.iter().copied().collect(),
                samples: 0,
            }
        }
    }

    impl TemperatureSource for ScriptedSource {
        fn next_reading(&mut self) -> Reading {
            self.samples += 1;
            Reading {
                elapsed_secs: f64::from(self.samples) * 0.2,
                temperature_celsius: self.temperatures.pop_front().unwrap_or(20.0),
            }
        }
    }

    fn monitor(temperatures: &[f64]) -> Monitor<ScriptedSource> {
        Monitor::with_source(&Settings::default(), ScriptedSource::new(temperatures))
    }

    #[test]
    fn ticks_only_while_running() {
        let mut monitor = monitor(&[20.0, 21.0]);
        assert_eq!(monitor.phase(), RunPhase::Ready);
        assert_eq!(monitor.tick(), None);

        assert!(monitor.start());
        assert!(!monitor.start());
        let outcome = monitor.tick().unwrap();
        assert_eq!(outcome.reading.temperature_celsius, 20.0);
        assert_eq!(outcome.alarm, AlarmState::Normal);

        monitor.stop();
        assert_eq!(monitor.tick(), None);
        assert_eq!(monitor.history().len(), 1);
    }

    #[test]
    fn resuming_continues_the_time_axis() {
        let mut monitor = monitor(&[]);
        monitor.start();
        monitor.tick();
        monitor.stop();
        monitor.start();
        let outcome = monitor.tick().unwrap();

        assert!((outcome.reading.elapsed_secs - 0.4).abs() < 1e-12);
        assert_eq!(monitor.history().len(), 2);
    }

    #[test]
    fn history_is_capped() {
        let mut monitor = monitor(&[]);
        monitor.start();
        for _ in 0..150 {
            monitor.tick();
        }

        let history = monitor.history().snapshot();
        assert_eq!(history.len(), 100);
        assert!((history[0].elapsed_secs - 51.0 * 0.2).abs() < 1e-9);
        assert!(history.windows(2).all(|w| w[0].elapsed_secs < w[1].elapsed_secs));
    }

    #[test]
    fn blink_follows_alarm_transitions() {
        let mut monitor = monitor(&[20.0, 30.0, 31.0, 10.0, 20.0]);
        monitor.start();

        let blinks: Vec<BlinkChange> = (0..5).map(|_| monitor.tick().unwrap().blink).collect();
        assert_eq!(
            blinks,
            [
                BlinkChange::Unchanged,
                BlinkChange::Started,
                BlinkChange::Unchanged,
                BlinkChange::Unchanged,
                BlinkChange::Stopped,
            ]
        );
    }

    #[test]
    fn stop_clears_the_alarm() {
        let mut monitor = monitor(&[30.0]);
        monitor.start();
        monitor.tick();
        monitor.blink_tick();
        assert_eq!(monitor.backdrop(), Backdrop::Highlight(AlarmState::AboveMax));

        assert_eq!(monitor.stop(), BlinkChange::Stopped);
        assert_eq!(monitor.backdrop(), Backdrop::Plain);
        assert_eq!(monitor.status().text, "Simulation stopped.");
    }

    #[test]
    fn resuming_reports_running_until_the_next_reading() {
        let mut monitor = monitor(&[30.0, 20.0]);
        monitor.start();
        monitor.tick();
        assert_eq!(monitor.status().tone, StatusTone::AboveMax);

        monitor.stop();
        monitor.start();
        assert_eq!(
            monitor.status(),
            Status {
                tone: StatusTone::Ok,
                text: "Simulation running...".to_string()
            }
        );

        monitor.tick();
        assert_eq!(monitor.status().text, "OK (20.00°C)");
    }

    #[test]
    fn limits_ignore_a_reading_from_before_the_resume() {
        let mut monitor = monitor(&[24.0]);
        monitor.start();
        monitor.tick();
        monitor.stop();
        monitor.start();

        assert_eq!(monitor.set_max_limit(20.0), BlinkChange::Unchanged);
        assert!(!monitor.is_blinking());
    }

    #[test]
    #[should_panic]
    fn empty_history_is_rejected() {
        let settings = Settings {
            history_len: 0,
            ..Settings::default()
        };
        let _ = Monitor::with_source(&settings, ScriptedSource::new(&[]));
    }

    #[test]
    fn changing_limits_reevaluates_the_latest_reading() {
        let mut monitor = monitor(&[24.0]);
        monitor.start();
        monitor.tick();

        assert_eq!(monitor.set_max_limit(23.0), BlinkChange::Started);
        assert_eq!(monitor.alarm_state(), AlarmState::AboveMax);

        assert_eq!(monitor.step_max_limit(4), BlinkChange::Stopped);
        assert_eq!(monitor.bounds().max, 25.0);
    }

    #[test]
    fn limits_do_not_raise_alarms_while_stopped() {
        let mut monitor = monitor(&[24.0]);
        monitor.start();
        monitor.tick();
        monitor.stop();

        assert_eq!(monitor.set_max_limit(0.0), BlinkChange::Unchanged);
        assert!(!monitor.is_blinking());
    }

    #[test]
    fn limits_are_clamped_to_the_input_range() {
        let mut monitor = monitor(&[]);

        monitor.set_max_limit(500.0);
        monitor.set_min_limit(-500.0);
        assert_eq!(monitor.bounds(), Bounds { min: -50.0, max: 150.0 });

        monitor.step_min_limit(-1);
        assert_eq!(monitor.bounds().min, -50.0);
    }

    #[test]
    fn status_messages() {
        let mut monitor = monitor(&[20.0, 30.0, 10.0]);
        assert_eq!(monitor.status().text, "Ready. Start the simulation.");

        monitor.start();
        assert_eq!(monitor.status().text, "Simulation running...");

        monitor.tick();
        assert_eq!(
            monitor.status(),
            Status {
                tone: StatusTone::Ok,
                text: "OK (20.00°C)".to_string()
            }
        );

        monitor.tick();
        assert_eq!(monitor.status().tone, StatusTone::AboveMax);
        assert_eq!(monitor.status().text, "ALARM: maximum temperature exceeded! (30.00°C)");

        monitor.tick();
        assert_eq!(monitor.status().tone, StatusTone::BelowMin);
        assert_eq!(monitor.status().text, "ALARM: minimum temperature undercut! (10.00°C)");
    }

    #[test]
    fn zoom_narrows_and_widens_the_view() {
        let mut monitor = monitor(&[10.0, 30.0]);
        monitor.start();
        monitor.tick();
        monitor.tick();
        let before = monitor.plot_frame().y_range;

        monitor.zoom_in();
        assert!((monitor.plot_frame().y_range.span() - before.span() * 0.8).abs() < 1e-9);

        monitor.zoom_out();
        monitor.zoom_out();
        assert!((monitor.plot_frame().y_range.span() - before.span() * 1.25).abs() < 1e-9);

        monitor.auto_range();
        assert_eq!(monitor.plot_frame().y_range, before);
    }

    #[test]
    fn simulated_monitor_builds_from_settings() {
        let mut monitor = Monitor::new(&Settings::default()).unwrap();
        monitor.start();
        let reading = monitor.tick().unwrap().reading;

        assert!((reading.elapsed_secs - 0.2).abs() < 1e-12);
        assert!((reading.temperature_celsius - 20.8).abs() < 2.0);
    }
}
