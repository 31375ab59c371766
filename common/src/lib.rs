//! Platform-independent core of the temperature monitor: the simulated sensor, the rolling
//! history, the limit alarm and the plot geometry. The UI crates only forward timer ticks and
//! user actions to a [`Monitor`] and render what it reports.

pub mod alarm;
pub mod buffer;
pub mod monitor;
pub mod plot;
pub mod sensor;
pub mod settings;

pub use alarm::{evaluate, AlarmMonitor, AlarmState, Backdrop, BlinkChange, Bounds};
pub use buffer::RollingBuffer;
pub use monitor::{Monitor, RunPhase, Status, StatusTone, TickOutcome};
pub use plot::{AxisRange, PlotFrame, PlotView, Tick};
pub use sensor::{Reading, SensorError, SimulatedSensor, TemperatureSource, Waveform};
pub use settings::{Settings, SettingsError};
