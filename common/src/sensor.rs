use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

use crate::settings::SignalSettings;

/// A single sample of the temperature feed.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Reading {
    /// Simulated time since the feed started, in seconds.
    pub elapsed_secs: f64,
    pub temperature_celsius: f64,
}

/// Anything that can produce the next temperature reading.
///
/// The monitor only talks to this trait, so tests can drive it with a scripted feed.
pub trait TemperatureSource {
    fn next_reading(&mut self) -> Reading;
}

/// The noiseless part of the simulated signal: `baseline + amplitude * sin(angular_frequency * t)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Waveform {
    pub baseline: f64,
    pub amplitude: f64,
    pub angular_frequency: f64,
}

impl Waveform {
    pub fn value_at(&self, elapsed_secs: f64) -> f64 {
        self.baseline + self.amplitude * (self.angular_frequency * elapsed_secs).sin()
    }
}

impl From<&SignalSettings> for Waveform {
    fn from(settings: &SignalSettings) -> Self {
        Self {
            baseline: settings.baseline,
            amplitude: settings.amplitude,
            angular_frequency: settings.angular_frequency,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SensorError {
    /// The noise standard deviation is negative or not finite.
    InvalidNoise(f64),
    /// A zero step would never advance the time axis.
    ZeroStep,
}

impl std::fmt::Display for SensorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidNoise(std_dev) => write!(f, "invalid noise standard deviation: {std_dev}"),
            Self::ZeroStep => write!(f, "sample step must be greater than zero"),
        }
    }
}

impl std::error::Error for SensorError {}

/// A fake temperature sensor: a sine wave with Gaussian noise, sampled at a fixed step of
/// simulated time.
pub struct SimulatedSensor {
    waveform: Waveform,
    noise: Normal<f64>,
    step: Duration,
    samples: u64,
    rng: StdRng,
}

impl SimulatedSensor {
    /// Create a sensor seeded from the operating system.
    pub fn new(signal: &SignalSettings, step: Duration) -> Result<Self, SensorError> {
        Self::with_rng(signal, step, StdRng::from_os_rng())
    }

    /// Create a sensor with a fixed seed, so the noise is reproducible.
    pub fn with_seed(signal: &SignalSettings, step: Duration, seed: u64) -> Result<Self, SensorError> {
        Self::with_rng(signal, step, StdRng::seed_from_u64(seed))
    }

    fn with_rng(signal: &SignalSettings, step: Duration, rng: StdRng) -> Result<Self, SensorError> {
        if step.is_zero() {
            return Err(SensorError::ZeroStep);
        }

        let std_dev = signal.noise_std_dev;
        if !std_dev.is_finite() || std_dev < 0.0 {
            return Err(SensorError::InvalidNoise(std_dev));
        }
        let noise = Normal::new(0.0, std_dev).map_err(|_| SensorError::InvalidNoise(std_dev))?;

        Ok(Self {
            waveform: signal.into(),
            noise,
            step,
            samples: 0,
            rng,
        })
    }

    pub fn waveform(&self) -> &Waveform {
        &self.waveform
    }

    /// Simulated time of the last produced reading.
    pub fn elapsed_secs(&self) -> f64 {
        // Multiply instead of accumulating, so the time axis does not drift.
        self.samples as f64 * self.step.as_secs_f64()
    }
}

impl TemperatureSource for SimulatedSensor {
    fn next_reading(&mut self) -> Reading {
        self.samples += 1;
        let elapsed_secs = self.elapsed_secs();
        let temperature_celsius =
            self.waveform.value_at(elapsed_secs) + self.noise.sample(&mut self.rng);

        log::trace!("Simulated reading at {elapsed_secs:.1}s: {temperature_celsius:.3}°C");

        Reading {
            elapsed_secs,
            temperature_celsius,
        }
    }
}
