// Hearth: a reactive control core for heater device cards
// Copyright 2026

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

mod observable;

pub use observable::{DisposeBag, ObservableProperty, Subscription};

#[cfg(feature = "debugging")]
mod debug;

#[cfg(feature = "debugging")]
pub use debug::{ControlDebugger, DebugConfig};

/// Configuration for a heater control model.
///
/// Uses a builder pattern to configure the temperature bounds and the
/// slider step.
#[derive(Debug, Clone)]
pub struct HeaterConfig {
    min_temperature: f64, // Lower slider bound, °C
    max_temperature: f64, // Upper slider bound, °C
    step: f64,            // Slider increment, °C
}

impl Default for HeaterConfig {
    fn default() -> Self {
        HeaterConfig {
            min_temperature: 10.0,
            max_temperature: 30.0,
            step: 0.5,
        }
    }
}

impl HeaterConfig {
    /// Create a new heater configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the temperature bounds (min, max) in °C.
    pub fn with_temperature_range(mut self, min: f64, max: f64) -> Self {
        self.min_temperature = min;
        self.max_temperature = max;
        self
    }

    /// Set the slider step in °C.
    pub fn with_step(mut self, step: f64) -> Self {
        self.step = step;
        self
    }

    /// Lower temperature bound in °C.
    pub fn min_temperature(&self) -> f64 {
        self.min_temperature
    }

    /// Upper temperature bound in °C.
    pub fn max_temperature(&self) -> f64 {
        self.max_temperature
    }

    /// Slider step in °C.
    pub fn step(&self) -> f64 {
        self.step
    }
}

/// Power mode of the heater device. No intermediate states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DeviceMode {
    On,
    Off,
}

impl DeviceMode {
    /// Map a raw switch position to a mode: `true → On`, `false → Off`.
    pub fn from_switch(is_on: bool) -> Self {
        if is_on {
            DeviceMode::On
        } else {
            DeviceMode::Off
        }
    }

    pub fn is_on(&self) -> bool {
        matches!(self, DeviceMode::On)
    }
}

impl fmt::Display for DeviceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceMode::On => write!(f, "On"),
            DeviceMode::Off => write!(f, "Off"),
        }
    }
}

/// Snapshot of the external device record, read once at construction.
///
/// Writeback of accepted values is the provider's concern: it subscribes
/// to the model's observables and persists what they publish.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeviceRecord {
    pub temperature: f64,
    pub mode: DeviceMode,
}

/// The reactive control model behind a heater card.
///
/// Holds temperature and mode as observable properties, normalizes raw
/// slider/switch input before publishing it, and exposes the derived
/// display state (gradient position and label text) as read-only
/// observables recomputed on every accepted change.
pub struct HeaterControlModel {
    config: HeaterConfig,

    /// Current temperature in °C; mutated only through
    /// [`set_temperature_from_slider`](Self::set_temperature_from_slider).
    pub temperature: ObservableProperty<f64>,
    /// Current power mode; mutated only through
    /// [`set_mode_from_switch`](Self::set_mode_from_switch).
    pub mode: ObservableProperty<DeviceMode>,

    /// Normalized gradient stop position in [0, 1], derived from
    /// temperature. Read-only.
    pub gradient_position: ObservableProperty<f64>,
    /// `"Temperature: {t} °C"`, derived from temperature. Read-only.
    pub temperature_display_text: ObservableProperty<String>,
    /// `"Mode: {mode}"`, derived from mode. Read-only.
    pub mode_display_text: ObservableProperty<String>,

    // Debugging
    #[cfg(feature = "debugging")]
    debugger: Option<ControlDebugger>,
}

impl HeaterControlModel {
    /// Create a model seeded from `record`.
    ///
    /// An out-of-range initial temperature is clamped into the configured
    /// bounds rather than rejected.
    pub fn new(config: HeaterConfig, record: &DeviceRecord) -> Self {
        let initial = clamp(
            record.temperature,
            config.min_temperature,
            config.max_temperature,
        );
        let temperature = ObservableProperty::new(initial);
        let mode = ObservableProperty::new(record.mode);

        let (min, max) = (config.min_temperature, config.max_temperature);
        let gradient_position = temperature.map(move |t| gradient_position(*t, min, max));
        let temperature_display_text = temperature.map(|t| format!("Temperature: {} °C", t));
        let mode_display_text = mode.map(|m| format!("Mode: {}", m));

        HeaterControlModel {
            config,
            temperature,
            mode,
            gradient_position,
            temperature_display_text,
            mode_display_text,
            #[cfg(feature = "debugging")]
            debugger: None,
        }
    }

    /// Configure debugging if the debugging feature is enabled
    #[cfg(feature = "debugging")]
    pub fn with_debugging(mut self, debug_config: DebugConfig) -> Self {
        self.debugger = Some(ControlDebugger::new(debug_config));
        self
    }

    /// The configuration this model was built with.
    pub fn config(&self) -> &HeaterConfig {
        &self.config
    }

    /// Accept a raw slider value: round it to the nearest multiple of
    /// `step`, clamp it into the configured bounds, and publish it through
    /// [`temperature`](Self::temperature).
    ///
    /// Ties round away from zero (`(raw / step).round() * step`), which is
    /// round-half-up over the positive temperature domain. Every accepted
    /// call publishes exactly one value, even when it equals the current
    /// one.
    ///
    /// `step <= 0` or a non-finite `raw`/`step` is a precondition
    /// violation and a no-op: nothing is published.
    pub fn set_temperature_from_slider(&mut self, raw: f64, step: f64) {
        if step <= 0.0 || !step.is_finite() || !raw.is_finite() {
            return;
        }

        let rounded = (raw / step).round() * step;
        let clamped = clamp(
            rounded,
            self.config.min_temperature,
            self.config.max_temperature,
        );
        self.temperature.set(clamped);

        #[cfg(feature = "debugging")]
        self.send_debug_snapshot();
    }

    /// Accept a raw switch position and publish the mapped mode through
    /// [`mode`](Self::mode).
    pub fn set_mode_from_switch(&mut self, is_on: bool) {
        self.mode.set(DeviceMode::from_switch(is_on));

        #[cfg(feature = "debugging")]
        self.send_debug_snapshot();
    }

    // Send a snapshot of the model state after an accepted control event
    #[cfg(feature = "debugging")]
    fn send_debug_snapshot(&mut self) {
        let temperature = self.temperature.get();
        let mode = self.mode.get();
        let gradient = self.gradient_position.get();
        if let Some(debugger) = &mut self.debugger {
            debugger.send_debug_data(temperature, mode, gradient);
        }
    }
}

/// Linear normalization of `temperature` into [0, 1] over `[min, max]`.
///
/// A degenerate range (`max <= min`) pins the position at 0.0.
fn gradient_position(temperature: f64, min: f64, max: f64) -> f64 {
    let span = max - min;
    if span <= 0.0 {
        return 0.0;
    }
    clamp((temperature - min) / span, 0.0, 1.0)
}

fn clamp(value: f64, min: f64, max: f64) -> f64 {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}
