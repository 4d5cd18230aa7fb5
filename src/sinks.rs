//! # Publish Sinks
//!
//! Decoded values leave the crate through four small capability traits. Every
//! sink slot on a component is an `Option`; an unconfigured slot simply means
//! the value is not published.
//!
//! Closures implement the traits directly, [`Recorder`] collects values for
//! tests and [`LogSink`] writes them to the log.
//!
//! ```rust
//! use tin_bus::sinks::{NumericSink, Recorder};
//!
//! let recorder = Recorder::<f32>::new();
//! let mut sink = recorder.clone();
//! sink.publish(21.5);
//! assert_eq!(recorder.values(), vec![21.5]);
//! ```

use std::sync::{Arc, Mutex};

use log::info;

/// Receives numeric readings.
pub trait NumericSink {
    fn publish(&mut self, value: f32);
}

/// Receives on/off states.
pub trait BooleanSink {
    fn publish(&mut self, value: bool);
}

/// Receives the index of an enumerated option.
pub trait EnumSink {
    fn publish(&mut self, index: u8);
}

/// Receives text lines.
pub trait TextSink {
    fn publish(&mut self, text: &str);
}

impl<F: FnMut(f32)> NumericSink for F {
    fn publish(&mut self, value: f32) {
        self(value)
    }
}

impl<F: FnMut(bool)> BooleanSink for F {
    fn publish(&mut self, value: bool) {
        self(value)
    }
}

impl<F: FnMut(u8)> EnumSink for F {
    fn publish(&mut self, index: u8) {
        self(index)
    }
}

impl<F: FnMut(&str)> TextSink for F {
    fn publish(&mut self, text: &str) {
        self(text)
    }
}

/// Shared, clonable store of everything published to it.
#[derive(Debug)]
pub struct Recorder<T> {
    values: Arc<Mutex<Vec<T>>>,
}

impl<T> Clone for Recorder<T> {
    fn clone(&self) -> Self {
        Recorder {
            values: Arc::clone(&self.values),
        }
    }
}

impl<T> Default for Recorder<T> {
    fn default() -> Self {
        Recorder {
            values: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<T: Clone> Recorder<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn values(&self) -> Vec<T> {
        self.values.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<T> {
        self.values.lock().unwrap().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.values.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn record(&self, value: T) {
        self.values.lock().unwrap().push(value);
    }
}

impl NumericSink for Recorder<f32> {
    fn publish(&mut self, value: f32) {
        self.record(value);
    }
}

impl BooleanSink for Recorder<bool> {
    fn publish(&mut self, value: bool) {
        self.record(value);
    }
}

impl EnumSink for Recorder<u8> {
    fn publish(&mut self, index: u8) {
        self.record(index);
    }
}

impl TextSink for Recorder<String> {
    fn publish(&mut self, text: &str) {
        self.record(text.to_string());
    }
}

/// Writes published values to the log at info level.
#[derive(Debug, Clone)]
pub struct LogSink {
    name: String,
    options: Option<&'static [&'static str]>,
}

impl LogSink {
    pub fn new(name: impl Into<String>) -> Self {
        LogSink {
            name: name.into(),
            options: None,
        }
    }

    /// Log enumerated values by label instead of index.
    pub fn with_options(mut self, options: &'static [&'static str]) -> Self {
        self.options = Some(options);
        self
    }
}

impl NumericSink for LogSink {
    fn publish(&mut self, value: f32) {
        info!("{}: {:.1}", self.name, value);
    }
}

impl BooleanSink for LogSink {
    fn publish(&mut self, value: bool) {
        info!("{}: {}", self.name, if value { "ON" } else { "OFF" });
    }
}

impl EnumSink for LogSink {
    fn publish(&mut self, index: u8) {
        match self.options.and_then(|o| o.get(index as usize)) {
            Some(label) => info!("{}: {}", self.name, label),
            None => info!("{}: {}", self.name, index),
        }
    }
}

impl TextSink for LogSink {
    fn publish(&mut self, text: &str) {
        info!("{}: {}", self.name, text);
    }
}
