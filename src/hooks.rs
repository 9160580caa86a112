use crate::Setting;
use log::error;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Mutex;

type ReadyCallback = Box<dyn Fn() + Send + Sync>;
type ConfigChangedCallback = Box<dyn Fn(&HashMap<String, Setting>) + Send + Sync>;
type ErrorCallback = Box<dyn Fn(&str) + Send + Sync>;

/// Registry of callbacks the SDK invokes on lifecycle events.
///
/// Callbacks registered for a given event run in registration order. A callback that
/// panics is caught and logged; it never aborts the service or stops the remaining
/// subscribers from running.
#[derive(Default)]
pub struct Hooks {
    on_ready: Mutex<Vec<ReadyCallback>>,
    on_config_changed: Mutex<Vec<ConfigChangedCallback>>,
    on_error: Mutex<Vec<ErrorCallback>>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to the event fired when the SDK has finished its first successful
    /// (or locally-served) config acquisition and is ready to evaluate flags.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use flagcore::Client;
    ///
    /// let builder = Client::builder("sdk-key");
    /// builder.hooks().add_on_ready(|| println!("ready"));
    /// ```
    pub fn add_on_ready<F: Fn() + Send + Sync + 'static>(&self, callback: F) {
        self.on_ready.lock().unwrap().push(Box::new(callback));
    }

    /// Subscribes to the event fired every time the SDK downloads and installs a new
    /// (etag-distinct) config JSON, whether from the network or the external cache.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use flagcore::Client;
    ///
    /// let builder = Client::builder("sdk-key");
    /// builder.hooks().add_on_config_changed(|settings| println!("{} flags", settings.len()));
    /// ```
    pub fn add_on_config_changed<F: Fn(&HashMap<String, Setting>) + Send + Sync + 'static>(
        &self,
        callback: F,
    ) {
        self.on_config_changed
            .lock()
            .unwrap()
            .push(Box::new(callback));
    }

    /// Subscribes to the event fired whenever the SDK encounters a recoverable error
    /// (a failed fetch, an unreadable cache entry, and so on).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use flagcore::Client;
    ///
    /// let builder = Client::builder("sdk-key");
    /// builder.hooks().add_on_error(|msg| eprintln!("configcat error: {msg}"));
    /// ```
    pub fn add_on_error<F: Fn(&str) + Send + Sync + 'static>(&self, callback: F) {
        self.on_error.lock().unwrap().push(Box::new(callback));
    }

    pub(crate) fn invoke_on_ready(&self) {
        for callback in self.on_ready.lock().unwrap().iter() {
            if catch_unwind(AssertUnwindSafe(|| callback())).is_err() {
                error!("An error occurred during invoking the `on_ready` hook callback.");
            }
        }
    }

    pub(crate) fn invoke_on_config_changed(&self, settings: &HashMap<String, Setting>) {
        for callback in self.on_config_changed.lock().unwrap().iter() {
            if catch_unwind(AssertUnwindSafe(|| callback(settings))).is_err() {
                error!("An error occurred during invoking the `on_config_changed` hook callback.");
            }
        }
    }

    pub(crate) fn invoke_on_error(&self, message: &str) {
        for callback in self.on_error.lock().unwrap().iter() {
            if catch_unwind(AssertUnwindSafe(|| callback(message))).is_err() {
                error!("An error occurred during invoking the `on_error` hook callback.");
            }
        }
    }
}
