//! Typed key-value preference store

use crate::error::PrefError;
use crate::guard::{BoundKind, PreferenceGuard};
use crate::value::{PrefType, PrefValue};
use crate::Result;
use parking_lot::RwLock;
use sort_core::store::atomic_write;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Weak};
use tracing::{debug, trace, warn};

/// Receives the full name of every preference whose value changed
pub trait PreferenceObserver: Send + Sync {
    fn preference_changed(&self, name: &str);
}

/// Flat preference namespace with declared defaults and bounds
///
/// `get` falls back to the declared default; `has` reports only values that were
/// written explicitly. Integer writes pass through the `PreferenceGuard` before
/// they are committed, so observers only ever see accepted values.
#[derive(Default)]
pub struct PrefStore {
    values: RwLock<BTreeMap<String, PrefValue>>,
    defaults: RwLock<BTreeMap<String, PrefValue>>,
    guard: PreferenceGuard,
    observers: RwLock<Vec<Weak<dyn PreferenceObserver>>>,
}

impl PrefStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a preference, fixing its type and default
    pub fn declare(&self, name: &str, default: impl Into<PrefValue>) {
        self.defaults.write().insert(name.to_string(), default.into());
    }

    pub fn declared_type(&self, name: &str) -> Option<PrefType> {
        self.defaults.read().get(name).map(PrefValue::pref_type)
    }

    pub fn default_value(&self, name: &str) -> Option<PrefValue> {
        self.defaults.read().get(name).cloned()
    }

    /// Whether a value was written explicitly
    pub fn has(&self, name: &str) -> bool {
        self.values.read().contains_key(name)
    }

    /// The explicitly written value, ignoring defaults
    pub fn user_value(&self, name: &str) -> Option<PrefValue> {
        self.values.read().get(name).cloned()
    }

    /// Effective value: explicit value or declared default
    pub fn get(&self, name: &str) -> Option<PrefValue> {
        self.user_value(name).or_else(|| self.default_value(name))
    }

    pub fn get_bool(&self, name: &str) -> Result<bool> {
        let value = self.require(name)?;
        value
            .as_bool()
            .ok_or_else(|| self.mismatch(name, PrefType::Bool, &value))
    }

    pub fn get_int(&self, name: &str) -> Result<i64> {
        let value = self.require(name)?;
        value
            .as_int()
            .ok_or_else(|| self.mismatch(name, PrefType::Int, &value))
    }

    pub fn get_string(&self, name: &str) -> Result<String> {
        let value = self.require(name)?;
        match value {
            PrefValue::String(s) => Ok(s),
            other => Err(self.mismatch(name, PrefType::String, &other)),
        }
    }

    /// Write a value and return the accepted value
    ///
    /// The value must match the declared type (or the type already stored for an
    /// undeclared name). Observers are notified once, after the write commits, and
    /// only when the effective value changed.
    pub fn set(&self, name: &str, value: impl Into<PrefValue>) -> Result<PrefValue> {
        let value = value.into();
        let expected = self
            .declared_type(name)
            .or_else(|| self.user_value(name).map(|v| v.pref_type()));
        if let Some(expected) = expected {
            if expected != value.pref_type() {
                return Err(self.mismatch(name, expected, &value));
            }
        }

        let accepted = match value {
            PrefValue::Int(proposed) => {
                let accepted = self.guard.enforce(name, proposed);
                if accepted != proposed {
                    debug!(name, proposed, accepted, "clamped preference");
                }
                PrefValue::Int(accepted)
            }
            other => other,
        };

        let default = self.default_value(name);
        let previous = {
            let mut values = self.values.write();
            values
                .insert(name.to_string(), accepted.clone())
                .or(default)
        };

        if previous.as_ref() != Some(&accepted) {
            trace!(name, value = %accepted, "preference changed");
            self.notify(name);
        }
        Ok(accepted)
    }

    /// Drop the explicit value, reverting to the default
    pub fn reset(&self, name: &str) {
        let Some(previous) = self.values.write().remove(name) else {
            return;
        };
        if Some(previous) != self.default_value(name) {
            self.notify(name);
        }
    }

    /// Register a minimum and clamp the stored value into the new range
    pub fn set_minimum(&self, name: &str, min: i64) -> Result<()> {
        self.set_bound(name, BoundKind::Min, min)
    }

    /// Register a maximum and clamp the stored value into the new range
    pub fn set_maximum(&self, name: &str, max: i64) -> Result<()> {
        self.set_bound(name, BoundKind::Max, max)
    }

    fn set_bound(&self, name: &str, kind: BoundKind, value: i64) -> Result<()> {
        let bounds = self.guard.set_bound(name, kind, value)?;
        if let Some(PrefValue::Int(current)) = self.user_value(name) {
            if bounds.clamp(current) != current {
                self.set(name, current)?;
            }
        }
        Ok(())
    }

    pub fn guard(&self) -> &PreferenceGuard {
        &self.guard
    }

    /// Register an observer; dropped observers are pruned lazily
    pub fn observe(&self, observer: Weak<dyn PreferenceObserver>) {
        self.observers.write().push(observer);
    }

    /// Explicit values, ordered by name
    pub fn user_values(&self) -> BTreeMap<String, PrefValue> {
        self.values.read().clone()
    }

    /// Declared names, ordered
    pub fn declared(&self) -> Vec<String> {
        self.defaults.read().keys().cloned().collect()
    }

    /// Merge values from a TOML file; a missing file is not an error
    ///
    /// Loaded values bypass observers. Values that do not fit their declared type
    /// are coerced, or skipped with a warning when they cannot be.
    pub fn load(&self, path: &Path) -> Result<()> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no preference file");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        let file: BTreeMap<String, PrefValue> = toml::from_str(&contents)?;

        let mut values = self.values.write();
        for (name, value) in file {
            let value = match self.declared_type(&name) {
                Some(ty) => match value.coerce(ty) {
                    Ok(value) => value,
                    Err(e) => {
                        warn!(name, error = %e, "skipping preference from file");
                        continue;
                    }
                },
                None => value,
            };
            let value = match value {
                PrefValue::Int(i) => PrefValue::Int(self.guard.enforce(&name, i)),
                other => other,
            };
            values.insert(name, value);
        }
        debug!(path = %path.display(), count = values.len(), "loaded preferences");
        Ok(())
    }

    /// Write explicit values as TOML, atomically
    pub fn save(&self, path: &Path) -> Result<()> {
        let rendered = toml::to_string_pretty(&*self.values.read())?;
        atomic_write(path, rendered.as_bytes())?;
        Ok(())
    }

    fn require(&self, name: &str) -> Result<PrefValue> {
        self.get(name)
            .ok_or_else(|| PrefError::Missing(name.to_string()))
    }

    fn mismatch(&self, name: &str, expected: PrefType, found: &PrefValue) -> PrefError {
        PrefError::TypeMismatch {
            name: name.to_string(),
            expected,
            found: found.pref_type(),
        }
    }

    fn notify(&self, name: &str) {
        let (live, dead) = {
            let observers = self.observers.read();
            let live: Vec<Arc<dyn PreferenceObserver>> =
                observers.iter().filter_map(Weak::upgrade).collect();
            let dead = live.len() != observers.len();
            (live, dead)
        };
        if dead {
            self.observers
                .write()
                .retain(|observer| observer.strong_count() > 0);
        }

        for observer in live {
            observer.preference_changed(name);
        }
    }
}
