//! One-shot migration of legacy preferences into the option namespace
//!
//! Legacy values are copied, never moved: the old preference stays in place and
//! its presence is what marks the migration as done. Running a migration twice
//! against the same legacy value writes the same new values.

use crate::error::MigrationError;
use crate::options::option_name;
use crate::store::PrefStore;
use crate::value::PrefValue;
use serde_json::Value;
use tracing::{debug, info};

/// Locates one field inside a structured legacy value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKey {
    /// Position in a JSON array
    Index(usize),
    /// Key in a JSON object
    Name(String),
}

#[derive(Debug, Clone)]
struct FieldMapping {
    field: FieldKey,
    option: String,
    default: PrefValue,
}

/// Field-to-option mapping for a structured legacy preference
#[derive(Debug, Clone, Default)]
pub struct StructuredMapping {
    fields: Vec<FieldMapping>,
}

impl StructuredMapping {
    /// Map array positions, in order, to `(option, default)` pairs
    pub fn positional<I, S, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (S, V)>,
        S: Into<String>,
        V: Into<PrefValue>,
    {
        let fields = fields
            .into_iter()
            .enumerate()
            .map(|(index, (option, default))| FieldMapping {
                field: FieldKey::Index(index),
                option: option.into(),
                default: default.into(),
            })
            .collect();
        Self { fields }
    }

    /// Map object keys to `(field, option, default)` triples
    pub fn named<I, F, S, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (F, S, V)>,
        F: Into<String>,
        S: Into<String>,
        V: Into<PrefValue>,
    {
        let fields = fields
            .into_iter()
            .map(|(field, option, default)| FieldMapping {
                field: FieldKey::Name(field.into()),
                option: option.into(),
                default: default.into(),
            })
            .collect();
        Self { fields }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Copies legacy preferences into the option namespace of a store
pub struct PreferenceMigrator<'a> {
    store: &'a PrefStore,
}

impl<'a> PreferenceMigrator<'a> {
    pub fn new(store: &'a PrefStore) -> Self {
        Self { store }
    }

    /// Copy `old_name` into the option `new_option`, or write `default` when the
    /// legacy preference is absent
    ///
    /// The copied value is coerced to the option's declared type.
    pub fn migrate_scalar(
        &self,
        old_name: &str,
        new_option: &str,
        default: impl Into<PrefValue>,
    ) -> Result<PrefValue, MigrationError> {
        let target = option_name(new_option);
        let value = match self.store.user_value(old_name) {
            Some(legacy) => {
                debug!(old_name, target = %target, "copying legacy preference");
                legacy
            }
            None => default.into(),
        };
        let value = match self.store.declared_type(&target) {
            Some(ty) => value.coerce(ty).map_err(|source| MigrationError::Coercion {
                name: old_name.to_string(),
                source,
            })?,
            None => value,
        };

        let accepted = self.store.set(&target, value)?;
        info!(old_name, target = %target, value = %accepted, "migrated preference");
        Ok(accepted)
    }

    /// Spread a JSON-serialized legacy value over several options
    ///
    /// Every field is parsed and coerced before anything is written, so a parse,
    /// shape or coercion failure leaves all target options untouched. Fields
    /// missing from the legacy value take their default.
    pub fn migrate_structured(
        &self,
        old_name: &str,
        mapping: &StructuredMapping,
    ) -> Result<Vec<(String, PrefValue)>, MigrationError> {
        let parsed = match self.store.user_value(old_name) {
            Some(PrefValue::String(raw)) => Some(serde_json::from_str::<Value>(&raw).map_err(
                |source| MigrationError::Parse {
                    name: old_name.to_string(),
                    source,
                },
            )?),
            Some(_) => {
                return Err(MigrationError::Shape {
                    name: old_name.to_string(),
                })
            }
            None => None,
        };

        let mut pending = Vec::with_capacity(mapping.len());
        for field in &mapping.fields {
            let legacy = match &parsed {
                Some(json) => self.field_value(old_name, json, &field.field)?,
                None => None,
            };
            let value = legacy.unwrap_or_else(|| field.default.clone());
            let target = option_name(&field.option);
            let value = self.coerce_for(old_name, &target, value)?;
            pending.push((target, value));
        }

        let mut written = Vec::with_capacity(pending.len());
        for (target, value) in pending {
            let accepted = self.store.set(&target, value)?;
            written.push((target, accepted));
        }
        info!(
            old_name,
            fields = written.len(),
            legacy = parsed.is_some(),
            "migrated structured preference"
        );
        Ok(written)
    }

    fn field_value(
        &self,
        old_name: &str,
        json: &Value,
        field: &FieldKey,
    ) -> Result<Option<PrefValue>, MigrationError> {
        let shape = || MigrationError::Shape {
            name: old_name.to_string(),
        };
        let raw = match (field, json) {
            (FieldKey::Index(index), Value::Array(items)) => items.get(*index),
            (FieldKey::Name(key), Value::Object(map)) => map.get(key),
            _ => return Err(shape()),
        };
        match raw {
            Some(raw) => PrefValue::from_json(raw).map(Some).ok_or_else(shape),
            None => Ok(None),
        }
    }

    /// Declared targets get the declared type; undeclared ones turn numeric
    /// strings into integers
    fn coerce_for(
        &self,
        old_name: &str,
        target: &str,
        value: PrefValue,
    ) -> Result<PrefValue, MigrationError> {
        match self.store.declared_type(target) {
            Some(ty) => value.coerce(ty).map_err(|source| MigrationError::Coercion {
                name: old_name.to_string(),
                source,
            }),
            None => Ok(value.numeric_or_self()),
        }
    }
}
