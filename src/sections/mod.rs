//! Key/value sections of an OEM: the message header and the segment metadata.
//!
//! Both are backed by a [`KeyValueSection`], an insertion-ordered store of typed
//! values validated against a [`SectionSchema`].
pub mod header;
pub mod metadata;

use crate::oem_errors::OemError;
use crate::schema::{FieldContext, FieldValue, SectionSchema};

/// Insertion-ordered, schema-checked `key → value` store.
#[derive(Debug, Clone)]
pub struct KeyValueSection {
    schema: &'static SectionSchema,
    entries: Vec<(&'static str, FieldValue)>,
}

impl KeyValueSection {
    /// Build a section from raw `(key, value)` text pairs.
    ///
    /// Arguments
    /// -----------------
    /// * `schema`: descriptors of the allowed keywords
    /// * `raw`: keyword/value pairs in file order
    /// * `context`: extra parsing context (time system for epoch fields)
    ///
    /// Return
    /// ----------
    /// * The section, or [`OemError::Validation`] on an unknown, duplicated or
    ///   missing required keyword, or on a value its parser refuses.
    pub fn from_raw(
        schema: &'static SectionSchema,
        raw: &[(String, String)],
        context: &FieldContext,
    ) -> Result<Self, OemError> {
        let mut entries: Vec<(&'static str, FieldValue)> = Vec::with_capacity(raw.len());
        for (key, value) in raw {
            let spec = schema.field(key).ok_or_else(|| {
                OemError::Validation(format!("Unrecognized key '{key}' in {}", schema.name))
            })?;
            if entries.iter().any(|(k, _)| *k == spec.key) {
                return Err(OemError::Validation(format!(
                    "Duplicate key '{key}' in {}",
                    schema.name
                )));
            }
            let parsed = (spec.parse)(value, context).map_err(|err| match err {
                OemError::Validation(reason) => {
                    OemError::Validation(format!("{key}: {reason}"))
                }
                other => other,
            })?;
            entries.push((spec.key, parsed));
        }

        let section = KeyValueSection { schema, entries };
        section.check_required()?;
        Ok(section)
    }

    fn check_required(&self) -> Result<(), OemError> {
        match self.schema.required_keys().find(|key| !self.contains(key)) {
            Some(missing) => Err(OemError::Validation(format!(
                "Missing required key '{missing}' in {}",
                self.schema.name
            ))),
            None => Ok(()),
        }
    }

    pub fn schema(&self) -> &'static SectionSchema {
        self.schema
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| *k == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(k, _)| *k)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &FieldValue)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    /// Copy of this section with `key` set to the parsed `raw` value.
    ///
    /// Existing keys keep their position; new keys are appended.
    pub fn with_value(
        &self,
        key: &str,
        raw: &str,
        context: &FieldContext,
    ) -> Result<Self, OemError> {
        let spec = self.schema.field(key).ok_or_else(|| {
            OemError::Validation(format!(
                "Unrecognized key '{key}' in {}",
                self.schema.name
            ))
        })?;
        let value = (spec.parse)(raw, context)?;

        let mut updated = self.clone();
        match updated.entries.iter_mut().find(|(k, _)| *k == spec.key) {
            Some(entry) => entry.1 = value,
            None => updated.entries.push((spec.key, value)),
        }
        Ok(updated)
    }

    /// Keyword/value pairs formatted for output, in insertion order.
    pub fn formatted(&self) -> Vec<(&'static str, String)> {
        self.entries
            .iter()
            .map(|(key, value)| {
                let text = match self.schema.field(key) {
                    Some(spec) => (spec.format)(value),
                    None => crate::schema::format_value(value),
                };
                (*key, text)
            })
            .collect()
    }
}

/// Equal when both sections hold the same keys with equal values, whatever the order.
impl PartialEq for KeyValueSection {
    fn eq(&self, other: &Self) -> bool {
        self.schema.name == other.schema.name
            && self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .all(|(key, value)| other.get(key) == Some(value))
    }
}
