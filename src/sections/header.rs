use std::str::FromStr;

use crate::constants::VERSION_KEY;
use crate::oem_errors::OemError;
use crate::schema::{header_schema, FieldContext, FieldValue};
use crate::sections::KeyValueSection;
use crate::time::OemEpoch;
use crate::version::OemVersion;

/// OEM message header.
///
/// Holds `CCSDS_OEM_VERS`, `CREATION_DATE` and `ORIGINATOR` (plus the optional v3.0
/// keywords). The version found here drives the schema and constraints of every
/// other entity of the message.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderSection {
    fields: KeyValueSection,
    version: OemVersion,
}

impl HeaderSection {
    /// Build a header from raw keyword/value pairs.
    ///
    /// The version keyword is resolved first since it selects the schema.
    pub fn from_raw(raw: &[(String, String)]) -> Result<Self, OemError> {
        let version = raw
            .iter()
            .find(|(key, _)| key == VERSION_KEY)
            .map(|(_, value)| OemVersion::from_str(value))
            .transpose()?
            .ok_or_else(|| {
                OemError::Validation(format!("Missing required key '{VERSION_KEY}' in header"))
            })?;

        let fields =
            KeyValueSection::from_raw(header_schema(version), raw, &FieldContext::default())?;
        Ok(HeaderSection { fields, version })
    }

    /// Minimal header for a message built in code.
    pub fn new(
        version: OemVersion,
        creation_date: &str,
        originator: &str,
    ) -> Result<Self, OemError> {
        Self::from_raw(&[
            (VERSION_KEY.to_string(), version.to_string()),
            ("CREATION_DATE".to_string(), creation_date.to_string()),
            ("ORIGINATOR".to_string(), originator.to_string()),
        ])
    }

    pub fn version(&self) -> OemVersion {
        self.version
    }

    pub fn creation_date(&self) -> Option<OemEpoch> {
        self.fields.get("CREATION_DATE").and_then(FieldValue::as_epoch)
    }

    pub fn originator(&self) -> Option<&str> {
        self.fields.get("ORIGINATOR").and_then(FieldValue::as_text)
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.keys()
    }

    /// Set a header keyword. The version keyword cannot be changed this way.
    pub fn set(&mut self, key: &str, raw: &str) -> Result<(), OemError> {
        if key == VERSION_KEY {
            return Err(OemError::Validation(format!(
                "'{VERSION_KEY}' cannot be changed on an existing header"
            )));
        }
        self.fields = self.fields.with_value(key, raw, &FieldContext::default())?;
        Ok(())
    }

    /// Formatted keyword/value pairs, version keyword excluded.
    pub fn formatted_fields(&self) -> Vec<(&'static str, String)> {
        self.fields
            .formatted()
            .into_iter()
            .filter(|(key, _)| *key != VERSION_KEY)
            .collect()
    }
}
