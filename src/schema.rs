//! # Field descriptor tables
//!
//! Static `key → {parse, format, required}` tables for the key/value sections of an
//! OEM (header and metadata), selected by format version.
//!
//! Overview
//! -----------------
//! * [`FieldValue`] is the typed value stored for a key once parsed.
//! * [`FieldSpec`] describes a single keyword: how to parse the raw text, how to
//!   write it back, and whether it is mandatory.
//! * [`SectionSchema`] groups the descriptors of one section for one version.
//!
//! Epoch-valued metadata keywords are parsed in the calendar of the section's
//! `TIME_SYSTEM`, passed through [`FieldContext`]. `CREATION_DATE` is always UTC.
use std::str::FromStr;

use crate::conversion::parse_integer;
use crate::oem_errors::OemError;
use crate::time::{Calendar, OemEpoch, TimeSystem};
use crate::version::OemVersion;

/// Typed value of a key/value field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Epoch(OemEpoch),
    Integer(u32),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_epoch(&self) -> Option<OemEpoch> {
        match self {
            FieldValue::Epoch(epoch) => Some(*epoch),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<u32> {
        match self {
            FieldValue::Integer(value) => Some(*value),
            _ => None,
        }
    }
}

/// Information a field parser may need beyond the raw text.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldContext<'a> {
    pub time_system: Option<&'a TimeSystem>,
}

pub type FieldParser = fn(&str, &FieldContext) -> Result<FieldValue, OemError>;
pub type FieldFormatter = fn(&FieldValue) -> String;

/// Descriptor of one keyword.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub key: &'static str,
    pub parse: FieldParser,
    pub format: FieldFormatter,
    pub required: bool,
}

/// Field descriptors of one section for one version.
#[derive(Debug)]
pub struct SectionSchema {
    pub name: &'static str,
    pub fields: &'static [FieldSpec],
}

impl SectionSchema {
    pub fn field(&self, key: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|spec| spec.key == key)
    }

    pub fn required_keys(&self) -> impl Iterator<Item = &'static str> {
        self.fields
            .iter()
            .filter(|spec| spec.required)
            .map(|spec| spec.key)
    }
}

// -------------------------------------------------------------------------------------------------
// Field parsers
// -------------------------------------------------------------------------------------------------

fn parse_text(raw: &str, _: &FieldContext) -> Result<FieldValue, OemError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(OemError::Validation("Empty value".into()));
    }
    Ok(FieldValue::Text(raw.to_string()))
}

fn parse_version(raw: &str, _: &FieldContext) -> Result<FieldValue, OemError> {
    let version = OemVersion::from_str(raw)?;
    Ok(FieldValue::Text(version.to_string()))
}

fn parse_utc(raw: &str, _: &FieldContext) -> Result<FieldValue, OemError> {
    OemEpoch::parse(raw, Calendar::Utc).map(FieldValue::Epoch)
}

fn parse_epoch(raw: &str, context: &FieldContext) -> Result<FieldValue, OemError> {
    let time_system = context.time_system.ok_or_else(|| {
        OemError::Validation("Epoch field parsed without a TIME_SYSTEM".into())
    })?;
    OemEpoch::parse(raw, time_system.calendar()).map(FieldValue::Epoch)
}

fn parse_integer_field(raw: &str, _: &FieldContext) -> Result<FieldValue, OemError> {
    parse_integer(raw).map(FieldValue::Integer)
}

pub fn format_value(value: &FieldValue) -> String {
    match value {
        FieldValue::Text(text) => text.clone(),
        FieldValue::Epoch(epoch) => epoch.format(),
        FieldValue::Integer(value) => value.to_string(),
    }
}

const fn field(key: &'static str, parse: FieldParser, required: bool) -> FieldSpec {
    FieldSpec {
        key,
        parse,
        format: format_value,
        required,
    }
}

// -------------------------------------------------------------------------------------------------
// Header
// -------------------------------------------------------------------------------------------------

static HEADER_V1: SectionSchema = SectionSchema {
    name: "header",
    fields: &[
        field("CCSDS_OEM_VERS", parse_version, true),
        field("CREATION_DATE", parse_utc, true),
        field("ORIGINATOR", parse_text, true),
    ],
};

static HEADER_V3: SectionSchema = SectionSchema {
    name: "header",
    fields: &[
        field("CCSDS_OEM_VERS", parse_version, true),
        field("CLASSIFICATION", parse_text, false),
        field("CREATION_DATE", parse_utc, true),
        field("ORIGINATOR", parse_text, true),
        field("MESSAGE_ID", parse_text, false),
    ],
};

pub fn header_schema(version: OemVersion) -> &'static SectionSchema {
    match version {
        OemVersion::V1_0 | OemVersion::V2_0 => &HEADER_V1,
        OemVersion::V3_0 => &HEADER_V3,
    }
}

// -------------------------------------------------------------------------------------------------
// Metadata
// -------------------------------------------------------------------------------------------------

// Version gating of REF_FRAME_EPOCH and MESSAGE_ID is done by the metadata constraints.
static METADATA: SectionSchema = SectionSchema {
    name: "metadata",
    fields: &[
        field("OBJECT_NAME", parse_text, true),
        field("OBJECT_ID", parse_text, true),
        field("CENTER_NAME", parse_text, true),
        field("REF_FRAME", parse_text, true),
        field("TIME_SYSTEM", parse_text, true),
        field("START_TIME", parse_epoch, true),
        field("STOP_TIME", parse_epoch, true),
        field("REF_FRAME_EPOCH", parse_epoch, false),
        field("USEABLE_START_TIME", parse_epoch, false),
        field("USEABLE_STOP_TIME", parse_epoch, false),
        field("INTERPOLATION", parse_text, false),
        field("INTERPOLATION_DEGREE", parse_integer_field, false),
        field("MESSAGE_ID", parse_text, false),
    ],
};

pub fn metadata_schema(_version: OemVersion) -> &'static SectionSchema {
    &METADATA
}

#[cfg(test)]
mod schema_test {
    use super::*;

    #[test]
    fn test_header_schema_per_version() {
        assert!(header_schema(OemVersion::V1_0).field("MESSAGE_ID").is_none());
        assert!(header_schema(OemVersion::V3_0).field("MESSAGE_ID").is_some());
        let required: Vec<_> = header_schema(OemVersion::V3_0).required_keys().collect();
        assert_eq!(required, ["CCSDS_OEM_VERS", "CREATION_DATE", "ORIGINATOR"]);
    }

    #[test]
    fn test_field_parsers() {
        let schema = metadata_schema(OemVersion::V2_0);
        let tai = TimeSystem::Tai;
        let ctx = FieldContext {
            time_system: Some(&tai),
        };

        let degree = schema.field("INTERPOLATION_DEGREE").unwrap();
        assert_eq!((degree.parse)("7", &ctx).unwrap(), FieldValue::Integer(7));
        assert!((degree.parse)("7.5", &ctx).is_err());

        let start = schema.field("START_TIME").unwrap();
        let value = (start.parse)("2020-01-01T00:00:00", &ctx).unwrap();
        assert_eq!((start.format)(&value), "2020-01-01T00:00:00.000000");
        assert!((start.parse)("2020-01-01T00:00:00", &FieldContext::default()).is_err());

        let name = schema.field("OBJECT_NAME").unwrap();
        assert!((name.parse)("   ", &ctx).is_err());
    }
}
