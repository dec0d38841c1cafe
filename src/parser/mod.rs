//! # OEM readers
//!
//! Both front ends ([`kvn::KvnReader`] and [`xml::XmlReader`]) turn text into the same
//! raw intermediate form: keyword/value pairs for the key/value sections, numeric rows
//! for the data and covariance blocks. Typed entities are built from it by
//! [`crate::message::EphemerisMessage::from_raw`], which runs every validation rule.
pub mod kvn;
pub mod xml;

use std::fmt;
use std::str::FromStr;

use crate::oem_errors::OemError;

/// One state line: epoch text and its 6 or 9 components.
#[derive(Debug, Clone, PartialEq)]
pub struct RawState {
    pub epoch: String,
    pub values: Vec<f64>,
}

/// One covariance entry: epoch text, optional frame and the 21 lower-triangle values.
#[derive(Debug, Clone, PartialEq)]
pub struct RawCovariance {
    pub epoch: String,
    pub frame: Option<String>,
    pub lower_triangle: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSegment {
    pub metadata: Vec<(String, String)>,
    pub states: Vec<RawState>,
    pub covariances: Vec<RawCovariance>,
}

/// Unvalidated content of a whole message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawOem {
    pub header: Vec<(String, String)>,
    pub segments: Vec<RawSegment>,
}

/// Front end for one OEM encoding.
pub trait OemReader {
    fn read(&self, content: &str) -> Result<RawOem, OemError>;
}

/// Encoding of an OEM file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileFormat {
    Kvn,
    Xml,
}

impl FileFormat {
    /// Guess the encoding from the first non-whitespace character.
    pub fn detect(content: &str) -> FileFormat {
        match content.trim_start().chars().next() {
            Some('<') => FileFormat::Xml,
            _ => FileFormat::Kvn,
        }
    }

    pub fn reader(&self) -> Box<dyn OemReader> {
        match self {
            FileFormat::Kvn => Box::new(kvn::KvnReader),
            FileFormat::Xml => Box::new(xml::XmlReader),
        }
    }
}

impl FromStr for FileFormat {
    type Err = OemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "kvn" => Ok(FileFormat::Kvn),
            "xml" => Ok(FileFormat::Xml),
            other => Err(OemError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileFormat::Kvn => f.write_str("kvn"),
            FileFormat::Xml => f.write_str("xml"),
        }
    }
}

#[cfg(test)]
mod parser_test {
    use super::*;

    #[test]
    fn test_detect_format() {
        assert_eq!(FileFormat::detect("  \n<?xml version=\"1.0\"?>"), FileFormat::Xml);
        assert_eq!(FileFormat::detect("CCSDS_OEM_VERS = 2.0"), FileFormat::Kvn);
        assert_eq!("XML".parse::<FileFormat>().unwrap(), FileFormat::Xml);
        assert_eq!(
            "json".parse::<FileFormat>(),
            Err(OemError::UnsupportedFormat("json".into()))
        );
    }
}
