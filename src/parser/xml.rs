//! # XML reader
//!
//! The XML encoding is deserialized with `quick_xml::de` into private mirror
//! structs, then flattened into the raw form shared with the KVN reader.
//!
//! Elements are matched on their local name, so namespace-prefixed documents
//! (`<ndm:oem>`, `<ndm:header>`, ...) are read the same way as unprefixed ones.
//! `COMMENT` elements and attributes inside key/value blocks are ignored.
use std::fmt;

use quick_xml::de::from_str;
use serde::de::{Error as _, IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

use crate::constants::{ACCELERATION_KEYS, COMMENT, COVARIANCE_KEYS, STATE_VECTOR_KEYS, VERSION_KEY};
use crate::conversion::parse_float;
use crate::oem_errors::OemError;
use crate::parser::{OemReader, RawCovariance, RawOem, RawSegment, RawState};

#[derive(Debug, Deserialize)]
struct XmlOem {
    #[serde(rename = "@version")]
    version: String,
    header: FieldList,
    body: XmlBody,
}

#[derive(Debug, Deserialize)]
struct XmlBody {
    #[serde(default)]
    segment: Vec<XmlSegment>,
}

#[derive(Debug, Deserialize)]
struct XmlSegment {
    metadata: FieldList,
    data: XmlData,
}

#[derive(Debug, Deserialize)]
struct XmlData {
    #[serde(rename = "stateVector", default)]
    state_vectors: Vec<FieldList>,

    #[serde(rename = "covarianceMatrix", default)]
    covariance_matrices: Vec<FieldList>,
}

/// Text content of a leaf element; attributes such as `units` are dropped.
#[derive(Debug, Deserialize)]
struct XmlText {
    #[serde(rename = "$text", default)]
    text: String,
}

/// Ordered `(element name, text)` pairs of a key/value block.
#[derive(Debug, Default)]
struct FieldList(Vec<(String, String)>);

impl FieldList {
    fn take(&mut self, key: &str) -> Option<String> {
        let index = self.0.iter().position(|(k, _)| k == key)?;
        Some(self.0.remove(index).1)
    }

    fn take_required(&mut self, key: &str, block: &str) -> Result<String, OemError> {
        self.take(key)
            .ok_or_else(|| OemError::XmlParse(format!("Missing '{key}' in {block}")))
    }

    fn take_float(&mut self, key: &str, block: &str) -> Result<f64, OemError> {
        let text = self.take_required(key, block)?;
        parse_float(&text).map_err(|_| {
            OemError::XmlParse(format!("Invalid numeric value '{text}' for '{key}' in {block}"))
        })
    }

    fn ensure_consumed(&self, block: &str) -> Result<(), OemError> {
        match self.0.first() {
            Some((key, _)) => Err(OemError::XmlParse(format!(
                "Unexpected element '{key}' in {block}"
            ))),
            None => Ok(()),
        }
    }
}

impl<'de> Deserialize<'de> for FieldList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FieldListVisitor;

        impl<'de> Visitor<'de> for FieldListVisitor {
            type Value = FieldList;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a block of keyword elements")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<FieldList, A::Error> {
                let mut fields: Vec<(String, String)> = Vec::new();
                while let Some(key) = map.next_key::<String>()? {
                    if key.starts_with('@') || key == COMMENT || key == "$text" {
                        map.next_value::<IgnoredAny>()?;
                        continue;
                    }
                    let value: XmlText = map.next_value()?;
                    if fields.iter().any(|(k, _)| *k == key) {
                        return Err(A::Error::custom(format!("Duplicate key '{key}'")));
                    }
                    fields.push((key, value.text.trim().to_string()));
                }
                Ok(FieldList(fields))
            }
        }

        deserializer.deserialize_map(FieldListVisitor)
    }
}

fn read_state(mut fields: FieldList) -> Result<RawState, OemError> {
    const BLOCK: &str = "stateVector";
    let epoch = fields.take_required("EPOCH", BLOCK)?;
    let mut values = STATE_VECTOR_KEYS
        .iter()
        .map(|key| fields.take_float(key, BLOCK))
        .collect::<Result<Vec<_>, _>>()?;

    let present = ACCELERATION_KEYS
        .iter()
        .filter(|key| fields.0.iter().any(|(k, _)| k.as_str() == **key))
        .count();
    match present {
        0 => {}
        3 => {
            for key in ACCELERATION_KEYS {
                values.push(fields.take_float(key, BLOCK)?);
            }
        }
        _ => {
            return Err(OemError::XmlParse(format!(
                "Partial acceleration in stateVector at {epoch}"
            )))
        }
    }
    fields.ensure_consumed(BLOCK)?;
    Ok(RawState { epoch, values })
}

fn read_covariance(mut fields: FieldList) -> Result<RawCovariance, OemError> {
    const BLOCK: &str = "covarianceMatrix";
    let epoch = fields.take_required("EPOCH", BLOCK)?;
    let frame = fields.take("COV_REF_FRAME");
    let lower_triangle = COVARIANCE_KEYS
        .iter()
        .map(|(key, _, _)| fields.take_float(key, BLOCK))
        .collect::<Result<Vec<_>, _>>()?;
    fields.ensure_consumed(BLOCK)?;
    Ok(RawCovariance {
        epoch,
        frame,
        lower_triangle,
    })
}

/// Reader for the XML encoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlReader;

impl OemReader for XmlReader {
    fn read(&self, content: &str) -> Result<RawOem, OemError> {
        let document: XmlOem = from_str(content)?;

        let mut header = vec![(VERSION_KEY.to_string(), document.version.trim().to_string())];
        header.extend(document.header.0);

        let segments = document
            .body
            .segment
            .into_iter()
            .map(|segment| {
                Ok(RawSegment {
                    metadata: segment.metadata.0,
                    states: segment
                        .data
                        .state_vectors
                        .into_iter()
                        .map(read_state)
                        .collect::<Result<_, OemError>>()?,
                    covariances: segment
                        .data
                        .covariance_matrices
                        .into_iter()
                        .map(read_covariance)
                        .collect::<Result<_, OemError>>()?,
                })
            })
            .collect::<Result<Vec<_>, OemError>>()?;

        tracing::debug!(segments = segments.len(), "XML message read");
        Ok(RawOem { header, segments })
    }
}

#[cfg(test)]
mod xml_test {
    use super::*;

    const DOCUMENT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ndm:oem xmlns:ndm="urn:ccsds:schema:ndmxml" id="CCSDS_OEM_VERS" version="2.0">
  <ndm:header>
    <ndm:COMMENT>Example</ndm:COMMENT>
    <ndm:CREATION_DATE>2020-01-01T00:00:00</ndm:CREATION_DATE>
    <ndm:ORIGINATOR>ME</ndm:ORIGINATOR>
  </ndm:header>
  <ndm:body>
    <ndm:segment>
      <ndm:metadata>
        <ndm:OBJECT_NAME>SAT</ndm:OBJECT_NAME>
        <ndm:TIME_SYSTEM>UTC</ndm:TIME_SYSTEM>
      </ndm:metadata>
      <ndm:data>
        <ndm:stateVector>
          <ndm:EPOCH>2020-01-01T00:00:00</ndm:EPOCH>
          <ndm:X units="km">7000.0</ndm:X>
          <ndm:Y>0.0</ndm:Y>
          <ndm:Z>0.0</ndm:Z>
          <ndm:X_DOT>0.0</ndm:X_DOT>
          <ndm:Y_DOT>7.5</ndm:Y_DOT>
          <ndm:Z_DOT>0.0</ndm:Z_DOT>
        </ndm:stateVector>
      </ndm:data>
    </ndm:segment>
  </ndm:body>
</ndm:oem>"#;

    #[test]
    fn test_read_prefixed_document() {
        let raw = XmlReader.read(DOCUMENT).unwrap();
        assert_eq!(
            raw.header,
            vec![
                (VERSION_KEY.to_string(), "2.0".to_string()),
                ("CREATION_DATE".to_string(), "2020-01-01T00:00:00".to_string()),
                ("ORIGINATOR".to_string(), "ME".to_string()),
            ]
        );
        let segment = &raw.segments[0];
        assert_eq!(segment.metadata[0], ("OBJECT_NAME".to_string(), "SAT".to_string()));
        assert_eq!(segment.states[0].values, vec![7000.0, 0.0, 0.0, 0.0, 7.5, 0.0]);
        assert!(segment.covariances.is_empty());
    }

    #[test]
    fn test_partial_acceleration_rejected() {
        let document = DOCUMENT.replace(
            "<ndm:Z_DOT>0.0</ndm:Z_DOT>",
            "<ndm:Z_DOT>0.0</ndm:Z_DOT><ndm:X_DDOT>0.0</ndm:X_DDOT>",
        );
        assert!(matches!(
            XmlReader.read(&document),
            Err(OemError::XmlParse(_))
        ));
    }

    #[test]
    fn test_malformed_document() {
        assert!(matches!(
            XmlReader.read("<oem version=\"2.0\"><header>"),
            Err(OemError::XmlParse(_))
        ));
    }
}
