use crate::constraints::{require, Constraint, ConstraintSpec, Versioned};
use crate::oem_errors::OemError;
use crate::schema::{metadata_schema, FieldContext, FieldValue};
use crate::sections::KeyValueSection;
use crate::time::{OemEpoch, TimeSystem};
use crate::version::OemVersion;

/// Metadata block of an ephemeris segment.
///
/// Typed access is provided for the keywords used by the rest of the crate; any
/// keyword can be read through [`MetaData::get`].
#[derive(Debug, Clone, PartialEq)]
pub struct MetaData {
    fields: KeyValueSection,
    version: OemVersion,
    time_system: TimeSystem,
    start_time: OemEpoch,
    stop_time: OemEpoch,
}

static METADATA_CONSTRAINTS: ConstraintSpec<MetaData> = ConstraintSpec(&[
    Constraint::all("start_before_stop", check_time_range),
    Constraint::all("useable_time_range", check_useable_range),
    Constraint::all("interpolation_degree", check_interpolation),
    Constraint::only(
        "no_ref_frame_epoch",
        &[OemVersion::V1_0],
        check_ref_frame_epoch,
    ),
    Constraint::only(
        "no_message_id",
        &[OemVersion::V1_0, OemVersion::V2_0],
        check_message_id,
    ),
]);

fn check_time_range(metadata: &MetaData) -> Result<(), OemError> {
    require(metadata.start_time <= metadata.stop_time, || {
        format!(
            "START_TIME {} is after STOP_TIME {}",
            metadata.start_time, metadata.stop_time
        )
    })
}

fn check_useable_range(metadata: &MetaData) -> Result<(), OemError> {
    let start = metadata.get("USEABLE_START_TIME").and_then(FieldValue::as_epoch);
    let stop = metadata.get("USEABLE_STOP_TIME").and_then(FieldValue::as_epoch);
    match (start, stop) {
        (None, None) => Ok(()),
        (Some(_), None) => Err(OemError::Validation(
            "USEABLE_START_TIME provided without USEABLE_STOP_TIME".into(),
        )),
        (None, Some(_)) => Err(OemError::Validation(
            "USEABLE_STOP_TIME provided without USEABLE_START_TIME".into(),
        )),
        (Some(start), Some(stop)) => {
            require(start <= stop, || {
                "USEABLE_START_TIME after USEABLE_STOP_TIME".into()
            })?;
            require(start >= metadata.start_time, || {
                "USEABLE_START_TIME before START_TIME".into()
            })?;
            require(stop <= metadata.stop_time, || {
                "USEABLE_STOP_TIME after STOP_TIME".into()
            })
        }
    }
}

fn check_interpolation(metadata: &MetaData) -> Result<(), OemError> {
    if metadata.contains("INTERPOLATION") {
        require(metadata.contains("INTERPOLATION_DEGREE"), || {
            "INTERPOLATION provided without INTERPOLATION_DEGREE".into()
        })?;
    }
    Ok(())
}

fn check_ref_frame_epoch(metadata: &MetaData) -> Result<(), OemError> {
    require(!metadata.contains("REF_FRAME_EPOCH"), || {
        "Metadata keyword 'REF_FRAME_EPOCH' not supported in OEM v1.0".into()
    })
}

fn check_message_id(metadata: &MetaData) -> Result<(), OemError> {
    require(!metadata.contains("MESSAGE_ID"), || {
        "Metadata keyword 'MESSAGE_ID' not supported in OEM v1.0 and v2.0".into()
    })
}

impl Versioned for MetaData {
    fn version(&self) -> OemVersion {
        self.version
    }
}

impl MetaData {
    /// Build and validate a metadata block.
    ///
    /// Arguments
    /// -----------------
    /// * `raw`: keyword/value pairs in file order
    /// * `version`: OEM version of the owning message
    ///
    /// Return
    /// ----------
    /// * The validated metadata, or the first schema or constraint violation.
    pub fn from_raw(raw: &[(String, String)], version: OemVersion) -> Result<Self, OemError> {
        let time_system = raw
            .iter()
            .find(|(key, _)| key == "TIME_SYSTEM")
            .map(|(_, value)| TimeSystem::resolve(value))
            .ok_or_else(|| {
                OemError::Validation("Missing required key 'TIME_SYSTEM' in metadata".into())
            })?;

        let context = FieldContext {
            time_system: Some(&time_system),
        };
        let fields = KeyValueSection::from_raw(metadata_schema(version), raw, &context)?;

        let epoch = |key: &str| {
            fields
                .get(key)
                .and_then(FieldValue::as_epoch)
                .ok_or_else(|| OemError::Validation(format!("Missing required key '{key}' in metadata")))
        };
        let start_time = epoch("START_TIME")?;
        let stop_time = epoch("STOP_TIME")?;

        let metadata = MetaData {
            fields,
            version,
            time_system,
            start_time,
            stop_time,
        };
        METADATA_CONSTRAINTS.apply(&metadata)?;
        Ok(metadata)
    }

    pub fn version(&self) -> OemVersion {
        self.version
    }

    fn text(&self, key: &str) -> &str {
        self.fields
            .get(key)
            .and_then(FieldValue::as_text)
            .unwrap_or_default()
    }

    pub fn object_name(&self) -> &str {
        self.text("OBJECT_NAME")
    }

    pub fn object_id(&self) -> &str {
        self.text("OBJECT_ID")
    }

    pub fn center_name(&self) -> &str {
        self.text("CENTER_NAME")
    }

    pub fn ref_frame(&self) -> &str {
        self.text("REF_FRAME")
    }

    pub fn time_system(&self) -> &TimeSystem {
        &self.time_system
    }

    pub fn start_time(&self) -> OemEpoch {
        self.start_time
    }

    pub fn stop_time(&self) -> OemEpoch {
        self.stop_time
    }

    /// `USEABLE_START_TIME`, or `START_TIME` when absent.
    pub fn useable_start_time(&self) -> OemEpoch {
        self.fields
            .get("USEABLE_START_TIME")
            .and_then(FieldValue::as_epoch)
            .unwrap_or(self.start_time)
    }

    /// `USEABLE_STOP_TIME`, or `STOP_TIME` when absent.
    pub fn useable_stop_time(&self) -> OemEpoch {
        self.fields
            .get("USEABLE_STOP_TIME")
            .and_then(FieldValue::as_epoch)
            .unwrap_or(self.stop_time)
    }

    pub fn ref_frame_epoch(&self) -> Option<OemEpoch> {
        self.fields.get("REF_FRAME_EPOCH").and_then(FieldValue::as_epoch)
    }

    pub fn interpolation(&self) -> Option<&str> {
        self.fields.get("INTERPOLATION").and_then(FieldValue::as_text)
    }

    pub fn interpolation_degree(&self) -> Option<u32> {
        self.fields
            .get("INTERPOLATION_DEGREE")
            .and_then(FieldValue::as_integer)
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

    pub fn formatted_fields(&self) -> Vec<(&'static str, String)> {
        self.fields.formatted()
    }

    /// Copy of this metadata with `key` set to `raw`, fully re-validated.
    ///
    /// Changing `TIME_SYSTEM` re-reads every epoch keyword in the new calendar.
    pub fn with_value(&self, key: &str, raw: &str) -> Result<Self, OemError> {
        let mut pairs: Vec<(String, String)> = self
            .formatted_fields()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        match pairs.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = raw.to_string(),
            None => pairs.push((key.to_string(), raw.to_string())),
        }
        MetaData::from_raw(&pairs, self.version)
    }

    /// Set `key` to `raw`. On failure the metadata is left unchanged.
    pub fn set(&mut self, key: &str, raw: &str) -> Result<(), OemError> {
        *self = self.with_value(key, raw)?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod metadata_test {
    use super::*;

    pub(crate) fn raw_metadata(extra: &[(&str, &str)]) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = [
            ("OBJECT_NAME", "SAT"),
            ("OBJECT_ID", "2020-001A"),
            ("CENTER_NAME", "EARTH"),
            ("REF_FRAME", "EME2000"),
            ("TIME_SYSTEM", "UTC"),
            ("START_TIME", "2020-01-01T00:00:00"),
            ("STOP_TIME", "2020-01-01T01:00:00"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        for (key, value) in extra {
            match pairs.iter_mut().find(|(k, _)| k == key) {
                Some(entry) => entry.1 = value.to_string(),
                None => pairs.push((key.to_string(), value.to_string())),
            }
        }
        pairs
    }

    #[test]
    fn test_defaults_and_accessors() {
        let metadata = MetaData::from_raw(&raw_metadata(&[]), OemVersion::V2_0).unwrap();
        assert_eq!(metadata.object_name(), "SAT");
        assert_eq!(metadata.ref_frame(), "EME2000");
        assert_eq!(metadata.time_system(), &TimeSystem::Utc);
        assert_eq!(metadata.useable_start_time(), metadata.start_time());
        assert_eq!(metadata.useable_stop_time(), metadata.stop_time());
        assert_eq!(metadata.interpolation(), None);
    }

    #[test]
    fn test_time_constraints() {
        let reversed = raw_metadata(&[("STOP_TIME", "2019-12-31T00:00:00")]);
        assert!(matches!(
            MetaData::from_raw(&reversed, OemVersion::V2_0),
            Err(OemError::Validation(_))
        ));

        let half = raw_metadata(&[("USEABLE_START_TIME", "2020-01-01T00:10:00")]);
        assert_eq!(
            MetaData::from_raw(&half, OemVersion::V2_0),
            Err(OemError::Validation(
                "USEABLE_START_TIME provided without USEABLE_STOP_TIME".into()
            ))
        );

        let outside = raw_metadata(&[
            ("USEABLE_START_TIME", "2020-01-01T00:10:00"),
            ("USEABLE_STOP_TIME", "2020-01-01T02:00:00"),
        ]);
        assert!(MetaData::from_raw(&outside, OemVersion::V2_0).is_err());

        let nested = raw_metadata(&[
            ("USEABLE_START_TIME", "2020-01-01T00:10:00"),
            ("USEABLE_STOP_TIME", "2020-01-01T00:50:00"),
        ]);
        let metadata = MetaData::from_raw(&nested, OemVersion::V2_0).unwrap();
        assert_eq!(metadata.useable_stop_time() - metadata.useable_start_time(), 2400.0);
    }

    #[test]
    fn test_interpolation_constraints() {
        let missing_degree = raw_metadata(&[("INTERPOLATION", "HERMITE")]);
        assert!(MetaData::from_raw(&missing_degree, OemVersion::V2_0).is_err());

        let fractional = raw_metadata(&[
            ("INTERPOLATION", "HERMITE"),
            ("INTERPOLATION_DEGREE", "5.5"),
        ]);
        assert!(MetaData::from_raw(&fractional, OemVersion::V2_0).is_err());

        let ok = raw_metadata(&[
            ("INTERPOLATION", "HERMITE"),
            ("INTERPOLATION_DEGREE", "5.0"),
        ]);
        let metadata = MetaData::from_raw(&ok, OemVersion::V2_0).unwrap();
        assert_eq!(metadata.interpolation_degree(), Some(5));
    }

    #[test]
    fn test_version_gated_keywords() {
        let frame_epoch = raw_metadata(&[("REF_FRAME_EPOCH", "2000-01-01T12:00:00")]);
        assert!(MetaData::from_raw(&frame_epoch, OemVersion::V1_0).is_err());
        assert!(MetaData::from_raw(&frame_epoch, OemVersion::V2_0).is_ok());

        let message_id = raw_metadata(&[("MESSAGE_ID", "ABC")]);
        assert!(MetaData::from_raw(&message_id, OemVersion::V1_0).is_err());
        assert!(MetaData::from_raw(&message_id, OemVersion::V2_0).is_err());
        assert!(MetaData::from_raw(&message_id, OemVersion::V3_0).is_ok());
    }

    #[test]
    fn test_set_revalidates() {
        let mut metadata = MetaData::from_raw(&raw_metadata(&[]), OemVersion::V2_0).unwrap();
        metadata.set("CENTER_NAME", "MARS").unwrap();
        assert_eq!(metadata.center_name(), "MARS");

        let before = metadata.clone();
        assert!(metadata.set("STOP_TIME", "2019-01-01T00:00:00").is_err());
        assert_eq!(metadata, before);

        metadata.set("TIME_SYSTEM", "TAI").unwrap();
        assert_eq!(metadata.time_system(), &TimeSystem::Tai);
        assert_eq!(
            metadata.start_time().format(),
            "2020-01-01T00:00:00.000000"
        );
    }
}
