//! # KVN reader
//!
//! Line-oriented finite state machine over the Key-Value Notation encoding.
//!
//! Every line is first classified (blank, comment, section keyword, `KEY = VALUE`,
//! data line, numeric row). The current [`ParserState`] then either accepts the
//! line, moves to another state, or rejects it with an [`OemError::Parse`] carrying
//! the 1-based line number and the offending content.
//!
//! ```text
//! Version ─► Header ─META_START─► MetadataStart ─► Metadata ─META_STOP─► DataStart ─► Data
//!   Data ─META_START─► MetadataStart
//!   Data ─COVARIANCE_START─► CovarianceStart ─► CovarianceHeader ─► CovarianceMatrix(1..6)
//!   CovarianceMatrix(6) ─► CovarianceEntryEnd ─► CovarianceHeader | CovarianceStop | MetadataStart
//!   CovarianceStop ─META_START─► MetadataStart
//! ```
//!
//! Comments are discarded everywhere except before the version line.
use std::sync::LazyLock;

use regex::Regex;

use crate::constants::{
    COMMENT, COVARIANCE_START, COVARIANCE_STOP, COVARIANCE_TRIANGLE_LEN, META_START, META_STOP,
    VERSION_KEY,
};
use crate::conversion::{is_float, parse_float};
use crate::oem_errors::OemError;
use crate::parser::{OemReader, RawCovariance, RawOem, RawSegment, RawState};

static KEY_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Z][A-Z0-9_]*)[ \t]*=[ \t]*(\S.*?)[ \t]*$").expect("key/value pattern")
});

static DATA_EPOCH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-(?:\d{2}-\d{2}|\d{3})T\d{2}:\d{2}:\d{2}(?:\.\d*)?Z?$")
        .expect("data epoch pattern")
});

/// Classification of one input line.
#[derive(Debug, Clone, PartialEq)]
enum Line<'a> {
    Blank,
    Comment,
    MetaStart,
    MetaStop,
    CovarianceStart,
    CovarianceStop,
    KeyValue(&'a str, &'a str),
    Data(&'a str, Vec<f64>),
    Row(Vec<f64>),
    Unrecognized,
}

fn classify(line: &str) -> Line<'_> {
    let line = line.trim();
    if line.is_empty() {
        return Line::Blank;
    }
    match line {
        META_START => return Line::MetaStart,
        META_STOP => return Line::MetaStop,
        COVARIANCE_START => return Line::CovarianceStart,
        COVARIANCE_STOP => return Line::CovarianceStop,
        _ => {}
    }
    if line
        .strip_prefix(COMMENT)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with([' ', '\t']))
    {
        return Line::Comment;
    }
    if let Some(caps) = KEY_VALUE.captures(line) {
        let key = caps.get(1).map_or("", |m| m.as_str());
        let value = caps.get(2).map_or("", |m| m.as_str());
        return Line::KeyValue(key, value);
    }

    let tokens: Vec<&str> = line.split_whitespace().collect();
    let numbers = |tokens: &[&str]| -> Option<Vec<f64>> {
        if tokens.iter().all(|token| is_float(token)) {
            tokens.iter().map(|token| parse_float(token).ok()).collect()
        } else {
            None
        }
    };
    match tokens.split_first() {
        Some((first, rest)) if DATA_EPOCH.is_match(first) && !rest.is_empty() => {
            numbers(rest).map_or(Line::Unrecognized, |values| Line::Data(*first, values))
        }
        _ => numbers(&tokens).map_or(Line::Unrecognized, Line::Row),
    }
}

/// Position of the reader in the KVN grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParserState {
    Version,
    Header,
    MetadataStart,
    Metadata,
    DataStart,
    Data,
    CovarianceStart,
    /// Header lines of the current covariance entry read so far (1 or 2)
    CovarianceHeader(usize),
    /// Matrix rows of the current covariance entry read so far (1 to 5)
    CovarianceMatrix(usize),
    CovarianceEntryEnd,
    CovarianceStop,
}

impl ParserState {
    fn accepts_eof(&self) -> bool {
        matches!(
            self,
            ParserState::Data | ParserState::CovarianceEntryEnd | ParserState::CovarianceStop
        )
    }
}

/// Covariance entry being assembled.
#[derive(Debug, Default)]
struct PendingCovariance {
    epoch: Option<String>,
    frame: Option<String>,
    values: Vec<f64>,
}

/// Reader for the KVN encoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct KvnReader;

impl OemReader for KvnReader {
    fn read(&self, content: &str) -> Result<RawOem, OemError> {
        KvnMachine::default().run(content)
    }
}

#[derive(Debug)]
struct KvnMachine {
    state: ParserState,
    oem: RawOem,
    width: Option<usize>,
    covariance: PendingCovariance,
}

impl Default for KvnMachine {
    fn default() -> Self {
        KvnMachine {
            state: ParserState::Version,
            oem: RawOem::default(),
            width: None,
            covariance: PendingCovariance::default(),
        }
    }
}

fn push_unique(
    pairs: &mut Vec<(String, String)>,
    key: &str,
    value: &str,
    section: &str,
) -> Result<(), String> {
    if pairs.iter().any(|(k, _)| k == key) {
        return Err(format!("Duplicate key '{key}' in {section}"));
    }
    pairs.push((key.to_string(), value.to_string()));
    Ok(())
}

impl KvnMachine {
    fn run(mut self, content: &str) -> Result<RawOem, OemError> {
        let mut last_line = 0;
        for (index, text) in content.lines().enumerate() {
            let number = index + 1;
            last_line = number;
            let line = classify(text);
            match line {
                Line::Blank => continue,
                Line::Comment if self.state != ParserState::Version => continue,
                _ => {}
            }
            self.state = self
                .step(line)
                .map_err(|reason| OemError::parse(number, text, reason))?;
        }

        if !self.state.accepts_eof() {
            return Err(OemError::parse(
                last_line,
                "",
                format!("Unexpected end of file in state {:?}", self.state),
            ));
        }
        tracing::debug!(segments = self.oem.segments.len(), "KVN message read");
        Ok(self.oem)
    }

    fn segment(&mut self) -> Result<&mut RawSegment, String> {
        self.oem
            .segments
            .last_mut()
            .ok_or_else(|| "No open segment".to_string())
    }

    fn open_segment(&mut self) -> ParserState {
        self.oem.segments.push(RawSegment::default());
        self.width = None;
        ParserState::MetadataStart
    }

    fn push_state(&mut self, epoch: &str, values: Vec<f64>) -> Result<ParserState, String> {
        if values.len() != 6 && values.len() != 9 {
            return Err(format!(
                "Data line must hold 6 or 9 values, found {}",
                values.len()
            ));
        }
        match self.width {
            Some(width) if width != values.len() => {
                return Err(format!(
                    "Inconsistent data line width: expected {width} values, found {}",
                    values.len()
                ))
            }
            _ => self.width = Some(values.len()),
        }
        self.segment()?.states.push(RawState {
            epoch: epoch.to_string(),
            values,
        });
        Ok(ParserState::Data)
    }

    fn push_covariance_key(&mut self, key: &str, value: &str) -> Result<(), String> {
        let slot = match key {
            "EPOCH" => &mut self.covariance.epoch,
            "COV_REF_FRAME" => &mut self.covariance.frame,
            other => return Err(format!("Unexpected key '{other}' in covariance entry")),
        };
        if slot.is_some() {
            return Err(format!("Duplicate key '{key}' in covariance entry"));
        }
        *slot = Some(value.to_string());
        Ok(())
    }

    fn start_covariance_entry(&mut self, key: &str, value: &str) -> Result<ParserState, String> {
        self.covariance = PendingCovariance::default();
        self.push_covariance_key(key, value)?;
        Ok(ParserState::CovarianceHeader(1))
    }

    fn push_covariance_row(&mut self, row: usize, values: Vec<f64>) -> Result<ParserState, String> {
        if values.len() != row {
            return Err(format!(
                "Covariance row {row} must hold {row} values, found {}",
                values.len()
            ));
        }
        self.covariance.values.extend(values);
        if row < 6 {
            return Ok(ParserState::CovarianceMatrix(row));
        }

        let pending = std::mem::take(&mut self.covariance);
        let epoch = pending
            .epoch
            .ok_or_else(|| "Covariance entry without EPOCH".to_string())?;
        debug_assert_eq!(pending.values.len(), COVARIANCE_TRIANGLE_LEN);
        self.segment()?.covariances.push(RawCovariance {
            epoch,
            frame: pending.frame,
            lower_triangle: pending.values,
        });
        Ok(ParserState::CovarianceEntryEnd)
    }

    fn step(&mut self, line: Line) -> Result<ParserState, String> {
        use ParserState as S;

        match (self.state, line) {
            (S::Version, Line::KeyValue(VERSION_KEY, value)) => {
                push_unique(&mut self.oem.header, VERSION_KEY, value, "header")?;
                Ok(S::Header)
            }
            (S::Version, _) => Err(format!("File must start with {VERSION_KEY}")),

            (S::Header, Line::KeyValue(key, value)) => {
                push_unique(&mut self.oem.header, key, value, "header")?;
                Ok(S::Header)
            }
            (S::Header, Line::MetaStart) => Ok(self.open_segment()),

            (S::MetadataStart | S::Metadata, Line::KeyValue(key, value)) => {
                push_unique(&mut self.segment()?.metadata, key, value, "metadata")?;
                Ok(S::Metadata)
            }
            (S::Metadata, Line::MetaStop) => Ok(S::DataStart),

            (S::DataStart | S::Data, Line::Data(epoch, values)) => self.push_state(epoch, values),
            (S::Data, Line::MetaStart) => Ok(self.open_segment()),
            (S::Data, Line::CovarianceStart) => Ok(S::CovarianceStart),

            (S::CovarianceStart | S::CovarianceEntryEnd, Line::KeyValue(key, value)) => {
                self.start_covariance_entry(key, value)
            }
            (S::CovarianceHeader(1), Line::KeyValue(key, value)) => {
                self.push_covariance_key(key, value)?;
                Ok(S::CovarianceHeader(2))
            }
            (S::CovarianceHeader(_), Line::Row(values)) => self.push_covariance_row(1, values),
            (S::CovarianceMatrix(row), Line::Row(values)) => {
                self.push_covariance_row(row + 1, values)
            }
            (S::CovarianceEntryEnd, Line::CovarianceStop) => Ok(S::CovarianceStop),
            (S::CovarianceEntryEnd | S::CovarianceStop, Line::MetaStart) => {
                Ok(self.open_segment())
            }

            (state, Line::Unrecognized) => Err(format!("Unrecognized line in state {state:?}")),
            (state, _) => Err(format!("Unexpected line in state {state:?}")),
        }
    }
}

#[cfg(test)]
mod kvn_test {
    use super::*;

    const SIMPLE: &str = "CCSDS_OEM_VERS = 2.0
CREATION_DATE = 2020-01-01T00:00:00
ORIGINATOR = ME

META_START
OBJECT_NAME = SAT
OBJECT_ID = 2020-001A
CENTER_NAME = EARTH
REF_FRAME = EME2000
TIME_SYSTEM = UTC
START_TIME = 2020-01-01T00:00:00
STOP_TIME = 2020-01-01T00:01:00
META_STOP

COMMENT a comment line
2020-01-01T00:00:00 7000.0 0.0 0.0 0.0 7.5 0.0
2020-01-01T00:01:00 7000.0 450.0 0.0 0.0 7.5 0.0
";

    fn covariance_block() -> String {
        let mut block = String::from("COVARIANCE_START\nEPOCH = 2020-01-01T00:00:00\nCOV_REF_FRAME = RTN\n");
        for row in 1..=6 {
            let values = vec!["1.0e-3"; row].join(" ");
            block.push_str(&values);
            block.push('\n');
        }
        block.push_str("COVARIANCE_STOP\n");
        block
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("  "), Line::Blank);
        assert_eq!(classify("COMMENT hello"), Line::Comment);
        assert_eq!(classify("META_START"), Line::MetaStart);
        assert_eq!(classify("OBJECT_NAME = SAT 1"), Line::KeyValue("OBJECT_NAME", "SAT 1"));
        assert_eq!(
            classify("2020-001T00:00:00 1 2 3 4 5 6"),
            Line::Data("2020-001T00:00:00", vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0])
        );
        assert_eq!(classify("1.0 -2e-3"), Line::Row(vec![1.0, -2e-3]));
        assert_eq!(classify("what is this"), Line::Unrecognized);
    }

    #[test]
    fn test_read_simple() {
        let raw = KvnReader.read(SIMPLE).unwrap();
        assert_eq!(raw.header.len(), 3);
        assert_eq!(raw.segments.len(), 1);
        assert_eq!(raw.segments[0].metadata.len(), 7);
        assert_eq!(raw.segments[0].states.len(), 2);
        assert_eq!(raw.segments[0].states[1].values[1], 450.0);
    }

    #[test]
    fn test_read_covariance() {
        let content = format!("{SIMPLE}{}", covariance_block());
        let raw = KvnReader.read(&content).unwrap();
        let cov = &raw.segments[0].covariances[0];
        assert_eq!(cov.frame.as_deref(), Some("RTN"));
        assert_eq!(cov.lower_triangle.len(), 21);
    }

    #[test]
    fn test_parse_errors_report_line() {
        let missing_version = "CREATION_DATE = 2020-01-01T00:00:00\n";
        assert_eq!(
            KvnReader.read(missing_version),
            Err(OemError::Parse {
                line: 1,
                content: "CREATION_DATE = 2020-01-01T00:00:00".into(),
                reason: "File must start with CCSDS_OEM_VERS".into(),
            })
        );

        let bad_width = SIMPLE.replace(
            "2020-01-01T00:01:00 7000.0 450.0 0.0 0.0 7.5 0.0",
            "2020-01-01T00:01:00 7000.0 450.0 0.0 0.0 7.5",
        );
        assert!(matches!(
            KvnReader.read(&bad_width),
            Err(OemError::Parse { line: 17, .. })
        ));

        let duplicate = SIMPLE.replace("ORIGINATOR = ME", "ORIGINATOR = ME\nORIGINATOR = YOU");
        assert!(matches!(
            KvnReader.read(&duplicate),
            Err(OemError::Parse { line: 4, .. })
        ));

        let truncated = SIMPLE.split("META_STOP").next().unwrap_or_default();
        assert!(matches!(
            KvnReader.read(truncated),
            Err(OemError::Parse { .. })
        ));
    }

    #[test]
    fn test_covariance_block_closed_by_next_segment() {
        let block = covariance_block().replace("COVARIANCE_STOP\n", "");
        let next = SIMPLE
            .split_once("META_START")
            .map(|(_, rest)| format!("META_START{rest}"))
            .unwrap_or_default()
            .replace("00:00:00 7000.0", "00:02:00 7000.0")
            .replace("00:01:00 7000.0", "00:03:00 7000.0");
        let content = format!("{SIMPLE}{block}{next}");

        let raw = KvnReader.read(&content).unwrap();
        assert_eq!(raw.segments.len(), 2);
        assert_eq!(raw.segments[0].covariances.len(), 1);
        assert!(raw.segments[1].covariances.is_empty());
        assert_eq!(raw.segments[1].states[0].epoch, "2020-01-01T00:02:00");
    }

    #[test]
    fn test_covariance_row_lengths_are_strict() {
        let block = covariance_block().replacen("1.0e-3 1.0e-3\n", "1.0e-3 1.0e-3 1.0e-3\n", 1);
        let content = format!("{SIMPLE}{block}");
        assert!(matches!(
            KvnReader.read(&content),
            Err(OemError::Parse { .. })
        ));
    }
}
