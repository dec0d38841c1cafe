use thiserror::Error;

#[derive(Error, Debug)]
pub enum OemError {
    #[error("Parse error on line {line}: {reason} ('{content}')")]
    Parse {
        line: usize,
        content: String,
        reason: String,
    },

    #[error("Malformed XML OEM: {0}")]
    XmlParse(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid dimension: {0}")]
    Dimension(String),

    #[error("Incompatible compare: {0}")]
    IncompatibleCompare(String),

    #[error("Unsupported operation for rotating frame: {0}")]
    UnsupportedFrameOperation(String),

    #[error("Epoch out of range: {0}")]
    OutOfRange(String),

    #[error("Interpolation error: {0}")]
    Interpolation(String),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),
}

impl OemError {
    pub(crate) fn parse(line: usize, content: &str, reason: impl Into<String>) -> Self {
        OemError::Parse {
            line,
            content: content.trim().to_string(),
            reason: reason.into(),
        }
    }
}

impl From<quick_xml::DeError> for OemError {
    fn from(err: quick_xml::DeError) -> Self {
        OemError::XmlParse(err.to_string())
    }
}

impl From<quick_xml::Error> for OemError {
    fn from(err: quick_xml::Error) -> Self {
        OemError::XmlParse(err.to_string())
    }
}

impl PartialEq for OemError {
    fn eq(&self, other: &Self) -> bool {
        use OemError::*;
        match (self, other) {
            (
                Parse {
                    line: l1,
                    content: c1,
                    reason: r1,
                },
                Parse {
                    line: l2,
                    content: c2,
                    reason: r2,
                },
            ) => l1 == l2 && c1 == c2 && r1 == r2,
            (XmlParse(a), XmlParse(b)) => a == b,
            (Validation(a), Validation(b)) => a == b,
            (Dimension(a), Dimension(b)) => a == b,
            (IncompatibleCompare(a), IncompatibleCompare(b)) => a == b,
            (UnsupportedFrameOperation(a), UnsupportedFrameOperation(b)) => a == b,
            (OutOfRange(a), OutOfRange(b)) => a == b,
            (Interpolation(a), Interpolation(b)) => a == b,
            (UnsupportedFormat(a), UnsupportedFormat(b)) => a == b,

            // io::Error carries no comparable payload
            (IoError(_), IoError(_)) => true,

            _ => false,
        }
    }
}
