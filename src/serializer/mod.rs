//! Writers for the two OEM encodings. Comments are not preserved.
pub mod kvn;
pub mod xml;

use crate::message::EphemerisMessage;
use crate::oem_errors::OemError;
use crate::parser::FileFormat;

/// Encode `message` in `format`.
pub fn write(message: &EphemerisMessage, format: FileFormat) -> Result<String, OemError> {
    match format {
        FileFormat::Kvn => Ok(kvn::to_kvn(message)),
        FileFormat::Xml => xml::to_xml(message),
    }
}
