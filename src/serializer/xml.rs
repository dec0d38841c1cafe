use std::io::Write;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::components::covariance::Covariance;
use crate::components::segment::EphemerisSegment;
use crate::components::state::State;
use crate::constants::{ACCELERATION_KEYS, COVARIANCE_KEYS, STATE_VECTOR_KEYS, VERSION_KEY};
use crate::conversion::format_float;
use crate::message::EphemerisMessage;
use crate::oem_errors::OemError;

fn text_element<W: Write>(writer: &mut Writer<W>, name: &str, text: &str) -> Result<(), OemError> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn start<W: Write>(writer: &mut Writer<W>, name: &str) -> Result<(), OemError> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    Ok(())
}

fn end<W: Write>(writer: &mut Writer<W>, name: &str) -> Result<(), OemError> {
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn write_state<W: Write>(writer: &mut Writer<W>, state: &State) -> Result<(), OemError> {
    start(writer, "stateVector")?;
    text_element(writer, "EPOCH", &state.epoch.format())?;
    let keys = STATE_VECTOR_KEYS.iter().chain(ACCELERATION_KEYS.iter());
    for (key, value) in keys.zip(state.vector().iter()) {
        text_element(writer, key, &format_float(*value))?;
    }
    end(writer, "stateVector")
}

fn write_covariance<W: Write>(writer: &mut Writer<W>, covariance: &Covariance) -> Result<(), OemError> {
    start(writer, "covarianceMatrix")?;
    text_element(writer, "EPOCH", &covariance.epoch.format())?;
    if let Some(frame) = &covariance.frame {
        text_element(writer, "COV_REF_FRAME", frame)?;
    }
    for (key, row, col) in COVARIANCE_KEYS {
        text_element(writer, key, &format_float(covariance.matrix[(row, col)]))?;
    }
    end(writer, "covarianceMatrix")
}

fn write_segment<W: Write>(writer: &mut Writer<W>, segment: &EphemerisSegment) -> Result<(), OemError> {
    start(writer, "segment")?;

    start(writer, "metadata")?;
    for (key, value) in segment.metadata().formatted_fields() {
        text_element(writer, key, &value)?;
    }
    end(writer, "metadata")?;

    start(writer, "data")?;
    for state in segment.states() {
        write_state(writer, state)?;
    }
    for covariance in segment.covariances() {
        write_covariance(writer, covariance)?;
    }
    end(writer, "data")?;

    end(writer, "segment")
}

/// Encode a message in XML.
pub fn to_xml(message: &EphemerisMessage) -> Result<String, OemError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let version = message.header().version().to_string();
    let mut root = BytesStart::new("oem");
    root.push_attribute(("id", VERSION_KEY));
    root.push_attribute(("version", version.as_str()));
    writer.write_event(Event::Start(root))?;

    start(&mut writer, "header")?;
    for (key, value) in message.header().formatted_fields() {
        text_element(&mut writer, key, &value)?;
    }
    end(&mut writer, "header")?;

    start(&mut writer, "body")?;
    for segment in message.segments() {
        write_segment(&mut writer, segment)?;
    }
    end(&mut writer, "body")?;
    end(&mut writer, "oem")?;

    let mut xml = String::from_utf8(writer.into_inner())
        .map_err(|err| OemError::XmlParse(err.to_string()))?;
    xml.push('\n');
    Ok(xml)
}

#[cfg(test)]
mod xml_writer_test {
    use super::*;
    use crate::message::message_test::two_segment_message;
    use crate::parser::xml::XmlReader;
    use crate::parser::OemReader;

    #[test]
    fn test_document_layout() {
        let message = two_segment_message();
        let xml = to_xml(&message).unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("<oem id=\"CCSDS_OEM_VERS\" version=\"2.0\">"));
        assert!(xml.contains("<ORIGINATOR>TEST</ORIGINATOR>"));
        assert!(xml.contains("<X>+7.00000000000000e+03</X>"));
        assert_eq!(xml.matches("<segment>").count(), 2);
        assert_eq!(xml.matches("<stateVector>").count(), 14);
        assert!(!xml.contains("X_DDOT"));
    }

    #[test]
    fn test_reader_accepts_output() {
        let message = two_segment_message();
        let raw = XmlReader.read(&to_xml(&message).unwrap()).unwrap();
        assert_eq!(EphemerisMessage::from_raw(raw).unwrap(), message);
    }
}
