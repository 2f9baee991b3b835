//! Per-component percent-encode sets (§4.2 "Encode sets per component") and
//! the shared percent-decoder.

use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};

use super::error::ParseError;

const fn base_set() -> AsciiSet {
    CONTROLS
        .add(b' ')
        .add(b'"')
        .add(b'<')
        .add(b'>')
        .add(b'`')
        .add(0x7f)
}

const USERINFO: AsciiSet = base_set().add(b'/').add(b':').add(b'@').add(b'\\').add(b'?').add(b'#').add(b'[').add(b']');
const PATH_SEGMENT: AsciiSet = base_set().add(b'/').add(b'?').add(b'#').add(b'[').add(b']').add(b'\\');
const QUERY: AsciiSet = base_set().add(b'#').add(b'\'');
const QUERY_COMPONENT: AsciiSet = QUERY.add(b'&').add(b'=').add(b'+');
const FRAGMENT: AsciiSet = CONTROLS.add(b' ').add(b'`');

pub fn encode_userinfo(s: &str) -> String {
    utf8_percent_encode(s, &USERINFO).to_string()
}

pub fn encode_path_segment(s: &str) -> String {
    utf8_percent_encode(s, &PATH_SEGMENT).to_string()
}

pub fn encode_query_component(s: &str) -> String {
    utf8_percent_encode(s, &QUERY_COMPONENT).to_string()
}

pub fn encode_fragment(s: &str) -> String {
    utf8_percent_encode(s, &FRAGMENT).to_string()
}

/// Decode percent-escapes back to a UTF-8 string, failing on a dangling `%`
/// or a triplet that is not valid UTF-8 once decoded.
pub fn decode(s: &str) -> Result<String, ParseError> {
    percent_decode_str(s)
        .decode_utf8()
        .map(|cow| cow.into_owned())
        .map_err(|_| ParseError::InvalidPercentEncoding(s.to_string()))
}
