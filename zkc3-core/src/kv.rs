//! Key/value payload parsing
//!
//! Parameter replies, discovery replies and key/value real-time logs are
//! ASCII text of `key=value` pairs separated by commas or tabs. Keys consist
//! of word characters and may start with `~`; values run up to the next
//! separator and may contain spaces.

use std::collections::HashMap;

fn is_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '~'
}

fn is_separator(c: char) -> bool {
    matches!(c, ',' | '\t' | '\r' | '\n' | '\0')
}

/// Parse all `key=value` pairs of a text payload
///
/// Non-ASCII bytes are dropped and malformed fragments are skipped, so a
/// partially garbled reply still yields its readable pairs.
///
/// # Examples
///
/// ```
/// use zkc3_core::kv;
///
/// let params = kv::parse(b"~SerialNumber=6404162101689,LockCount=2");
/// assert_eq!(params["~SerialNumber"], "6404162101689");
/// assert_eq!(params["LockCount"], "2");
/// ```
pub fn parse(data: &[u8]) -> HashMap<String, String> {
    let text: String = data.iter().filter(|b| b.is_ascii()).map(|&b| b as char).collect();
    parse_str(&text)
}

/// Parse all `key=value` pairs of a string
pub fn parse_str(text: &str) -> HashMap<String, String> {
    text.split(is_separator)
        .filter_map(parse_pair)
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

fn parse_pair(fragment: &str) -> Option<(&str, &str)> {
    let (key, value) = fragment.split_once('=')?;

    // Keep the trailing run of key characters, so leading noise is ignored
    let start = key
        .char_indices()
        .rev()
        .take_while(|(_, c)| is_key_char(*c))
        .last()
        .map(|(i, _)| i)?;
    let key = &key[start..];

    if value.is_empty() {
        return None;
    }

    Some((key, value))
}

/// Split a multi-record text payload into its records
///
/// Records are separated by line breaks; empty lines are skipped.
pub fn records(data: &[u8]) -> Vec<HashMap<String, String>> {
    let text: String = data.iter().filter(|b| b.is_ascii()).map(|&b| b as char).collect();

    text.split(['\r', '\n'])
        .filter(|line| !line.trim().is_empty())
        .map(parse_str)
        .filter(|record| !record.is_empty())
        .collect()
}

/// Build a GETPARAM request payload
pub fn join_names<S: AsRef<str>>(names: &[S]) -> String {
    names
        .iter()
        .map(|name| name.as_ref())
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_params() {
        let params = parse(b"~ZKFPVersion=10,LockCount=2,ReaderCount=4,AuxInCount=2,AuxOutCount=2");

        assert_eq!(params.len(), 5);
        assert_eq!(params["~ZKFPVersion"], "10");
        assert_eq!(params["ReaderCount"], "4");
        assert_eq!(params["AuxOutCount"], "2");
    }

    #[test]
    fn test_parse_tab_separated_with_spaces() {
        let params = parse(b"time=2023-12-09 15:09:33\tsensor=24\trelay=04\talarm=00000000");

        assert_eq!(params["time"], "2023-12-09 15:09:33");
        assert_eq!(params["sensor"], "24");
        assert_eq!(params["alarm"], "00000000");
    }

    #[test]
    fn test_parse_skips_garbage() {
        let params = parse(b"\x00\xffnoise,=novalue,key=,IP=192.168.1.201");

        assert_eq!(params.len(), 1);
        assert_eq!(params["IP"], "192.168.1.201");
    }

    #[test]
    fn test_records() {
        let data = b"time=2023-12-06 22:33:15\tpin=0\tevent=8\r\ntime=2023-12-09 15:09:33\tsensor=24\r\n";
        let records = records(data);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["event"], "8");
        assert!(!records[1].contains_key("event"));
    }

    #[test]
    fn test_join_names() {
        assert_eq!(join_names(&["~SerialNumber", "LockCount"]), "~SerialNumber,LockCount");
    }
}
