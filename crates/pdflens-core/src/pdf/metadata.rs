//! Document information dictionary and PDF date strings.

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone};
use lazy_static::lazy_static;
use lopdf::{Dictionary, Document, Object};
use regex::Regex;

use crate::models::DocumentMetadata;

lazy_static! {
    /// `D:YYYYMMDDHHmmSSOHH'mm'`, everything after the year optional.
    static ref PDF_DATE: Regex = Regex::new(
        r"^(?:D:)?(\d{4})(\d{2})?(\d{2})?(\d{2})?(\d{2})?(\d{2})?(?:([Zz+\-])(\d{2})?'?(\d{2})?'?)?"
    ).unwrap();
}

/// Read the `/Info` dictionary referenced from the trailer.
pub(crate) fn read_metadata(doc: &Document) -> DocumentMetadata {
    let info = match doc.trailer.get(b"Info") {
        Ok(Object::Reference(id)) => doc.get_object(*id).and_then(|o| o.as_dict()).ok(),
        Ok(Object::Dictionary(dict)) => Some(dict),
        _ => None,
    };

    let Some(info) = info else {
        return DocumentMetadata::default();
    };

    DocumentMetadata {
        title: info_string(doc, info, b"Title"),
        author: info_string(doc, info, b"Author"),
        subject: info_string(doc, info, b"Subject"),
        keywords: info_string(doc, info, b"Keywords"),
        creator: info_string(doc, info, b"Creator"),
        producer: info_string(doc, info, b"Producer"),
        creation_date: info_string(doc, info, b"CreationDate"),
        modification_date: info_string(doc, info, b"ModDate"),
    }
}

fn info_string(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<String> {
    let obj = match dict.get(key).ok()? {
        Object::Reference(id) => doc.get_object(*id).ok()?,
        other => other,
    };

    let value = match obj {
        Object::String(bytes, _) => decode_text_string(bytes),
        Object::Name(name) => String::from_utf8_lossy(name).into_owned(),
        _ => return None,
    };

    let value = value.trim_matches('\0').trim().to_string();
    (!value.is_empty()).then_some(value)
}

/// Decode a PDF text string: UTF-16BE with BOM, else UTF-8, else Latin-1.
fn decode_text_string(bytes: &[u8]) -> String {
    if let [0xFE, 0xFF, rest @ ..] = bytes {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }

    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// Parse a PDF date string such as `D:20240315093000+01'00'`.
///
/// Returns `None` for anything that does not describe a real date.
pub fn parse_pdf_date(value: &str) -> Option<DateTime<FixedOffset>> {
    let caps = PDF_DATE.captures(value.trim())?;
    let num = |i: usize, default: u32| -> Option<u32> {
        match caps.get(i) {
            Some(m) => m.as_str().parse().ok(),
            None => Some(default),
        }
    };

    let year: i32 = caps.get(1)?.as_str().parse().ok()?;
    let date = NaiveDate::from_ymd_opt(year, num(2, 1)?, num(3, 1)?)?;
    let naive = date.and_hms_opt(num(4, 0)?, num(5, 0)?, num(6, 0)?)?;

    let offset_secs = match caps.get(7).map(|m| m.as_str()) {
        Some("+") | Some("-") => {
            let secs = (num(8, 0)? * 3600 + num(9, 0)? * 60) as i32;
            if caps.get(7)?.as_str() == "-" { -secs } else { secs }
        }
        _ => 0,
    };

    FixedOffset::east_opt(offset_secs)?
        .from_local_datetime(&naive)
        .single()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_full_date() {
        let date = parse_pdf_date("D:20240315093000+01'00'").unwrap();
        assert_eq!(date.to_rfc3339(), "2024-03-15T09:30:00+01:00");
    }

    #[test]
    fn test_parse_utc_and_partial_dates() {
        assert_eq!(
            parse_pdf_date("D:20231231235959Z").unwrap().to_rfc3339(),
            "2023-12-31T23:59:59+00:00"
        );
        assert_eq!(
            parse_pdf_date("D:2022").unwrap().to_rfc3339(),
            "2022-01-01T00:00:00+00:00"
        );
        assert_eq!(
            parse_pdf_date("20200101120000-05'30").unwrap().to_rfc3339(),
            "2020-01-01T12:00:00-05:30"
        );
    }

    #[test]
    fn test_parse_invalid_dates() {
        assert!(parse_pdf_date("").is_none());
        assert!(parse_pdf_date("yesterday").is_none());
        assert!(parse_pdf_date("D:20241301").is_none());
    }

    #[test]
    fn test_decode_text_string() {
        assert_eq!(decode_text_string(b"Plain"), "Plain");
        assert_eq!(decode_text_string(&[0xFE, 0xFF, 0x00, 0x41, 0x00, 0xE9]), "A\u{e9}");
        assert_eq!(decode_text_string(&[0x43, 0x61, 0x66, 0xE9]), "Caf\u{e9}");
    }

    #[test]
    fn test_read_metadata() {
        let mut doc = Document::with_version("1.5");
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal("Annual Report"),
            "Author" => Object::string_literal("  "),
            "Producer" => Object::string_literal("pdflens tests"),
            "CreationDate" => Object::string_literal("D:20240101000000Z"),
        });
        doc.trailer.set("Info", Object::Reference(info_id));

        let meta = read_metadata(&doc);
        assert_eq!(meta.title.as_deref(), Some("Annual Report"));
        assert_eq!(meta.author, None);
        assert_eq!(meta.producer.as_deref(), Some("pdflens tests"));
        assert_eq!(meta.creation_date.as_deref(), Some("D:20240101000000Z"));
        assert_eq!(meta.modification_date, None);
    }

    #[test]
    fn test_read_metadata_without_info() {
        let doc = Document::with_version("1.5");
        assert_eq!(read_metadata(&doc), DocumentMetadata::default());
    }
}
