//! Row normalization
//!
//! Maps one tabular row with arbitrary header spelling onto the canonical
//! `{FirstName, Phone, Notes}` record. Header matching is case-insensitive
//! and follows a fixed synonym priority per field; the first synonym that is
//! present wins.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Header synonyms for the first name, highest priority first
pub const FIRST_NAME_HEADERS: [&str; 4] = ["firstname", "first_name", "name", "first name"];

/// Header synonyms for the phone number, highest priority first
pub const PHONE_HEADERS: [&str; 3] = ["phone", "phone_number", "mobile"];

/// Header synonyms for notes, highest priority first
pub const NOTES_HEADERS: [&str; 3] = ["notes", "note", "remarks"];

/// One decoded row: header → cell value, in column order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    fields: Vec<(String, String)>,
}

impl RawRow {
    /// Value under an exact header. With duplicate headers the last column wins.
    pub fn get(&self, header: &str) -> Option<&str> {
        self.fields
            .iter()
            .rev()
            .find(|(h, _)| h == header)
            .map(|(_, v)| v.as_str())
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(h, _)| h.as_str())
    }

    /// True when every cell is empty or whitespace
    pub fn is_blank(&self) -> bool {
        self.fields.iter().all(|(_, v)| v.trim().is_empty())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Normalized lead derived from one input row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CanonicalRecord {
    pub first_name: String,
    pub phone: String,
    pub notes: String,
}

impl CanonicalRecord {
    pub fn new(first_name: impl Into<String>, phone: impl Into<String>, notes: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            phone: phone.into(),
            notes: notes.into(),
        }
    }
}

/// Why a row could not be normalized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RowRejection {
    /// No recognized first-name header, or no recognized phone header
    #[error("required columns missing (FirstName, Phone)")]
    MissingColumns,

    /// The header exists but the value is blank
    #[error("empty {0}")]
    EmptyValue(&'static str),
}

/// Normalize one row, or report why it is rejected
pub fn normalize_row(row: &RawRow) -> Result<CanonicalRecord, RowRejection> {
    // lower-cased header → original header; a later duplicate overrides
    let index: HashMap<String, &str> = row.headers().map(|h| (h.to_lowercase(), h)).collect();

    let (Some(first_key), Some(phone_key)) = (
        resolve_header(&index, &FIRST_NAME_HEADERS),
        resolve_header(&index, &PHONE_HEADERS),
    ) else {
        return Err(RowRejection::MissingColumns);
    };

    let value = |key: &str| row.get(key).unwrap_or_default().trim().to_string();

    let first_name = value(first_key);
    if first_name.is_empty() {
        return Err(RowRejection::EmptyValue("FirstName"));
    }

    let phone = value(phone_key);
    if phone.is_empty() {
        return Err(RowRejection::EmptyValue("Phone"));
    }

    let notes = resolve_header(&index, &NOTES_HEADERS)
        .map(value)
        .unwrap_or_default();

    Ok(CanonicalRecord::new(first_name, phone, notes))
}

/// First synonym present in the row, as the row spells it
fn resolve_header<'a>(index: &HashMap<String, &'a str>, candidates: &[&str]) -> Option<&'a str> {
    candidates
        .iter()
        .find_map(|candidate| index.get(*candidate).copied())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> RawRow {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_every_first_name_synonym_resolves() {
        for header in ["FirstName", "firstname", "FIRST_NAME", "Name", "first name", "First Name"] {
            let record = normalize_row(&row(&[(header, "Ada"), ("Phone", "555")]))
                .unwrap_or_else(|e| panic!("{} rejected: {}", header, e));
            assert_eq!(record.first_name, "Ada", "header {}", header);
        }
    }

    #[test]
    fn test_every_phone_synonym_resolves() {
        for header in ["Phone", "PHONE_NUMBER", "phone_number", "Mobile", "mobile"] {
            let record = normalize_row(&row(&[("FirstName", "Ada"), (header, "555")]))
                .unwrap_or_else(|e| panic!("{} rejected: {}", header, e));
            assert_eq!(record.phone, "555", "header {}", header);
        }
    }

    #[test]
    fn test_every_notes_synonym_resolves() {
        for header in ["Notes", "note", "REMARKS"] {
            let record = normalize_row(&row(&[("Name", "Ada"), ("Phone", "555"), (header, "call back")]))
                .unwrap();
            assert_eq!(record.notes, "call back", "header {}", header);
        }
    }

    #[test]
    fn test_first_name_priority_order() {
        // firstname beats first_name beats name beats "first name"
        let all = row(&[
            ("first name", "d"),
            ("Name", "c"),
            ("first_name", "b"),
            ("FirstName", "a"),
            ("Phone", "1"),
        ]);
        assert_eq!(normalize_row(&all).unwrap().first_name, "a");

        let no_firstname = row(&[("first name", "d"), ("Name", "c"), ("First_Name", "b"), ("Phone", "1")]);
        assert_eq!(normalize_row(&no_firstname).unwrap().first_name, "b");

        let only_name_and_spaced = row(&[("first name", "d"), ("NAME", "c"), ("Phone", "1")]);
        assert_eq!(normalize_row(&only_name_and_spaced).unwrap().first_name, "c");

        let only_spaced = row(&[("First Name", "d"), ("Phone", "1")]);
        assert_eq!(normalize_row(&only_spaced).unwrap().first_name, "d");
    }

    #[test]
    fn test_phone_priority_order() {
        let all = row(&[("Name", "n"), ("mobile", "3"), ("phone_number", "2"), ("phone", "1")]);
        assert_eq!(normalize_row(&all).unwrap().phone, "1");

        let no_phone = row(&[("Name", "n"), ("Mobile", "3"), ("Phone_Number", "2")]);
        assert_eq!(normalize_row(&no_phone).unwrap().phone, "2");

        let only_mobile = row(&[("Name", "n"), ("MOBILE", "3")]);
        assert_eq!(normalize_row(&only_mobile).unwrap().phone, "3");
    }

    #[test]
    fn test_notes_priority_order() {
        let all = row(&[("Name", "n"), ("Phone", "1"), ("remarks", "r"), ("note", "s"), ("notes", "p")]);
        assert_eq!(normalize_row(&all).unwrap().notes, "p");

        let note_and_remarks = row(&[("Name", "n"), ("Phone", "1"), ("Remarks", "r"), ("Note", "s")]);
        assert_eq!(normalize_row(&note_and_remarks).unwrap().notes, "s");
    }

    #[test]
    fn test_missing_notes_defaults_to_empty() {
        let record = normalize_row(&row(&[("FirstName", "Ada"), ("Phone", "555")])).unwrap();
        assert_eq!(record.notes, "");
    }

    #[test]
    fn test_values_are_trimmed() {
        let record = normalize_row(&row(&[
            ("FirstName", "  Ada \t"),
            ("Phone", " 555-0100 "),
            ("Notes", "  warm lead  "),
        ]))
        .unwrap();

        assert_eq!(record, CanonicalRecord::new("Ada", "555-0100", "warm lead"));
    }

    #[test]
    fn test_missing_name_and_phone_rejected_regardless_of_other_columns() {
        let rejected = row(&[("Email", "a@example.com"), ("Notes", "x"), ("Surname", "Lovelace")]);
        assert_eq!(normalize_row(&rejected), Err(RowRejection::MissingColumns));
    }

    #[test]
    fn test_missing_either_required_column_rejected() {
        assert_eq!(
            normalize_row(&row(&[("FirstName", "Ada")])),
            Err(RowRejection::MissingColumns)
        );
        assert_eq!(
            normalize_row(&row(&[("Phone", "555")])),
            Err(RowRejection::MissingColumns)
        );
    }

    #[test]
    fn test_headers_are_not_fuzzy_matched() {
        // Only the listed spellings count
        let near_miss = row(&[("First-Name", "Ada"), ("Telephone", "555")]);
        assert_eq!(normalize_row(&near_miss), Err(RowRejection::MissingColumns));
    }

    #[test]
    fn test_blank_required_values_rejected() {
        assert_eq!(
            normalize_row(&row(&[("FirstName", "   "), ("Phone", "555")])),
            Err(RowRejection::EmptyValue("FirstName"))
        );
        assert_eq!(
            normalize_row(&row(&[("FirstName", "Ada"), ("Phone", "")])),
            Err(RowRejection::EmptyValue("Phone"))
        );
    }

    #[test]
    fn test_duplicate_header_last_column_wins() {
        let dup = row(&[("Phone", "111"), ("FirstName", "Ada"), ("phone", "222")]);
        assert_eq!(normalize_row(&dup).unwrap().phone, "222");
    }

    #[test]
    fn test_canonical_record_serializes_pascal_case() {
        let json = serde_json::to_value(CanonicalRecord::new("Ada", "555", "")).unwrap();
        assert_eq!(json["FirstName"], "Ada");
        assert_eq!(json["Phone"], "555");
        assert_eq!(json["Notes"], "");
    }

    #[test]
    fn test_raw_row_blank_detection() {
        assert!(row(&[("Name", " "), ("Phone", "")]).is_blank());
        assert!(!row(&[("Name", " "), ("Phone", "1")]).is_blank());
    }
}
