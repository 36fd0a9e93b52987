//! Encoding between canonical sequences and the two physical column forms.
//!
//! A sequence column is either a legacy `TEXT` column holding array-literal
//! text (`{a,b,c}`) or a migrated `JSONB` column holding a JSON string
//! array. Writers pick the encoding off the live column's declared type so
//! loads keep working on either side of the migration; readers sniff the
//! value itself, which also lets a half-migrated database be read.

use vitae_core::{
  canon::{normalize_sequence, parse_array_literal},
  profile::Experience,
};

use crate::Result;

// ─── Sequence encodings ──────────────────────────────────────────────────────

/// Physical representation of a sequence column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeqEncoding {
  /// Legacy bracketed text, `{a,b,c}`.
  ArrayLiteral,
  /// JSON string array, `["a","b","c"]`.
  Document,
}

impl SeqEncoding {
  /// Classify a column by its declared type from `pragma_table_info`.
  pub fn from_declared_type(declared: &str) -> SeqEncoding {
    if declared.to_ascii_uppercase().contains("JSONB") {
      SeqEncoding::Document
    } else {
      SeqEncoding::ArrayLiteral
    }
  }
}

pub fn encode_sequence(values: &[String], encoding: SeqEncoding) -> Result<String> {
  match encoding {
    SeqEncoding::ArrayLiteral => Ok(encode_array_literal(values)),
    SeqEncoding::Document => Ok(serde_json::to_string(values)?),
  }
}

/// Render the legacy physical text form. Elements are always quoted; the
/// parser strips the quotes back off.
pub fn encode_array_literal(values: &[String]) -> String {
  if values.is_empty() {
    return "{}".to_owned();
  }
  let quoted: Vec<String> = values.iter().map(|v| format!("\"{v}\"")).collect();
  format!("{{{}}}", quoted.join(","))
}

/// Decode either physical form back to the canonical sequence.
///
/// NULL decodes to the empty sequence, never to an absent value. Text that
/// fails to parse as a JSON array falls back to the array-literal parser;
/// malformed rows are tolerated, not fatal.
pub fn decode_sequence(raw: Option<&str>) -> Vec<String> {
  let Some(text) = raw else {
    return Vec::new();
  };

  let trimmed = text.trim();
  if trimmed.starts_with('[') {
    if let Ok(values) = serde_json::from_str::<Vec<String>>(trimmed) {
      return normalize_sequence(values);
    }
  }
  parse_array_literal(trimmed)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `professional_experience` (or
/// `full_experience`) row.
pub struct RawExperienceRow {
  pub company:          Option<String>,
  pub title:            Option<String>,
  pub start_date:       Option<String>,
  pub end_date:         Option<String>,
  pub location:         Option<String>,
  pub responsibilities: Option<String>,
  pub achievements:     Option<String>,
  pub narrative:        Option<String>,
}

impl RawExperienceRow {
  pub fn into_experience(self) -> Experience {
    Experience {
      company:          self.company,
      title:            self.title,
      start_date:       self.start_date,
      end_date:         self.end_date,
      location:         self.location,
      responsibilities: decode_sequence(self.responsibilities.as_deref()),
      achievements:     decode_sequence(self.achievements.as_deref()),
      narrative:        decode_sequence(self.narrative.as_deref()),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn array_literal_roundtrip() {
    let values = vec!["shipped the thing".to_owned(), "kept it running".to_owned()];
    let encoded = encode_array_literal(&values);
    assert_eq!(encoded, "{\"shipped the thing\",\"kept it running\"}");
    assert_eq!(decode_sequence(Some(&encoded)), values);
  }

  #[test]
  fn document_roundtrip() {
    let values = vec!["a".to_owned(), "b".to_owned()];
    let encoded = encode_sequence(&values, SeqEncoding::Document).unwrap();
    assert_eq!(encoded, "[\"a\",\"b\"]");
    assert_eq!(decode_sequence(Some(&encoded)), values);
  }

  #[test]
  fn null_decodes_to_empty_sequence() {
    assert_eq!(decode_sequence(None), Vec::<String>::new());
    assert_eq!(decode_sequence(Some("{}")), Vec::<String>::new());
    assert_eq!(decode_sequence(Some("[]")), Vec::<String>::new());
  }

  #[test]
  fn declared_type_classification() {
    assert_eq!(SeqEncoding::from_declared_type("JSONB"), SeqEncoding::Document);
    assert_eq!(SeqEncoding::from_declared_type("jsonb"), SeqEncoding::Document);
    assert_eq!(
      SeqEncoding::from_declared_type("TEXT"),
      SeqEncoding::ArrayLiteral
    );
  }
}
