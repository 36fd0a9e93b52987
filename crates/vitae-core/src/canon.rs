//! Canonical forms for loosely-typed profile source data.
//!
//! Source files are human-authored, so values arrive with stray whitespace,
//! decorative quotes, placeholder dates and half-filled lists. Everything in
//! this module is pure: raw text in, canonical values out. The store and the
//! loader both build on these functions, which keeps the logical shape of a
//! field independent of its physical representation.

use chrono::NaiveDate;

// ─── Scalars ─────────────────────────────────────────────────────────────────

/// Quote characters stripped from the ends of a scalar, straight and curly.
const QUOTE_CHARS: [char; 6] =
  ['"', '\'', '\u{201C}', '\u{201D}', '\u{2018}', '\u{2019}'];

/// Trim a raw scalar and strip a single layer of enclosing quotes.
///
/// `None` stays `None`; a value that is empty once normalized also becomes
/// `None`, so callers never see empty strings.
pub fn normalize_scalar(value: Option<&str>) -> Option<String> {
  let trimmed = value?.trim();
  let stripped = strip_quote_layer(trimmed).trim();
  if stripped.is_empty() {
    None
  } else {
    Some(stripped.to_owned())
  }
}

/// Strip one layer of enclosing quotes when both ends carry a quote char.
fn strip_quote_layer(s: &str) -> &str {
  let mut chars = s.chars();
  match (chars.next(), chars.next_back()) {
    (Some(first), Some(last))
      if QUOTE_CHARS.contains(&first) && QUOTE_CHARS.contains(&last) =>
    {
      &s[first.len_utf8()..s.len() - last.len_utf8()]
    }
    _ => s,
  }
}

// ─── Sequences ───────────────────────────────────────────────────────────────

/// Normalize each element and drop the ones that normalize to nothing.
///
/// Order of the surviving elements is preserved. Idempotent: applying this
/// twice yields the same sequence as applying it once.
pub fn normalize_sequence<I, S>(values: I) -> Vec<String>
where
  I: IntoIterator<Item = S>,
  S: AsRef<str>,
{
  values
    .into_iter()
    .filter_map(|v| normalize_scalar(Some(v.as_ref())))
    .collect()
}

// ─── Dates ───────────────────────────────────────────────────────────────────

/// Placeholder tokens that mean "no date", not "bad date".
const PLACEHOLDER_DATES: [&str; 2] = ["YYYY-MM", "YYYY-MM-DD"];

/// The result of normalizing a date field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateOutcome {
  /// A full `YYYY-MM-DD` value that chrono accepts as a calendar date.
  Parsed(String),
  /// Text that is neither a placeholder nor a well-formed date. Stored
  /// as-is; callers decide whether to tolerate it.
  Unvalidated(String),
  /// No usable date: empty input or a recognized placeholder token.
  Absent,
}

impl DateOutcome {
  /// Flatten to the stored value, keeping unvalidated text intact.
  pub fn into_value(self) -> Option<String> {
    match self {
      DateOutcome::Parsed(s) | DateOutcome::Unvalidated(s) => Some(s),
      DateOutcome::Absent => None,
    }
  }

  pub fn is_absent(&self) -> bool {
    matches!(self, DateOutcome::Absent)
  }
}

/// Normalize a date field to the canonical `YYYY-MM-DD` form.
///
/// Bare years and year-months are anchored to day 1. Malformed input never
/// fails hard; it comes back as [`DateOutcome::Unvalidated`].
pub fn normalize_date(value: Option<&str>) -> DateOutcome {
  let Some(text) = normalize_scalar(value) else {
    return DateOutcome::Absent;
  };

  if PLACEHOLDER_DATES.contains(&text.as_str()) {
    return DateOutcome::Absent;
  }

  let candidate = match text.len() {
    4 => format!("{text}-01-01"),
    7 => format!("{text}-01"),
    _ => text,
  };

  match NaiveDate::parse_from_str(&candidate, "%Y-%m-%d") {
    Ok(_) => DateOutcome::Parsed(candidate),
    Err(_) => DateOutcome::Unvalidated(candidate),
  }
}

// ─── Array literals ──────────────────────────────────────────────────────────

/// Parse the bracketed physical text form of a legacy array column,
/// e.g. `{a,"b c",d}`, into its canonical sequence.
///
/// Empty input and `{}` yield an empty sequence. Text not wrapped in braces
/// is passed through as a single-element sequence (or none, if it normalizes
/// to nothing). Elements containing literal commas are not round-trippable
/// through this form; the document representation is what fixes that.
pub fn parse_array_literal(text: &str) -> Vec<String> {
  let trimmed = text.trim();
  if trimmed.is_empty() || trimmed == "{}" {
    return Vec::new();
  }

  match trimmed
    .strip_prefix('{')
    .and_then(|rest| rest.strip_suffix('}'))
  {
    Some(inner) => normalize_sequence(inner.split(',')),
    None => normalize_sequence([trimmed]),
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn scalar_trims_and_strips_quotes() {
    assert_eq!(normalize_scalar(Some("  hello  ")), Some("hello".into()));
    assert_eq!(normalize_scalar(Some("\"quoted\"")), Some("quoted".into()));
    assert_eq!(normalize_scalar(Some("'single'")), Some("single".into()));
    assert_eq!(
      normalize_scalar(Some("\u{201C}curly\u{201D}")),
      Some("curly".into())
    );
    assert_eq!(normalize_scalar(Some(" \"spaced\" ")), Some("spaced".into()));
  }

  #[test]
  fn scalar_strips_one_layer_only() {
    assert_eq!(normalize_scalar(Some("\"\"double\"\"")), Some("\"double\"".into()));
  }

  #[test]
  fn scalar_interior_quotes_survive() {
    assert_eq!(
      normalize_scalar(Some("it's fine")),
      Some("it's fine".into())
    );
  }

  #[test]
  fn scalar_empty_and_none() {
    assert_eq!(normalize_scalar(None), None);
    assert_eq!(normalize_scalar(Some("")), None);
    assert_eq!(normalize_scalar(Some("   ")), None);
    assert_eq!(normalize_scalar(Some("\"\"")), None);
  }

  #[test]
  fn sequence_drops_empties_and_preserves_order() {
    let out = normalize_sequence(["b", "", "  ", "a", "'c'"]);
    assert_eq!(out, vec!["b", "a", "c"]);
  }

  #[test]
  fn sequence_is_idempotent() {
    let once = normalize_sequence([" x ", "\"y\"", "", "z"]);
    let twice = normalize_sequence(once.iter().map(String::as_str));
    assert_eq!(once, twice);
  }

  #[test]
  fn date_anchors_year_and_year_month() {
    assert_eq!(
      normalize_date(Some("2020")),
      DateOutcome::Parsed("2020-01-01".into())
    );
    assert_eq!(
      normalize_date(Some("2020-05")),
      DateOutcome::Parsed("2020-05-01".into())
    );
    assert_eq!(
      normalize_date(Some("2020-05-17")),
      DateOutcome::Parsed("2020-05-17".into())
    );
  }

  #[test]
  fn date_placeholders_and_empty_are_absent() {
    assert!(normalize_date(Some("YYYY-MM")).is_absent());
    assert!(normalize_date(Some("YYYY-MM-DD")).is_absent());
    assert!(normalize_date(None).is_absent());
    assert!(normalize_date(Some("  ")).is_absent());
  }

  #[test]
  fn date_malformed_passes_through_unvalidated() {
    assert_eq!(
      normalize_date(Some("May 2020")),
      DateOutcome::Unvalidated("May 2020".into())
    );
    assert_eq!(
      normalize_date(Some("2020-13-40")),
      DateOutcome::Unvalidated("2020-13-40".into())
    );
    // into_value keeps the pass-through text.
    assert_eq!(
      normalize_date(Some("May 2020")).into_value(),
      Some("May 2020".into())
    );
  }

  #[test]
  fn date_strips_quotes_first() {
    assert_eq!(
      normalize_date(Some("\"2019-03\"")),
      DateOutcome::Parsed("2019-03-01".into())
    );
  }

  #[test]
  fn array_literal_basic() {
    assert_eq!(parse_array_literal("{a,b,c}"), vec!["a", "b", "c"]);
    assert_eq!(
      parse_array_literal("{\"one\",'two', three }"),
      vec!["one", "two", "three"]
    );
  }

  #[test]
  fn array_literal_empty_forms() {
    assert_eq!(parse_array_literal(""), Vec::<String>::new());
    assert_eq!(parse_array_literal("{}"), Vec::<String>::new());
    assert_eq!(parse_array_literal("   "), Vec::<String>::new());
  }

  #[test]
  fn array_literal_non_array_passes_through() {
    assert_eq!(parse_array_literal("plain text"), vec!["plain text"]);
  }
}
