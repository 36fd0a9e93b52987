//! Entity records of the profile store.
//!
//! These are the canonical in-memory shapes: scalar fields are `Option` (a
//! missing value is `None`, never an empty string), sequence fields are
//! ordered lists of trimmed, non-empty strings, and dates carry the
//! canonical `YYYY-MM-DD` text produced by [`crate::canon::normalize_date`].

use serde::{Deserialize, Serialize};

/// Contact details; one row per profile.
///
/// `phone` is the legacy scalar; deployments that have run the additive
/// migration also carry a country-code → phone mapping alongside it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactInfo {
  pub full_name: Option<String>,
  pub email:     Option<String>,
  pub phone:     Option<String>,
  pub location:  Option<String>,
  pub linkedin:  Option<String>,
}

/// One professional-experience entry. `end_date` of `None` means current.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Experience {
  pub company:          Option<String>,
  pub title:            Option<String>,
  pub start_date:       Option<String>,
  pub end_date:         Option<String>,
  pub location:         Option<String>,
  pub responsibilities: Vec<String>,
  pub achievements:     Vec<String>,
  pub narrative:        Vec<String>,
}

/// One education entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Education {
  pub institution:  Option<String>,
  pub degree:       Option<String>,
  pub field:        Option<String>,
  pub start_date:   Option<String>,
  pub end_date:     Option<String>,
  pub location:     Option<String>,
  pub achievements: Vec<String>,
}

/// A named group of skills.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillGroup {
  pub category: Option<String>,
  pub skills:   Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Award {
  pub title:       Option<String>,
  pub issuer:      Option<String>,
  pub date:        Option<String>,
  pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Publication {
  pub title:       Option<String>,
  pub publisher:   Option<String>,
  pub date:        Option<String>,
  pub url:         Option<String>,
  pub description: Option<String>,
}

/// A scraped job posting. Written by the scraping application, migrated and
/// backed up here; never re-loaded by the entity loader.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobContent {
  pub title:            Option<String>,
  pub company:          Option<String>,
  pub location:         Option<String>,
  pub salary:           Option<String>,
  pub description:      Option<String>,
  pub requirements:     Vec<String>,
  pub responsibilities: Vec<String>,
  pub about_company:    Option<String>,
  pub benefits:         Option<String>,
  pub raw_content:      Option<String>,
  pub url:              Option<String>,
  pub created_at:       Option<String>,
}
