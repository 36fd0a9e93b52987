//! The entity loader: structured source files → relational store.
//!
//! Each entity type reads one YAML document with a fixed top-level key;
//! professional experience is split across one file per employer. Records
//! are canonicalized field by field before insert. A missing file or key is
//! a warning and the run continues; a store failure aborts the run with the
//! native error detail.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde_yaml::Value;
use vitae_core::{
  canon::{normalize_date, normalize_scalar, normalize_sequence},
  profile::{Award, ContactInfo, Education, Experience, Publication, SkillGroup},
};
use vitae_store_sqlite::SqliteStore;

// ─── Entry points ────────────────────────────────────────────────────────────

/// Full reload: truncate the profile tables, then load every entity type in
/// the fixed operator-visible order. The entity types are independent; the
/// order only shapes progress output.
pub async fn full_reload(store: &SqliteStore, data_dir: &Path) -> anyhow::Result<()> {
  tracing::info!("clearing existing data");
  store.truncate_profile_tables().await?;

  tracing::info!("loading contact info");
  load_contact_info(store, &data_dir.join("contact_info.yml")).await?;

  tracing::info!("loading professional experience");
  for path in experience_sources(data_dir)? {
    load_experience_file(store, &path).await?;
  }

  tracing::info!("loading education");
  load_education(store, &data_dir.join("education.yml")).await?;

  tracing::info!("loading skills");
  load_skills(store, &data_dir.join("skills.yml")).await?;

  tracing::info!("loading awards");
  load_awards(store, &data_dir.join("awards.yml")).await?;

  tracing::info!("loading publications");
  load_publications(store, &data_dir.join("publications.yml")).await?;

  Ok(())
}

/// Append the experience records of one source file, touching nothing else.
pub async fn load_single_job(store: &SqliteStore, path: &Path) -> anyhow::Result<()> {
  tracing::info!(path = %path.display(), "loading single job file");
  load_experience_file(store, path).await
}

/// Discover per-employer experience files: every YAML document in the data
/// directory whose top-level mapping carries a `professional_experience`
/// key, in sorted filename order.
fn experience_sources(data_dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
  let mut sources = Vec::new();

  let entries = match std::fs::read_dir(data_dir) {
    Ok(entries) => entries,
    Err(err) => {
      tracing::warn!(dir = %data_dir.display(), error = %err, "data directory not readable");
      return Ok(sources);
    }
  };

  for entry in entries {
    let path = entry
      .with_context(|| format!("scanning {}", data_dir.display()))?
      .path();
    let is_yaml = path
      .extension()
      .is_some_and(|ext| ext == "yml" || ext == "yaml");
    if !is_yaml {
      continue;
    }
    if let Some(doc) = read_document(&path)?
      && doc.get("professional_experience").is_some()
    {
      sources.push(path);
    }
  }

  sources.sort();
  if sources.is_empty() {
    tracing::warn!(dir = %data_dir.display(), "no professional experience files found");
  }
  Ok(sources)
}

// ─── Per-entity loads ────────────────────────────────────────────────────────

async fn load_contact_info(store: &SqliteStore, path: &Path) -> anyhow::Result<()> {
  let Some(doc) = read_document(path)? else {
    return Ok(());
  };
  let Some(record) = doc.get("contact_info").filter(|r| !r.is_null()) else {
    tracing::warn!(path = %path.display(), "missing contact_info section");
    return Ok(());
  };

  let contact = ContactInfo {
    full_name: scalar(record, "full_name"),
    email:     scalar(record, "email"),
    phone:     scalar(record, "phone"),
    location:  scalar(record, "location"),
    linkedin:  scalar(record, "linkedin"),
  };
  store.insert_contact_info(&contact).await?;
  Ok(())
}

async fn load_experience_file(store: &SqliteStore, path: &Path) -> anyhow::Result<()> {
  let Some(doc) = read_document(path)? else {
    return Ok(());
  };

  for record in records(&doc, "professional_experience", path) {
    let job = Experience {
      company:          scalar(record, "company"),
      title:            scalar(record, "title"),
      start_date:       date(record, "start_date"),
      end_date:         date(record, "end_date"),
      location:         scalar(record, "location"),
      responsibilities: sequence(record, "responsibilities"),
      achievements:     sequence(record, "achievements"),
      narrative:        sequence(record, "narrative"),
    };
    store.insert_experience(&job).await?;
    tracing::info!(
      title = job.title.as_deref().unwrap_or("?"),
      company = job.company.as_deref().unwrap_or("?"),
      "added job"
    );
  }
  Ok(())
}

async fn load_education(store: &SqliteStore, path: &Path) -> anyhow::Result<()> {
  let Some(doc) = read_document(path)? else {
    return Ok(());
  };

  for record in records(&doc, "education", path) {
    let entry = Education {
      institution:  scalar(record, "institution"),
      degree:       scalar(record, "degree"),
      field:        scalar(record, "field"),
      start_date:   date(record, "start_date"),
      end_date:     date(record, "end_date"),
      location:     scalar(record, "location"),
      achievements: sequence(record, "achievements"),
    };
    store.insert_education(&entry).await?;
  }
  Ok(())
}

async fn load_skills(store: &SqliteStore, path: &Path) -> anyhow::Result<()> {
  let Some(doc) = read_document(path)? else {
    return Ok(());
  };

  for record in records(&doc, "skills", path) {
    let group = SkillGroup {
      category: scalar(record, "category"),
      skills:   sequence(record, "skills"),
    };
    store.insert_skill_group(&group).await?;
  }
  Ok(())
}

async fn load_awards(store: &SqliteStore, path: &Path) -> anyhow::Result<()> {
  let Some(doc) = read_document(path)? else {
    return Ok(());
  };

  for record in records(&doc, "awards", path) {
    let award = Award {
      title:       scalar(record, "title"),
      issuer:      scalar(record, "issuer"),
      date:        date(record, "date"),
      description: scalar(record, "description"),
    };
    store.insert_award(&award).await?;
  }
  Ok(())
}

async fn load_publications(store: &SqliteStore, path: &Path) -> anyhow::Result<()> {
  let Some(doc) = read_document(path)? else {
    return Ok(());
  };

  for record in records(&doc, "publications", path) {
    let publication = Publication {
      title:       scalar(record, "title"),
      publisher:   scalar(record, "publisher"),
      date:        date(record, "date"),
      url:         scalar(record, "url"),
      description: scalar(record, "description"),
    };
    store.insert_publication(&publication).await?;
  }
  Ok(())
}

// ─── Document access ─────────────────────────────────────────────────────────

/// Read one YAML source document. An absent or empty file is a warning,
/// not an error; malformed YAML aborts the run.
fn read_document(path: &Path) -> anyhow::Result<Option<Value>> {
  let raw = match std::fs::read_to_string(path) {
    Ok(raw) => raw,
    Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
      tracing::warn!(path = %path.display(), "source file not found");
      return Ok(None);
    }
    Err(err) => {
      return Err(err).with_context(|| format!("reading {}", path.display()));
    }
  };

  let doc: Value =
    serde_yaml::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
  if doc.is_null() {
    tracing::warn!(path = %path.display(), "source file is empty");
    return Ok(None);
  }
  Ok(Some(doc))
}

/// The records under `key`, or an empty (warned-about) list.
fn records<'a>(doc: &'a Value, key: &str, path: &Path) -> Vec<&'a Value> {
  match doc.get(key).and_then(Value::as_sequence) {
    Some(seq) if !seq.is_empty() => seq.iter().collect(),
    _ => {
      tracing::warn!(path = %path.display(), key, "no records under expected key");
      Vec::new()
    }
  }
}

// ─── Field canonicalization ──────────────────────────────────────────────────

/// A loosely-typed scalar: strings pass through, numbers and booleans are
/// rendered to text, anything else is absent.
fn raw_scalar(record: &Value, field: &str) -> Option<String> {
  match record.get(field)? {
    Value::String(s) => Some(s.clone()),
    Value::Number(n) => Some(n.to_string()),
    Value::Bool(b) => Some(b.to_string()),
    _ => None,
  }
}

fn scalar(record: &Value, field: &str) -> Option<String> {
  normalize_scalar(raw_scalar(record, field).as_deref())
}

fn date(record: &Value, field: &str) -> Option<String> {
  normalize_date(raw_scalar(record, field).as_deref()).into_value()
}

fn sequence(record: &Value, field: &str) -> Vec<String> {
  match record.get(field).and_then(Value::as_sequence) {
    Some(seq) => normalize_sequence(seq.iter().filter_map(|v| match v {
      Value::String(s) => Some(s.as_str()),
      _ => None,
    })),
    None => Vec::new(),
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use std::path::Path;

  use vitae_store_sqlite::SqliteStore;

  use super::{full_reload, load_single_job};

  async fn store() -> SqliteStore {
    SqliteStore::open_in_memory()
      .await
      .expect("in-memory store")
  }

  fn write(dir: &Path, name: &str, contents: &str) {
    std::fs::write(dir.join(name), contents).unwrap();
  }

  fn write_fixture_set(dir: &Path) {
    write(
      dir,
      "contact_info.yml",
      "contact_info:\n  full_name: \"Alice Liddell\"\n  email: alice@example.com\n  phone: '+1 555 0100'\n  location: Antwerp\n  linkedin: https://linkedin.com/in/alice\n",
    );
    write(
      dir,
      "acme.yml",
      "professional_experience:\n  - company: Acme\n    title: Engineer\n    start_date: 2020\n    end_date: YYYY-MM\n    location: Remote\n    responsibilities:\n      - \"built the pipeline\"\n      - \"   \"\n    achievements:\n      - cut latency in half\n",
    );
    write(
      dir,
      "globex.yml",
      "professional_experience:\n  - company: Globex\n    title: Lead\n    start_date: \"2022-03\"\n    location: Brussels\n    narrative:\n      - took over the platform team\n",
    );
    write(
      dir,
      "education.yml",
      "education:\n  - institution: Ghent University\n    degree: BSc\n    field: Computer Science\n    start_date: \"2010-09-01\"\n    end_date: \"2014-06-30\"\n    location: Ghent\n    achievements:\n      - graduated with honors\n",
    );
    write(
      dir,
      "skills.yml",
      "skills:\n  - category: Languages\n    skills: [Rust, SQL]\n  - category: Tools\n    skills: [git]\n",
    );
    write(
      dir,
      "awards.yml",
      "awards:\n  - title: Best Paper\n    issuer: SIGMOD\n    date: \"2019-06\"\n    description: awarded for the storage paper\n",
    );
    write(
      dir,
      "publications.yml",
      "publications:\n  - title: On Schema Evolution\n    publisher: VLDB\n    date: \"2018\"\n    url: https://example.com/paper\n    description: the one everyone cites\n",
    );
  }

  #[tokio::test]
  async fn full_reload_loads_every_entity_type() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture_set(dir.path());

    let s = store().await;
    full_reload(&s, dir.path()).await.unwrap();

    assert_eq!(s.count_rows("contact_info").await.unwrap(), 1);
    assert_eq!(s.count_rows("professional_experience").await.unwrap(), 2);
    assert_eq!(s.count_rows("education").await.unwrap(), 1);
    assert_eq!(s.count_rows("skills").await.unwrap(), 2);
    assert_eq!(s.count_rows("awards").await.unwrap(), 1);
    assert_eq!(s.count_rows("publications").await.unwrap(), 1);
  }

  #[tokio::test]
  async fn full_reload_canonicalizes_fields() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture_set(dir.path());

    let s = store().await;
    full_reload(&s, dir.path()).await.unwrap();

    let rows = s.full_experience().await.unwrap();
    // Newest start date first: Globex (2022-03 → anchored) before Acme.
    assert_eq!(rows[0].company.as_deref(), Some("Globex"));
    assert_eq!(rows[0].start_date.as_deref(), Some("2022-03-01"));

    let acme = &rows[1];
    // Bare year anchored to January 1st; placeholder end date absent.
    assert_eq!(acme.start_date.as_deref(), Some("2020-01-01"));
    assert_eq!(acme.end_date, None);
    // Whitespace-only elements are gone, order preserved.
    assert_eq!(acme.responsibilities, vec!["built the pipeline"]);
    assert_eq!(acme.achievements, vec!["cut latency in half"]);
  }

  #[tokio::test]
  async fn full_reload_replaces_prior_contents() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture_set(dir.path());

    let s = store().await;
    full_reload(&s, dir.path()).await.unwrap();
    full_reload(&s, dir.path()).await.unwrap();

    assert_eq!(s.count_rows("professional_experience").await.unwrap(), 2);
    assert_eq!(s.count_rows("contact_info").await.unwrap(), 1);
  }

  #[tokio::test]
  async fn absent_source_files_are_skipped_with_zero_rows() {
    let dir = tempfile::tempdir().unwrap();
    write(
      dir.path(),
      "acme.yml",
      "professional_experience:\n  - company: Acme\n    title: Engineer\n",
    );

    let s = store().await;
    full_reload(&s, dir.path()).await.unwrap();

    assert_eq!(s.count_rows("professional_experience").await.unwrap(), 1);
    assert_eq!(s.count_rows("contact_info").await.unwrap(), 0);
    assert_eq!(s.count_rows("education").await.unwrap(), 0);
    assert_eq!(s.count_rows("skills").await.unwrap(), 0);
    assert_eq!(s.count_rows("awards").await.unwrap(), 0);
    assert_eq!(s.count_rows("publications").await.unwrap(), 0);
  }

  #[tokio::test]
  async fn single_job_reload_appends_and_touches_nothing_else() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture_set(dir.path());

    let s = store().await;
    full_reload(&s, dir.path()).await.unwrap();

    write(
      dir.path(),
      "initech.yml",
      "professional_experience:\n  - company: Initech\n    title: Consultant\n    start_date: \"2023-01\"\n",
    );
    load_single_job(&s, &dir.path().join("initech.yml"))
      .await
      .unwrap();

    assert_eq!(s.count_rows("professional_experience").await.unwrap(), 3);
    assert_eq!(s.count_rows("contact_info").await.unwrap(), 1);
    assert_eq!(s.count_rows("education").await.unwrap(), 1);
  }

  #[tokio::test]
  async fn experience_discovery_ignores_other_sources() {
    let dir = tempfile::tempdir().unwrap();
    write(
      dir.path(),
      "b_corp.yml",
      "professional_experience:\n  - company: B Corp\n    title: Engineer\n",
    );
    write(
      dir.path(),
      "a_corp.yml",
      "professional_experience:\n  - company: A Corp\n    title: Engineer\n",
    );
    write(dir.path(), "education.yml", "education: []\n");
    write(dir.path(), "notes.txt", "not yaml at all");

    let sources = super::experience_sources(dir.path()).unwrap();
    let names: Vec<_> = sources
      .iter()
      .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
      .collect();
    assert_eq!(names, vec!["a_corp.yml", "b_corp.yml"]);
  }
}
