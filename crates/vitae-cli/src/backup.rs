//! Backup and restore: the file-shuffling halves of snapshot/restore.
//!
//! Backup writes each snapshot table as one portable JSON document in the
//! backup directory. Restore reshapes those documents into loader source
//! files: one YAML per employer for professional experience, one shared
//! YAML per other entity type. Together with the loader this closes the
//! snapshot → restore → reload round trip.

use std::path::Path;

use anyhow::Context as _;
use serde_json::Value;
use vitae_core::canon::parse_array_literal;
use vitae_store_sqlite::{SqliteStore, snapshot::SNAPSHOT_TABLES};

// ─── Backup ──────────────────────────────────────────────────────────────────

/// Export every snapshot table to `<table>_backup.json`.
///
/// A failing table is logged and skipped; the remaining tables still get
/// their backup.
pub async fn write_backups(store: &SqliteStore, backup_dir: &Path) -> anyhow::Result<()> {
  std::fs::create_dir_all(backup_dir)
    .with_context(|| format!("creating {}", backup_dir.display()))?;

  for spec in SNAPSHOT_TABLES {
    match store.snapshot_table(spec).await {
      Ok(rows) => {
        let path = backup_dir.join(format!("{}_backup.json", spec.table));
        let file = std::fs::File::create(&path)
          .with_context(|| format!("creating {}", path.display()))?;
        serde_json::to_writer_pretty(file, &rows)
          .with_context(|| format!("writing {}", path.display()))?;
        tracing::info!(table = spec.table, rows = rows.len(), "backup saved");
      }
      Err(err) => {
        tracing::error!(table = spec.table, error = %err, "backup failed");
      }
    }
  }
  Ok(())
}

// ─── Restore ─────────────────────────────────────────────────────────────────

/// Reshape the backup documents into loader source files.
pub fn restore_sources(backup_dir: &Path, data_dir: &Path) -> anyhow::Result<()> {
  std::fs::create_dir_all(data_dir)
    .with_context(|| format!("creating {}", data_dir.display()))?;

  if let Some(rows) = read_backup(backup_dir, "professional_experience")? {
    restore_experience(rows, data_dir)?;
  }

  let shared: [(&str, &[&str]); 3] = [
    ("education", &["achievements"]),
    ("skills", &["skills"]),
    ("job_content", &["requirements", "responsibilities"]),
  ];
  for (table, sequence_fields) in shared {
    if let Some(rows) = read_backup(backup_dir, table)? {
      let cleaned: Vec<Value> = rows
        .into_iter()
        .map(|row| clean_row(row, sequence_fields))
        .collect();
      write_source(&data_dir.join(format!("{table}.yml")), table, cleaned)?;
    }
  }
  Ok(())
}

/// One file per employer, grouped by company in first-appearance order.
fn restore_experience(rows: Vec<Value>, data_dir: &Path) -> anyhow::Result<()> {
  let mut groups: Vec<(String, Vec<Value>)> = Vec::new();

  for row in rows {
    let row = clean_row(row, &["responsibilities", "achievements", "narrative"]);
    let company = row
      .get("company")
      .and_then(Value::as_str)
      .unwrap_or("unknown");
    let slug = company_slug(company);
    match groups.iter_mut().find(|(existing, _)| *existing == slug) {
      Some((_, jobs)) => jobs.push(row),
      None => groups.push((slug, vec![row])),
    }
  }

  for (slug, jobs) in groups {
    write_source(
      &data_dir.join(format!("{slug}.yml")),
      "professional_experience",
      jobs,
    )?;
  }
  Ok(())
}

fn company_slug(company: &str) -> String {
  company
    .to_lowercase()
    .split_whitespace()
    .collect::<Vec<_>>()
    .join("_")
}

/// Read one backup document; absent files are a warning, not an error.
fn read_backup(backup_dir: &Path, table: &str) -> anyhow::Result<Option<Vec<Value>>> {
  let path = backup_dir.join(format!("{table}_backup.json"));
  let raw = match std::fs::read_to_string(&path) {
    Ok(raw) => raw,
    Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
      tracing::warn!(path = %path.display(), "backup file not found");
      return Ok(None);
    }
    Err(err) => {
      return Err(err).with_context(|| format!("reading {}", path.display()));
    }
  };
  let rows: Vec<Value> =
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
  Ok(Some(rows))
}

/// Ensure each sequence field is a list. Backups taken before the document
/// migration hold array-literal strings; those are cleaned into lists here.
fn clean_row(mut row: Value, sequence_fields: &[&str]) -> Value {
  for field in sequence_fields {
    let cleaned = match row.get(*field) {
      Some(Value::Array(items)) => Value::Array(items.clone()),
      Some(Value::String(text)) => Value::Array(
        parse_array_literal(text)
          .into_iter()
          .map(Value::String)
          .collect(),
      ),
      _ => Value::Array(Vec::new()),
    };
    if let Some(slot) = row.get_mut(*field) {
      *slot = cleaned;
    } else if let Some(map) = row.as_object_mut() {
      map.insert((*field).to_owned(), cleaned);
    }
  }
  row
}

fn write_source(path: &Path, key: &str, rows: Vec<Value>) -> anyhow::Result<()> {
  let doc = serde_json::json!({ key: rows });
  let yaml = serde_yaml::to_string(&doc)
    .with_context(|| format!("serialising {}", path.display()))?;
  std::fs::write(path, yaml).with_context(|| format!("writing {}", path.display()))?;
  tracing::info!(path = %path.display(), "source file written");
  Ok(())
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use vitae_core::profile::{Education, Experience, SkillGroup};
  use vitae_store_sqlite::{SqliteStore, migrate::MigrateOptions};

  use crate::loader::full_reload;

  use super::{restore_sources, write_backups};

  async fn store() -> SqliteStore {
    SqliteStore::open_in_memory()
      .await
      .expect("in-memory store")
  }

  fn engineer_at(company: &str, start: &str) -> Experience {
    Experience {
      company:          Some(company.into()),
      title:            Some("Engineer".into()),
      start_date:       Some(start.into()),
      end_date:         None,
      location:         Some("Remote".into()),
      responsibilities: vec!["built the pipeline".into()],
      achievements:     vec!["cut latency in half".into()],
      narrative:        vec!["joined early".into()],
    }
  }

  #[tokio::test]
  async fn restore_writes_one_file_per_employer() {
    let backup_dir = tempfile::tempdir().unwrap();
    let data_dir = tempfile::tempdir().unwrap();

    let s = store().await;
    s.insert_experience(&engineer_at("Acme Rockets", "2020-01-01"))
      .await
      .unwrap();
    s.insert_experience(&engineer_at("Globex", "2022-03-01"))
      .await
      .unwrap();

    write_backups(&s, backup_dir.path()).await.unwrap();
    restore_sources(backup_dir.path(), data_dir.path()).unwrap();

    assert!(data_dir.path().join("acme_rockets.yml").exists());
    assert!(data_dir.path().join("globex.yml").exists());
  }

  #[tokio::test]
  async fn snapshot_restore_reload_round_trip() {
    let backup_dir = tempfile::tempdir().unwrap();
    let data_dir = tempfile::tempdir().unwrap();

    let original = store().await;
    original
      .insert_experience(&engineer_at("Acme", "2020-01-01"))
      .await
      .unwrap();
    original
      .insert_experience(&engineer_at("Globex", "2022-03-01"))
      .await
      .unwrap();
    original
      .insert_education(&Education {
        institution:  Some("Ghent University".into()),
        degree:       Some("BSc".into()),
        field:        Some("Computer Science".into()),
        start_date:   Some("2010-09-01".into()),
        end_date:     Some("2014-06-30".into()),
        location:     Some("Ghent".into()),
        achievements: vec!["graduated with honors".into()],
      })
      .await
      .unwrap();
    original
      .insert_skill_group(&SkillGroup {
        category: Some("Languages".into()),
        skills:   vec!["Rust".into(), "SQL".into()],
      })
      .await
      .unwrap();

    write_backups(&original, backup_dir.path()).await.unwrap();
    restore_sources(backup_dir.path(), data_dir.path()).unwrap();

    let reloaded = store().await;
    full_reload(&reloaded, data_dir.path()).await.unwrap();

    assert_eq!(
      original.full_experience().await.unwrap(),
      reloaded.full_experience().await.unwrap()
    );
    assert_eq!(reloaded.count_rows("education").await.unwrap(), 1);
    assert_eq!(reloaded.count_rows("skills").await.unwrap(), 1);
  }

  #[tokio::test]
  async fn round_trip_from_a_migrated_store_matches() {
    let backup_dir = tempfile::tempdir().unwrap();
    let data_dir = tempfile::tempdir().unwrap();

    let original = store().await;
    original
      .insert_experience(&engineer_at("Acme", "2020-01-01"))
      .await
      .unwrap();
    original.migrate(MigrateOptions::default()).await.unwrap();

    write_backups(&original, backup_dir.path()).await.unwrap();
    restore_sources(backup_dir.path(), data_dir.path()).unwrap();

    let reloaded = store().await;
    full_reload(&reloaded, data_dir.path()).await.unwrap();

    assert_eq!(
      original.full_experience().await.unwrap(),
      reloaded.full_experience().await.unwrap()
    );
  }

  #[tokio::test]
  async fn missing_backup_files_are_skipped() {
    let backup_dir = tempfile::tempdir().unwrap();
    let data_dir = tempfile::tempdir().unwrap();

    restore_sources(backup_dir.path(), data_dir.path()).unwrap();
    assert_eq!(std::fs::read_dir(data_dir.path()).unwrap().count(), 0);
  }
}
