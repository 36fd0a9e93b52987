//! [`SqliteStore`] — the SQLite store behind the profile datastore.

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;

use vitae_core::profile::{
  Award, ContactInfo, Education, Experience, JobContent, Publication,
  SkillGroup,
};

use crate::{
  Result,
  encode::{RawExperienceRow, SeqEncoding, encode_sequence},
  schema::{FULL_EXPERIENCE_VIEW, SCHEMA},
};

/// Tables owned by the entity loader, truncated together on a full reload.
/// `job_content` is deliberately absent: postings survive reloads.
pub const PROFILE_TABLES: &[&str] = &[
  "contact_info",
  "professional_experience",
  "education",
  "skills",
  "awards",
  "publications",
];

// ─── Store ───────────────────────────────────────────────────────────────────

/// A profile store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. All access
/// funnels through one connection on a dedicated thread; callers are a
/// single sequential actor, so no cross-run coordination exists or is
/// needed.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self.execute_batch(SCHEMA.to_owned()).await?;

    // The view can only exist while its columns do. A store interrupted
    // between legacy-drop and rename has no `responsibilities` column; the
    // migrator recreates the view when it finishes that rename.
    if self
      .declared_type("professional_experience", "responsibilities")
      .await?
      .is_some()
    {
      self.execute_batch(FULL_EXPERIENCE_VIEW.to_owned()).await?;
    }
    Ok(())
  }

  /// Run a batch of statements verbatim, in order.
  pub(crate) async fn execute_batch(&self, sql: String) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(&sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// The declared type of a live column, or `None` if the column (or the
  /// table) does not exist. This is the inspection primitive the migration
  /// state machine is built on.
  pub(crate) async fn declared_type(
    &self,
    table: &str,
    column: &str,
  ) -> Result<Option<String>> {
    let sql = format!(
      "SELECT type FROM pragma_table_info('{table}') WHERE name = '{column}'"
    );
    let declared = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(&sql, [], |row| row.get::<_, String>(0)).optional()?)
      })
      .await?;
    Ok(declared)
  }

  /// How sequence values must be written for `column` right now.
  async fn sequence_encoding(
    &self,
    table: &str,
    column: &str,
  ) -> Result<SeqEncoding> {
    Ok(
      self
        .declared_type(table, column)
        .await?
        .map(|ty| SeqEncoding::from_declared_type(&ty))
        .unwrap_or(SeqEncoding::Document),
    )
  }

  pub async fn count_rows(&self, table: &str) -> Result<i64> {
    let sql = format!("SELECT COUNT(*) FROM {table}");
    let count = self
      .conn
      .call(move |conn| Ok(conn.query_row(&sql, [], |row| row.get(0))?))
      .await?;
    Ok(count)
  }

  // ── Full-reload support ───────────────────────────────────────────────────

  /// Delete every row from the loader-owned tables. Postings in
  /// `job_content` are untouched.
  pub async fn truncate_profile_tables(&self) -> Result<()> {
    let sql = PROFILE_TABLES
      .iter()
      .map(|table| format!("DELETE FROM {table};"))
      .collect::<Vec<_>>()
      .join("\n");
    self.execute_batch(sql).await
  }

  // ── Inserts ───────────────────────────────────────────────────────────────

  pub async fn insert_contact_info(&self, contact: &ContactInfo) -> Result<()> {
    let contact = contact.clone();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO contact_info (full_name, email, phone, location, linkedin)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![
            contact.full_name,
            contact.email,
            contact.phone,
            contact.location,
            contact.linkedin,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  pub async fn insert_experience(&self, exp: &Experience) -> Result<()> {
    let encoding = self
      .sequence_encoding("professional_experience", "responsibilities")
      .await?;
    let responsibilities = encode_sequence(&exp.responsibilities, encoding)?;
    let achievements = encode_sequence(&exp.achievements, encoding)?;
    let narrative = encode_sequence(&exp.narrative, encoding)?;
    let exp = exp.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO professional_experience (
             company, title, start_date, end_date, location,
             responsibilities, achievements, narrative
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            exp.company,
            exp.title,
            exp.start_date,
            exp.end_date,
            exp.location,
            responsibilities,
            achievements,
            narrative,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  pub async fn insert_education(&self, edu: &Education) -> Result<()> {
    let encoding = self.sequence_encoding("education", "achievements").await?;
    let achievements = encode_sequence(&edu.achievements, encoding)?;
    let edu = edu.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO education (
             institution, degree, field, start_date, end_date, location,
             achievements
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            edu.institution,
            edu.degree,
            edu.field,
            edu.start_date,
            edu.end_date,
            edu.location,
            achievements,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  pub async fn insert_skill_group(&self, group: &SkillGroup) -> Result<()> {
    let encoding = self.sequence_encoding("skills", "skills").await?;
    let skills = encode_sequence(&group.skills, encoding)?;
    let category = group.category.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO skills (category, skills) VALUES (?1, ?2)",
          rusqlite::params![category, skills],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  pub async fn insert_award(&self, award: &Award) -> Result<()> {
    let award = award.clone();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO awards (title, issuer, date, description)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![award.title, award.issuer, award.date, award.description],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  pub async fn insert_publication(&self, publication: &Publication) -> Result<()> {
    let publication = publication.clone();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO publications (title, publisher, date, url, description)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![
            publication.title,
            publication.publisher,
            publication.date,
            publication.url,
            publication.description,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Insert a scraped posting. `created_at` is stamped here when the caller
  /// has not supplied one.
  pub async fn insert_job_content(&self, job: &JobContent) -> Result<()> {
    let encoding = self.sequence_encoding("job_content", "requirements").await?;
    let requirements = encode_sequence(&job.requirements, encoding)?;
    let responsibilities = encode_sequence(&job.responsibilities, encoding)?;
    let created_at = job
      .created_at
      .clone()
      .unwrap_or_else(|| Utc::now().to_rfc3339());
    let job = job.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO job_content (
             title, company, location, salary, description,
             requirements, responsibilities, about_company, benefits,
             raw_content, url, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
          rusqlite::params![
            job.title,
            job.company,
            job.location,
            job.salary,
            job.description,
            requirements,
            responsibilities,
            job.about_company,
            job.benefits,
            job.raw_content,
            job.url,
            created_at,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  /// Read the `full_experience` view — every entry, newest start date first.
  pub async fn full_experience(&self) -> Result<Vec<Experience>> {
    let raws: Vec<RawExperienceRow> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT company, title, start_date, end_date, location,
                  responsibilities, achievements, narrative
           FROM full_experience",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawExperienceRow {
              company:          row.get(0)?,
              title:            row.get(1)?,
              start_date:       row.get(2)?,
              end_date:         row.get(3)?,
              location:         row.get(4)?,
              responsibilities: row.get(5)?,
              achievements:     row.get(6)?,
              narrative:        row.get(7)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(raws.into_iter().map(RawExperienceRow::into_experience).collect())
  }
}
