//! The schema-evolution engine.
//!
//! Evolves sequence columns from legacy array-literal `TEXT` storage to
//! `JSONB` documents without losing rows, and tolerates re-invocation after
//! a partial prior run. Nothing here is transactional; resumability comes
//! from recomputing each column's [`ColumnState`] off the live schema
//! (declared types, staging-column contents) instead of keeping external
//! bookkeeping. Any interrupted run finishes by being run again.

use rusqlite::OptionalExtension as _;
use vitae_core::canon::parse_array_literal;

use crate::{
  Result, SqliteStore,
  encode::SeqEncoding,
  schema::FULL_EXPERIENCE_VIEW,
};

// ─── Targets ─────────────────────────────────────────────────────────────────

/// A table whose sequence columns migrate from array to document form.
#[derive(Debug, Clone, Copy)]
pub struct MigrationTarget {
  pub table:   &'static str,
  pub columns: &'static [&'static str],
}

/// The fixed set of migration targets.
pub const MIGRATION_TARGETS: &[MigrationTarget] = &[
  MigrationTarget {
    table:   "professional_experience",
    columns: &["responsibilities", "achievements", "narrative"],
  },
  MigrationTarget { table: "education", columns: &["achievements"] },
  MigrationTarget { table: "skills", columns: &["skills"] },
  MigrationTarget {
    table:   "job_content",
    columns: &["requirements", "responsibilities"],
  },
];

// ─── State machine ───────────────────────────────────────────────────────────

/// Where a single column stands in the migration.
///
/// Recomputed purely by inspection, so a process restart at any point
/// resumes from here rather than from a journal. A "verified" state is
/// deliberately absent: verification is a judgment made at the checkpoint,
/// and on re-inspection a verified column reads back as `Backfilled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnState {
  /// Legacy text column only.
  NotStarted,
  /// Legacy and staging columns both present; staging not fully backfilled.
  ColumnsAdded,
  /// Both present, every row converted. Safe to finalize.
  Backfilled,
  /// Legacy column gone, staging column still awaiting its rename.
  LegacyDropped,
  /// The column carries the document type under its original name.
  Finalized,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MigrateOptions {
  /// Stop at the verification checkpoint instead of finalizing. The staged
  /// columns stay in place; a later run (without this flag) picks up from
  /// `Backfilled` and completes.
  pub require_confirmation: bool,
}

/// One sample row at the verification checkpoint: the legacy and document
/// representations side by side, captured before any destructive step.
#[derive(Debug, Clone)]
pub struct VerificationSample {
  pub table:    &'static str,
  pub column:   &'static str,
  pub legacy:   Option<String>,
  pub document: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MigrationReport {
  /// `false` means the run stopped at the verification checkpoint.
  pub finalized: bool,
  pub samples:   Vec<VerificationSample>,
}

// ─── Engine ──────────────────────────────────────────────────────────────────

impl SqliteStore {
  /// Compute the migration state of one column by inspecting the live
  /// schema. An entirely absent column is treated as already migrated, not
  /// as an error.
  pub async fn column_state(&self, table: &str, column: &str) -> Result<ColumnState> {
    let staging = staging_column(column);
    let legacy_ty = self.declared_type(table, column).await?;
    let staging_ty = self.declared_type(table, &staging).await?;

    Ok(match (legacy_ty, staging_ty) {
      (Some(ty), None) if is_document_type(&ty) => ColumnState::Finalized,
      (Some(_), None) => ColumnState::NotStarted,
      (Some(_), Some(_)) => {
        if self.unbackfilled_rows(table, &staging).await? == 0 {
          ColumnState::Backfilled
        } else {
          ColumnState::ColumnsAdded
        }
      }
      (None, Some(_)) => ColumnState::LegacyDropped,
      (None, None) => {
        tracing::warn!(table, column, "column absent; treating as already migrated");
        ColumnState::Finalized
      }
    })
  }

  /// Run the migration across every target table.
  ///
  /// Idempotent: finalized columns are skipped, staged columns are resumed.
  /// The dependent view is recreated only once the column shape is final.
  pub async fn migrate(&self, options: MigrateOptions) -> Result<MigrationReport> {
    tracing::info!("starting schema migration");

    // Views cannot safely reference mid-migration dual columns.
    self
      .execute_batch("DROP VIEW IF EXISTS full_experience;".to_owned())
      .await?;

    let mut samples = Vec::new();
    let mut stopped_at_checkpoint = false;

    for target in MIGRATION_TARGETS {
      let mut states = Vec::with_capacity(target.columns.len());
      for column in target.columns {
        states.push((*column, self.column_state(target.table, column).await?));
      }

      if states.iter().all(|(_, state)| *state == ColumnState::Finalized) {
        tracing::info!(table = target.table, "already in document form; skipping");
        continue;
      }

      // Add document columns alongside the legacy ones.
      for &(column, state) in &states {
        if state == ColumnState::NotStarted {
          self
            .execute_batch(format!(
              "ALTER TABLE {} ADD COLUMN {} JSONB;",
              target.table,
              staging_column(column)
            ))
            .await?;
        }
      }

      // Convert every row that does not yet carry a document value.
      for &(column, state) in &states {
        if matches!(state, ColumnState::NotStarted | ColumnState::ColumnsAdded) {
          self.backfill_column(target.table, column).await?;
        }
      }

      // Verification checkpoint: one sample row per column, old and new
      // side by side, ahead of anything destructive.
      for &(column, state) in &states {
        if state == ColumnState::Finalized {
          continue;
        }
        if let Some(sample) =
          self.verification_sample(target.table, column, state).await?
        {
          tracing::info!(
            table = target.table,
            column,
            legacy = sample.legacy.as_deref().unwrap_or("NULL"),
            document = sample.document.as_deref().unwrap_or("NULL"),
            "sample conversion"
          );
          samples.push(sample);
        }
      }

      if options.require_confirmation {
        stopped_at_checkpoint = true;
        continue;
      }

      // Drop the legacy columns first, then rename the document columns into
      // their place. Consumers querying by original name only ever miss the
      // column inside this window, and nothing else runs during a migration.
      for &(column, state) in &states {
        if matches!(state, ColumnState::Finalized | ColumnState::LegacyDropped) {
          continue;
        }
        self
          .execute_batch(format!(
            "ALTER TABLE {} DROP COLUMN {};",
            target.table, column
          ))
          .await?;
      }
      for &(column, state) in &states {
        if state == ColumnState::Finalized {
          continue;
        }
        self
          .execute_batch(format!(
            "ALTER TABLE {} RENAME COLUMN {} TO {};",
            target.table,
            staging_column(column),
            column
          ))
          .await?;
      }

      tracing::info!(table = target.table, "columns migrated to document form");
    }

    // Always-safe additive change, independent of the array migrations.
    self.add_phone_numbers().await?;

    if stopped_at_checkpoint {
      tracing::info!(
        "stopped at verification checkpoint; staged columns remain in place"
      );
      return Ok(MigrationReport { finalized: false, samples });
    }

    self.execute_batch(FULL_EXPERIENCE_VIEW.to_owned()).await?;
    self.log_final_shape().await?;

    Ok(MigrationReport { finalized: true, samples })
  }

  /// Introduce `contact_info.phone_numbers` (country code → phone) with a
  /// schema-level default, backfilling it from the legacy scalar `phone`.
  /// Additive only; the scalar column stays in place.
  async fn add_phone_numbers(&self) -> Result<()> {
    if self
      .declared_type("contact_info", "phone_numbers")
      .await?
      .is_some()
    {
      return Ok(());
    }

    tracing::info!("adding contact_info.phone_numbers");
    self
      .execute_batch(
        "ALTER TABLE contact_info
           ADD COLUMN phone_numbers JSONB DEFAULT '{\"US\": null, \"BE\": null}';
         UPDATE contact_info
           SET phone_numbers = json_object('US', phone, 'BE', null)
           WHERE phone IS NOT NULL;"
          .to_owned(),
      )
      .await
  }

  async fn unbackfilled_rows(&self, table: &str, staging: &str) -> Result<i64> {
    let sql = format!("SELECT COUNT(*) FROM {table} WHERE {staging} IS NULL");
    let count = self
      .conn
      .call(move |conn| Ok(conn.query_row(&sql, [], |row| row.get(0))?))
      .await?;
    Ok(count)
  }

  /// Convert the legacy array value of every row still lacking a document
  /// value. Absent or NULL arrays become `[]`, never NULL. Rows already
  /// converted by an earlier run are left alone.
  async fn backfill_column(
    &self,
    table: &'static str,
    column: &'static str,
  ) -> Result<()> {
    let staging = staging_column(column);
    let select = format!("SELECT id, {column} FROM {table} WHERE {staging} IS NULL");
    let update = format!("UPDATE {table} SET {staging} = ?1 WHERE id = ?2");

    let rows: Vec<(i64, Option<String>)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&select)?;
        let rows = stmt
          .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    if rows.is_empty() {
      return Ok(());
    }

    let mut updates = Vec::with_capacity(rows.len());
    for (id, legacy) in rows {
      let values = parse_array_literal(legacy.as_deref().unwrap_or(""));
      updates.push((id, serde_json::to_string(&values)?));
    }

    let converted = updates.len();
    self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&update)?;
        for (id, document) in updates {
          stmt.execute(rusqlite::params![document, id])?;
        }
        Ok(())
      })
      .await?;

    tracing::info!(table, column, rows = converted, "backfilled document column");
    Ok(())
  }

  async fn verification_sample(
    &self,
    table: &'static str,
    column: &'static str,
    state: ColumnState,
  ) -> Result<Option<VerificationSample>> {
    let staging = staging_column(column);
    let sql = if state == ColumnState::LegacyDropped {
      format!("SELECT NULL, {staging} FROM {table} LIMIT 1")
    } else {
      format!("SELECT {column}, {staging} FROM {table} LIMIT 1")
    };

    let pair: Option<(Option<String>, Option<String>)> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, [], |row| Ok((row.get(0)?, row.get(1)?)))
            .optional()?,
        )
      })
      .await?;

    Ok(pair.map(|(legacy, document)| VerificationSample {
      table,
      column,
      legacy,
      document,
    }))
  }

  /// Final verification read: log each target table's column shape and one
  /// experience row for operator inspection.
  async fn log_final_shape(&self) -> Result<()> {
    for target in MIGRATION_TARGETS {
      let sql =
        format!("SELECT name, type FROM pragma_table_info('{}')", target.table);
      let shape: Vec<(String, String)> = self
        .conn
        .call(move |conn| {
          let mut stmt = conn.prepare(&sql)?;
          let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          Ok(rows)
        })
        .await?;
      tracing::info!(table = target.table, shape = ?shape, "final column shape");
    }

    if let Some(first) = self.full_experience().await?.into_iter().next() {
      tracing::info!(
        company = first.company.as_deref().unwrap_or(""),
        responsibilities = first.responsibilities.len(),
        achievements = first.achievements.len(),
        narrative = first.narrative.len(),
        "sample migrated row"
      );
    }
    Ok(())
  }
}

fn staging_column(column: &str) -> String {
  format!("{column}_jsonb")
}

fn is_document_type(declared: &str) -> bool {
  SeqEncoding::from_declared_type(declared) == SeqEncoding::Document
}
