//! Export of relational rows to portable row documents.
//!
//! Each snapshot table becomes an ordered sequence of JSON row documents.
//! Sequence-typed columns coerce to JSON lists whichever physical form they
//! are in (legacy array-literal text or a migrated document), so a backup
//! taken mid-migration is as portable as one taken after. Scalars pass
//! through; NULL sequences become empty lists, never null.

use serde_json::{Map, Value};

use crate::{Result, SqliteStore, encode::decode_sequence};

// ─── Table specs ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub enum ColumnKind {
  Scalar,
  Sequence,
}

#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
  pub name: &'static str,
  pub kind: ColumnKind,
}

#[derive(Debug, Clone, Copy)]
pub struct TableSpec {
  pub table:   &'static str,
  pub columns: &'static [ColumnSpec],
}

const fn scalar(name: &'static str) -> ColumnSpec {
  ColumnSpec { name, kind: ColumnKind::Scalar }
}

const fn sequence(name: &'static str) -> ColumnSpec {
  ColumnSpec { name, kind: ColumnKind::Sequence }
}

/// The tables a backup covers, with their column lists.
pub const SNAPSHOT_TABLES: &[TableSpec] = &[
  TableSpec {
    table:   "professional_experience",
    columns: &[
      scalar("id"),
      scalar("company"),
      scalar("title"),
      scalar("start_date"),
      scalar("end_date"),
      scalar("location"),
      sequence("responsibilities"),
      sequence("achievements"),
      sequence("narrative"),
    ],
  },
  TableSpec {
    table:   "education",
    columns: &[
      scalar("id"),
      scalar("institution"),
      scalar("degree"),
      scalar("field"),
      scalar("start_date"),
      scalar("end_date"),
      scalar("location"),
      sequence("achievements"),
    ],
  },
  TableSpec {
    table:   "skills",
    columns: &[scalar("id"), scalar("category"), sequence("skills")],
  },
  TableSpec {
    table:   "job_content",
    columns: &[
      scalar("id"),
      scalar("title"),
      scalar("company"),
      scalar("location"),
      scalar("salary"),
      scalar("description"),
      sequence("requirements"),
      sequence("responsibilities"),
      scalar("about_company"),
      scalar("benefits"),
      scalar("raw_content"),
      scalar("url"),
      scalar("created_at"),
    ],
  },
];

// ─── Export ──────────────────────────────────────────────────────────────────

impl SqliteStore {
  /// Export one table as ordered portable row documents.
  pub async fn snapshot_table(&self, spec: &TableSpec) -> Result<Vec<Value>> {
    let names: Vec<&str> = spec.columns.iter().map(|c| c.name).collect();
    let sql = format!(
      "SELECT {} FROM {} ORDER BY id",
      names.join(", "),
      spec.table
    );
    let width = spec.columns.len();

    let rows: Vec<Vec<rusqlite::types::Value>> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], |row| {
            let mut cells = Vec::with_capacity(width);
            for i in 0..width {
              cells.push(row.get::<_, rusqlite::types::Value>(i)?);
            }
            Ok(cells)
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let documents = rows
      .into_iter()
      .map(|cells| {
        let mut doc = Map::with_capacity(width);
        for (column, cell) in spec.columns.iter().zip(cells) {
          doc.insert(column.name.to_owned(), coerce(column.kind, cell));
        }
        Value::Object(doc)
      })
      .collect();

    Ok(documents)
  }
}

/// Coerce one physical cell to its portable JSON form.
fn coerce(kind: ColumnKind, cell: rusqlite::types::Value) -> Value {
  use rusqlite::types::Value as Sql;

  match kind {
    ColumnKind::Sequence => {
      let raw = match &cell {
        Sql::Text(text) => Some(text.as_str()),
        _ => None,
      };
      Value::Array(
        decode_sequence(raw).into_iter().map(Value::String).collect(),
      )
    }
    ColumnKind::Scalar => match cell {
      Sql::Null => Value::Null,
      Sql::Integer(n) => Value::from(n),
      Sql::Real(n) => Value::from(n),
      Sql::Text(text) => Value::String(text),
      // No blob columns exist in this schema.
      Sql::Blob(_) => Value::Null,
    },
  }
}
