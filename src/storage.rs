use anyhow::Result;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};

use crate::logging::{log, obj, v_str, Domain, Level};
use crate::table::{Column, FeatureRow, FeatureTable};

/// Quoted feature column names in `Column::ALL` order.
fn column_list() -> String {
    Column::ALL
        .iter()
        .map(|c| format!("\"{}\"", c.name()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// SQLite sink for feature tables, one labelled run per `persist` call.
pub struct FeatureStore {
    conn: Connection,
}

impl FeatureStore {
    pub fn new(path: &str) -> Result<Self> {
        Ok(Self { conn: Connection::open(path)? })
    }

    pub fn in_memory() -> Result<Self> {
        Ok(Self { conn: Connection::open_in_memory()? })
    }

    pub fn init(&mut self) -> Result<()> {
        let columns: String = Column::ALL
            .iter()
            .map(|c| format!("\"{}\" REAL,\n", c.name()))
            .collect();
        self.conn.execute_batch(&format!(
            "BEGIN;
            CREATE TABLE IF NOT EXISTS sigma_runs (
                label TEXT PRIMARY KEY,
                params_hash TEXT NOT NULL,
                fingerprint TEXT NOT NULL,
                rows INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS sigma_features (
                label TEXT NOT NULL,
                ts INTEGER NOT NULL,
                {columns}PRIMARY KEY (label, ts)
            );
            COMMIT;"
        ))?;
        Ok(())
    }

    /// Replace any previous run stored under `label`.
    pub fn persist(&mut self, label: &str, params_hash: &str, table: &FeatureTable) -> Result<usize> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM sigma_features WHERE label = ?1", params![label])?;
        tx.execute(
            "INSERT OR REPLACE INTO sigma_runs (label, params_hash, fingerprint, rows)
             VALUES (?1, ?2, ?3, ?4)",
            params![label, params_hash, table.fingerprint(), table.len() as i64],
        )?;
        {
            let placeholders: Vec<String> = (1..=Column::ALL.len() + 2).map(|i| format!("?{i}")).collect();
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO sigma_features (label, ts, {}) VALUES ({})",
                column_list(),
                placeholders.join(", ")
            ))?;
            for i in 0..table.len() {
                let mut values = vec![Value::Text(label.to_string()), Value::Integer(table.timestamps()[i])];
                values.extend(Column::ALL.iter().map(|&c| Value::Real(table.column(c)[i])));
                stmt.execute(params_from_iter(values))?;
            }
        }
        tx.commit()?;
        log(
            Level::Info,
            Domain::Storage,
            "persisted",
            obj(&[("label", v_str(label)), ("rows", serde_json::json!(table.len()))]),
        );
        Ok(table.len())
    }

    /// Every stored row of `label`, in timestamp order. SQLite keeps NaN as
    /// NULL, which reads back as NaN.
    pub fn rows(&self, label: &str) -> Result<Vec<FeatureRow>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT ts, {} FROM sigma_features WHERE label = ?1 ORDER BY ts",
            column_list()
        ))?;
        let rows = stmt.query_map(params![label], |r| {
            let ts: i64 = r.get(0)?;
            let values = (0..Column::ALL.len())
                .map(|i| r.get::<_, Option<f64>>(i + 1).map(|v| v.unwrap_or(f64::NAN)))
                .collect::<rusqlite::Result<Vec<f64>>>()?;
            Ok(FeatureRow::assemble(ts, |c| values[c.index()]))
        })?;
        let rows = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn row_count(&self, label: &str) -> Result<usize> {
        let n: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sigma_features WHERE label = ?1",
            params![label],
            |r| r.get(0),
        )?;
        Ok(n as usize)
    }

    pub fn sigma_r_series(&self, label: &str) -> Result<Vec<(i64, f64)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT ts, \"sigma_R\" FROM sigma_features WHERE label = ?1 ORDER BY ts")?;
        let rows = stmt.query_map(params![label], |r| Ok((r.get(0)?, r.get(1)?)))?;
        let series = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(series)
    }

    pub fn fingerprint(&self, label: &str) -> Result<Option<String>> {
        let mut stmt = self.conn.prepare("SELECT fingerprint FROM sigma_runs WHERE label = ?1")?;
        let mut rows = stmt.query_map(params![label], |r| r.get::<_, String>(0))?;
        let first = rows.next().transpose()?;
        Ok(first)
    }
}
