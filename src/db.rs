use anyhow::Context;
use chrono::Local;
use rusqlite::Connection;

use crate::{capability::TelemetrySink, error::Fault};

/// Telemetry sink that keeps published points in a local SQLite file.
#[derive(Debug)]
pub struct DB {
    conn: Connection,
}

impl DB {
    pub fn new(path: &str) -> Result<Self, anyhow::Error> {
        let conn = Connection::open(path).context("Failed to open database file")?;
        Ok(Self { conn })
    }

    pub fn init(&self) -> Result<(), anyhow::Error> {
        self.conn
            .execute_batch(
                r"
                CREATE TABLE IF NOT EXISTS measurements (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    timestamp TEXT NOT NULL,
                    series TEXT NOT NULL,
                    field TEXT NOT NULL,
                    value REAL NOT NULL
                );
                ",
            )
            .context("Failed to create table")?;
        Ok(())
    }

    pub fn insert(&mut self, series: &str, fields: &[(&str, f64)]) -> Result<(), anyhow::Error> {
        let timestamp = Local::now().to_rfc3339();
        let tx = self
            .conn
            .transaction()
            .context("Failed to begin transaction")?;
        for (field, value) in fields {
            tx.execute(
                r"
                INSERT INTO measurements (timestamp, series, field, value) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![timestamp, series, field, value],
            )
            .context("Failed to insert data into table")?;
        }
        tx.commit().context("Failed to commit transaction")?;
        Ok(())
    }
}

impl TelemetrySink for DB {
    fn setup(&mut self) -> Result<(), Fault> {
        self.init().map_err(Fault::sink)
    }

    fn publish(&mut self, series: &str, fields: &[(&str, f64)]) -> Result<(), Fault> {
        self.insert(series, fields).map_err(Fault::sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(db: &DB) -> Vec<(String, String, f64)> {
        let mut stmt = db
            .conn
            .prepare("SELECT series, field, value FROM measurements ORDER BY id")
            .unwrap();
        stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn test_publish_inserts_one_row_per_field() {
        let mut db = DB::new(":memory:").unwrap();
        db.setup().unwrap();
        db.publish(
            "measurement",
            &[
                ("temperature", 24.5),
                ("humidity", 48.0),
                ("pressure", 1009.5),
            ],
        )
        .unwrap();

        assert_eq!(
            rows(&db),
            vec![
                ("measurement".to_string(), "temperature".to_string(), 24.5),
                ("measurement".to_string(), "humidity".to_string(), 48.0),
                ("measurement".to_string(), "pressure".to_string(), 1009.5),
            ]
        );
    }

    #[test]
    fn test_setup_is_repeatable() {
        let mut db = DB::new(":memory:").unwrap();
        db.setup().unwrap();
        db.setup().unwrap();
    }

    #[test]
    fn test_publish_without_table_is_sink_unavailable() {
        let mut db = DB::new(":memory:").unwrap();
        let err = db.publish("measurement", &[("temperature", 1.0)]).unwrap_err();
        assert!(matches!(err, Fault::SinkUnavailable(_)));
    }
}
