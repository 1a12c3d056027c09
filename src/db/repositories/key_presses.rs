use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension, Row};

use crate::db::{
    connection::Database,
    helpers::to_u64,
    models::{KeyPressDelta, KeyPressRecord},
};

fn row_to_record(row: &Row) -> Result<KeyPressRecord> {
    let count: i64 = row.get("count")?;

    Ok(KeyPressRecord {
        key_code: row.get("key_code")?,
        key_name: row.get("key_name")?,
        count: to_u64(count, "count")?,
    })
}

impl Database {
    /// Merges a flush batch into the `key_presses` table. The whole batch
    /// commits in one transaction: either every delta lands or none does.
    ///
    /// A key seen for the first time starts at `max(delta, 1)` so a record is
    /// never created with a zero count.
    pub async fn apply_press_deltas(&self, batch: Vec<KeyPressDelta>) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }

        self.execute(move |conn| {
            let tx = conn
                .transaction()
                .context("failed to open key press transaction")?;

            for item in &batch {
                let existing: Option<i64> = tx
                    .query_row(
                        "SELECT count FROM key_presses WHERE key_code = ?1",
                        params![item.key_code],
                        |row| row.get(0),
                    )
                    .optional()
                    .context("failed to fetch key press record")?;

                match existing {
                    Some(count) => {
                        tx.execute(
                            "UPDATE key_presses SET count = ?1 WHERE key_code = ?2",
                            params![count + i64::from(item.delta), item.key_code],
                        )
                        .context("failed to update key press record")?;
                    }
                    None => {
                        tx.execute(
                            "INSERT INTO key_presses (key_code, key_name, count)
                             VALUES (?1, ?2, ?3)",
                            params![
                                item.key_code,
                                item.key_name,
                                i64::from(item.delta.max(1))
                            ],
                        )
                        .context("failed to insert key press record")?;
                    }
                }
            }

            tx.commit().context("failed to commit key press batch")?;
            Ok(())
        })
        .await
    }

    pub async fn get_key_press(&self, key_code: i64) -> Result<Option<KeyPressRecord>> {
        self.execute(move |conn| {
            let record = conn
                .query_row(
                    "SELECT key_code, key_name, count FROM key_presses WHERE key_code = ?1",
                    params![key_code],
                    |row| {
                        Ok((
                            row.get::<_, i64>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, i64>(2)?,
                        ))
                    },
                )
                .optional()
                .context("failed to fetch key press record")?;

            match record {
                Some((key_code, key_name, count)) => Ok(Some(KeyPressRecord {
                    key_code,
                    key_name,
                    count: to_u64(count, "count")?,
                })),
                None => Ok(None),
            }
        })
        .await
    }

    pub async fn get_all_key_presses(&self) -> Result<Vec<KeyPressRecord>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT key_code, key_name, count FROM key_presses
                 ORDER BY count DESC, key_code ASC",
            )?;

            let mut rows = stmt.query([])?;
            let mut records = Vec::new();
            while let Some(row) = rows.next()? {
                records.push(row_to_record(row)?);
            }

            Ok(records)
        })
        .await
    }

    pub async fn top_key_presses(&self, limit: u32) -> Result<Vec<KeyPressRecord>> {
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT key_code, key_name, count FROM key_presses
                 ORDER BY count DESC, key_code ASC
                 LIMIT ?1",
            )?;

            let mut rows = stmt.query(params![limit])?;
            let mut records = Vec::new();
            while let Some(row) = rows.next()? {
                records.push(row_to_record(row)?);
            }

            Ok(records)
        })
        .await
    }

    pub async fn total_press_count(&self) -> Result<u64> {
        self.execute(|conn| {
            let total: i64 = conn
                .query_row(
                    "SELECT COALESCE(SUM(count), 0) FROM key_presses",
                    [],
                    |row| row.get(0),
                )
                .context("failed to sum key press counts")?;

            to_u64(total, "total")
        })
        .await
    }

    /// Bulk reset requested from the data settings surface.
    pub async fn reset_key_presses(&self) -> Result<()> {
        self.execute(|conn| {
            conn.execute("DELETE FROM key_presses", [])
                .context("failed to reset key press records")?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delta(key_code: i64, key_name: &str, delta: u32) -> KeyPressDelta {
        KeyPressDelta {
            key_code,
            key_name: key_name.to_string(),
            delta,
        }
    }

    #[tokio::test]
    async fn creates_records_on_first_flush() {
        let db = Database::open_in_memory().unwrap();

        db.apply_press_deltas(vec![delta(0, "A", 3), delta(49, "␣", 1)])
            .await
            .unwrap();

        let record = db.get_key_press(0).await.unwrap().unwrap();
        assert_eq!(record.key_name, "A");
        assert_eq!(record.count, 3);
        assert_eq!(db.total_press_count().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn merges_deltas_into_existing_records() {
        let db = Database::open_in_memory().unwrap();

        db.apply_press_deltas(vec![delta(0, "A", 2)]).await.unwrap();
        db.apply_press_deltas(vec![delta(0, "A", 5)]).await.unwrap();

        let record = db.get_key_press(0).await.unwrap().unwrap();
        assert_eq!(record.count, 7);
    }

    #[tokio::test]
    async fn new_records_never_start_below_one() {
        let db = Database::open_in_memory().unwrap();

        db.apply_press_deltas(vec![delta(12, "Q", 0)]).await.unwrap();

        let record = db.get_key_press(12).await.unwrap().unwrap();
        assert_eq!(record.count, 1);
    }

    #[tokio::test]
    async fn empty_batch_writes_nothing() {
        let db = Database::open_in_memory().unwrap();

        db.apply_press_deltas(Vec::new()).await.unwrap();

        assert!(db.get_all_key_presses().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn orders_records_by_count_descending() {
        let db = Database::open_in_memory().unwrap();

        db.apply_press_deltas(vec![delta(0, "A", 1), delta(1, "S", 9), delta(2, "D", 4)])
            .await
            .unwrap();

        let all = db.get_all_key_presses().await.unwrap();
        let names: Vec<&str> = all.iter().map(|r| r.key_name.as_str()).collect();
        assert_eq!(names, vec!["S", "D", "A"]);

        let top = db.top_key_presses(2).await.unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].key_name, "S");
    }

    #[tokio::test]
    async fn reset_clears_all_records() {
        let db = Database::open_in_memory().unwrap();

        db.apply_press_deltas(vec![delta(0, "A", 3)]).await.unwrap();
        db.reset_key_presses().await.unwrap();

        assert!(db.get_key_press(0).await.unwrap().is_none());
        assert_eq!(db.total_press_count().await.unwrap(), 0);
    }
}
