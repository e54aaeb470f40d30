//! SQLite-backed policy blob store.

use super::{PolicyStore, StoreResult};
use rusqlite::{params, Connection, OptionalExtension};

const UPSERT_SQL: &str = "INSERT INTO policy_blobs (key, value, updated_at)
     VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
     ON CONFLICT(key) DO UPDATE SET
        value = excluded.value,
        updated_at = excluded.updated_at;";

/// Policy store over the `policy_blobs` table.
pub struct SqlitePolicyStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePolicyStore<'conn> {
    /// Wraps a connection returned by `open_db`/`open_db_in_memory`.
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl PolicyStore for SqlitePolicyStore<'_> {
    fn load(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM policy_blobs WHERE key = ?1;",
                [key],
                |row| row.get::<_, Vec<u8>>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn save(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        self.conn.execute(UPSERT_SQL, params![key, value])?;
        Ok(())
    }

    fn save_all(&self, entries: &[(&str, Vec<u8>)]) -> StoreResult<()> {
        // unchecked_transaction works on a shared borrow; nesting is not used here.
        let tx = self.conn.unchecked_transaction()?;
        for (key, value) in entries {
            tx.execute(UPSERT_SQL, params![key, value])?;
        }
        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::SqlitePolicyStore;
    use crate::db::open_db_in_memory;
    use crate::store::PolicyStore;

    #[test]
    fn missing_key_loads_as_none() {
        let conn = open_db_in_memory().unwrap();
        let store = SqlitePolicyStore::new(&conn);
        assert_eq!(store.load("absent").unwrap(), None);
    }

    #[test]
    fn save_overwrites_previous_value() {
        let conn = open_db_in_memory().unwrap();
        let store = SqlitePolicyStore::new(&conn);

        store.save("k", b"first").unwrap();
        store.save("k", b"second").unwrap();
        assert_eq!(store.load("k").unwrap().as_deref(), Some(&b"second"[..]));
    }

    #[test]
    fn save_all_writes_every_key() {
        let conn = open_db_in_memory().unwrap();
        let store = SqlitePolicyStore::new(&conn);

        store
            .save_all(&[("a", b"1".to_vec()), ("b", b"2".to_vec())])
            .unwrap();
        assert_eq!(store.load("a").unwrap(), Some(b"1".to_vec()));
        assert_eq!(store.load("b").unwrap(), Some(b"2".to_vec()));
    }
}
