//! Persisted button records and shortcut bindings.
//!
//! SQLite is the single source of truth the accelerator registry reconciles
//! toward. All mutations go through this one store (single-writer
//! discipline); a partial unique index on `shortcut_key` backs the explicit
//! conflict check so global shortcut uniqueness holds even if a caller skips
//! `find_conflict`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::actions::ActionKind;
use crate::error::{Result, SoundpadError};

/// Durable button identity: `(category_id, button_index)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ButtonId {
    pub category: i64,
    pub index: i64,
}

impl ButtonId {
    pub fn new(category: i64, index: i64) -> Self {
        Self { category, index }
    }
}

impl std::fmt::Display for ButtonId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.category, self.index)
    }
}

/// One row of the `sound_buttons` table.
#[derive(Clone, Debug, PartialEq)]
pub struct ButtonRecord {
    pub id: ButtonId,
    pub name: String,
    pub sound_path: Option<String>,
    pub shortcut_key: Option<String>,
    pub shortcut_display: Option<String>,
    pub action: ActionKind,
}

impl ButtonRecord {
    pub fn new(id: ButtonId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            sound_path: None,
            shortcut_key: None,
            shortcut_display: None,
            action: ActionKind::PlaySound,
        }
    }

    pub fn with_action(mut self, action: ActionKind) -> Self {
        self.action = action;
        self
    }

    pub fn with_sound(mut self, path: impl Into<String>) -> Self {
        self.sound_path = Some(path.into());
        self
    }
}

/// File-backed store of button records.
pub struct BindingStore {
    conn: Arc<Mutex<Connection>>,
}

/// Default database location (~/.soundpad/db/soundbuttons.sqlite).
pub fn default_db_path() -> Result<PathBuf> {
    let dir = PathBuf::from(shellexpand::tilde("~/.soundpad").as_ref()).join("db");
    if !dir.exists() {
        std::fs::create_dir_all(&dir)?;
    }
    Ok(dir.join("soundbuttons.sqlite"))
}

impl BindingStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// In-memory store, used by tests and the one-shot CLI subcommands.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        // WAL plus a busy timeout avoids "database is locked" when the UI
        // process and a maintenance command touch the same file.
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;
             PRAGMA busy_timeout=5000;",
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS sound_buttons (
                category_id      INTEGER NOT NULL,
                button_index     INTEGER NOT NULL,
                name             TEXT NOT NULL DEFAULT '',
                sound_path       TEXT,
                shortcut_key     TEXT,
                shortcut_display TEXT,
                action_type      TEXT NOT NULL DEFAULT 'play_sound',
                PRIMARY KEY (category_id, button_index)
            )",
            [],
        )?;

        // Global uniqueness of bound shortcuts, regardless of category.
        conn.execute(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_shortcut_key
             ON sound_buttons(shortcut_key) WHERE shortcut_key IS NOT NULL",
            [],
        )?;

        debug!("binding store ready");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn insert(&self, record: &ButtonRecord) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO sound_buttons
             (category_id, button_index, name, sound_path, shortcut_key, shortcut_display, action_type)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.id.category,
                record.id.index,
                record.name,
                record.sound_path,
                record.shortcut_key,
                record.shortcut_display,
                record.action.as_str(),
            ],
        )?;
        Ok(())
    }

    pub fn get(&self, id: ButtonId) -> Result<Option<ButtonRecord>> {
        let conn = self.conn.lock();
        let record = conn
            .query_row(
                "SELECT category_id, button_index, name, sound_path, shortcut_key,
                        shortcut_display, action_type
                 FROM sound_buttons WHERE category_id = ?1 AND button_index = ?2",
                params![id.category, id.index],
                row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    /// Every record, ordered by `(category_id, button_index)`. This is what a
    /// full reconciliation pass consumes.
    pub fn all(&self) -> Result<Vec<ButtonRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT category_id, button_index, name, sound_path, shortcut_key,
                    shortcut_display, action_type
             FROM sound_buttons ORDER BY category_id, button_index",
        )?;
        let rows = stmt.query_map([], row_to_record)?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    /// Does any *other* button already hold this canonical key?
    pub fn find_conflict(
        &self,
        canonical: &str,
        exclude: ButtonId,
    ) -> Result<Option<ButtonRecord>> {
        let conn = self.conn.lock();
        let record = conn
            .query_row(
                "SELECT category_id, button_index, name, sound_path, shortcut_key,
                        shortcut_display, action_type
                 FROM sound_buttons
                 WHERE shortcut_key = ?1
                   AND NOT (category_id = ?2 AND button_index = ?3)",
                params![canonical, exclude.category, exclude.index],
                row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    /// Bind a shortcut to a button. Fails with [`SoundpadError::Conflict`] if
    /// any other button holds the key; other rows are never touched.
    pub fn bind(&self, id: ButtonId, canonical: &str, display: &str) -> Result<()> {
        if let Some(holder) = self.find_conflict(canonical, id)? {
            return Err(SoundpadError::Conflict {
                display: display.to_string(),
                holder: holder.name,
            });
        }

        let conn = self.conn.lock();
        let changed = conn
            .execute(
                "UPDATE sound_buttons SET shortcut_key = ?1, shortcut_display = ?2
                 WHERE category_id = ?3 AND button_index = ?4",
                params![canonical, display, id.category, id.index],
            )
            .map_err(|e| match e {
                // The unique index is the backstop behind the explicit check.
                rusqlite::Error::SqliteFailure(err, _)
                    if err.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    SoundpadError::Conflict {
                        display: display.to_string(),
                        holder: String::from("another button"),
                    }
                }
                other => SoundpadError::Persistence(other),
            })?;

        if changed == 0 {
            return Err(SoundpadError::UnknownButton {
                category: id.category,
                index: id.index,
            });
        }
        // Rebind: tracing's macro imports `tracing::field::display`, which
        // shadows a bare `display` identifier inside the expansion.
        let label = display;
        info!(button = %id, key = canonical, label, "shortcut bound");
        Ok(())
    }

    /// Clear a button's shortcut. Returns the canonical key that was cleared,
    /// if any, so the caller can unregister the matching accelerator.
    pub fn unbind(&self, id: ButtonId) -> Result<Option<String>> {
        let previous = self
            .get(id)?
            .ok_or(SoundpadError::UnknownButton {
                category: id.category,
                index: id.index,
            })?
            .shortcut_key;

        let conn = self.conn.lock();
        conn.execute(
            "UPDATE sound_buttons SET shortcut_key = NULL, shortcut_display = NULL
             WHERE category_id = ?1 AND button_index = ?2",
            params![id.category, id.index],
        )?;
        if let Some(key) = &previous {
            info!(button = %id, key, "shortcut cleared");
        }
        Ok(previous)
    }

    pub fn rename(&self, id: ButtonId, name: &str) -> Result<()> {
        self.update_row(
            id,
            "UPDATE sound_buttons SET name = ?1 WHERE category_id = ?2 AND button_index = ?3",
            params![name, id.category, id.index],
        )
    }

    pub fn set_sound(&self, id: ButtonId, sound_path: Option<&str>) -> Result<()> {
        self.update_row(
            id,
            "UPDATE sound_buttons SET sound_path = ?1 WHERE category_id = ?2 AND button_index = ?3",
            params![sound_path, id.category, id.index],
        )
    }

    /// Overwrite a button's assignment (name + sound) in one statement.
    /// Used by clipboard paste; the shortcut is deliberately not copied.
    pub fn assign(&self, id: ButtonId, name: &str, sound_path: Option<&str>) -> Result<()> {
        self.update_row(
            id,
            "UPDATE sound_buttons SET name = ?1, sound_path = ?2
             WHERE category_id = ?3 AND button_index = ?4",
            params![name, sound_path, id.category, id.index],
        )
    }

    /// Delete a button and close the gap: remaining buttons in the category
    /// are renumbered so `button_index` stays a dense 1..N sequence.
    pub fn delete(&self, id: ButtonId) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let deleted = tx.execute(
            "DELETE FROM sound_buttons WHERE category_id = ?1 AND button_index = ?2",
            params![id.category, id.index],
        )?;
        if deleted == 0 {
            return Err(SoundpadError::UnknownButton {
                category: id.category,
                index: id.index,
            });
        }
        // Shift in two passes. A single `button_index - 1` update trips the
        // primary key whenever SQLite visits rows out of index order (rows
        // inserted out of order keep their rowid order), so park the shifted
        // indices in negative space first, then flip the sign.
        tx.execute(
            "UPDATE sound_buttons SET button_index = -(button_index - 1)
             WHERE category_id = ?1 AND button_index > ?2",
            params![id.category, id.index],
        )?;
        tx.execute(
            "UPDATE sound_buttons SET button_index = -button_index
             WHERE category_id = ?1 AND button_index < 0",
            params![id.category],
        )?;
        tx.commit()?;
        info!(button = %id, "button deleted, category renumbered");
        Ok(())
    }

    fn update_row(
        &self,
        id: ButtonId,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<()> {
        let conn = self.conn.lock();
        let changed = conn.execute(sql, params)?;
        if changed == 0 {
            return Err(SoundpadError::UnknownButton {
                category: id.category,
                index: id.index,
            });
        }
        Ok(())
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<ButtonRecord> {
    let action: String = row.get(6)?;
    Ok(ButtonRecord {
        id: ButtonId::new(row.get(0)?, row.get(1)?),
        name: row.get(2)?,
        sound_path: row.get(3)?,
        shortcut_key: row.get(4)?,
        shortcut_display: row.get(5)?,
        action: ActionKind::parse(&action).unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_buttons(count: i64) -> BindingStore {
        let store = BindingStore::open_in_memory().unwrap();
        for i in 1..=count {
            store
                .insert(&ButtonRecord::new(
                    ButtonId::new(1, i),
                    format!("button-{}", i),
                ))
                .unwrap();
        }
        store
    }

    #[test]
    fn bind_and_read_back() {
        let store = store_with_buttons(2);
        store.bind(ButtonId::new(1, 1), "65", "A").unwrap();
        let rec = store.get(ButtonId::new(1, 1)).unwrap().unwrap();
        assert_eq!(rec.shortcut_key.as_deref(), Some("65"));
        assert_eq!(rec.shortcut_display.as_deref(), Some("A"));
    }

    #[test]
    fn bind_rejects_conflicts_and_leaves_holder_untouched() {
        let store = store_with_buttons(2);
        store.bind(ButtonId::new(1, 1), "65", "A").unwrap();

        let err = store.bind(ButtonId::new(1, 2), "65", "A").unwrap_err();
        match err {
            SoundpadError::Conflict { holder, .. } => assert_eq!(holder, "button-1"),
            other => panic!("expected conflict, got {:?}", other),
        }

        // Holder unchanged, target row untouched.
        let holder = store.get(ButtonId::new(1, 1)).unwrap().unwrap();
        assert_eq!(holder.shortcut_key.as_deref(), Some("65"));
        let target = store.get(ButtonId::new(1, 2)).unwrap().unwrap();
        assert_eq!(target.shortcut_key, None);
    }

    #[test]
    fn conflict_check_is_global_across_categories() {
        let store = store_with_buttons(1);
        store
            .insert(&ButtonRecord::new(ButtonId::new(2, 1), "other-tab"))
            .unwrap();
        store.bind(ButtonId::new(1, 1), "F3", "F3").unwrap();
        assert!(store.bind(ButtonId::new(2, 1), "F3", "F3").is_err());
    }

    #[test]
    fn rebinding_own_key_is_not_a_conflict() {
        let store = store_with_buttons(1);
        store.bind(ButtonId::new(1, 1), "65", "A").unwrap();
        store.bind(ButtonId::new(1, 1), "65", "A").unwrap();
    }

    #[test]
    fn shortcut_uniqueness_holds_under_bind_unbind_sequences() {
        let store = store_with_buttons(3);
        let a = ButtonId::new(1, 1);
        let b = ButtonId::new(1, 2);
        let c = ButtonId::new(1, 3);

        store.bind(a, "65", "A").unwrap();
        assert!(store.bind(b, "65", "A").is_err());
        store.unbind(a).unwrap();
        store.bind(b, "65", "A").unwrap();
        store.bind(a, "66", "B").unwrap();
        assert!(store.bind(c, "66", "B").is_err());

        let held: Vec<_> = store
            .all()
            .unwrap()
            .into_iter()
            .filter_map(|r| r.shortcut_key)
            .collect();
        let mut deduped = held.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(held.len(), deduped.len(), "duplicate shortcut keys in store");
    }

    #[test]
    fn unbind_returns_the_cleared_key() {
        let store = store_with_buttons(1);
        let id = ButtonId::new(1, 1);
        store.bind(id, "F7", "F7").unwrap();
        assert_eq!(store.unbind(id).unwrap().as_deref(), Some("F7"));
        assert_eq!(store.unbind(id).unwrap(), None);
    }

    #[test]
    fn bind_unknown_button_fails() {
        let store = store_with_buttons(1);
        assert!(matches!(
            store.bind(ButtonId::new(9, 9), "65", "A"),
            Err(SoundpadError::UnknownButton { .. })
        ));
    }

    #[test]
    fn delete_renumbers_the_category_densely() {
        let store = store_with_buttons(4);
        store.delete(ButtonId::new(1, 2)).unwrap();

        let records = store.all().unwrap();
        let indices: Vec<i64> = records.iter().map(|r| r.id.index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
        // button-3 slid into index 2; button-4 into 3.
        assert_eq!(records[1].name, "button-3");
        assert_eq!(records[2].name, "button-4");
    }

    #[test]
    fn delete_renumbers_rows_inserted_out_of_order() {
        // Rows keep their insertion (rowid) order, so the renumbering update
        // visits index 3 before index 2 here. Must not trip the primary key.
        let store = BindingStore::open_in_memory().unwrap();
        for i in [3, 2, 1] {
            store
                .insert(&ButtonRecord::new(
                    ButtonId::new(1, i),
                    format!("button-{}", i),
                ))
                .unwrap();
        }
        store.delete(ButtonId::new(1, 1)).unwrap();

        let records = store.all().unwrap();
        let indices: Vec<i64> = records.iter().map(|r| r.id.index).collect();
        assert_eq!(indices, vec![1, 2]);
        assert_eq!(records[0].name, "button-2");
        assert_eq!(records[1].name, "button-3");
    }

    #[test]
    fn assign_overwrites_name_and_sound_but_not_shortcut() {
        let store = store_with_buttons(2);
        let target = ButtonId::new(1, 2);
        store.bind(target, "70", "F").unwrap();
        store.assign(target, "horn", Some("sounds/horn.bin")).unwrap();

        let rec = store.get(target).unwrap().unwrap();
        assert_eq!(rec.name, "horn");
        assert_eq!(rec.sound_path.as_deref(), Some("sounds/horn.bin"));
        assert_eq!(rec.shortcut_key.as_deref(), Some("70"));
    }

    #[test]
    fn action_kind_persists() {
        let store = BindingStore::open_in_memory().unwrap();
        store
            .insert(
                &ButtonRecord::new(ButtonId::new(1, 1), "toggle")
                    .with_action(ActionKind::ToggleHotkeys),
            )
            .unwrap();
        let rec = store.get(ButtonId::new(1, 1)).unwrap().unwrap();
        assert_eq!(rec.action, ActionKind::ToggleHotkeys);
    }
}
