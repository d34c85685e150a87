use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{Connection, OptionalExtension};
use std::path::PathBuf;
use thiserror::Error;

use crate::backup::{Backup, BackupError};
use crate::expiry;
use crate::models::{Product, Reminder, Settings};

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),
    #[error("Failed to create database directory: {0}")]
    DirectoryError(String),
    #[error("No product with id {0}")]
    NotFound(i64),
    #[error("Cannot update a product without an id")]
    MissingId,
    #[error("Invalid backup: {0}")]
    InvalidBackup(#[from] BackupError),
}

/// Ordering of the active list: newest registration first, or soonest
/// expiry first (the dashboard view).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Recent,
    ExpiryAsc,
}

const PRODUCT_COLUMNS: &str = "id, name, barcode, description, expiry_date, photo_path, quantity, archived, notification_id, created_at, updated_at";

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database at `path` and bring its schema up to
    /// date.
    pub fn new(path: &str) -> Result<Self, DatabaseError> {
        let db_path = PathBuf::from(path);

        // Create parent directory if it doesn't exist
        if let Some(parent) = db_path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| DatabaseError::DirectoryError(e.to_string()))?;
            }
        }

        let conn = Connection::open(&db_path)?;

        let db = Database { conn };
        db.apply_migrations()?;

        Ok(db)
    }

    /// Apply pending schema migrations in order. Each step checks for its
    /// own applicability (column inspection, CREATE IF NOT EXISTS) before
    /// touching anything, so re-running against any older store shape is
    /// safe. Duplicate-column errors are never swallowed; existing data is
    /// never dropped.
    fn apply_migrations(&self) -> Result<(), DatabaseError> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)",
            [],
        )?;

        let version: Option<i64> = self
            .conn
            .query_row("SELECT version FROM schema_version", [], |row| row.get(0))
            .optional()?;
        let version = match version {
            Some(v) => v,
            None => {
                self.conn
                    .execute("INSERT INTO schema_version (version) VALUES (0)", [])?;
                0
            }
        };

        if version < 1 {
            self.migrate_v1_products()?;
            self.set_schema_version(1)?;
        }
        if version < 2 {
            self.migrate_v2_capture_fields()?;
            self.set_schema_version(2)?;
        }
        if version < 3 {
            self.migrate_v3_lifecycle_fields()?;
            self.set_schema_version(3)?;
        }
        if version < 4 {
            self.migrate_v4_settings_and_reminders()?;
            self.set_schema_version(4)?;
            tracing::debug!("migrated database schema from version {version}");
        }

        Ok(())
    }

    fn set_schema_version(&self, version: i64) -> Result<(), DatabaseError> {
        self.conn
            .execute("UPDATE schema_version SET version = ?1", rusqlite::params![version])?;
        Ok(())
    }

    fn column_exists(&self, table: &str, column: &str) -> Result<bool, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare("SELECT COUNT(*) FROM pragma_table_info(?1) WHERE name = ?2")?;
        let count: i64 = stmt.query_row(rusqlite::params![table, column], |row| row.get(0))?;
        Ok(count > 0)
    }

    /// v1: the original product table (name + expiry date only)
    fn migrate_v1_products(&self) -> Result<(), DatabaseError> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS products (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                name            TEXT NOT NULL,
                expiry_date     TEXT NOT NULL,
                created_at      TEXT NOT NULL,
                updated_at      TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    /// v2: barcode scanning and photo capture fields
    fn migrate_v2_capture_fields(&self) -> Result<(), DatabaseError> {
        if !self.column_exists("products", "barcode")? {
            self.conn
                .execute("ALTER TABLE products ADD COLUMN barcode TEXT", [])?;
        }
        if !self.column_exists("products", "description")? {
            self.conn
                .execute("ALTER TABLE products ADD COLUMN description TEXT", [])?;
        }
        if !self.column_exists("products", "photo_path")? {
            self.conn
                .execute("ALTER TABLE products ADD COLUMN photo_path TEXT", [])?;
        }
        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_products_barcode ON products(barcode)",
            [],
        )?;
        Ok(())
    }

    /// v3: quantity, archive flag and the reminder handle
    fn migrate_v3_lifecycle_fields(&self) -> Result<(), DatabaseError> {
        if !self.column_exists("products", "quantity")? {
            self.conn.execute(
                "ALTER TABLE products ADD COLUMN quantity INTEGER NOT NULL DEFAULT 1",
                [],
            )?;
        }
        if !self.column_exists("products", "archived")? {
            self.conn.execute(
                "ALTER TABLE products ADD COLUMN archived INTEGER NOT NULL DEFAULT 0",
                [],
            )?;
        }
        if !self.column_exists("products", "notification_id")? {
            self.conn
                .execute("ALTER TABLE products ADD COLUMN notification_id TEXT", [])?;
        }
        Ok(())
    }

    /// v4: the settings singleton and the reminder queue
    fn migrate_v4_settings_and_reminders(&self) -> Result<(), DatabaseError> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS settings (
                id              INTEGER PRIMARY KEY CHECK (id = 1),
                lead_days       INTEGER NOT NULL,
                alert_hour      INTEGER NOT NULL,
                alert_minute    INTEGER NOT NULL
            )",
            [],
        )?;
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS reminders (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                title           TEXT NOT NULL,
                body            TEXT NOT NULL,
                fire_at         TEXT NOT NULL,
                delivered       INTEGER NOT NULL DEFAULT 0
            )",
            [],
        )?;
        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_reminders_fire_at ON reminders(fire_at)",
            [],
        )?;
        Ok(())
    }

    /// Get a reference to the underlying connection
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    // Product operations

    fn row_to_product(row: &rusqlite::Row) -> Result<Product, rusqlite::Error> {
        Ok(Product {
            id: Some(row.get(0)?),
            name: row.get(1)?,
            barcode: row.get(2)?,
            description: row.get(3)?,
            expiry_date: row.get(4)?,
            photo_path: row.get(5)?,
            quantity: row.get(6)?,
            archived: row.get::<_, i64>(7)? != 0,
            notification_id: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }

    /// Insert a product and return its assigned id
    pub fn insert_product(&self, product: &Product) -> Result<i64, DatabaseError> {
        self.conn.execute(
            "INSERT INTO products (name, barcode, description, expiry_date, photo_path, quantity, archived, notification_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            rusqlite::params![
                product.name,
                product.barcode,
                product.description,
                product.expiry_date,
                product.photo_path,
                product.quantity,
                if product.archived { 1 } else { 0 },
                product.notification_id,
                product.created_at,
                product.updated_at
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Get a single product by id
    pub fn get_product(&self, id: i64) -> Result<Product, DatabaseError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))?;
        stmt.query_row(rusqlite::params![id], Self::row_to_product)
            .optional()?
            .ok_or(DatabaseError::NotFound(id))
    }

    /// Update an existing product (all fields)
    pub fn update_product(&self, product: &Product) -> Result<(), DatabaseError> {
        let id = product.id.ok_or(DatabaseError::MissingId)?;

        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute(
            "UPDATE products SET name = ?1, barcode = ?2, description = ?3, expiry_date = ?4,
             photo_path = ?5, quantity = ?6, archived = ?7, notification_id = ?8, updated_at = ?9
             WHERE id = ?10",
            rusqlite::params![
                product.name,
                product.barcode,
                product.description,
                product.expiry_date,
                product.photo_path,
                product.quantity,
                if product.archived { 1 } else { 0 },
                product.notification_id,
                product.updated_at,
                id
            ],
        )?;
        tx.commit()?;

        if changed == 0 {
            return Err(DatabaseError::NotFound(id));
        }
        Ok(())
    }

    /// Permanently delete a product
    pub fn delete_product(&self, id: i64) -> Result<(), DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute("DELETE FROM products WHERE id = ?1", rusqlite::params![id])?;
        tx.commit()?;

        if changed == 0 {
            return Err(DatabaseError::NotFound(id));
        }
        Ok(())
    }

    /// Soft-delete a batch of products in one transaction. Only the
    /// archived flag changes, so a later restore is an exact inverse.
    pub fn archive_products(&self, ids: &[i64]) -> Result<(), DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        for id in ids {
            tx.execute(
                "UPDATE products SET archived = 1 WHERE id = ?1",
                rusqlite::params![id],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Bring an archived product back to the active list
    pub fn restore_product(&self, id: i64) -> Result<(), DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute(
            "UPDATE products SET archived = 0 WHERE id = ?1",
            rusqlite::params![id],
        )?;
        tx.commit()?;

        if changed == 0 {
            return Err(DatabaseError::NotFound(id));
        }
        Ok(())
    }

    /// Active (non-archived) products. `Recent` is newest-first by
    /// insertion; `ExpiryAsc` sorts by parsed expiry date, soonest first,
    /// with unreadable dates last (the persisted DD/MM/YYYY form does not
    /// sort lexically, so the sort happens after the query).
    pub fn list_active(&self, sort: SortOrder) -> Result<Vec<Product>, DatabaseError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE archived = 0 ORDER BY id DESC"
        ))?;
        let mut products = stmt
            .query_map([], Self::row_to_product)?
            .collect::<Result<Vec<_>, _>>()?;

        if sort == SortOrder::ExpiryAsc {
            products.sort_by_key(|p| {
                expiry::parse_expiry(&p.expiry_date).unwrap_or(NaiveDate::MAX)
            });
        }

        Ok(products)
    }

    /// Archived products, newest-first
    pub fn list_archived(&self) -> Result<Vec<Product>, DatabaseError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE archived = 1 ORDER BY id DESC"
        ))?;
        let products = stmt
            .query_map([], Self::row_to_product)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(products)
    }

    /// Most recent product carrying this barcode (purchase history may hold
    /// several)
    pub fn find_by_barcode(&self, barcode: &str) -> Result<Option<Product>, DatabaseError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE barcode = ?1 ORDER BY id DESC LIMIT 1"
        ))?;
        let product = stmt
            .query_row(rusqlite::params![barcode], Self::row_to_product)
            .optional()?;
        Ok(product)
    }

    /// Hard-delete every record (archived or not) whose expiry lies more
    /// than `retention_days` days in the past, together with its queued
    /// reminder. Returns the removed records. Records with unreadable
    /// dates are never swept.
    pub fn purge_stale(
        &self,
        retention_days: i64,
        today: NaiveDate,
    ) -> Result<Vec<Product>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {PRODUCT_COLUMNS} FROM products"))?;
        let products = stmt
            .query_map([], Self::row_to_product)?
            .collect::<Result<Vec<_>, _>>()?;

        let stale: Vec<Product> = products
            .into_iter()
            .filter(|p| match expiry::parse_expiry(&p.expiry_date) {
                Some(date) => expiry::days_until(date, today) < -retention_days,
                None => false,
            })
            .collect();

        if stale.is_empty() {
            return Ok(stale);
        }

        let tx = self.conn.unchecked_transaction()?;
        for product in &stale {
            if let Some(id) = product.id {
                tx.execute("DELETE FROM products WHERE id = ?1", rusqlite::params![id])?;
            }
            // drop the queued reminder alongside the record so no orphaned
            // reminder survives the sweep
            if let Some(handle) = product.notification_id.as_deref() {
                if let Ok(reminder_id) = handle.parse::<i64>() {
                    tx.execute(
                        "DELETE FROM reminders WHERE id = ?1",
                        rusqlite::params![reminder_id],
                    )?;
                }
            }
        }
        tx.commit()?;

        Ok(stale)
    }

    // Settings

    /// Current settings; defaults apply while no row has been written yet
    pub fn settings(&self) -> Result<Settings, DatabaseError> {
        let settings = self
            .conn
            .query_row(
                "SELECT lead_days, alert_hour, alert_minute FROM settings WHERE id = 1",
                [],
                |row| {
                    Ok(Settings {
                        lead_days: row.get(0)?,
                        alert_hour: row.get(1)?,
                        alert_minute: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(settings.unwrap_or_default())
    }

    /// Write the settings singleton (row id 1, created on first write)
    pub fn save_settings(&self, settings: &Settings) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO settings (id, lead_days, alert_hour, alert_minute)
             VALUES (1, ?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET
                 lead_days = excluded.lead_days,
                 alert_hour = excluded.alert_hour,
                 alert_minute = excluded.alert_minute",
            rusqlite::params![settings.lead_days, settings.alert_hour, settings.alert_minute],
        )?;
        Ok(())
    }

    // Reminder queue

    fn row_to_reminder(row: &rusqlite::Row) -> Result<Reminder, rusqlite::Error> {
        Ok(Reminder {
            id: Some(row.get(0)?),
            title: row.get(1)?,
            body: row.get(2)?,
            fire_at: row.get(3)?,
            delivered: row.get::<_, i64>(4)? != 0,
        })
    }

    /// Queue a reminder and return its id (the opaque handle)
    pub fn insert_reminder(
        &self,
        title: &str,
        body: &str,
        fire_at: NaiveDateTime,
    ) -> Result<i64, DatabaseError> {
        self.conn.execute(
            "INSERT INTO reminders (title, body, fire_at, delivered) VALUES (?1, ?2, ?3, 0)",
            rusqlite::params![title, body, fire_at.format("%Y-%m-%d %H:%M:%S").to_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Remove a queued reminder. Removing an unknown or already-fired id is
    /// a no-op, never an error.
    pub fn delete_reminder(&self, id: i64) -> Result<usize, DatabaseError> {
        let changed = self
            .conn
            .execute("DELETE FROM reminders WHERE id = ?1", rusqlite::params![id])?;
        Ok(changed)
    }

    /// Undelivered reminders whose fire time has passed, oldest first
    pub fn due_reminders(&self, now: NaiveDateTime) -> Result<Vec<Reminder>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, body, fire_at, delivered FROM reminders
             WHERE delivered = 0 AND fire_at <= ?1 ORDER BY fire_at ASC",
        )?;
        let reminders = stmt
            .query_map(
                rusqlite::params![now.format("%Y-%m-%d %H:%M:%S").to_string()],
                Self::row_to_reminder,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(reminders)
    }

    pub fn mark_delivered(&self, id: i64) -> Result<(), DatabaseError> {
        self.conn.execute(
            "UPDATE reminders SET delivered = 1 WHERE id = ?1",
            rusqlite::params![id],
        )?;
        Ok(())
    }

    // Backup

    /// Snapshot every record plus the configuration row
    pub fn export_all(&self) -> Result<Backup, DatabaseError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id ASC"
        ))?;
        let records = stmt
            .query_map([], Self::row_to_product)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Backup {
            records,
            configuration: vec![self.settings()?],
        })
    }

    /// Wholesale-replace all records and the configuration with the
    /// payload's contents. The payload is validated before anything is
    /// written and the replacement runs in one transaction, so a rejected
    /// or failing import leaves the existing data untouched. The reminder
    /// queue is cleared alongside the records it belonged to.
    pub fn import_all(&self, backup: &Backup) -> Result<(), DatabaseError> {
        backup.validate()?;

        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM products", [])?;
        tx.execute("DELETE FROM reminders", [])?;

        for record in &backup.records {
            let created_at = if record.created_at.is_empty() {
                crate::utils::timestamp()
            } else {
                record.created_at.clone()
            };
            let updated_at = if record.updated_at.is_empty() {
                created_at.clone()
            } else {
                record.updated_at.clone()
            };
            tx.execute(
                "INSERT INTO products (id, name, barcode, description, expiry_date, photo_path, quantity, archived, notification_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                rusqlite::params![
                    record.id,
                    record.name,
                    record.barcode,
                    record.description,
                    record.expiry_date,
                    record.photo_path,
                    record.quantity,
                    if record.archived { 1 } else { 0 },
                    record.notification_id,
                    created_at,
                    updated_at
                ],
            )?;
        }

        let settings = backup.settings();
        tx.execute(
            "INSERT INTO settings (id, lead_days, alert_hour, alert_minute)
             VALUES (1, ?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET
                 lead_days = excluded.lead_days,
                 alert_hour = excluded.alert_hour,
                 alert_minute = excluded.alert_minute",
            rusqlite::params![settings.lead_days, settings.alert_hour, settings.alert_minute],
        )?;

        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_db(dir: &TempDir) -> Database {
        Database::new(dir.path().join("test.db").to_str().unwrap()).unwrap()
    }

    fn sample(name: &str, expiry: &str) -> Product {
        Product::new(name.to_string(), expiry.to_string())
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn insert_assigns_ids_and_lists_recent_first() {
        let dir = TempDir::new().unwrap();
        let db = open_db(&dir);

        let first = db.insert_product(&sample("Milk", "10/03/2026")).unwrap();
        let second = db.insert_product(&sample("Yogurt", "12/03/2026")).unwrap();
        assert!(second > first);

        let active = db.list_active(SortOrder::Recent).unwrap();
        assert_eq!(active.len(), 2);
        assert_eq!(active[0].name, "Yogurt");
        assert_eq!(active[1].name, "Milk");
    }

    #[test]
    fn expiry_sort_puts_soonest_first_and_unreadable_last() {
        let dir = TempDir::new().unwrap();
        let db = open_db(&dir);

        db.insert_product(&sample("Later", "20/06/2026")).unwrap();
        db.insert_product(&sample("Broken", "??")).unwrap();
        db.insert_product(&sample("Soon", "01/04/2026")).unwrap();

        let active = db.list_active(SortOrder::ExpiryAsc).unwrap();
        let names: Vec<&str> = active.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Soon", "Later", "Broken"]);
    }

    #[test]
    fn find_by_barcode_returns_most_recent_match() {
        let dir = TempDir::new().unwrap();
        let db = open_db(&dir);

        let mut older = sample("Milk", "10/03/2026");
        older.barcode = Some("789".to_string());
        older.photo_path = Some("/photos/old.jpg".to_string());
        db.insert_product(&older).unwrap();

        let mut newer = sample("Milk 1L", "10/04/2026");
        newer.barcode = Some("789".to_string());
        db.insert_product(&newer).unwrap();

        let found = db.find_by_barcode("789").unwrap().unwrap();
        assert_eq!(found.name, "Milk 1L");

        assert!(db.find_by_barcode("000").unwrap().is_none());
    }

    #[test]
    fn archive_moves_records_between_lists() {
        let dir = TempDir::new().unwrap();
        let db = open_db(&dir);

        let a = db.insert_product(&sample("A", "10/03/2026")).unwrap();
        let b = db.insert_product(&sample("B", "11/03/2026")).unwrap();
        let c = db.insert_product(&sample("C", "12/03/2026")).unwrap();

        db.archive_products(&[a, c]).unwrap();

        let active = db.list_active(SortOrder::Recent).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, Some(b));

        let archived = db.list_archived().unwrap();
        let archived_ids: Vec<i64> = archived.iter().filter_map(|p| p.id).collect();
        assert_eq!(archived_ids, vec![c, a]);
    }

    #[test]
    fn restore_flips_only_the_archived_flag() {
        let dir = TempDir::new().unwrap();
        let db = open_db(&dir);

        let mut product = sample("Cheese", "15/03/2026");
        product.barcode = Some("456".to_string());
        product.notification_id = Some("7".to_string());
        let id = db.insert_product(&product).unwrap();
        let before = db.get_product(id).unwrap();

        db.archive_products(&[id]).unwrap();
        db.restore_product(id).unwrap();

        let after = db.get_product(id).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn restore_of_unknown_id_reports_not_found() {
        let dir = TempDir::new().unwrap();
        let db = open_db(&dir);
        assert!(matches!(
            db.restore_product(99),
            Err(DatabaseError::NotFound(99))
        ));
    }

    #[test]
    fn purge_deletes_only_records_past_the_retention_window() {
        let dir = TempDir::new().unwrap();
        let db = open_db(&dir);
        let today = date(2026, 3, 10);

        db.insert_product(&sample("Six days past", "04/03/2026")).unwrap();
        db.insert_product(&sample("Five days past", "05/03/2026")).unwrap();
        db.insert_product(&sample("Fresh", "20/03/2026")).unwrap();
        db.insert_product(&sample("Broken", "??")).unwrap();
        let mut old_archived = sample("Long archived", "01/01/2026");
        old_archived.archived = true;
        db.insert_product(&old_archived).unwrap();

        let removed = db.purge_stale(5, today).unwrap();
        let mut removed_names: Vec<&str> = removed.iter().map(|p| p.name.as_str()).collect();
        removed_names.sort();
        assert_eq!(removed_names, vec!["Long archived", "Six days past"]);

        let mut remaining: Vec<String> = db
            .list_active(SortOrder::Recent)
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        remaining.sort();
        assert_eq!(remaining, vec!["Broken", "Five days past", "Fresh"]);
    }

    #[test]
    fn purge_drops_the_queued_reminders_of_swept_records() {
        let dir = TempDir::new().unwrap();
        let db = open_db(&dir);
        let today = date(2026, 3, 10);

        let fire_at = date(2026, 1, 1).and_hms_opt(9, 0, 0).unwrap();
        let reminder_id = db.insert_reminder("Expiry reminder", "x", fire_at).unwrap();
        let mut stale = sample("Old", "01/01/2026");
        stale.notification_id = Some(reminder_id.to_string());
        db.insert_product(&stale).unwrap();

        db.purge_stale(5, today).unwrap();

        let due = db.due_reminders(date(2026, 3, 10).and_hms_opt(12, 0, 0).unwrap()).unwrap();
        assert!(due.is_empty());
    }

    #[test]
    fn settings_default_until_first_write_then_roundtrip() {
        let dir = TempDir::new().unwrap();
        let db = open_db(&dir);

        assert_eq!(db.settings().unwrap(), Settings::default());

        let custom = Settings {
            lead_days: 7,
            alert_hour: 20,
            alert_minute: 30,
        };
        db.save_settings(&custom).unwrap();
        assert_eq!(db.settings().unwrap(), custom);

        // second write updates in place, never a second row
        let again = Settings {
            lead_days: 1,
            ..custom
        };
        db.save_settings(&again).unwrap();
        assert_eq!(db.settings().unwrap(), again);
    }

    #[test]
    fn reopening_an_existing_store_preserves_data() {
        let dir = TempDir::new().unwrap();
        {
            let db = open_db(&dir);
            db.insert_product(&sample("Milk", "10/03/2026")).unwrap();
        }
        let db = open_db(&dir);
        assert_eq!(db.list_active(SortOrder::Recent).unwrap().len(), 1);
    }

    #[test]
    fn migrates_a_v1_store_without_data_loss() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.db");
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute(
                "CREATE TABLE schema_version (version INTEGER NOT NULL)",
                [],
            )
            .unwrap();
            conn.execute("INSERT INTO schema_version (version) VALUES (1)", [])
                .unwrap();
            conn.execute(
                "CREATE TABLE products (
                    id          INTEGER PRIMARY KEY AUTOINCREMENT,
                    name        TEXT NOT NULL,
                    expiry_date TEXT NOT NULL,
                    created_at  TEXT NOT NULL,
                    updated_at  TEXT NOT NULL
                )",
                [],
            )
            .unwrap();
            conn.execute(
                "INSERT INTO products (name, expiry_date, created_at, updated_at)
                 VALUES ('Legacy milk', '10/03/2026', '2026-01-01 00:00:00', '2026-01-01 00:00:00')",
                [],
            )
            .unwrap();
        }

        let db = Database::new(path.to_str().unwrap()).unwrap();
        let active = db.list_active(SortOrder::Recent).unwrap();
        assert_eq!(active.len(), 1);
        let product = &active[0];
        assert_eq!(product.name, "Legacy milk");
        assert_eq!(product.quantity, 1);
        assert_eq!(product.barcode, None);
        assert!(!product.archived);
    }

    #[test]
    fn import_replaces_records_and_configuration() {
        let dir = TempDir::new().unwrap();
        let db = open_db(&dir);

        db.insert_product(&sample("Old A", "10/03/2026")).unwrap();
        db.insert_product(&sample("Old B", "11/03/2026")).unwrap();

        let backup = Backup {
            records: vec![sample("Imported", "01/06/2026")],
            configuration: vec![Settings {
                lead_days: 10,
                alert_hour: 8,
                alert_minute: 15,
            }],
        };
        db.import_all(&backup).unwrap();

        let active = db.list_active(SortOrder::Recent).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "Imported");
        assert_eq!(db.settings().unwrap().lead_days, 10);
    }

    #[test]
    fn import_without_configuration_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let db = open_db(&dir);

        db.save_settings(&Settings {
            lead_days: 9,
            alert_hour: 7,
            alert_minute: 0,
        })
        .unwrap();

        let backup = Backup {
            records: vec![sample("Imported", "01/06/2026")],
            configuration: vec![],
        };
        db.import_all(&backup).unwrap();

        assert_eq!(db.settings().unwrap(), Settings::default());
    }

    #[test]
    fn rejected_import_leaves_the_store_untouched() {
        let dir = TempDir::new().unwrap();
        let db = open_db(&dir);

        db.insert_product(&sample("Keep me", "10/03/2026")).unwrap();
        let settings_before = db.settings().unwrap();

        let backup = Backup {
            records: vec![sample("", "01/06/2026")], // empty name
            configuration: vec![Settings {
                lead_days: 10,
                alert_hour: 8,
                alert_minute: 15,
            }],
        };
        assert!(db.import_all(&backup).is_err());

        let active = db.list_active(SortOrder::Recent).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "Keep me");
        assert_eq!(db.settings().unwrap(), settings_before);
    }

    #[test]
    fn reminder_queue_delivery_cycle() {
        let dir = TempDir::new().unwrap();
        let db = open_db(&dir);
        let fire_at = date(2026, 3, 7).and_hms_opt(9, 0, 0).unwrap();

        let id = db.insert_reminder("Expiry reminder", "Milk", fire_at).unwrap();

        let before = date(2026, 3, 7).and_hms_opt(8, 59, 0).unwrap();
        assert!(db.due_reminders(before).unwrap().is_empty());

        let after = date(2026, 3, 7).and_hms_opt(9, 0, 0).unwrap();
        let due = db.due_reminders(after).unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].id, Some(id));

        db.mark_delivered(id).unwrap();
        assert!(db.due_reminders(after).unwrap().is_empty());
    }

    #[test]
    fn deleting_an_unknown_reminder_is_a_noop() {
        let dir = TempDir::new().unwrap();
        let db = open_db(&dir);
        assert_eq!(db.delete_reminder(42).unwrap(), 0);
    }
}
