use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params, params_from_iter, Connection, OpenFlags, OptionalExtension};
use tracing::{debug, info};

use homesearch_core::error::{Error, Result};
use homesearch_core::schema;
use homesearch_core::traits::PropertyStore;
use homesearch_core::types::{PropertyRecord, Record, Value};

/// Column declarations of the property table, in canonical order.
const COLUMN_TYPES: [(&str, &str); 11] = [
    (schema::ADDRESS, "TEXT"),
    (schema::PRICE, "REAL"),
    (schema::BEDROOMS, "INTEGER"),
    (schema::BATHROOMS, "INTEGER"),
    (schema::TYPE, "TEXT"),
    (schema::PROPERTY_TYPE_FULL_DESCRIPTION, "TEXT"),
    (schema::FLOOD_RISK, "TEXT"),
    (schema::CRIME_SCORE, "REAL"),
    (schema::IS_NEW_HOME, "INTEGER"),
    (schema::LAUA, "TEXT"),
    (schema::LISTING_UPDATE_DATE, "TEXT"),
];

pub struct SqliteStore {
    conn: Mutex<Connection>,
    table: String,
}

impl SqliteStore {
    /// Opens an existing database read-only and binds to its first user
    /// table. A missing file or a database without tables is a startup error.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::NotFound(format!("SQLite database not found at {}", path.display())));
        }
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| Error::Store(format!("failed opening {} read-only: {e}", path.display())))?;

        let table: Option<String> = conn
            .query_row(
                "SELECT name FROM sqlite_master \
                 WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
                 ORDER BY rowid LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()
            .map_err(store_err)?;
        let table = table
            .ok_or_else(|| Error::NotFound(format!("no tables found in {}", path.display())))?;

        info!(path = %path.display(), %table, "opened property store");
        Ok(Self { conn: Mutex::new(conn), table })
    }

    /// Opens (creating if needed) a writable database bound to `table`.
    pub fn create(path: &Path, table: &str) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::Store(format!("failed creating {}: {e}", parent.display())))?;
        }
        let conn = Connection::open(path)
            .map_err(|e| Error::Store(format!("failed opening {}: {e}", path.display())))?;
        conn.execute_batch("PRAGMA synchronous = NORMAL;").map_err(store_err)?;
        Ok(Self { conn: Mutex::new(conn), table: table.to_string() })
    }

    /// Drops and rewrites the bound table with `records` in one transaction.
    pub fn replace_table(&self, records: &[PropertyRecord]) -> Result<usize> {
        let table = quote_ident(&self.table);
        let columns: Vec<&str> = COLUMN_TYPES.iter().map(|(name, _)| *name).collect();
        let declarations: Vec<String> =
            COLUMN_TYPES.iter().map(|(name, ty)| format!("{} {ty}", quote_ident(name))).collect();
        let placeholders = vec!["?"; columns.len()].join(", ");

        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(store_err)?;
        tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS {table}; CREATE TABLE {table} ({});",
            declarations.join(", ")
        ))
        .map_err(store_err)?;
        {
            let quoted: Vec<String> = columns.iter().map(|c| quote_ident(c)).collect();
            let mut stmt = tx
                .prepare(&format!(
                    "INSERT INTO {table} ({}) VALUES ({placeholders})",
                    quoted.join(", ")
                ))
                .map_err(store_err)?;
            for r in records {
                stmt.execute(params![
                    r.address,
                    r.price,
                    r.bedrooms,
                    r.bathrooms,
                    r.property_type,
                    r.property_type_full_description,
                    r.flood_risk,
                    r.crime_score_weight,
                    r.is_new_home,
                    r.laua,
                    r.listing_update_date,
                ])
                .map_err(store_err)?;
            }
        }
        tx.commit().map_err(store_err)?;
        info!(table = %self.table, count = records.len(), "property table written");
        Ok(records.len())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| Error::Store("connection lock poisoned".to_string()))
    }
}

impl PropertyStore for SqliteStore {
    fn table_name(&self) -> &str {
        &self.table
    }

    fn fetch_rows(&self, sql: &str, params: &[Value]) -> Result<Vec<Record>> {
        debug!(sql, ?params, "fetching rows");
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql).map_err(store_err)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(str::to_string).collect();

        let rows = stmt
            .query_map(params_from_iter(params.iter().map(to_sql)), |row| {
                let mut record = Record::new();
                for (i, column) in columns.iter().enumerate() {
                    record.insert(column.clone(), from_sql(column, row.get_ref(i)?));
                }
                Ok(record)
            })
            .map_err(store_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(store_err)
    }

    fn distinct_addresses(&self) -> Result<Vec<String>> {
        let sql = format!(
            "SELECT CAST({col} AS TEXT) AS a FROM {table} WHERE {col} IS NOT NULL \
             GROUP BY a ORDER BY MIN(rowid)",
            col = quote_ident(schema::ADDRESS),
            table = quote_ident(&self.table),
        );
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql).map_err(store_err)?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0)).map_err(store_err)?;
        let mut addresses = Vec::new();
        for address in rows {
            let address = address.map_err(store_err)?;
            if !address.trim().is_empty() {
                addresses.push(address);
            }
        }
        Ok(addresses)
    }
}

/// `properties` -> `"properties"`, doubling embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn store_err(e: rusqlite::Error) -> Error {
    Error::Store(e.to_string())
}

fn to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Integer(i) => SqlValue::Integer(*i),
        Value::Real(r) => SqlValue::Real(*r),
        Value::Text(s) => SqlValue::Text(s.clone()),
    }
}

/// Boolean columns are stored as integers and surface as booleans.
fn from_sql(column: &str, value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) if schema::is_boolean_field(column) => Value::Bool(i != 0),
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(r) => Value::Real(r),
        ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
        // no scalar form
        ValueRef::Blob(_) => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_identifiers() {
        assert_eq!(quote_ident("properties"), "\"properties\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn flags_surface_as_booleans() {
        assert_eq!(from_sql(schema::IS_NEW_HOME, ValueRef::Integer(1)), Value::Bool(true));
        assert_eq!(from_sql(schema::BEDROOMS, ValueRef::Integer(1)), Value::Integer(1));
        assert_eq!(to_sql(&Value::Bool(true)), SqlValue::Integer(1));
    }
}
