//! SQLite-backed catalog implementation.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use tracing::{debug, info};

use super::{
    CatalogError, CatalogStore, GenerationHandle, GenerationSummary, GenerationView,
};
use crate::query::{Filter, Query, QueryResult};
use crate::record::{CatalogRecord, Generation, GenerationInfo};

const RECORD_COLUMNS: &str =
    "id, title, price, in_stock, rating, detail_url, thumbnail_url, availability_text";

type SharedConnection = Arc<Mutex<Connection>>;

/// Generations pinned by live handles. A lease is held while its
/// strong count is above one.
type Leases = Arc<Mutex<HashMap<i64, Arc<()>>>>;

/// SQLite-backed catalog.
///
/// Every published generation gets its own rows; `catalog_state` names the
/// one readers see. Superseded generations are pruned once no handle
/// leases them.
pub struct SqliteCatalog {
    conn: SharedConnection,
    leases: Leases,
}

impl SqliteCatalog {
    /// Create a new SQLite catalog, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, CatalogError> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Create an in-memory SQLite catalog (useful for testing).
    pub fn in_memory() -> Result<Self, CatalogError> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, CatalogError> {
        Self::initialize_schema(&conn)?;
        let catalog = Self {
            conn: Arc::new(Mutex::new(conn)),
            leases: Arc::new(Mutex::new(HashMap::new())),
        };

        // Leftovers from an earlier process are never leased.
        let conn = lock(&catalog.conn)?;
        catalog.prune(&conn)?;
        drop(conn);

        Ok(catalog)
    }

    fn initialize_schema(conn: &Connection) -> Result<(), CatalogError> {
        conn.execute_batch(
            r#"
            -- One row per published generation
            CREATE TABLE IF NOT EXISTS catalog_generations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                record_count INTEGER NOT NULL,
                sealed_at TEXT NOT NULL,
                published_at TEXT NOT NULL,
                source_url TEXT
            );

            -- Records, keyed by generation and crawl position
            CREATE TABLE IF NOT EXISTS catalog_records (
                generation_id INTEGER NOT NULL,
                position INTEGER NOT NULL,
                id TEXT NOT NULL,
                title TEXT NOT NULL,
                title_folded TEXT NOT NULL,
                price REAL NOT NULL,
                in_stock INTEGER NOT NULL,
                rating INTEGER NOT NULL,
                detail_url TEXT NOT NULL,
                thumbnail_url TEXT NOT NULL,
                availability_text TEXT NOT NULL,
                PRIMARY KEY (generation_id, position),
                UNIQUE (generation_id, id),
                UNIQUE (generation_id, detail_url)
            );

            -- Which generation readers see
            CREATE TABLE IF NOT EXISTS catalog_state (
                singleton INTEGER PRIMARY KEY CHECK (singleton = 1),
                published_generation INTEGER NOT NULL
            );
            "#,
        )?;

        Ok(())
    }

    /// Delete generations that are neither published nor leased.
    fn prune(&self, conn: &Connection) -> Result<(), CatalogError> {
        let published = published_generation(conn)?;

        let mut leases = lock(&self.leases)?;
        leases.retain(|_, lease| Arc::strong_count(lease) > 1);

        let stale: Vec<i64> = {
            let mut stmt = conn.prepare("SELECT id FROM catalog_generations")?;
            let ids = stmt.query_map([], |row| row.get::<_, i64>(0))?;
            let mut stale = Vec::new();
            for id in ids {
                let id = id?;
                if Some(id) != published && !leases.contains_key(&id) {
                    stale.push(id);
                }
            }
            stale
        };

        for id in &stale {
            conn.execute(
                "DELETE FROM catalog_records WHERE generation_id = ?",
                params![id],
            )?;
            conn.execute("DELETE FROM catalog_generations WHERE id = ?", params![id])?;
        }

        if !stale.is_empty() {
            debug!(pruned = ?stale, "Pruned superseded generations");
        }
        Ok(())
    }

    /// Generations currently stored (published or leased).
    pub fn stored_generations(&self) -> Result<Vec<u64>, CatalogError> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare("SELECT id FROM catalog_generations ORDER BY id")?;
        let rows = stmt.query_map([], |row| row.get::<_, i64>(0))?;

        let mut ids = Vec::new();
        for row in rows {
            ids.push(row? as u64);
        }
        Ok(ids)
    }
}

impl CatalogStore for SqliteCatalog {
    fn publish(&self, generation: Generation) -> Result<GenerationInfo, CatalogError> {
        let mut conn = lock(&self.conn)?;
        let published_at = Utc::now();

        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO catalog_generations (record_count, sealed_at, published_at, source_url)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                generation.len() as i64,
                generation.sealed_at().to_rfc3339(),
                published_at.to_rfc3339(),
                generation.source_url(),
            ],
        )?;
        let generation_id = tx.last_insert_rowid();

        {
            let mut stmt = tx.prepare(
                "INSERT INTO catalog_records
                 (generation_id, position, id, title, title_folded, price, in_stock, rating,
                  detail_url, thumbnail_url, availability_text)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            )?;
            for (position, record) in generation.records().iter().enumerate() {
                stmt.execute(params![
                    generation_id,
                    position as i64,
                    record.id,
                    record.title,
                    record.folded_title(),
                    record.price,
                    record.in_stock,
                    record.rating,
                    record.detail_url,
                    record.thumbnail_url,
                    record.availability_text,
                ])?;
            }
        }

        tx.execute(
            "INSERT INTO catalog_state (singleton, published_generation) VALUES (1, ?1)
             ON CONFLICT(singleton) DO UPDATE SET published_generation = excluded.published_generation",
            params![generation_id],
        )?;
        tx.commit()?;

        info!(
            generation = generation_id,
            records = generation.len(),
            "Published generation"
        );

        self.prune(&conn)?;

        Ok(GenerationInfo {
            id: generation_id as u64,
            record_count: generation.len(),
            sealed_at: generation.sealed_at(),
            published_at: Some(published_at),
            source_url: generation.source_url().map(str::to_string),
        })
    }

    fn current(&self) -> Result<GenerationHandle, CatalogError> {
        let conn = lock(&self.conn)?;

        let Some(generation_id) = published_generation(&conn)? else {
            return Ok(Arc::new(SqliteGeneration {
                conn: Arc::clone(&self.conn),
                generation_id: 0,
                info: GenerationInfo::empty(),
                _lease: None,
            }));
        };

        let info = load_generation_info(&conn, generation_id)?;
        let lease = {
            let mut leases = lock(&self.leases)?;
            Arc::clone(leases.entry(generation_id).or_default())
        };
        drop(conn);

        Ok(Arc::new(SqliteGeneration {
            conn: Arc::clone(&self.conn),
            generation_id,
            info,
            _lease: Some(lease),
        }))
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}

/// A leased generation in the SQLite catalog.
struct SqliteGeneration {
    conn: SharedConnection,
    generation_id: i64,
    info: GenerationInfo,
    _lease: Option<Arc<()>>,
}

impl GenerationView for SqliteGeneration {
    fn info(&self) -> &GenerationInfo {
        &self.info
    }

    fn execute(&self, query: &Query) -> Result<QueryResult, CatalogError> {
        let sql = Filter::from_query(query).to_sql();

        let mut values = Vec::with_capacity(sql.params.len() + 3);
        values.push(rusqlite::types::Value::Integer(self.generation_id));
        values.extend(sql.params);

        let mut conn = lock(&self.conn)?;
        let tx = conn.transaction()?;

        let total: i64 = tx.query_row(
            &format!(
                "SELECT COUNT(*) FROM catalog_records WHERE generation_id = ? AND {}",
                sql.clause
            ),
            params_from_iter(values.iter()),
            |row| row.get(0),
        )?;

        let limit = i64::from(query.limit);
        let offset = i64::try_from(query.offset()).unwrap_or(i64::MAX);
        values.push(rusqlite::types::Value::Integer(limit));
        values.push(rusqlite::types::Value::Integer(offset));

        let items = {
            let mut stmt = tx.prepare(&format!(
                "SELECT {} FROM catalog_records WHERE generation_id = ? AND {}
                 ORDER BY position LIMIT ? OFFSET ?",
                RECORD_COLUMNS, sql.clause
            ))?;
            let rows = stmt.query_map(params_from_iter(values.iter()), row_to_record)?;

            let mut items = Vec::new();
            for row in rows {
                items.push(row?);
            }
            items
        };
        tx.commit()?;

        Ok(QueryResult {
            total: total as u64,
            page: query.page,
            limit: query.limit,
            items,
            generation: self.info.id,
        })
    }

    fn get(&self, id: &str) -> Result<CatalogRecord, CatalogError> {
        let conn = lock(&self.conn)?;
        conn.query_row(
            &format!(
                "SELECT {} FROM catalog_records WHERE generation_id = ? AND id = ?",
                RECORD_COLUMNS
            ),
            params![self.generation_id, id],
            row_to_record,
        )
        .optional()?
        .ok_or_else(|| CatalogError::NotFound(id.to_string()))
    }

    fn summary(&self) -> Result<GenerationSummary, CatalogError> {
        let conn = lock(&self.conn)?;
        let summary = conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(in_stock), 0), MIN(price), MAX(price)
             FROM catalog_records WHERE generation_id = ?",
            params![self.generation_id],
            |row| {
                Ok(GenerationSummary {
                    record_count: row.get::<_, i64>(0)? as u64,
                    in_stock_count: row.get::<_, i64>(1)? as u64,
                    price_min: row.get(2)?,
                    price_max: row.get(3)?,
                })
            },
        )?;
        Ok(summary)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, CatalogError> {
    mutex
        .lock()
        .map_err(|_| CatalogError::Internal("catalog lock poisoned".to_string()))
}

fn published_generation(conn: &Connection) -> Result<Option<i64>, CatalogError> {
    let id = conn
        .query_row(
            "SELECT published_generation FROM catalog_state WHERE singleton = 1",
            [],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id)
}

fn load_generation_info(conn: &Connection, id: i64) -> Result<GenerationInfo, CatalogError> {
    let info = conn.query_row(
        "SELECT record_count, sealed_at, published_at, source_url
         FROM catalog_generations WHERE id = ?",
        params![id],
        |row| {
            let sealed_at: String = row.get(1)?;
            let published_at: String = row.get(2)?;
            Ok(GenerationInfo {
                id: id as u64,
                record_count: row.get::<_, i64>(0)? as usize,
                sealed_at: parse_timestamp(&sealed_at),
                published_at: Some(parse_timestamp(&published_at)),
                source_url: row.get(3)?,
            })
        },
    )?;
    Ok(info)
}

fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<CatalogRecord> {
    Ok(CatalogRecord {
        id: row.get(0)?,
        title: row.get(1)?,
        price: row.get(2)?,
        in_stock: row.get(3)?,
        rating: row.get(4)?,
        detail_url: row.get(5)?,
        thumbnail_url: row.get(6)?,
        availability_text: row.get(7)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;
    use tempfile::tempdir;

    fn generation(records: Vec<CatalogRecord>) -> Generation {
        Generation::from_records(records).0
    }

    fn page(page: u32, limit: u32) -> Query {
        Query {
            page,
            limit,
            ..Default::default()
        }
    }

    #[test]
    fn test_in_memory_starts_empty() {
        let catalog = SqliteCatalog::in_memory().unwrap();
        let handle = catalog.current().unwrap();
        assert_eq!(handle.info().id, 0);
        assert_eq!(handle.execute(&page(1, 20)).unwrap().total, 0);
    }

    #[test]
    fn test_publish_and_query() {
        let catalog = SqliteCatalog::in_memory().unwrap();
        let info = catalog.publish(generation(fixtures::mixed_records())).unwrap();
        assert_eq!(info.id, 1);
        assert_eq!(info.record_count, 5);

        let handle = catalog.current().unwrap();
        let result = handle.execute(&page(2, 2)).unwrap();
        assert_eq!(result.total, 5);
        assert_eq!(result.generation, 1);
        let titles: Vec<_> = result.items.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Soumission", "Sharp Objects"]);
    }

    #[test]
    fn test_records_round_trip_exactly() {
        let records = fixtures::mixed_records();
        let catalog = SqliteCatalog::in_memory().unwrap();
        catalog.publish(generation(records.clone())).unwrap();

        let result = catalog.current().unwrap().execute(&page(1, 200)).unwrap();
        assert_eq!(result.items, records);
    }

    #[test]
    fn test_filters_and_search() {
        let catalog = SqliteCatalog::in_memory().unwrap();
        catalog.publish(generation(fixtures::mixed_records())).unwrap();
        let handle = catalog.current().unwrap();

        let result = handle
            .execute(&Query {
                min_price: Some(10.0),
                max_price: Some(30.0),
                min_rating: Some(4),
                ..page(1, 1)
            })
            .unwrap();
        assert_eq!(result.total, 3);
        assert_eq!(result.items.len(), 1);

        let result = handle
            .execute(&Query {
                search: Some("OBJECT".to_string()),
                ..page(1, 20)
            })
            .unwrap();
        assert_eq!(result.total, 1);
        assert_eq!(result.items[0].title, "Sharp Objects");
    }

    #[test]
    fn test_search_matches_literal_wildcards() {
        let catalog = SqliteCatalog::in_memory().unwrap();
        catalog
            .publish(generation(vec![
                fixtures::record("100% Pure", "https://shop.test/a", 1.0, 1, true),
                fixtures::record("1000 Places", "https://shop.test/b", 1.0, 1, true),
            ]))
            .unwrap();

        let result = catalog
            .current()
            .unwrap()
            .execute(&Query {
                search: Some("0%".to_string()),
                ..page(1, 20)
            })
            .unwrap();
        assert_eq!(result.total, 1);
        assert_eq!(result.items[0].title, "100% Pure");
    }

    #[test]
    fn test_get_and_not_found() {
        let records = fixtures::mixed_records();
        let catalog = SqliteCatalog::in_memory().unwrap();
        catalog.publish(generation(records.clone())).unwrap();
        let handle = catalog.current().unwrap();

        assert_eq!(handle.get(&records[2].id).unwrap(), records[2]);
        assert!(matches!(handle.get("missing"), Err(CatalogError::NotFound(_))));
    }

    #[test]
    fn test_leased_generation_survives_publish() {
        let catalog = SqliteCatalog::in_memory().unwrap();
        catalog.publish(generation(fixtures::mixed_records())).unwrap();
        let old = catalog.current().unwrap();

        catalog
            .publish(generation(vec![fixtures::record(
                "Replacement",
                "https://shop.test/r",
                2.0,
                2,
                false,
            )]))
            .unwrap();

        assert_eq!(catalog.stored_generations().unwrap(), vec![1, 2]);
        assert_eq!(old.execute(&page(1, 20)).unwrap().total, 5);
        assert_eq!(catalog.current().unwrap().info().id, 2);
    }

    #[test]
    fn test_unleased_generations_pruned() {
        let catalog = SqliteCatalog::in_memory().unwrap();
        catalog.publish(generation(fixtures::mixed_records())).unwrap();
        {
            let _handle = catalog.current().unwrap();
        }
        catalog.publish(generation(fixtures::mixed_records())).unwrap();
        catalog.publish(generation(fixtures::mixed_records())).unwrap();

        assert_eq!(catalog.stored_generations().unwrap(), vec![3]);
    }

    #[test]
    fn test_published_generation_persists_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("catalog.db");

        {
            let catalog = SqliteCatalog::new(&path).unwrap();
            catalog.publish(generation(fixtures::mixed_records())).unwrap();
            catalog.publish(generation(fixtures::mixed_records())).unwrap();
        }

        let catalog = SqliteCatalog::new(&path).unwrap();
        let handle = catalog.current().unwrap();
        assert_eq!(handle.info().id, 2);
        assert_eq!(handle.info().record_count, 5);
        assert_eq!(handle.summary().unwrap().in_stock_count, 4);
        assert_eq!(catalog.stored_generations().unwrap(), vec![2]);
    }
}
