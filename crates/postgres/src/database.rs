use async_trait::async_trait;
use permit_scan::{KnownState, KnownStateStore, ScanError};
use sqlx::{PgPool, Row};

/// Creates a connection pool to the PostgreSQL database.
pub async fn create_connection_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPool::connect(database_url).await
}

/// Tests the database connection by executing a simple query.
pub async fn test_connection(pool: &PgPool) -> Result<(), sqlx::Error> {
    let row = sqlx::query("SELECT 1 as test").fetch_one(pool).await?;

    let test_value: i32 = row.try_get("test")?;
    log::info!(
        "✅ Database connection successful! Test value: {}",
        test_value
    );

    Ok(())
}

/// Known availability kept in a `(date TEXT PRIMARY KEY, availability BIGINT)` table.
#[derive(Debug, Clone)]
pub struct PgKnownStateStore {
    pool: PgPool,
    table: String,
}

impl PgKnownStateStore {
    /// Creates a store over `table`, which must be a plain SQL identifier.
    pub fn new(pool: PgPool, table: &str) -> Result<Self, ScanError> {
        validate_table_name(table)?;

        Ok(Self {
            pool,
            table: table.to_string(),
        })
    }

    /// Creates the table when it does not exist yet.
    pub async fn ensure_table(&self) -> Result<(), ScanError> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (date TEXT PRIMARY KEY, availability BIGINT)",
            self.table
        );

        sqlx::query(&sql)
            .execute(&self.pool)
            .await
            .map_err(|e| ScanError::StoreWrite(format!("Failed to create {}: {}", self.table, e)))?;

        log::info!("🗃️ Known availability table {} is ready", self.table);
        Ok(())
    }
}

#[async_trait]
impl KnownStateStore for PgKnownStateStore {
    async fn scan_all(&self) -> Result<KnownState, ScanError> {
        let sql = format!("SELECT date, availability FROM {}", self.table);

        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ScanError::StoreRead(format!("Failed to scan {}: {}", self.table, e)))?;

        let mut state = KnownState::with_capacity(rows.len());
        for row in rows {
            let date: String = row
                .try_get("date")
                .map_err(|e| ScanError::StoreRead(format!("Found invalid date key: {}", e)))?;
            let raw: Option<i64> = row.try_get("availability").map_err(|e| {
                ScanError::StoreRead(format!("Found invalid data for row {}: {}", date, e))
            })?;

            let availability = availability_from_column(&date, raw)?;
            state.insert(date, availability);
        }

        Ok(state)
    }

    async fn upsert(&self, date: &str, availability: u32) -> Result<(), ScanError> {
        let sql = format!(
            r#"
            INSERT INTO {} (date, availability)
            VALUES ($1, $2)
            ON CONFLICT (date)
            DO UPDATE SET availability = EXCLUDED.availability
            "#,
            self.table
        );

        sqlx::query(&sql)
            .bind(date)
            .bind(i64::from(availability))
            .execute(&self.pool)
            .await
            .map_err(|e| ScanError::StoreWrite(format!("Failed to update {}: {}", date, e)))?;

        Ok(())
    }
}

/// Converts a stored availability value into a permit count.
///
/// A missing value reads as zero. Values outside the range of a count mean the
/// table holds data this watcher never wrote, so they fail the read.
fn availability_from_column(date: &str, raw: Option<i64>) -> Result<u32, ScanError> {
    match raw {
        None => Ok(0),
        Some(value) => u32::try_from(value).map_err(|_| {
            ScanError::StoreRead(format!(
                "Found invalid availability {} for row {}",
                value, date
            ))
        }),
    }
}

fn validate_table_name(table: &str) -> Result<(), ScanError> {
    let mut chars = table.chars();
    let valid = table.len() <= 63
        && chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid {
        Ok(())
    } else {
        Err(ScanError::Configuration(format!(
            "Invalid known availability table name: {:?}",
            table
        )))
    }
}
