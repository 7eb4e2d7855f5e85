//! Postgres repository implementation using Diesel.
//!
//! This module implements the repository traits against a Postgres database.
//! Slots are stored whole: the occupant lists travel as JSONB so a load gives
//! back exactly what the last save wrote.
//!
//! ## Features
//!
//! - Connection pooling with r2d2
//! - Automatic retry for transient failures
//! - Connection health monitoring
//! - Automatic migration execution
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
//! - `PG_POOL_MAX`: Maximum pool size (default: 10)
//! - `PG_POOL_MIN`: Minimum pool size (default: 1)
//! - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
//! - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
//! - `PG_MAX_RETRIES`: Maximum retry attempts for transient failures (default: 3)
//! - `PG_RETRY_DELAY_MS`: Initial retry delay in milliseconds (default: 100)

use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sql_query;
use diesel::upsert::excluded;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::task;

use crate::api::{GuideId, School, SchoolId, SlotId, Tour, TourCode, TourId, TourKind};
use crate::db::repository::{
    ErrorContext, RepositoryError, RepositoryResult, SchoolRepository, SlotRepository,
    TourRepository,
};
use crate::models::{SlotEntry, TimeSlot};

mod models;
mod schema;

use models::*;
use schema::*;

type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/postgres/migrations");

/// Configuration for connecting to Postgres.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_pool_size: u32,
    /// Minimum number of connections in the pool
    pub min_pool_size: u32,
    /// Connection timeout in seconds
    pub connection_timeout_sec: u64,
    /// Idle connection timeout in seconds
    pub idle_timeout_sec: u64,
    /// Maximum number of retry attempts for transient failures
    pub max_retries: u32,
    /// Initial retry delay in milliseconds (doubles with each retry)
    pub retry_delay_ms: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_pool_size: 10,
            min_pool_size: 1,
            connection_timeout_sec: 30,
            idle_timeout_sec: 600,
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

impl PostgresConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
    /// - `PG_POOL_MAX`: Maximum pool size (default: 10)
    /// - `PG_POOL_MIN`: Minimum pool size (default: 1)
    /// - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
    /// - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
    /// - `PG_MAX_RETRIES`: Maximum retry attempts (default: 3)
    /// - `PG_RETRY_DELAY_MS`: Initial retry delay in milliseconds (default: 100)
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("PG_DATABASE_URL"))
            .map_err(|_| "DATABASE_URL or PG_DATABASE_URL must be set".to_string())?;

        let max_pool_size = std::env::var("PG_POOL_MAX")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);

        let min_pool_size = std::env::var("PG_POOL_MIN")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(1);

        let connection_timeout_sec = std::env::var("PG_CONN_TIMEOUT_SEC")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(30);

        let idle_timeout_sec = std::env::var("PG_IDLE_TIMEOUT_SEC")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(600);

        let max_retries = std::env::var("PG_MAX_RETRIES")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(3);

        let retry_delay_ms = std::env::var("PG_RETRY_DELAY_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(100);

        Ok(Self {
            database_url,
            max_pool_size,
            min_pool_size,
            connection_timeout_sec,
            idle_timeout_sec,
            max_retries,
            retry_delay_ms,
        })
    }

    /// Create a new configuration with a database URL.
    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }
}

/// Pool health statistics.
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    /// Number of connections currently in use
    pub connections_in_use: u32,
    /// Number of idle connections
    pub idle_connections: u32,
    /// Total number of connections in the pool
    pub total_connections: u32,
    /// Maximum pool size
    pub max_size: u32,
    /// Total successful queries executed
    pub total_queries: u64,
    /// Total failed queries
    pub failed_queries: u64,
    /// Total retried operations
    pub retried_operations: u64,
}

/// Diesel-backed repository for Postgres.
///
/// This repository implementation provides:
/// - Connection pooling with configurable limits
/// - Automatic retry for transient failures
/// - Health monitoring and statistics
/// - Automatic schema migrations
#[derive(Clone, Debug)]
pub struct PostgresRepository {
    pool: PgPool,
    config: PostgresConfig,
    // Metrics counters
    total_queries: std::sync::Arc<AtomicU64>,
    failed_queries: std::sync::Arc<AtomicU64>,
    retried_operations: std::sync::Arc<AtomicU64>,
}

impl PostgresRepository {
    /// Create a new repository and run pending migrations.
    ///
    /// # Arguments
    /// * `config` - Database configuration
    ///
    /// # Returns
    /// * `Ok(PostgresRepository)` on success
    /// * `Err(RepositoryError)` if connection or migration fails
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .min_idle(Some(config.min_pool_size))
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_sec)))
            .test_on_check_out(true) // Validate connections before use
            .build(manager)
            .map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("create_pool")
                        .with_details(format!("max_size={}", config.max_pool_size)),
                )
            })?;

        // Run migrations once during initialization
        {
            let mut conn = pool.get().map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("get_connection_for_migrations"),
                )
            })?;
            Self::run_migrations(&mut conn)?;
        }

        Ok(Self {
            pool,
            config,
            total_queries: std::sync::Arc::new(AtomicU64::new(0)),
            failed_queries: std::sync::Arc::new(AtomicU64::new(0)),
            retried_operations: std::sync::Arc::new(AtomicU64::new(0)),
        })
    }

    /// Run pending database migrations.
    fn run_migrations(conn: &mut PgConnection) -> RepositoryResult<()> {
        conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Migration failed: {}", e),
                ErrorContext::new("run_migrations"),
            )
        })?;

        Ok(())
    }

    /// Execute a database operation with automatic retry for transient failures.
    ///
    /// This method will retry the operation up to `max_retries` times if a
    /// retryable error occurs (connection errors, timeouts, serialization failures).
    async fn with_conn<T, F>(&self, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static + Clone,
    {
        let pool = self.pool.clone();
        let max_retries = self.config.max_retries;
        let retry_delay_ms = self.config.retry_delay_ms;
        let total_queries = self.total_queries.clone();
        let failed_queries = self.failed_queries.clone();
        let retried_operations = self.retried_operations.clone();

        task::spawn_blocking(move || {
            let mut last_error = None;
            let mut retry_delay = Duration::from_millis(retry_delay_ms);

            for attempt in 0..=max_retries {
                if attempt > 0 {
                    retried_operations.fetch_add(1, Ordering::Relaxed);
                    std::thread::sleep(retry_delay);
                    retry_delay *= 2; // Exponential backoff
                }

                // Get connection
                let mut conn = match pool.get() {
                    Ok(c) => c,
                    Err(e) => {
                        let err = RepositoryError::connection_with_context(
                            e.to_string(),
                            ErrorContext::new("get_connection")
                                .with_details(format!("attempt={}", attempt + 1))
                                .retryable(),
                        );
                        if attempt < max_retries {
                            last_error = Some(err);
                            continue;
                        }
                        failed_queries.fetch_add(1, Ordering::Relaxed);
                        return Err(err);
                    }
                };

                // Execute the operation
                total_queries.fetch_add(1, Ordering::Relaxed);
                match f.clone()(&mut conn) {
                    Ok(result) => return Ok(result),
                    Err(e) if e.is_retryable() && attempt < max_retries => {
                        last_error = Some(e);
                        continue;
                    }
                    Err(e) => {
                        failed_queries.fetch_add(1, Ordering::Relaxed);
                        return Err(e);
                    }
                }
            }

            failed_queries.fetch_add(1, Ordering::Relaxed);
            Err(last_error.unwrap_or_else(|| {
                RepositoryError::internal("Max retries exceeded with no error captured")
            }))
        })
        .await
        .map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Task join error: {}", e),
                ErrorContext::new("spawn_blocking"),
            )
        })?
    }

    /// Get pool health statistics.
    ///
    /// Returns current pool state and query statistics for monitoring.
    pub fn get_pool_stats(&self) -> PoolStats {
        let state = self.pool.state();
        PoolStats {
            connections_in_use: state.connections - state.idle_connections,
            idle_connections: state.idle_connections,
            total_connections: state.connections,
            max_size: self.config.max_pool_size,
            total_queries: self.total_queries.load(Ordering::Relaxed),
            failed_queries: self.failed_queries.load(Ordering::Relaxed),
            retried_operations: self.retried_operations.load(Ordering::Relaxed),
        }
    }

    /// Check if the database connection is healthy.
    ///
    /// Performs a simple query to verify connectivity.
    pub async fn is_healthy(&self) -> bool {
        self.health_check().await.unwrap_or(false)
    }

    /// Get detailed health information.
    ///
    /// Returns a tuple of (is_healthy, latency_ms, error_message).
    pub async fn health_check_detailed(&self) -> (bool, Option<u64>, Option<String>) {
        let start = Instant::now();
        match self.health_check().await {
            Ok(true) => (true, Some(start.elapsed().as_millis() as u64), None),
            Ok(false) => (
                false,
                Some(start.elapsed().as_millis() as u64),
                Some("Health check returned false".to_string()),
            ),
            Err(e) => (
                false,
                Some(start.elapsed().as_millis() as u64),
                Some(e.to_string()),
            ),
        }
    }
}

fn map_diesel_error(err: diesel::result::Error) -> RepositoryError {
    RepositoryError::from(err)
}

fn entries_to_json(entries: &[SlotEntry]) -> RepositoryResult<Value> {
    serde_json::to_value(entries).map_err(|e| {
        RepositoryError::internal(format!("Failed to serialize slot entries: {}", e))
    })
}

fn json_to_entries(value: &Value) -> RepositoryResult<Vec<SlotEntry>> {
    serde_json::from_value(value.clone()).map_err(|e| {
        RepositoryError::internal(format!("Failed to parse slot entry JSON: {}", e))
    })
}

fn slot_to_new_row(slot: &TimeSlot) -> RepositoryResult<NewSlotRow> {
    let key = slot.key().map_err(|e| {
        RepositoryError::validation_with_context(
            e.to_string(),
            ErrorContext::new("save_slot")
                .with_entity("slot")
                .with_entity_id(slot.id()),
        )
    })?;

    Ok(NewSlotRow {
        slot_id: slot.id().value(),
        visit_day: key.day.date(),
        slot_index: key.index.value() as i16,
        max_admitted: slot.max_admitted() as i32,
        next_seq: slot.next_seq() as i64,
        admitted_json: entries_to_json(slot.admitted())?,
        waitlisted_json: entries_to_json(slot.waitlisted())?,
    })
}

fn row_to_slot(row: SlotRow) -> RepositoryResult<TimeSlot> {
    let admitted = json_to_entries(&row.admitted_json)?;
    let waitlisted = json_to_entries(&row.waitlisted_json)?;
    Ok(TimeSlot::from_parts(
        SlotId::new(row.slot_id),
        row.max_admitted.max(0) as usize,
        row.next_seq.max(0) as u64,
        admitted,
        waitlisted,
    ))
}

fn row_to_tour(row: TourRow) -> RepositoryResult<Tour> {
    let kind = row.kind.parse::<TourKind>().map_err(|e| {
        RepositoryError::validation_with_context(
            e,
            ErrorContext::new("row_to_tour")
                .with_entity("tour")
                .with_entity_id(row.tour_id),
        )
    })?;

    Ok(Tour {
        id: Some(TourId::new(row.tour_id)),
        code: TourCode::from(row.tour_code),
        kind,
        school_id: row.school_id.map(SchoolId::new),
        city: row.city,
        priority: row.priority,
        guide_id: row.guide_id.map(GuideId::new),
        checksum: row.checksum,
        registered_at: row.registered_at,
    })
}

fn row_to_school(row: SchoolRow) -> School {
    School {
        id: Some(SchoolId::new(row.school_id)),
        name: row.school_name,
        city: row.city,
        persistence_score: row.persistence_score,
        quality_score: row.quality_score,
        city_distance_km: row.city_distance_km,
    }
}

#[async_trait]
impl SlotRepository for PostgresRepository {
    async fn save_slot(&self, slot: &TimeSlot) -> RepositoryResult<()> {
        let row = slot_to_new_row(slot)?;
        self.with_conn(move |conn| {
            diesel::insert_into(slots::table)
                .values(&row)
                .on_conflict(slots::slot_id)
                .do_update()
                .set((
                    slots::max_admitted.eq(excluded(slots::max_admitted)),
                    slots::next_seq.eq(excluded(slots::next_seq)),
                    slots::admitted_json.eq(excluded(slots::admitted_json)),
                    slots::waitlisted_json.eq(excluded(slots::waitlisted_json)),
                ))
                .execute(conn)
                .map_err(map_diesel_error)?;
            Ok(())
        })
        .await
    }

    async fn load_slot(&self, id: SlotId) -> RepositoryResult<Option<TimeSlot>> {
        let row = self
            .with_conn(move |conn| {
                slots::table
                    .filter(slots::slot_id.eq(id.value()))
                    .select(SlotRow::as_select())
                    .first::<SlotRow>(conn)
                    .optional()
                    .map_err(map_diesel_error)
            })
            .await?;

        row.map(row_to_slot).transpose()
    }

    async fn delete_slot(&self, id: SlotId) -> RepositoryResult<bool> {
        let deleted = self
            .with_conn(move |conn| {
                diesel::delete(slots::table.filter(slots::slot_id.eq(id.value())))
                    .execute(conn)
                    .map_err(map_diesel_error)
            })
            .await?;

        Ok(deleted > 0)
    }

    async fn list_slots(&self) -> RepositoryResult<Vec<TimeSlot>> {
        let rows = self
            .with_conn(|conn| {
                slots::table
                    .select(SlotRow::as_select())
                    .load::<SlotRow>(conn)
                    .map_err(map_diesel_error)
            })
            .await?;

        rows.into_iter().map(row_to_slot).collect()
    }

    async fn health_check(&self) -> RepositoryResult<bool> {
        self.with_conn(|conn| {
            sql_query("SELECT 1")
                .execute(conn)
                .map(|_| true)
                .map_err(map_diesel_error)
        })
        .await
    }
}

#[async_trait]
impl TourRepository for PostgresRepository {
    async fn store_tour(&self, tour: &Tour) -> RepositoryResult<Tour> {
        let tour = tour.clone();
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                // Idempotency: return the stored tour if the checksum matches
                if !tour.checksum.is_empty() {
                    let existing = tours::table
                        .filter(tours::checksum.eq(&tour.checksum))
                        .select(TourRow::as_select())
                        .first::<TourRow>(tx)
                        .optional()
                        .map_err(map_diesel_error)?;
                    if let Some(existing) = existing {
                        return row_to_tour(existing);
                    }
                }

                let taken: i64 = tours::table
                    .filter(tours::tour_code.eq(tour.code.as_str()))
                    .count()
                    .get_result(tx)
                    .map_err(map_diesel_error)?;
                if taken > 0 {
                    return Err(RepositoryError::validation_with_context(
                        format!("tour code {} already taken", tour.code),
                        ErrorContext::new("store_tour")
                            .with_entity("tour")
                            .with_entity_id(tour.code.clone()),
                    ));
                }

                let new_tour = NewTourRow {
                    tour_code: tour.code.as_str().to_string(),
                    kind: tour.kind.to_string(),
                    school_id: tour.school_id.map(|id| id.value()),
                    city: tour.city.clone(),
                    priority: tour.priority,
                    guide_id: tour.guide_id.map(|id| id.value()),
                    checksum: tour.checksum.clone(),
                    registered_at: tour.registered_at,
                };

                let inserted: TourRow = diesel::insert_into(tours::table)
                    .values(&new_tour)
                    .returning(TourRow::as_returning())
                    .get_result(tx)
                    .map_err(map_diesel_error)?;

                row_to_tour(inserted)
            })
        })
        .await
    }

    async fn get_tour(&self, code: &TourCode) -> RepositoryResult<Tour> {
        let code = code.clone();
        self.with_conn(move |conn| {
            let row = tours::table
                .filter(tours::tour_code.eq(code.as_str()))
                .select(TourRow::as_select())
                .first::<TourRow>(conn)
                .optional()
                .map_err(map_diesel_error)?
                .ok_or_else(|| {
                    RepositoryError::not_found_with_context(
                        format!("tour {} not found", code),
                        ErrorContext::new("get_tour")
                            .with_entity("tour")
                            .with_entity_id(code.clone()),
                    )
                })?;
            row_to_tour(row)
        })
        .await
    }

    async fn tour_code_exists(&self, code: &TourCode) -> RepositoryResult<bool> {
        let code = code.clone();
        let count: i64 = self
            .with_conn(move |conn| {
                tours::table
                    .filter(tours::tour_code.eq(code.as_str()))
                    .count()
                    .get_result(conn)
                    .map_err(map_diesel_error)
            })
            .await?;

        Ok(count > 0)
    }

    async fn list_tours(&self) -> RepositoryResult<Vec<Tour>> {
        let rows = self
            .with_conn(|conn| {
                tours::table
                    .select(TourRow::as_select())
                    .load::<TourRow>(conn)
                    .map_err(map_diesel_error)
            })
            .await?;

        rows.into_iter().map(row_to_tour).collect()
    }

    async fn assign_guide(
        &self,
        code: &TourCode,
        guide_id: Option<GuideId>,
    ) -> RepositoryResult<Tour> {
        let code = code.clone();
        self.with_conn(move |conn| {
            let row = diesel::update(tours::table.filter(tours::tour_code.eq(code.as_str())))
                .set(tours::guide_id.eq(guide_id.map(|id| id.value())))
                .returning(TourRow::as_returning())
                .get_result::<TourRow>(conn)
                .optional()
                .map_err(map_diesel_error)?
                .ok_or_else(|| {
                    RepositoryError::not_found_with_context(
                        format!("tour {} not found", code),
                        ErrorContext::new("assign_guide")
                            .with_entity("tour")
                            .with_entity_id(code.clone()),
                    )
                })?;
            row_to_tour(row)
        })
        .await
    }
}

#[async_trait]
impl SchoolRepository for PostgresRepository {
    async fn store_school(&self, school: &School) -> RepositoryResult<SchoolId> {
        let school = school.clone();
        self.with_conn(move |conn| {
            let new_school = NewSchoolRow {
                school_name: school.name.clone(),
                city: school.city.clone(),
                persistence_score: school.persistence_score,
                quality_score: school.quality_score,
                city_distance_km: school.city_distance_km,
            };

            let inserted: SchoolRow = diesel::insert_into(schools::table)
                .values(&new_school)
                .returning(SchoolRow::as_returning())
                .get_result(conn)
                .map_err(map_diesel_error)?;

            Ok(SchoolId::new(inserted.school_id))
        })
        .await
    }

    async fn get_school(&self, id: SchoolId) -> RepositoryResult<School> {
        let row = self
            .with_conn(move |conn| {
                schools::table
                    .filter(schools::school_id.eq(id.value()))
                    .select(SchoolRow::as_select())
                    .first::<SchoolRow>(conn)
                    .optional()
                    .map_err(map_diesel_error)
            })
            .await?
            .ok_or_else(|| {
                RepositoryError::not_found_with_context(
                    format!("school {} not found", id),
                    ErrorContext::new("get_school")
                        .with_entity("school")
                        .with_entity_id(id),
                )
            })?;

        Ok(row_to_school(row))
    }

    async fn list_schools(&self) -> RepositoryResult<Vec<School>> {
        let rows = self
            .with_conn(|conn| {
                schools::table
                    .select(SchoolRow::as_select())
                    .load::<SchoolRow>(conn)
                    .map_err(map_diesel_error)
            })
            .await?;

        Ok(rows.into_iter().map(row_to_school).collect())
    }
}
