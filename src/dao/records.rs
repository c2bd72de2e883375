use std::borrow::Cow;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use tracing::{Instrument, instrument};

use crate::model::{
    apperror::{ApplicationError, ErrorType},
    db::DengueRecordDbResp,
    models::{DengueRecord, DengueRecordInput},
};

/**
 * Access to the record collection.
 *
 * Every operation is a single call against the backing store. No caching is done here.
 */
#[async_trait]
pub trait RecordStore: Send + Sync {
    /**
     * Creates a record and returns it with its assigned id.
     */
    async fn create(&self, input: DengueRecordInput) -> Result<DengueRecord, ApplicationError>;

    /**
     * Returns the entire collection in insertion order.
     */
    async fn list(&self) -> Result<Vec<DengueRecord>, ApplicationError>;

    /**
     * Replaces all fields of the record with the given id.
     * Returns a `NotFound` error when no such record exists.
     */
    async fn update_by_id(&self, id: &str, input: DengueRecordInput) -> Result<(), ApplicationError>;

    /**
     * Deletes the record with the given id.
     * Returns a `NotFound` error when no such record exists.
     */
    async fn delete_by_id(&self, id: &str) -> Result<(), ApplicationError>;
}

/**
 * SQL query to retrieve all records.
 */
const QUERY_RECORDS_LIST: &str = "SELECT id, location, cases, deaths, record_date, regions FROM dengue_records ORDER BY inserted_at, id";

/**
 * SQL query to add a new record.
 */
const ADD_RECORD: &str = "INSERT INTO dengue_records (id, location, cases, deaths, record_date, regions, inserted_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, now(), now())";

/**
 * SQL query to update a record.
 */
const UPDATE_RECORD: &str = "UPDATE dengue_records SET location = $1, cases = $2, deaths = $3, record_date = $4, regions = $5, updated_at = now() WHERE id = $6";

/**
 * SQL query to delete a record.
 */
const DELETE_RECORD: &str = "DELETE FROM dengue_records WHERE id = $1";

/**
 * Record store backed by `PostgreSQL`.
 */
pub struct PostgresRecordStore {
    /**
     * Connection pool for database operations.
     */
    connection_pool: Pool<Postgres>,
}

impl PostgresRecordStore {
    /**
     * Creates a new instance of `PostgresRecordStore`.
     *
     * # Arguments
     * `connection_pool`: The database connection pool.
     *
     * # Returns
     * A new instance of `PostgresRecordStore`.
     */
    pub fn new(connection_pool: Pool<Postgres>) -> Self {
        PostgresRecordStore { connection_pool }
    }

    /**
     * Begins a transaction on the pool.
     */
    async fn begin(&self) -> Result<sqlx::Transaction<'static, Postgres>, ApplicationError> {
        self.connection_pool.begin().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to begin transaction: {err}")))
    }

    /**
     * Commits the transaction if the write touched exactly one row, otherwise rolls back.
     *
     * # Arguments
     * `transaction`: The transaction holding the write.
     * `rows_affected`: Number of rows the write affected.
     * `id`: The record id, for logging.
     * `operation`: Name of the operation, for logging and messages.
     *
     * # Returns
     * A result indicating success or failure of the operation.
     */
    async fn finish_single_row_write(transaction: sqlx::Transaction<'static, Postgres>, rows_affected: u64, id: &str, operation: &str) -> Result<(), ApplicationError> {
        if rows_affected == 1 {
            return transaction.commit().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to commit transaction: {err}")));
        }
        transaction.rollback().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to rollback transaction: {err}")))?;
        if rows_affected == 0 {
            tracing::debug!("Record with id {} not found for {}", id, operation);
            return Err(ApplicationError::new(ErrorType::NotFound, "Record not found".to_string()));
        }
        tracing::warn!("Multiple records attempted {}. Rolled back", operation);
        Err(ApplicationError::new(ErrorType::Application, format!("Multiple records attempted {operation}. Rolled back")))
    }

    /**
     * Handles database errors and maps them to application errors.
     *
     * # Arguments
     * `error`: The database error to handle.
     *
     * # Returns
     * An `ApplicationError` corresponding to the database error.
     */
    fn handle_database_error(error: Option<&dyn sqlx::error::DatabaseError>) -> ApplicationError {
        if let Some(db_error) = error {
            tracing::debug!("Database error: {}", db_error);
            if db_error.code() == Some(Cow::Borrowed("23505")) {
                // Unique violation
                return ApplicationError::new(ErrorType::ConstraintViolation, "Already exists".to_string());
            } else if db_error.code() == Some(Cow::Borrowed("22001")) {
                // Value too long
                return ApplicationError::new(ErrorType::Validation, "Value too long".to_string());
            }
            tracing::error!("Unhandled database error: {}", db_error);
            return ApplicationError::new(ErrorType::DatabaseError, "Unhandled database error".to_string());
        }
        ApplicationError::new(ErrorType::DatabaseError, "Failed to execute database operation".to_string())
    }
}

#[async_trait]
impl RecordStore for PostgresRecordStore {
    #[instrument(skip(self), fields(result))]
    async fn create(&self, input: DengueRecordInput) -> Result<DengueRecord, ApplicationError> {
        let span = tracing::Span::current();
        let id = uuid::Uuid::new_v4().to_string();
        let mut transaction = self.begin().await?;
        let result = sqlx::query(ADD_RECORD)
            .bind(&id)
            .bind(&input.location)
            .bind(input.cases)
            .bind(input.deaths)
            .bind(&input.date)
            .bind(&input.regions)
            .execute(&mut *transaction)
            .instrument(span)
            .await;
        match result {
            Ok(_) => transaction.commit().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to commit transaction: {err}")))?,
            Err(err) => {
                transaction.rollback().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to rollback transaction: {err}")))?;
                return Err(Self::handle_database_error(err.as_database_error()));
            }
        }
        Ok(DengueRecord::new(id, input))
    }

    #[instrument(skip(self), fields(result))]
    async fn list(&self) -> Result<Vec<DengueRecord>, ApplicationError> {
        let span = tracing::Span::current();
        let results: Vec<DengueRecordDbResp> = sqlx::query_as(QUERY_RECORDS_LIST)
            .fetch_all(&self.connection_pool)
            .instrument(span)
            .await
            .map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to execute query to get record list: {err}")))?;
        Ok(results.into_iter().map(DengueRecord::from).collect())
    }

    #[instrument(skip(self), fields(result))]
    async fn update_by_id(&self, id: &str, input: DengueRecordInput) -> Result<(), ApplicationError> {
        let span = tracing::Span::current();
        let mut transaction = self.begin().await?;
        let result = sqlx::query(UPDATE_RECORD)
            .bind(&input.location)
            .bind(input.cases)
            .bind(input.deaths)
            .bind(&input.date)
            .bind(&input.regions)
            .bind(id)
            .execute(&mut *transaction)
            .instrument(span)
            .await;
        let rows_affected = match result {
            Ok(result) => result.rows_affected(),
            Err(err) => {
                transaction.rollback().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to rollback transaction: {err}")))?;
                return Err(Self::handle_database_error(err.as_database_error()));
            }
        };
        Self::finish_single_row_write(transaction, rows_affected, id, "updated").await
    }

    #[instrument(skip(self), fields(result))]
    async fn delete_by_id(&self, id: &str) -> Result<(), ApplicationError> {
        let span = tracing::Span::current();
        let mut transaction = self.begin().await?;
        let result = sqlx::query(DELETE_RECORD).bind(id).execute(&mut *transaction).instrument(span).await;
        let rows_affected = match result {
            Ok(result) => result.rows_affected(),
            Err(err) => {
                transaction.rollback().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to rollback transaction: {err}")))?;
                return Err(Self::handle_database_error(err.as_database_error()));
            }
        };
        Self::finish_single_row_write(transaction, rows_affected, id, "deleted").await
    }
}
