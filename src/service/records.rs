use std::collections::HashSet;
use std::sync::Arc;

use futures_util::future::join_all;
use tracing::{Instrument, instrument};

use crate::{
    dao::records::RecordStore,
    model::{
        apperror::ApplicationError,
        models::{DengueRecord, ImportReport, RecordFields, RejectedRow},
    },
    service::csvimport::{CsvRow, parse_csv},
};

/**
 * Represents the service for managing dengue records.
 */
pub struct RecordService {
    /**
     * The store holding the record collection.
     */
    record_store: Arc<dyn RecordStore>,
}

impl RecordService {
    /**
     * Creates a new instance of `RecordService`.
     *
     * # Arguments
     * `record_store`: The store holding the record collection.
     *
     * # Returns
     * A new instance of `RecordService`.
     */
    pub fn new(record_store: Arc<dyn RecordStore>) -> Self {
        RecordService { record_store }
    }

    /**
     * Validates the fields and creates a new record.
     *
     * # Arguments
     * `fields`: The record fields as entered.
     *
     * # Returns
     * A Result containing the created record with its id or an `ApplicationError`.
     */
    #[instrument(skip(self), fields(result))]
    pub async fn add_record(&self, fields: RecordFields) -> Result<DengueRecord, ApplicationError> {
        let input = fields.validate()?;
        self.record_store.create(input).await.inspect_err(|err| tracing::error!("Error adding record: {}", err))
    }

    /**
     * Retrieves the entire record collection.
     *
     * # Returns
     * A Result containing every record or an `ApplicationError`.
     */
    pub async fn list_records(&self) -> Result<Vec<DengueRecord>, ApplicationError> {
        self.record_store.list().await.inspect_err(|err| tracing::error!("Error fetching records: {}", err))
    }

    /**
     * Validates the fields and replaces the record with the given id.
     *
     * # Arguments
     * `id`: The id of the record to update.
     * `fields`: The new record fields as entered.
     *
     * # Returns
     * A Result containing the updated record or an `ApplicationError`.
     */
    #[instrument(skip(self), fields(result))]
    pub async fn update_record(&self, id: &str, fields: RecordFields) -> Result<DengueRecord, ApplicationError> {
        let input = fields.validate()?;
        self.record_store.update_by_id(id, input.clone()).await.inspect_err(|err| tracing::error!("Error updating record {}: {}", id, err))?;
        Ok(DengueRecord::new(id.to_string(), input))
    }

    /**
     * Deletes the record with the given id.
     *
     * # Arguments
     * `id`: The id of the record to delete.
     *
     * # Returns
     * A Result indicating success or an `ApplicationError`.
     */
    #[instrument(skip(self), fields(result))]
    pub async fn delete_record(&self, id: &str) -> Result<(), ApplicationError> {
        self.record_store.delete_by_id(id).await.inspect_err(|err| tracing::error!("Error deleting record {}: {}", id, err))
    }

    /**
     * Imports CSV text. Every accepted row is written with its own create call and all calls
     * run concurrently. A failed write does not stop the other rows.
     *
     * # Arguments
     * `text`: The uploaded CSV contents.
     *
     * # Returns
     * A report of created, rejected and failed rows.
     */
    #[instrument(skip(self, text), fields(bytes = text.len()))]
    pub async fn import_csv(&self, text: &str) -> ImportReport {
        let span = tracing::Span::current();
        let mut report = ImportReport::default();
        let mut pending = Vec::new();
        for row in parse_csv(text) {
            match row {
                CsvRow::Accepted { line, input } => pending.push((line, input)),
                CsvRow::Rejected(rejected) => {
                    tracing::debug!("Rejected CSV line {}: {}", rejected.line, rejected.reason);
                    report.rejected.push(rejected);
                }
            }
        }
        let writes = pending.into_iter().map(|(line, input)| async move { (line, self.record_store.create(input).await) });
        for (line, result) in join_all(writes).instrument(span).await {
            match result {
                Ok(record) => report.created.push(record),
                Err(err) => {
                    tracing::error!("Error importing CSV line {}: {}", line, err);
                    report.failed.push(RejectedRow { line, reason: err.message });
                }
            }
        }
        tracing::info!("CSV import finished: {} created, {} rejected, {} failed", report.created.len(), report.rejected.len(), report.failed.len());
        report
    }
}

/**
 * Returns the distinct regions in order of first appearance.
 */
pub fn unique_regions(records: &[DengueRecord]) -> Vec<String> {
    let mut seen = HashSet::new();
    records.iter().filter(|record| seen.insert(record.regions.as_str())).map(|record| record.regions.clone()).collect()
}

#[cfg(test)]
mod test {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::{
        dao::memory::InMemoryRecordStore,
        model::{
            apperror::ErrorType,
            models::DengueRecordInput,
        },
    };

    /**
     * Store wrapper that records create calls and fails writes for chosen locations.
     */
    #[derive(Default)]
    struct RecordingStore {
        inner: InMemoryRecordStore,
        created: Mutex<Vec<DengueRecordInput>>,
        failing_location: Option<String>,
    }

    impl RecordingStore {
        fn failing_for(location: &str) -> Self {
            RecordingStore { failing_location: Some(location.to_string()), ..RecordingStore::default() }
        }

        fn check(&self, location: &str) -> Result<(), ApplicationError> {
            if self.failing_location.as_deref() == Some(location) {
                return Err(ApplicationError::new(ErrorType::DatabaseError, "Store unavailable".to_string()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl RecordStore for RecordingStore {
        async fn create(&self, input: DengueRecordInput) -> Result<DengueRecord, ApplicationError> {
            self.created.lock().unwrap().push(input.clone());
            self.check(&input.location)?;
            self.inner.create(input).await
        }

        async fn list(&self) -> Result<Vec<DengueRecord>, ApplicationError> {
            self.inner.list().await
        }

        async fn update_by_id(&self, id: &str, input: DengueRecordInput) -> Result<(), ApplicationError> {
            self.check(&input.location)?;
            self.inner.update_by_id(id, input).await
        }

        async fn delete_by_id(&self, id: &str) -> Result<(), ApplicationError> {
            self.inner.delete_by_id(id).await
        }
    }

    #[tokio::test]
    async fn test_add_record_validates_before_write() {
        let store = Arc::new(RecordingStore::default());
        let service = RecordService::new(store.clone());
        let err = service.add_record(RecordFields::new("Manila", "lots", "0", "2024-01-01", "NCR")).await.unwrap_err();
        assert_eq!(err.error_type, ErrorType::Validation);
        assert!(store.created.lock().unwrap().is_empty());

        let record = service.add_record(RecordFields::new("Manila", "12", "1", "2024-01-01", "NCR")).await.unwrap();
        assert!(!record.id.is_empty());
        assert_eq!(service.list_records().await.unwrap(), vec![record]);
    }

    #[tokio::test]
    async fn test_import_csv_issues_one_create_per_valid_row() {
        let store = Arc::new(RecordingStore::default());
        let service = RecordService::new(store.clone());
        let report = service.import_csv("location,cases,deaths,date,regions\nManila,10,1,2024-01-01,NCR\nCebu,20,2,2024-01-02,Region VII\nDavao,5,0,2024-01-03\n").await;
        let created = store.created.lock().unwrap().clone();
        assert_eq!(created.len(), 2);
        assert_eq!(created.iter().find(|input| input.location == "Cebu").map(|input| (input.cases, input.deaths, input.regions.as_str())), Some((20, 2, "Region VII")));
        assert_eq!(report.created.len(), 2);
        assert_eq!(report.rejected, vec![RejectedRow { line: 4, reason: "Expected 5 columns, found 4".to_string() }]);
        assert!(report.failed.is_empty());
    }

    #[tokio::test]
    async fn test_import_csv_reports_partial_failure() {
        let store = Arc::new(RecordingStore::failing_for("Cebu"));
        let service = RecordService::new(store.clone());
        let report = service.import_csv("header\nManila,10,1,2024-01-01,NCR\nCebu,20,2,2024-01-02,Region VII").await;
        assert_eq!(report.created.len(), 1);
        assert_eq!(report.created[0].location, "Manila");
        assert_eq!(report.failed, vec![RejectedRow { line: 3, reason: "Store unavailable".to_string() }]);
        assert_eq!(service.list_records().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_record_returns_merged_record() {
        let service = RecordService::new(Arc::new(InMemoryRecordStore::new()));
        let record = service.add_record(RecordFields::new("Manila", "12", "1", "2024-01-01", "NCR")).await.unwrap();
        let updated = service.update_record(&record.id, RecordFields::new("Manila", "30", "1", "2024-01-01", "NCR")).await.unwrap();
        assert_eq!(updated.id, record.id);
        assert_eq!(updated.cases, 30);
        assert_eq!(service.list_records().await.unwrap(), vec![updated]);
    }

    #[tokio::test]
    async fn test_delete_missing_record() {
        let service = RecordService::new(Arc::new(InMemoryRecordStore::new()));
        let err = service.delete_record("missing").await.unwrap_err();
        assert_eq!(err.error_type, ErrorType::NotFound);
    }

    #[test]
    fn test_unique_regions_first_appearance_order() {
        let records: Vec<DengueRecord> = ["NCR", "Region VII", "NCR", "CAR"]
            .iter()
            .enumerate()
            .map(|(index, region)| DengueRecord { id: index.to_string(), location: "x".to_string(), cases: 1, deaths: 0, date: "2024-01-01".to_string(), regions: (*region).to_string() })
            .collect();
        assert_eq!(unique_regions(&records), vec!["NCR".to_string(), "Region VII".to_string(), "CAR".to_string()]);
    }
}
