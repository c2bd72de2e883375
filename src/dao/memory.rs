use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::instrument;

use crate::{
    dao::records::RecordStore,
    model::{
        apperror::{ApplicationError, ErrorType},
        models::{DengueRecord, DengueRecordInput},
    },
};

/**
 * Process local record store. Used for development and tests.
 */
#[derive(Default)]
pub struct InMemoryRecordStore {
    records: RwLock<Vec<DengueRecord>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        InMemoryRecordStore::default()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    #[instrument(skip(self))]
    async fn create(&self, input: DengueRecordInput) -> Result<DengueRecord, ApplicationError> {
        let record = DengueRecord::new(uuid::Uuid::new_v4().to_string(), input);
        self.records.write().await.push(record.clone());
        Ok(record)
    }

    async fn list(&self) -> Result<Vec<DengueRecord>, ApplicationError> {
        Ok(self.records.read().await.clone())
    }

    #[instrument(skip(self))]
    async fn update_by_id(&self, id: &str, input: DengueRecordInput) -> Result<(), ApplicationError> {
        let mut records = self.records.write().await;
        let Some(record) = records.iter_mut().find(|record| record.id == id) else {
            tracing::debug!("Record with id {} not found for update", id);
            return Err(ApplicationError::new(ErrorType::NotFound, "Record not found".to_string()));
        };
        *record = DengueRecord::new(record.id.clone(), input);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_by_id(&self, id: &str) -> Result<(), ApplicationError> {
        let mut records = self.records.write().await;
        let Some(position) = records.iter().position(|record| record.id == id) else {
            tracing::debug!("Record with id {} not found for deletion", id);
            return Err(ApplicationError::new(ErrorType::NotFound, "Record not found".to_string()));
        };
        records.remove(position);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn input(location: &str, cases: i64) -> DengueRecordInput {
        DengueRecordInput { location: location.to_string(), cases, deaths: 0, date: "2024-03-01".to_string(), regions: "NCR".to_string() }
    }

    #[tokio::test]
    async fn test_create_assigns_unique_ids() {
        let store = InMemoryRecordStore::new();
        let first = store.create(input("Manila", 1)).await.unwrap();
        let second = store.create(input("Manila", 1)).await.unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(store.list().await.unwrap(), vec![first, second]);
    }

    #[tokio::test]
    async fn test_update_keeps_id_and_position() {
        let store = InMemoryRecordStore::new();
        let first = store.create(input("Manila", 1)).await.unwrap();
        let second = store.create(input("Pasig", 2)).await.unwrap();
        store.update_by_id(&first.id, input("Makati", 7)).await.unwrap();
        let records = store.list().await.unwrap();
        assert_eq!(records[0].id, first.id);
        assert_eq!(records[0].location, "Makati");
        assert_eq!(records[0].cases, 7);
        assert_eq!(records[1], second);
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let store = InMemoryRecordStore::new();
        let record = store.create(input("Manila", 1)).await.unwrap();
        let err = store.delete_by_id("unknown").await.unwrap_err();
        assert_eq!(err.error_type, ErrorType::NotFound);
        store.delete_by_id(&record.id).await.unwrap();
        assert!(store.list().await.unwrap().is_empty());
    }
}
