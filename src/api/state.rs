use crate::service::{analytics::AnalyticsService, records::RecordService};

/**
* Represents the application state shared across the Actix web application.
*/
pub struct AppState {
    /**
     * The record service for handling record-related operations.
     */
    pub record_service: RecordService,
    /**
     * The analytics service deriving chart and map data.
     */
    pub analytics_service: AnalyticsService,
    /**
     * Number of records per page in the record list.
     */
    pub page_size: usize,
}

/**
 * Creates a new instance of `AppState`.
 *
 * # Arguments
 * `record_service`: The record service for handling record-related operations.
 * `analytics_service`: The analytics service deriving chart and map data.
 * `page_size`: Number of records per page in the record list.
 */
impl AppState {
    pub fn new(record_service: RecordService, analytics_service: AnalyticsService, page_size: usize) -> Self {
        AppState { record_service, analytics_service, page_size }
    }
}
