use actix_web::{
    HttpRequest, HttpResponse, ResponseError,
    error::{JsonPayloadError, QueryPayloadError},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use crate::{
    model::{
        apperror::{ApplicationError, ErrorType},
        models::{DengueRecord, PaginationOutput, RecordFields},
    },
    service::listview::ListViewState,
};

/***************** Records models *********************/

/**
 * A count as sent by the client. Browser forms send numbers as text, so both are accepted.
 */
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CountValue {
    Number(serde_json::Number),
    Text(String),
}

impl CountValue {
    fn into_text(self) -> String {
        match self {
            CountValue::Number(number) => number.to_string(),
            CountValue::Text(text) => text,
        }
    }
}

/**
 * Request structure for adding or updating a record.
 */
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordRequest {
    pub location: String,
    pub cases: CountValue,
    pub deaths: CountValue,
    pub date: String,
    pub regions: String,
}

impl From<RecordRequest> for RecordFields {
    fn from(request: RecordRequest) -> Self {
        RecordFields { location: request.location, cases: request.cases.into_text(), deaths: request.deaths.into_text(), date: request.date, regions: request.regions }
    }
}

/**
 * Request structure for listing records.
 */
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordListRequest {
    /**
     * Case-insensitive text matched against the location.
     */
    #[serde(default)]
    pub filter_text: String,
    /**
     * Region to match exactly. Empty for all regions.
     */
    #[serde(default)]
    pub region: String,
}

/**
 * Page query parameter for the record list.
 */
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    /**
     * One-based page number. Defaults to the first page.
     */
    pub page: Option<usize>,
}

/**
 * Filter query parameters for the comparison chart.
 */
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterQuery {
    pub filter_text: Option<String>,
    pub region: Option<String>,
}

/**
 * Response structure for listing records.
 *
 * This structure contains the records on the requested page, pagination information and the
 * regions available for filtering.
 */
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordListResponse {
    records: Vec<DengueRecord>,
    pagination: PaginationOutput,
    regions: Vec<String>,
}

impl From<&ListViewState> for RecordListResponse {
    fn from(view: &ListViewState) -> Self {
        RecordListResponse { records: view.page_records().into_iter().cloned().collect(), pagination: view.pagination(), regions: view.regions() }
    }
}

/***************** Error models *********************/

/**
 * Custom error response for the application.
 */
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /**
     * The error code associated with the error type.
     */
    pub code: u16,
    /**
     * A human-readable message describing the error.
     */
    pub message: String,
}

impl ResponseError for ApplicationError {
    fn status_code(&self) -> StatusCode {
        get_statuscode(&self.error_type)
    }

    /**
     * Generates an error response for the application error.
     */
    fn error_response(&self) -> HttpResponse {
        let error_response = ErrorResponse { code: get_error_code(&self.error_type), message: self.message.clone() };
        HttpResponse::build(get_statuscode(&self.error_type)).json(&error_response)
    }
}

/**
 * Reports a request body that could not be deserialized as a validation error.
 */
pub fn json_error_handler(err: JsonPayloadError, _http_request: &HttpRequest) -> actix_web::Error {
    tracing::debug!("Rejected request body: {}", err);
    ApplicationError::new(ErrorType::Validation, format!("Invalid request body: {err}")).into()
}

/**
 * Reports query parameters that could not be deserialized as a validation error.
 */
pub fn query_error_handler(err: QueryPayloadError, _http_request: &HttpRequest) -> actix_web::Error {
    tracing::debug!("Rejected query parameters: {}", err);
    ApplicationError::new(ErrorType::Validation, format!("Invalid query parameters: {err}")).into()
}

/**
* Maps application errors to HTTP status codes.
*
* # Arguments
* `application_error`: The type of error that occurred.
*
* # Returns
* The corresponding HTTP status code.
*/
fn get_statuscode(application_error: &ErrorType) -> StatusCode {
    match application_error {
        ErrorType::Validation => StatusCode::BAD_REQUEST,
        ErrorType::NotFound => StatusCode::NOT_FOUND,
        ErrorType::ConstraintViolation => StatusCode::CONFLICT,
        ErrorType::Initialization | ErrorType::DatabaseError | ErrorType::Application => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/**
 * Maps application errors to error codes.
 *
 * # Arguments
 * `application_error`: The type of error that occurred.
 *
 * # Returns
 * The corresponding error code.
 */
fn get_error_code(application_error: &ErrorType) -> u16 {
    match application_error {
        ErrorType::Initialization => 1001,
        ErrorType::Application => 1002,
        ErrorType::DatabaseError => 1003,
        ErrorType::NotFound => 1004,
        ErrorType::Validation => 1005,
        ErrorType::ConstraintViolation => 1006,
    }
}
