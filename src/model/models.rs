use chrono::NaiveDate;
use serde::Serialize;

use crate::model::apperror::{ApplicationError, ErrorType};

/**
 * Date format produced by the browser date input.
 */
pub const RECORD_DATE_FORMAT: &str = "%Y-%m-%d";

/**
 * A stored dengue case record.
 */
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DengueRecord {
    /**
     * Identifier assigned by the store on creation.
     */
    pub id: String,
    pub location: String,
    pub cases: i64,
    pub deaths: i64,
    pub date: String,
    pub regions: String,
}

impl DengueRecord {
    /**
     * Creates a record from an id and validated input.
     */
    pub fn new(id: String, input: DengueRecordInput) -> Self {
        DengueRecord { id, location: input.location, cases: input.cases, deaths: input.deaths, date: input.date, regions: input.regions }
    }
}

/**
 * Validated record fields without an id.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DengueRecordInput {
    pub location: String,
    pub cases: i64,
    pub deaths: i64,
    pub date: String,
    pub regions: String,
}

/**
 * Record fields as entered by a user or read from a CSV row.
 *
 * Nothing is checked until `validate` is called.
 */
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFields {
    pub location: String,
    pub cases: String,
    pub deaths: String,
    pub date: String,
    pub regions: String,
}

impl RecordFields {
    /**
     * Creates a new instance of `RecordFields`.
     */
    pub fn new(location: &str, cases: &str, deaths: &str, date: &str, regions: &str) -> Self {
        RecordFields { location: location.to_string(), cases: cases.to_string(), deaths: deaths.to_string(), date: date.to_string(), regions: regions.to_string() }
    }

    /**
     * Validates the fields and converts them into a `DengueRecordInput`.
     *
     * # Returns
     * A Result containing the validated input or an `ApplicationError` of type `Validation`.
     */
    pub fn validate(&self) -> Result<DengueRecordInput, ApplicationError> {
        let location = self.location.trim();
        if location.is_empty() {
            return Err(ApplicationError::new(ErrorType::Validation, "Location is required".to_string()));
        }
        let regions = self.regions.trim();
        if regions.is_empty() {
            return Err(ApplicationError::new(ErrorType::Validation, "Region is required".to_string()));
        }
        let cases = parse_count("cases", &self.cases)?;
        let deaths = parse_count("deaths", &self.deaths)?;
        let date = self.date.trim();
        NaiveDate::parse_from_str(date, RECORD_DATE_FORMAT).map_err(|err| ApplicationError::new(ErrorType::Validation, format!("Invalid date '{date}': {err}")))?;
        Ok(DengueRecordInput { location: location.to_string(), cases, deaths, date: date.to_string(), regions: regions.to_string() })
    }
}

impl From<&DengueRecord> for RecordFields {
    fn from(record: &DengueRecord) -> Self {
        RecordFields {
            location: record.location.clone(),
            cases: record.cases.to_string(),
            deaths: record.deaths.to_string(),
            date: record.date.clone(),
            regions: record.regions.clone(),
        }
    }
}

/**
 * Parses a non-negative count. Integer-valued decimals such as "12.0" are accepted.
 *
 * # Arguments
 * `field`: Name of the field, used in the error message.
 * `value`: The raw text.
 *
 * # Returns
 * The parsed count or a `Validation` error.
 */
#[allow(clippy::cast_possible_truncation)]
pub fn parse_count(field: &str, value: &str) -> Result<i64, ApplicationError> {
    let value = value.trim();
    let parsed = match value.parse::<i64>() {
        Ok(count) => Some(count),
        Err(_) => value.parse::<f64>().ok().filter(|number| number.is_finite() && number.fract() == 0.0 && number.abs() < 9.0e15).map(|number| number as i64),
    };
    match parsed {
        Some(count) if count >= 0 => Ok(count),
        Some(_) => Err(ApplicationError::new(ErrorType::Validation, format!("Field {field} must not be negative"))),
        None => Err(ApplicationError::new(ErrorType::Validation, format!("Field {field} is not a whole number: '{value}'"))),
    }
}

/**
 * A CSV row that was not imported.
 */
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedRow {
    /**
     * One-based line number in the uploaded file.
     */
    pub line: usize,
    pub reason: String,
}

/**
 * Outcome of a whole CSV import.
 */
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    /**
     * Records written to the store.
     */
    pub created: Vec<DengueRecord>,
    /**
     * Rows that were malformed or failed validation. Never written.
     */
    pub rejected: Vec<RejectedRow>,
    /**
     * Rows that were valid but the store write failed.
     */
    pub failed: Vec<RejectedRow>,
}

/**
 * Filter applied to the record list.
 */
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    /**
     * Case-insensitive substring matched against the location.
     */
    pub text: String,
    /**
     * Exact region match. Empty matches every region.
     */
    pub region: String,
}

impl RecordFilter {
    pub fn new(text: &str, region: &str) -> Self {
        RecordFilter { text: text.to_string(), region: region.to_string() }
    }

    /**
     * Checks if the record passes the filter.
     */
    pub fn matches(&self, record: &DengueRecord) -> bool {
        record.location.to_lowercase().contains(&self.text.to_lowercase()) && (self.region.is_empty() || record.regions == self.region)
    }
}

/**
 * Pagination details for a page of the record list.
 */
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationOutput {
    /**
     * One-based page number.
     */
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    /**
     * Number of records passing the filter.
     */
    pub total_elements: usize,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_validate_ok() {
        let input = RecordFields::new(" Quezon City ", "120", "3", "2024-02-01", "NCR ").validate().unwrap();
        assert_eq!(input, DengueRecordInput { location: "Quezon City".to_string(), cases: 120, deaths: 3, date: "2024-02-01".to_string(), regions: "NCR".to_string() });
    }

    #[test]
    fn test_validate_rejects_non_numeric_cases() {
        let err = RecordFields::new("Cebu", "abc", "3", "2024-02-01", "Region VII").validate().unwrap_err();
        assert_eq!(err.error_type, ErrorType::Validation);
        assert!(err.message.contains("cases"));
    }

    #[test]
    fn test_validate_rejects_missing_location() {
        let err = RecordFields::new("  ", "1", "0", "2024-02-01", "Region VII").validate().unwrap_err();
        assert_eq!(err.error_type, ErrorType::Validation);
    }

    #[test]
    fn test_validate_rejects_bad_date() {
        let err = RecordFields::new("Cebu", "1", "0", "01/02/2024", "Region VII").validate().unwrap_err();
        assert!(err.message.contains("date"));
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("cases", "12").unwrap(), 12);
        assert_eq!(parse_count("cases", " 12.0 ").unwrap(), 12);
        assert!(parse_count("cases", "12.5").is_err());
        assert!(parse_count("cases", "-1").is_err());
        assert!(parse_count("cases", "").is_err());
        assert!(parse_count("cases", "NaN").is_err());
    }

    #[test]
    fn test_filter_matches() {
        let record = DengueRecord::new("1".to_string(), RecordFields::new("Quezon City", "1", "0", "2024-01-01", "NCR").validate().unwrap());
        assert!(RecordFilter::new("quezon", "").matches(&record));
        assert!(RecordFilter::new("CITY", "NCR").matches(&record));
        assert!(!RecordFilter::new("", "ncr").matches(&record));
        assert!(!RecordFilter::new("manila", "").matches(&record));
    }
}
