use crate::model::models::{DengueRecordInput, RecordFields, RejectedRow};

/**
 * Number of columns a data row must have: location, cases, deaths, date, regions.
 */
pub const CSV_COLUMNS: usize = 5;

/**
 * Result of parsing a single CSV data row.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CsvRow {
    /**
     * Row mapped and validated, ready to be written.
     */
    Accepted { line: usize, input: DengueRecordInput },
    /**
     * Row that is malformed or fails validation.
     */
    Rejected(RejectedRow),
}

/**
 * Parses uploaded CSV text into accepted and rejected rows.
 *
 * The first line is a header and is always skipped. Columns are mapped by position in the
 * order `location, cases, deaths, date, regions`; extra columns are ignored. Quoting is not
 * supported, so a comma always separates columns. Blank lines are ignored.
 *
 * # Arguments
 * `text`: The file contents.
 *
 * # Returns
 * One entry per non-blank data row, in file order.
 */
pub fn parse_csv(text: &str) -> Vec<CsvRow> {
    text.split('\n')
        .enumerate()
        .skip(1)
        .filter(|(_, row)| !row.trim().is_empty())
        .map(|(index, row)| parse_row(index + 1, row))
        .collect()
}

fn parse_row(line: usize, row: &str) -> CsvRow {
    let columns: Vec<&str> = row.split(',').map(str::trim).collect();
    if columns.len() < CSV_COLUMNS {
        return CsvRow::Rejected(RejectedRow { line, reason: format!("Expected {CSV_COLUMNS} columns, found {}", columns.len()) });
    }
    let fields = RecordFields::new(columns[0], columns[1], columns[2], columns[3], columns[4]);
    match fields.validate() {
        Ok(input) => CsvRow::Accepted { line, input },
        Err(err) => CsvRow::Rejected(RejectedRow { line, reason: err.message }),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_header_skipped_and_columns_mapped_by_position() {
        let rows = parse_csv("location,cases,deaths,date,regions\nManila,100,2,2024-01-01,NCR\nCebu City,50,0,2024-01-02,Region VII\n");
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0],
            CsvRow::Accepted { line: 2, input: DengueRecordInput { location: "Manila".to_string(), cases: 100, deaths: 2, date: "2024-01-01".to_string(), regions: "NCR".to_string() } }
        );
        assert!(matches!(&rows[1], CsvRow::Accepted { line: 3, input } if input.regions == "Region VII"));
    }

    #[test]
    fn test_short_row_rejected() {
        let rows = parse_csv("location,cases,deaths,date,regions\nManila,100,2,2024-01-01\nCebu City,50,0,2024-01-02,Region VII");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], CsvRow::Rejected(RejectedRow { line: 2, reason: "Expected 5 columns, found 4".to_string() }));
        assert!(matches!(rows[1], CsvRow::Accepted { line: 3, .. }));
    }

    #[test]
    fn test_crlf_and_extra_columns() {
        let rows = parse_csv("h1,h2,h3,h4,h5\r\nDavao, 7 ,1,2024-05-05,Region XI,extra\r\n");
        assert_eq!(rows.len(), 1);
        assert!(matches!(&rows[0], CsvRow::Accepted { input, .. } if input.cases == 7 && input.regions == "Region XI"));
    }

    #[test]
    fn test_invalid_count_rejected_with_reason() {
        let rows = parse_csv("header\nIloilo,many,1,2024-05-05,Region VI");
        let CsvRow::Rejected(rejected) = &rows[0] else { panic!("expected rejected row") };
        assert_eq!(rejected.line, 2);
        assert!(rejected.reason.contains("cases"));
    }

    #[test]
    fn test_header_only() {
        assert!(parse_csv("location,cases,deaths,date,regions").is_empty());
        assert!(parse_csv("").is_empty());
    }
}
