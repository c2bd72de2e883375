use crate::model::models::DengueRecord;

/**
 * Database response type for a row of the `dengue_records` table.
 *
 * Columns: id, location, cases, deaths, record_date, regions.
 */
pub type DengueRecordDbResp = (String, String, i64, i64, String, String);

impl From<DengueRecordDbResp> for DengueRecord {
    fn from(row: DengueRecordDbResp) -> Self {
        let (id, location, cases, deaths, date, regions) = row;
        DengueRecord { id, location, cases, deaths, date, regions }
    }
}
