pub mod analytics;
pub mod boundaries;
pub mod csvimport;
pub mod listview;
pub mod records;
