pub mod memory;
pub mod records;
