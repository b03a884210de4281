pub mod assistance;
pub mod garage;
pub mod location;
