pub mod departures;
pub mod table;
