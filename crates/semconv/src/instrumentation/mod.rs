pub mod enrich;
pub mod model;
