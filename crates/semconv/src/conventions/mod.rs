pub mod category;
pub mod document;
pub mod mapping;
