pub mod schemamodel;
pub mod turnmodel;
