pub mod db;
pub mod query_timeout;
pub mod turndb;

#[cfg(test)]
pub mod memorydb;
