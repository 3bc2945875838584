pub mod turndtos;
