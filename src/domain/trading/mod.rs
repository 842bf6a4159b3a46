// Core market entities and symbol handling
pub mod types;
