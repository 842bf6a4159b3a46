// Indicator math and rolling windows
pub mod market;

// Core market entities
pub mod trading;

// Port interfaces
pub mod ports;

// Worker domains
pub mod health;
pub mod macro_pulse;
pub mod news;
pub mod opportunity;
pub mod sentiment;
pub mod sentinel;

// Domain-specific error types
pub mod errors;
