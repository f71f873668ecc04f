pub mod connection;
pub mod remote;
pub mod types;
