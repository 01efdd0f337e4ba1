pub mod config;
pub mod filter;
pub mod packet;
pub mod stats;
