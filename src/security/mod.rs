pub mod config;
pub mod jwt;
pub mod password;
pub mod rate_limit;
