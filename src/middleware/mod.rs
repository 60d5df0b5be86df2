pub mod admin;
pub mod group;
pub mod rate_limit;
