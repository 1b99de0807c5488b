pub mod auth;
pub mod billing;
pub mod org;
pub mod project;
