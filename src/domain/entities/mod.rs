pub mod provider;
pub mod user;
