//! Test utilities shared by unit and route tests.
//!
//! - Provider payload and user record factories with override closures
//! - An in-memory `UserRepo`
//! - RSA fixture keys, a static key resolver and token minting
//! - `TestAppStateBuilder` for route tests

mod app_state_builder;
mod auth_mocks;
mod factories;
mod user_mocks;

pub use app_state_builder::*;
pub use auth_mocks::*;
pub use factories::*;
pub use user_mocks::*;
