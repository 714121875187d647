//! Authentication service models

pub mod user;

pub use user::{AccountType, NewUser, User};
