//! The storefront's only database access: the registration existence check.

pub mod entities;
pub mod services;
