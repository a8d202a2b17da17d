//! Records mirrored from the hosting backend. The storefront never owns their
//! lifecycle; it only renders them and forwards mutations.

pub mod auth_models;
pub mod content_models;
pub mod order_models;
pub mod plan_models;
pub mod vps_models;

pub use auth_models::*;
pub use content_models::*;
pub use order_models::*;
pub use plan_models::*;
pub use vps_models::*;
