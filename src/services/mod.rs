pub mod cart_service;
pub mod cookie_crypto;
pub mod password_reset_service;
pub mod provisioning_service;
pub mod registration_service;
