pub mod settings_service;
pub mod wallet_service;
