pub mod account_service;
pub mod catalog_service;
pub mod enrollment_service;
pub mod session_service;
pub mod token_service;
