pub mod capture;
pub mod history_service;
