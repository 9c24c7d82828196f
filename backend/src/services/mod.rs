// src/services/mod.rs

pub mod analytics;
pub mod session;
pub mod validation;
