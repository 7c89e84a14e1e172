pub mod communication;
pub mod configuration;
pub mod core;
pub mod database;
pub mod events;
pub mod notify;
pub mod session;
pub mod workflow;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Config Error:{0}")]
    ConfigError(String),

    #[error("Database Error:{0}")]
    DatabaseError(String),

    #[error("Service error")]
    ServiceError,
}
