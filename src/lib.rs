pub mod config;
pub mod database;
pub mod error;
pub mod services;
pub mod shared;

pub use config::Config;
pub use error::AppError;
pub use services::LeaveService;
