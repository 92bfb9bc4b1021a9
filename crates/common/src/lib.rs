pub mod logger;
pub mod models;
pub mod settings;
pub mod time;
