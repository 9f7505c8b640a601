pub mod config;
pub mod db;
pub mod error;
pub mod functions;
pub mod pages;
pub mod realtime;
pub mod server;
pub mod storage;
pub mod utils;

pub use error::OpsError;
pub use pages::Pages;
