pub mod callback_service;
pub mod retention_service;
pub mod status_feed;

pub use callback_service::CallbackService;
