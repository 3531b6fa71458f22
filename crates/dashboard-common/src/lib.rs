pub mod api;
pub mod error;
pub mod memory;
pub mod model;
pub mod notify;
