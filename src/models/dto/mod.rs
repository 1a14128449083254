pub mod platform;
pub mod request;
pub mod response;
