pub mod request;
pub mod resolver;
