pub mod kb;
pub mod service;
