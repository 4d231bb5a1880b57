//! HTTP surface of the inference service

pub mod http;

pub use http::*;
