//! Built-in document parsers.

pub mod json;
pub mod scml;

pub use json::JsonParser;
pub use scml::ScmlParser;
