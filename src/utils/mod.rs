//! Utility functions for code generation, URL checks, and request handling.
//!
//! - [`code_generator`] - Short code generation and alias validation
//! - [`url_validator`] - Target URL validation and self-reference detection
//! - [`client_ip`] - Client identity extraction from the connection and proxy headers

pub mod client_ip;
pub mod code_generator;
pub mod url_validator;
