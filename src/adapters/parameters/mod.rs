//! Parameters Adapters - Market-Manager Parameter Sources
//!
//! - `FileParametersSource`: contract values mirrored into a TOML file

pub mod file_source;

pub use file_source::FileParametersSource;
