pub mod config;
pub mod error;
pub mod theme;
pub mod types;

// Re-export commonly used types
pub use config::{Config, DarkMode, Features, Important, SafelistEntry};
pub use error::ConfigError;
pub use types::{Diagnostic, DiagnosticLevel, Diagnostics, Layer};
