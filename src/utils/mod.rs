//! Cross-platform utilities
//!
//! - [`fs`] - atomic writes, private files and JSON/TOML helpers
//! - [`platform`] - home directory and per-platform config locations

pub mod fs;
pub mod platform;

pub use fs::{atomic_write, ensure_dir, read_json_or_default, write_json_file};
pub use platform::{get_home_dir, is_windows};
