//! File system utilities
//!
//! - **Atomic operations**: every write goes to a temp file and is renamed into place
//! - **Private files**: owner-only permissions for secret-bearing files on Unix
//! - **Permissive reads**: missing or corrupt JSON degrades to an empty default

pub mod atomic;
pub mod dirs;
pub mod formats;

pub use atomic::{atomic_write, atomic_write_private};
pub use dirs::{ensure_dir, ensure_parent_dir};
pub use formats::{
    read_json_or_default, to_json_pretty, write_json_file, write_private_json_file,
    write_toml_file,
};
