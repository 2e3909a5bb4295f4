//! Configuration management for MCPM
//!
//! MCPM has one user-wide configuration file, `~/.mcpm/config.toml`, described in
//! [`GlobalConfig`]. It only tells MCPM where things live: the lockfile, the secrets
//! vault, and client config files installed in non-default places. MCPM runs with
//! no config file at all.
//!
//! The files MCPM manages are documented with their own modules:
//!
//! - Lockfile (`mcpm.lock`): [`crate::lockfile`]
//! - Vault (`~/.mcpm/vault.json`): [`crate::vault`]
//! - Client configs: [`crate::clients`]

mod global;

pub use global::{CONFIG_ENV, GlobalConfig, MCPM_DIR};
