//! Filesystem helpers shared by the installer, registrar and ledger.
//!
//! - [`fs`] - Directory creation, tree copy preserving modes, atomic file writes

pub mod fs;

pub use fs::{atomic_write, copy_tree, ensure_dir, remove_dir_all};
