// src/infrastructure/mod.rs
//
// Infrastructure Layer
//
// Contains implementation details that support the domain
// but are not part of the domain itself.
//
// RULES:
// - Infrastructure serves the domain
// - Infrastructure never dictates domain behavior
// - Infrastructure is replaceable

pub mod folder_locks;
pub mod media_scan;

pub use folder_locks::{FolderLockGuard, FolderLocks};
pub use media_scan::scan_media_folder;
