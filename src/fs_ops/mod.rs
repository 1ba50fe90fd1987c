//! Filesystem operations: modularized.

mod atomic;
mod batch;
pub mod classify;
mod copy;
mod create;
mod helpers;
mod io_copy;
mod merge;
mod metadata;
mod relocate;
mod tree;
mod util;

pub use batch::{
    delete_path, delete_paths, full_match, rename_matching, rename_path, rename_paths, rename_paths_matching, replace_bytes,
    replace_in_file, replace_in_files, replace_regex_in_file, replace_regex_in_files, search_pattern,
};
pub use classify::{EntryKind, classify, is_ancestor, is_strict_ancestor, relative_to, resolve, same_volume};
pub use copy::{safe_copy_and_rename, safe_copy_and_rename_with_metadata};
pub use create::{ensure_folder, is_container, touch};
pub use helpers::io_error_with_help;
pub use merge::{MergeOptions, MergeReport, merge_dirs};
pub use metadata::{copy_permissions, preserve_timestamps};
pub use relocate::{Relocation, clone_entry, move_entry, target_path};
pub use tree::{copy_entry, remove_entry};
pub use util::is_cross_device;

pub(crate) use util::unique_hidden_path;
