use std::fs;
use std::path::Path;

use crate::error::{Result, Chainable};
use crate::fstree::FsTree;

/// Recursively copies the contents of `from` into `to`, creating `to` and any
/// missing directories. Directory permissions are mirrored from the source;
/// files are copied byte-for-byte and overwrite existing ones.
pub fn copy_dir(from: &Path, to: &Path) -> Result<usize> {
    let tree = FsTree::build(from)?;
    let mut copied = 0;
    for entry in tree.iter() {
        let target = to.join(entry.relative_path());
        if entry.metadata.is_dir() {
            fs::create_dir_all(&target).chain_with(|| error! {
                "failed to create output directory",
                "directory" => target.display(),
            })?;

            fs::set_permissions(&target, entry.metadata.permissions()).chain_with(|| error! {
                "failed to set directory permissions",
                "directory" => target.display(),
            })?;
        } else {
            fs::copy(&entry.path, &target).chain_with(|| error! {
                "failed to copy file",
                "source" => entry.path.display(),
                "destination" => target.display(),
            })?;

            copied += 1;
        }
    }

    tracing::debug!(from = %from.display(), to = %to.display(), copied, "copied directory");
    Ok(copied)
}
