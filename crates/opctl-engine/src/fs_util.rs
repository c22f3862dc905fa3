//! Scratch copy of the manifests tree

use std::path::Path;

use crate::error::Result;

/// Replace `dest` with a fresh copy of `src`
pub fn refresh_copy(src: &Path, dest: &Path) -> Result<()> {
    if dest.exists() {
        std::fs::remove_dir_all(dest)?;
    }
    std::fs::create_dir_all(dest)?;

    // The scratch directory may live inside the tree being copied
    let skip = dest.canonicalize()?;
    copy_dir_recursive(src, dest, &skip)?;

    tracing::debug!(from = %src.display(), to = %dest.display(), "copied manifests");
    Ok(())
}

/// Copy directory recursively
fn copy_dir_recursive(src: &Path, dest: &Path, skip: &Path) -> Result<()> {
    std::fs::create_dir_all(dest)?;

    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dest_path = dest.join(entry.file_name());

        if src_path.is_dir() {
            if src_path.canonicalize()?.as_path() == skip {
                continue;
            }
            copy_dir_recursive(&src_path, &dest_path, skip)?;
        } else {
            std::fs::copy(&src_path, &dest_path)?;
        }
    }

    Ok(())
}
