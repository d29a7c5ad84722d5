//! Name rewriting.

use graft_core::RenameMapping;

/// Apply rename mappings to a name, in order.
///
/// A prepend rule puts its `to` in front of the name. Any other rule
/// replaces every non-overlapping literal occurrence of `from`, scanning
/// left to right. Each rule sees the output of the previous one.
pub fn apply_mappings(name: &str, mappings: &[RenameMapping]) -> String {
    mappings
        .iter()
        .fold(name.to_string(), |current, mapping| {
            if mapping.is_prepend() {
                format!("{}{}", mapping.to, current)
            } else {
                current.replace(&mapping.from, &mapping.to)
            }
        })
}

/// Check that a name can be created at the destination.
pub fn validate_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Name cannot be empty".into());
    }

    for c in ['/', '\0'] {
        if name.contains(c) {
            return Err(format!("Name cannot contain {c:?}"));
        }
    }

    if name == "." || name == ".." {
        return Err("'.' and '..' are reserved names".into());
    }

    Ok(())
}
