//! Share-path manipulation utilities.
//!
//! Share paths are `/`-separated strings independent of the local OS path
//! syntax, rooted at the share (`"/"` is the share root, not the local
//! filesystem root).

/// Normalize a base scan path: leading slash enforced, trailing slash
/// stripped (except for the root itself), duplicate separators collapsed.
///
/// `"incoming/Orexplore"` → `"/incoming/Orexplore"`,
/// `"/data/"` → `"/data"`, `"/"` → `"/"`, `""` → `"/"`.
#[must_use]
pub fn normalize_base_path(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 1);
    for segment in raw.split('/').filter(|s| !s.is_empty()) {
        out.push('/');
        out.push_str(segment);
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}

/// Join a child name onto a normalized share path.
#[must_use]
pub fn join_share_path(base: &str, name: &str) -> String {
    if base == "/" {
        format!("/{name}")
    } else {
        format!("{base}/{name}")
    }
}

/// Case-insensitive match of a file name's final extension against a filter
/// list. An empty filter matches every file.
#[must_use]
pub fn matches_extension(name: &str, extensions: &[String]) -> bool {
    if extensions.is_empty() {
        return true;
    }
    let Some((stem, ext)) = name.rsplit_once('.') else {
        return false;
    };
    // A bare leading dot (".hidden") is a hidden name, not an extension.
    if stem.is_empty() {
        return false;
    }
    extensions.iter().any(|e| ext.eq_ignore_ascii_case(e))
}
