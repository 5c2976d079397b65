//! Path resolution helpers for the in-memory tree.
//!
//! The virtual filesystem only understands absolute, `/`-separated paths.

/// Path separator used by the virtual filesystem.
pub const SEPARATOR: char = '/';

/// Lexically normalize a path.
///
/// - Collapses repeated separators
/// - Drops `.` components
/// - Resolves `..` against the preceding component (never above the root)
/// - Removes trailing separators
///
/// # Examples
/// ```
/// use osa_core::fs::clean;
/// assert_eq!(clean("/home//foo/./bar/../baz/"), "/home/foo/baz");
/// assert_eq!(clean("/.."), "/");
/// assert_eq!(clean("a/../../b"), "../b");
/// assert_eq!(clean(""), ".");
/// ```
pub fn clean(path: &str) -> String {
    let rooted = path.starts_with(SEPARATOR);
    let mut parts: Vec<&str> = Vec::new();

    for part in path.split(SEPARATOR) {
        match part {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ if rooted => {}
                _ => parts.push(".."),
            },
            _ => parts.push(part),
        }
    }

    let joined = parts.join("/");
    match (rooted, joined.is_empty()) {
        (true, _) => format!("/{}", joined),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

/// Split an absolute path into its components, excluding the root.
///
/// `"/"` yields no components.
///
/// # Panics
/// Panics on a relative path. Callers are expected to only ever pass
/// absolute paths to the virtual filesystem.
pub fn split(path: &str) -> Vec<String> {
    let cleaned = clean(path);
    if !cleaned.starts_with(SEPARATOR) {
        panic!("unexpected relative path: {:?}", path);
    }
    cleaned
        .split(SEPARATOR)
        .filter(|part| !part.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Split an absolute path into its parent components and base name.
///
/// Returns `None` for the root.
pub fn split_parent(path: &str) -> Option<(Vec<String>, String)> {
    let mut parts = split(path);
    let base = parts.pop()?;
    Some((parts, base))
}

/// Join a directory and a name into a clean path.
pub fn join(dir: &str, name: &str) -> String {
    clean(&format!("{}{}{}", dir, SEPARATOR, name))
}

/// Everything but the last element of a path; the root is its own parent.
pub fn dir_name(path: &str) -> String {
    let cleaned = clean(path);
    match cleaned.rfind(SEPARATOR) {
        Some(0) => SEPARATOR.to_string(),
        Some(pos) => cleaned[..pos].to_string(),
        None => ".".to_string(),
    }
}

/// Last element of a path; `"/"` for the root.
pub fn base_name(path: &str) -> String {
    let cleaned = clean(path);
    match cleaned.rsplit(SEPARATOR).next() {
        Some("") | None => SEPARATOR.to_string(),
        Some(base) => base.to_string(),
    }
}
