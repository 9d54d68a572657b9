//! Lexical helpers for owner-relative paths.
//!
//! Owner-relative paths are `/`-separated, always start with `/`, never end
//! with `/` (except the root itself), and never contain `.` or `..`.

/// Normalize a caller-supplied relative path.
///
/// Collapses repeated separators and resolves `.`/`..`. Returns `None` when
/// a `..` would climb above the root, or when a segment contains NUL or a
/// backslash.
pub fn normalize(path: &str) -> Option<String> {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                segments.pop()?;
            }
            s if s.contains(['\0', '\\']) => return None,
            s => segments.push(s),
        }
    }
    Some(format!("/{}", segments.join("/")))
}

/// Join a normalized base with an unnormalized remainder.
///
/// The remainder is normalized on its own first, so it can never climb out
/// of `base`.
pub fn join(base: &str, remainder: &str) -> Option<String> {
    let rest = normalize(remainder)?;
    if rest == "/" {
        return Some(base.to_string());
    }
    if base == "/" {
        return Some(rest);
    }
    Some(format!("{}{}", base.trim_end_matches('/'), rest))
}

/// Whether `path` equals `root` or lies beneath it.
pub fn is_at_or_under(path: &str, root: &str) -> bool {
    if root == "/" {
        return true;
    }
    let root = root.trim_end_matches('/');
    path == root || path.strip_prefix(root).is_some_and(|rest| rest.starts_with('/'))
}

/// Re-express `path` relative to `root`; `None` if it is not under it.
pub fn relative_to(path: &str, root: &str) -> Option<String> {
    if root == "/" {
        return Some(path.to_string());
    }
    let root = root.trim_end_matches('/');
    if path == root {
        return Some("/".to_string());
    }
    path.strip_prefix(root)
        .filter(|rest| rest.starts_with('/'))
        .map(str::to_string)
}

/// Last segment of a normalized path; empty for the root.
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or_default()
}
