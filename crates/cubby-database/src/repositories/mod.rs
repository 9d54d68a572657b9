//! PostgreSQL implementations of the metadata store traits.

pub mod favorite;
pub mod group_folder;
pub mod share;
pub mod user;

pub use favorite::FavoriteRepository;
pub use group_folder::GroupFolderRepository;
pub use share::ShareRepository;
pub use user::UserRepository;

/// `LIKE` pattern matching every path strictly beneath `path`.
pub(crate) fn descendants_pattern(path: &str) -> String {
    let mut escaped = String::with_capacity(path.len() + 2);
    for c in path.trim_end_matches('/').chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push_str("/%");
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descendants_pattern_escapes_wildcards() {
        assert_eq!(descendants_pattern("/docs"), "/docs/%");
        assert_eq!(descendants_pattern("/"), "/%");
        assert_eq!(descendants_pattern("/a_b%"), "/a\\_b\\%/%");
    }
}
