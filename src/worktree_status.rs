/// Paths with uncommitted changes to tracked files, from `git status --porcelain -z`.
///
/// Untracked (`??`) and ignored (`!!`) entries don't count.
pub fn outstanding_changes(porcelain: &str) -> Vec<String> {
    let mut entries = porcelain.split('\0').filter(|entry| !entry.is_empty());
    let mut paths = Vec::new();

    while let Some(entry) = entries.next() {
        let (status, path) = match (entry.get(..2), entry.get(3..)) {
            (Some(status), Some(path)) => (status, path),
            _ => (entry, ""),
        };

        if status.contains(['R', 'C']) {
            // Renames and copies are followed by the original path.
            entries.next();
        }

        if status != "??" && status != "!!" {
            paths.push(path.to_owned());
        }
    }

    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_clean() {
        assert_eq!(outstanding_changes(""), Vec::<String>::new());
        assert_eq!(
            outstanding_changes("?? scratch.txt\0!! target/\0"),
            Vec::<String>::new()
        );
    }

    #[test]
    fn test_dirty() {
        assert_eq!(
            outstanding_changes(" M src/main.rs\0A  new.rs\0?? scratch.txt\0"),
            vec!["src/main.rs", "new.rs"]
        );
    }

    #[test]
    fn test_rename() {
        assert_eq!(
            outstanding_changes("R  new name.rs\0old name.rs\0 D gone.rs\0"),
            vec!["new name.rs", "gone.rs"]
        );
    }
}
