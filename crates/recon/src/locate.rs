use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ReconError;
use crate::model::Located;

/// Scan the summary directory for files whose name contains `order_id`.
///
/// Only the directory's immediate file entries are considered. Entries are
/// sorted by file name before matching, so the outcome never depends on the
/// platform's enumeration order and an `Ambiguous` list is stable.
pub fn find_summary(summary_dir: &Path, order_id: &str) -> Result<Located, ReconError> {
    let entries = fs::read_dir(summary_dir).map_err(|e| ReconError::SummaryScan {
        path: summary_dir.to_path_buf(),
        detail: e.to_string(),
    })?;

    let mut names: Vec<(String, PathBuf)> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ReconError::SummaryScan {
            path: summary_dir.to_path_buf(),
            detail: e.to_string(),
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        names.push((entry.file_name().to_string_lossy().into_owned(), path));
    }
    names.sort_by(|a, b| a.0.cmp(&b.0));

    let mut matches: Vec<PathBuf> = names
        .into_iter()
        .filter(|(name, _)| name.contains(order_id))
        .map(|(_, path)| path)
        .collect();

    match matches.len() {
        0 => Ok(Located::NotFound),
        1 => Ok(Located::Unique(matches.remove(0))),
        _ => Ok(Located::Ambiguous(matches)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        fs::write(path, b"stub").unwrap();
    }

    #[test]
    fn unique_match() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("Order_111_summary.pdf"));
        touch(&dir.path().join("Order_222_summary.pdf"));

        let located = find_summary(dir.path(), "111").unwrap();
        assert_eq!(
            located,
            Located::Unique(dir.path().join("Order_111_summary.pdf")),
        );
    }

    #[test]
    fn not_found() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("Order_222_summary.pdf"));

        assert_eq!(find_summary(dir.path(), "111").unwrap(), Located::NotFound);
    }

    #[test]
    fn ambiguous_matches_sorted_by_name() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("b_111_copy.pdf"));
        touch(&dir.path().join("a_111_summary.pdf"));

        let located = find_summary(dir.path(), "111").unwrap();
        assert_eq!(
            located,
            Located::Ambiguous(vec![
                dir.path().join("a_111_summary.pdf"),
                dir.path().join("b_111_copy.pdf"),
            ]),
        );
    }

    #[test]
    fn subdirectories_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("111_folder")).unwrap();

        assert_eq!(find_summary(dir.path(), "111").unwrap(), Located::NotFound);
    }

    #[test]
    fn unreadable_directory_is_an_error() {
        let err = find_summary(Path::new("/nonexistent/summaries"), "111").unwrap_err();
        assert!(matches!(err, ReconError::SummaryScan { .. }));
    }
}
