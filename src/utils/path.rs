//! 作业标题到仓库路径的映射
//!
//! 标题原样作为目录名；无法安全映射的标题直接拒绝，对应条目标记为未解析。

use crate::errors::{Result, TrackerError};

/// 校验标题能否直接作为目录名
fn folder_for_title(title: &str) -> Result<&str> {
    if title.trim().is_empty() {
        return Err(TrackerError::validation("Assignment title is empty"));
    }
    if title == "." || title == ".." {
        return Err(TrackerError::validation(format!(
            "Assignment title '{title}' is not a valid folder name"
        )));
    }
    if title.contains(['/', '\\']) {
        return Err(TrackerError::validation(format!(
            "Assignment title '{title}' contains a path separator"
        )));
    }
    if title.chars().any(char::is_control) {
        return Err(TrackerError::validation(
            "Assignment title contains control characters",
        ));
    }
    if title != title.trim() {
        return Err(TrackerError::validation(format!(
            "Assignment title '{title}' has leading or trailing whitespace"
        )));
    }
    Ok(title)
}

/// `{title}/{filename}`
pub fn submission_path(title: &str, filename: &str) -> Result<String> {
    Ok(format!("{}/{filename}", folder_for_title(title)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_titles_are_used_verbatim() {
        assert_eq!(
            submission_path("HW1", "submission.txt").unwrap(),
            "HW1/submission.txt"
        );
        assert_eq!(
            submission_path("Lab 3: Pointers", "submission.txt").unwrap(),
            "Lab 3: Pointers/submission.txt"
        );
        assert_eq!(folder_for_title("作业一").unwrap(), "作业一");
    }

    #[test]
    fn test_unsafe_titles_are_rejected() {
        for title in [
            "",
            "   ",
            ".",
            "..",
            "../secrets",
            "a/b",
            "a\\b",
            "tab\there",
            " padded ",
        ] {
            assert!(
                folder_for_title(title).is_err(),
                "title {title:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_dots_inside_title_are_fine() {
        assert!(folder_for_title("v1.2 final...").is_ok());
    }
}
