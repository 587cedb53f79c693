//! Page range parsing
//!
//! Turns user-entered text such as `"1,3-5"` into zero-based page indices.
//! Order and duplicates are kept exactly as written, so `"3,1,1"` selects
//! page 3 followed by page 1 twice.

use crate::error::{Error, Result};

/// Largest page number accepted in a range expression
pub const MAX_PAGE_NUMBER: i64 = 100_000;

/// Parse a page range expression for `file_name`.
///
/// Supported formats:
/// - `""` / blank → `[]` (all pages)
/// - `"4"` → `[3]`
/// - `"2-4"` → `[1, 2, 3]`
/// - `"1,3-5"` → `[0, 2, 3, 4]`
///
/// The whole expression is rejected if any token is invalid; `file_name` is
/// carried in the error so the user knows which entry to fix.
pub fn parse_page_ranges(text: &str, file_name: &str) -> Result<Vec<usize>> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(Vec::new());
    }

    let mut pages = Vec::new();
    for part in text.split(',') {
        let part = part.trim();

        if let Some((start, end)) = part.split_once('-') {
            let start = parse_number(start, file_name)?;
            let end = parse_number(end, file_name)?;
            if start < 1 || end < start {
                return Err(invalid(file_name, format!("invalid page range '{}'", part)));
            }
            if end > MAX_PAGE_NUMBER {
                return Err(invalid(
                    file_name,
                    format!("page range '{}' goes past page {}", part, MAX_PAGE_NUMBER),
                ));
            }
            pages.extend((start - 1) as usize..end as usize);
        } else {
            let page = parse_number(part, file_name)?;
            if !(1..=MAX_PAGE_NUMBER).contains(&page) {
                return Err(invalid(file_name, format!("invalid page number '{}'", part)));
            }
            pages.push((page - 1) as usize);
        }
    }

    Ok(pages)
}

fn parse_number(token: &str, file_name: &str) -> Result<i64> {
    let token = token.trim();
    token
        .parse::<i64>()
        .map_err(|_| invalid(file_name, format!("'{}' is not a page number", token)))
}

fn invalid(file_name: &str, reason: String) -> Error {
    Error::InvalidRange {
        file: file_name.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1,3-5", vec![0, 2, 3, 4])]
    #[case("", vec![])]
    #[case("   ", vec![])]
    #[case("7", vec![6])]
    #[case("2-2", vec![1])]
    #[case("3,1,1", vec![2, 0, 0])]
    #[case("5-6, 1", vec![4, 5, 0])]
    #[case(" 2 - 3 ", vec![1, 2])]
    #[case("100000", vec![99_999])]
    fn test_valid_ranges(#[case] input: &str, #[case] expected: Vec<usize>) {
        assert_eq!(parse_page_ranges(input, "doc.pdf").unwrap(), expected);
    }

    #[rstest]
    #[case("0")]
    #[case("3-2")]
    #[case("0-4")]
    #[case("abc")]
    #[case("1,,2")]
    #[case("1-")]
    #[case("-3")]
    #[case("1,2,x")]
    #[case("1-9223372036854775807")]
    #[case("1-2000000000")]
    #[case("100001")]
    #[case("99999-100001")]
    fn test_invalid_ranges(#[case] input: &str) {
        let result = parse_page_ranges(input, "doc.pdf");
        assert!(matches!(result, Err(Error::InvalidRange { .. })), "{input:?} should fail");
    }

    #[test]
    fn test_error_identifies_file() {
        let err = parse_page_ranges("3-2", "Quarterly Report.pdf").unwrap_err();
        match err {
            Error::InvalidRange { file, .. } => assert_eq!(file, "Quarterly Report.pdf"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
