//! Drag-and-drop payload parsing
//!
//! Desktop file managers hand over dropped files as one string: paths
//! separated by spaces, with any path that itself contains a space wrapped
//! in braces, e.g. `{/home/me/My Notes.txt} /home/me/scan.png`.

/// Split a drop payload into paths.
///
/// Existence is not checked here; callers filter on that.
pub fn split_drop_payload(payload: &str) -> Vec<String> {
    let tokens: Vec<String> = if payload.contains('{') {
        scan_braced(payload)
    } else {
        payload.split_whitespace().map(str::to_string).collect()
    };

    tokens
        .into_iter()
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
        .collect()
}

fn scan_braced(payload: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_braces = false;

    for c in payload.chars() {
        match c {
            '{' => in_braces = true,
            '}' => in_braces = false,
            ' ' if !in_braces => tokens.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", &[])]
    #[case("   ", &[])]
    #[case("/a.pdf", &["/a.pdf"])]
    #[case("/a.pdf /b.png", &["/a.pdf", "/b.png"])]
    #[case("/a.pdf\t/b.png\n", &["/a.pdf", "/b.png"])]
    #[case("{/my docs/a.pdf}", &["/my docs/a.pdf"])]
    #[case("{/my docs/a.pdf} /b.png", &["/my docs/a.pdf", "/b.png"])]
    #[case("/b.png {/my docs/a.pdf}", &["/b.png", "/my docs/a.pdf"])]
    #[case("{/x y.txt}  {/z w.txt}", &["/x y.txt", "/z w.txt"])]
    fn test_split_drop_payload(#[case] payload: &str, #[case] expected: &[&str]) {
        assert_eq!(split_drop_payload(payload), expected);
    }
}
