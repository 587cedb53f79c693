//! Shell command parsing

use std::fmt;

/// One line of shell input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add(Vec<String>),
    /// Raw drag-and-drop payload
    Drop(String),
    List,
    Remove(usize),
    Up(usize),
    Down(usize),
    /// File position and range text (empty clears)
    Pages(usize, String),
    Merge(Option<String>),
    Status,
    Wait,
    Help,
    Quit,
}

/// Why a line could not be parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    Empty,
    Unknown(String),
    Usage(&'static str),
    UnterminatedQuote,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Empty => write!(f, "empty command"),
            ParseError::Unknown(name) => {
                write!(f, "unknown command '{}' (type 'help' for a list)", name)
            }
            ParseError::Usage(usage) => write!(f, "usage: {}", usage),
            ParseError::UnterminatedQuote => write!(f, "unterminated quote"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Parse one input line.
///
/// Positions are 1-based as typed and returned 0-based.
pub fn parse_command(line: &str) -> Result<Command, ParseError> {
    let trimmed = line.trim();
    let (name, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (trimmed, ""),
    };

    match name.to_ascii_lowercase().as_str() {
        "" => Err(ParseError::Empty),
        "add" => {
            let paths = split_words(rest)?;
            if paths.is_empty() {
                return Err(ParseError::Usage("add <file>..."));
            }
            Ok(Command::Add(paths))
        }
        // Payload is passed through untouched so braces survive
        "drop" => {
            if rest.is_empty() {
                return Err(ParseError::Usage("drop <payload>"));
            }
            Ok(Command::Drop(rest.to_string()))
        }
        "list" | "ls" => Ok(Command::List),
        "remove" | "rm" => Ok(Command::Remove(position(rest, "remove <n>")?)),
        "up" => Ok(Command::Up(position(rest, "up <n>")?)),
        "down" => Ok(Command::Down(position(rest, "down <n>")?)),
        "pages" => {
            const USAGE: &str = "pages <n> [ranges]";
            let (index, ranges) = match rest.split_once(char::is_whitespace) {
                Some((index, ranges)) => (index, ranges.trim()),
                None => (rest, ""),
            };
            Ok(Command::Pages(position(index, USAGE)?, ranges.to_string()))
        }
        "merge" => {
            let mut words = split_words(rest)?;
            match words.len() {
                0 => Ok(Command::Merge(None)),
                1 => Ok(Command::Merge(words.pop())),
                _ => Err(ParseError::Usage("merge [output.pdf]")),
            }
        }
        "status" => Ok(Command::Status),
        "wait" => Ok(Command::Wait),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        other => Err(ParseError::Unknown(other.to_string())),
    }
}

fn position(text: &str, usage: &'static str) -> Result<usize, ParseError> {
    match text.trim().parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(ParseError::Usage(usage)),
    }
}

/// Split on whitespace, keeping quoted sections together
fn split_words(text: &str) -> Result<Vec<String>, ParseError> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut in_word = false;

    for c in text.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_word = true;
            }
            None if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            None => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if quote.is_some() {
        return Err(ParseError::UnterminatedQuote);
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("list", Command::List)]
    #[case("  LS  ", Command::List)]
    #[case("remove 2", Command::Remove(1))]
    #[case("up 1", Command::Up(0))]
    #[case("down 3", Command::Down(2))]
    #[case("pages 1 1,3-5", Command::Pages(0, "1,3-5".to_string()))]
    #[case("pages 2 1, 3 - 5", Command::Pages(1, "1, 3 - 5".to_string()))]
    #[case("pages 2", Command::Pages(1, String::new()))]
    #[case("merge", Command::Merge(None))]
    #[case("merge \"out file.pdf\"", Command::Merge(Some("out file.pdf".to_string())))]
    #[case("drop {/a b.pdf} /c.png", Command::Drop("{/a b.pdf} /c.png".to_string()))]
    #[case("quit", Command::Quit)]
    fn test_parse_command(#[case] line: &str, #[case] expected: Command) {
        assert_eq!(parse_command(line).unwrap(), expected);
    }

    #[test]
    fn test_add_with_quotes() {
        let command = parse_command(r#"add a.pdf "my notes.txt" 'x y.png' """#).unwrap();
        assert_eq!(
            command,
            Command::Add(vec![
                "a.pdf".to_string(),
                "my notes.txt".to_string(),
                "x y.png".to_string(),
                String::new(),
            ])
        );
    }

    #[rstest]
    #[case("", ParseError::Empty)]
    #[case("frobnicate", ParseError::Unknown("frobnicate".to_string()))]
    #[case("add", ParseError::Usage("add <file>..."))]
    #[case("remove 0", ParseError::Usage("remove <n>"))]
    #[case("up x", ParseError::Usage("up <n>"))]
    #[case("pages", ParseError::Usage("pages <n> [ranges]"))]
    #[case("merge a.pdf b.pdf", ParseError::Usage("merge [output.pdf]"))]
    #[case("add \"open", ParseError::UnterminatedQuote)]
    fn test_parse_errors(#[case] line: &str, #[case] expected: ParseError) {
        assert_eq!(parse_command(line).unwrap_err(), expected);
    }
}
