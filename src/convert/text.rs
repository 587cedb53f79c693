//! Plain text to PDF conversion
//!
//! One input line maps to exactly one rendered line; long lines are not
//! wrapped. Text is set in Helvetica using WinAnsi encoding, so characters
//! outside that code page are rendered as `?`.

use std::fs;
use std::path::Path;
use std::time::Instant;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, StringFormat};
use tracing::info;

use crate::error::{Error, Result};
use crate::layout::{PageDimensions, TextLayout};
use crate::pdf::create::{helvetica_font, save_document, DocumentBuilder};

/// Convert a UTF-8 text file to a letter-size PDF
pub fn text_to_pdf(input: &Path, output: &Path) -> Result<()> {
    let start = Instant::now();

    let text = fs::read_to_string(input).map_err(|e| Error::conversion(input, e))?;
    let mut doc = render_text(&text, &TextLayout::default()).map_err(|e| Error::conversion(input, e))?;
    save_document(&mut doc, output).map_err(|e| Error::conversion(input, e))?;

    info!(
        "Converted {} to {} in {:.2}s",
        input.display(),
        output.display(),
        start.elapsed().as_secs_f64()
    );
    Ok(())
}

/// Lay out `text` line by line, starting a new page near the bottom margin
pub(crate) fn render_text(text: &str, layout: &TextLayout) -> Result<Document> {
    let lines: Vec<&str> = text.lines().map(str::trim_end).collect();

    let mut builder = DocumentBuilder::new(PageDimensions::letter());
    let font_id = builder.add_object(helvetica_font());

    let mut remaining = lines.as_slice();
    for count in layout.paginate(lines.len()) {
        let (page_lines, rest) = remaining.split_at(count);
        remaining = rest;

        let resources = dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        };
        builder.add_page(page_content(page_lines, layout), resources)?;
    }

    Ok(builder.finish())
}

fn page_content(lines: &[&str], layout: &TextLayout) -> Content {
    let mut operations = Vec::new();
    let mut y = layout.top.pt();

    for line in lines {
        if !line.is_empty() {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new(
                "Tf",
                vec!["F1".into(), Object::Real(layout.font_size)],
            ));
            operations.push(Operation::new(
                "Td",
                vec![Object::Real(layout.left.pt()), Object::Real(y)],
            ));
            operations.push(Operation::new(
                "Tj",
                vec![Object::String(encode_win_ansi(line), StringFormat::Literal)],
            ));
            operations.push(Operation::new("ET", vec![]));
        }
        y -= layout.line_height.pt();
    }

    Content { operations }
}

/// Encode `text` for a WinAnsiEncoding font
fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\t' => b' ',
            ' '..='~' => c as u8,
            '\u{a0}'..='\u{ff}' => c as u32 as u8,
            '€' => 0x80,
            '‚' => 0x82,
            '„' => 0x84,
            '…' => 0x85,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '™' => 0x99,
            _ => b'?',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_encode_win_ansi() {
        assert_eq!(encode_win_ansi("abc (1)"), b"abc (1)".to_vec());
        assert_eq!(encode_win_ansi("café"), vec![b'c', b'a', b'f', 0xe9]);
        assert_eq!(encode_win_ansi("“ok”"), vec![0x93, b'o', b'k', 0x94]);
        assert_eq!(encode_win_ansi("日本"), b"??".to_vec());
        assert_eq!(encode_win_ansi("a\tb"), b"a b".to_vec());
    }

    #[test]
    fn test_one_line_per_input_line() {
        let doc = render_text("first\n\nthird\n", &TextLayout::default()).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 1);

        let content = doc.get_page_content(pages[&1]).unwrap();
        let ops = Content::decode(&content).unwrap().operations;
        let shown = ops.iter().filter(|op| op.operator == "Tj").count();
        assert_eq!(shown, 2);

        // Third line sits two line-heights below the first
        let positions: Vec<f32> = ops
            .iter()
            .filter(|op| op.operator == "Td")
            .map(|op| op.operands[1].as_float().unwrap())
            .collect();
        assert_eq!(positions, vec![750.0, 720.0]);
    }

    #[test]
    fn test_long_text_starts_new_pages() {
        let text: String = (1..=100).map(|i| format!("line {i}\n")).collect();
        let doc = render_text(&text, &TextLayout::default()).unwrap();
        assert_eq!(doc.get_pages().len(), 3);
    }

    #[test]
    fn test_empty_text_gives_blank_page() {
        let doc = render_text("", &TextLayout::default()).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn test_text_to_pdf_writes_file() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("notes.txt");
        let output = temp_dir.path().join("notes.pdf");
        fs::write(&input, "hello\nworld\n").unwrap();

        text_to_pdf(&input, &output).unwrap();
        assert_eq!(Document::load(&output).unwrap().get_pages().len(), 1);
    }

    #[test]
    fn test_non_utf8_is_conversion_failure() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("latin1.txt");
        fs::write(&input, [0x66, 0x6f, 0xff, 0xfe]).unwrap();

        let result = text_to_pdf(&input, &temp_dir.path().join("out.pdf"));
        assert!(matches!(result, Err(Error::ConversionFailure { .. })));
    }
}
