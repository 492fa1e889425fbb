//! Rich text export

use super::text::PageText;

const HEADER: &str = "{\\rtf1\\ansi\\ansicpg1252\\deff0{\\fonttbl{\\f0\\fswiss Helvetica;}}\\f0\\fs20\n";

pub fn write_rtf(pages: &[PageText]) -> Vec<u8> {
    let mut out = String::from(HEADER);

    for (index, page) in pages.iter().enumerate() {
        if index > 0 {
            out.push_str("\\page\n");
        }
        for line in &page.lines {
            push_escaped(&mut out, line);
            out.push_str("\\par\n");
        }
    }

    out.push('}');
    out.into_bytes()
}

fn push_escaped(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '{' => out.push_str("\\{"),
            '}' => out.push_str("\\}"),
            '\t' => out.push_str("\\tab "),
            c if c.is_ascii() => out.push(c),
            c => {
                // \uN takes a signed 16-bit value; astral characters go as surrogate pairs
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    out.push_str(&format!("\\u{}?", *unit as i16));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(lines: &[&str]) -> String {
        let page = PageText {
            lines: lines.iter().map(|l| l.to_string()).collect(),
        };
        String::from_utf8(write_rtf(&[page])).unwrap()
    }

    #[test]
    fn test_document_structure() {
        let rtf = render(&["Hello"]);
        assert!(rtf.starts_with("{\\rtf1"));
        assert!(rtf.contains("Hello\\par"));
        assert!(rtf.ends_with('}'));
    }

    #[test]
    fn test_control_characters_escaped() {
        let rtf = render(&["a{b}\\c\td"]);
        assert!(rtf.contains("a\\{b\\}\\\\c\\tab d"));
    }

    #[test]
    fn test_unicode_escaped() {
        let rtf = render(&["Café"]);
        assert!(rtf.contains("Caf\\u233?"));
    }

    #[test]
    fn test_pages_separated() {
        let pages = vec![PageText::default(), PageText::default()];
        let rtf = String::from_utf8(write_rtf(&pages)).unwrap();
        assert_eq!(rtf.matches("\\page").count(), 1);
    }
}
