//! Rendering of the tool's rich-text chunks into tooltip markup.
//!
//! The report's `formatted` field carries styled text chunks; panels and
//! tooltips want a single HTML string. Whitespace is made non-collapsing
//! (`&nbsp;`) and newlines become `<br>` so the tool's hand-aligned
//! squiggle art survives an HTML renderer.

use crate::types::RichChunk;

/// Concatenate chunks into markup, in order.
#[must_use]
pub fn render(chunks: &[RichChunk]) -> String {
    let mut out = String::new();
    for chunk in chunks {
        let mut piece = escape(&chunk.text);
        if let Some(color) = &chunk.color {
            piece = format!("<span style=\"color: {color}\">{piece}</span>");
        }
        if let Some(link) = &chunk.link {
            piece = format!("<a href=\"{link}\">{piece}</a>");
        }
        out.push_str(&piece);
    }
    out
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\n' => out.push_str("<br>"),
            c if c.is_whitespace() => out.push_str("&nbsp;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(text: &str) -> RichChunk {
        RichChunk {
            text: text.to_string(),
            color: None,
            link: None,
        }
    }

    #[test]
    fn test_plain_chunks_concatenate_in_order() {
        let rendered = render(&[chunk("NoDebug.Log:"), chunk("remove"), chunk("it")]);
        assert_eq!(rendered, "NoDebug.Log:removeit");
    }

    #[test]
    fn test_whitespace_becomes_non_breaking() {
        assert_eq!(render(&[chunk("a b")]), "a&nbsp;b");
        assert_eq!(render(&[chunk("a\tb")]), "a&nbsp;b");
    }

    #[test]
    fn test_newline_becomes_line_break() {
        assert_eq!(render(&[chunk("5| x\n   ^")]), "5|&nbsp;x<br>&nbsp;&nbsp;&nbsp;^");
    }

    #[test]
    fn test_html_metacharacters_escaped() {
        assert_eq!(render(&[chunk("a<b&c>d")]), "a&lt;b&amp;c&gt;d");
    }

    #[test]
    fn test_color_wraps_in_span() {
        let styled = RichChunk {
            text: "Debug.log".to_string(),
            color: Some("#FF0000".to_string()),
            link: None,
        };
        assert_eq!(
            render(&[styled]),
            "<span style=\"color: #FF0000\">Debug.log</span>"
        );
    }

    #[test]
    fn test_link_renders_as_hyperlink() {
        let linked = RichChunk {
            text: "NoDebug.Log".to_string(),
            color: Some("#FF0000".to_string()),
            link: Some("https://example.test/NoDebug.Log".to_string()),
        };
        assert_eq!(
            render(&[linked]),
            "<a href=\"https://example.test/NoDebug.Log\">\
             <span style=\"color: #FF0000\">NoDebug.Log</span></a>"
        );
    }

    #[test]
    fn test_empty_input_renders_empty() {
        assert_eq!(render(&[]), "");
    }
}
