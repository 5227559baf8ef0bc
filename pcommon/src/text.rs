//! Text normalization for human-readable output surfaced to callers.
//!
//! Typographic punctuation is folded to ASCII, every line-ending variant becomes
//! `\n`, and any remaining non-printable character other than `\n` and `\t` is
//! dropped. The transformation is idempotent.
//!
//! ```rust
//! use pcommon::{normalize_optional_text, normalize_text};
//!
//! assert_eq!(normalize_text("\u{201c}hi\u{201d} \u{2014} ok\r\n"), "\"hi\" -- ok\n");
//! assert_eq!(normalize_optional_text(None), "");
//! ```

const TYPOGRAPHIC_REPLACEMENTS: &[(char, &str)] = &[
    ('\u{22ee}', "..."),
    ('\u{2026}', "..."),
    ('\u{2013}', "-"),
    ('\u{2014}', "--"),
    ('\u{201c}', "\""),
    ('\u{201d}', "\""),
    ('\u{2018}', "'"),
    ('\u{2019}', "'"),
];

pub fn normalize_text(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if let Some((_, replacement)) = TYPOGRAPHIC_REPLACEMENTS
            .iter()
            .find(|(candidate, _)| *candidate == ch)
        {
            output.push_str(replacement);
            continue;
        }

        match ch {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                output.push('\n');
            }
            '\n' | '\u{0085}' | '\u{2028}' | '\u{2029}' => output.push('\n'),
            '\t' => output.push('\t'),
            ch if is_printable(ch) => output.push(ch),
            _ => {}
        }
    }

    output
}

pub fn normalize_optional_text(text: Option<&str>) -> String {
    text.map(normalize_text).unwrap_or_default()
}

fn is_printable(ch: char) -> bool {
    if ch == ' ' {
        return true;
    }

    !(ch.is_control() || ch.is_whitespace() || is_format_char(ch) || is_private_use(ch))
}

fn is_format_char(ch: char) -> bool {
    matches!(
        ch,
        '\u{00ad}'
            | '\u{0600}'..='\u{0605}'
            | '\u{061c}'
            | '\u{06dd}'
            | '\u{070f}'
            | '\u{180e}'
            | '\u{200b}'..='\u{200f}'
            | '\u{202a}'..='\u{202e}'
            | '\u{2060}'..='\u{2064}'
            | '\u{2066}'..='\u{206f}'
            | '\u{feff}'
            | '\u{fff9}'..='\u{fffb}'
    )
}

fn is_private_use(ch: char) -> bool {
    matches!(
        ch,
        '\u{e000}'..='\u{f8ff}' | '\u{f0000}'..='\u{ffffd}' | '\u{100000}'..='\u{10fffd}'
    )
}
