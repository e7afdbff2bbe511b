// String helpers shared by the passes.

/// Split on commas that are not nested in parentheses, brackets or strings.
pub fn split_on_top_level_commas(text: &str) -> Vec<&str> {
    let mut result = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut prev = 0;

    for (i, ch) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            _ if quote == Some(ch) => quote = None,
            _ if quote.is_some() => {}
            '"' | '\'' => quote = Some(ch),
            '(' | '[' => depth += 1,
            ')' | ']' => depth -= 1,
            ',' if depth <= 0 => {
                result.push(&text[prev..i]);
                prev = i + 1;
            }
            _ => {}
        }
    }

    result.push(&text[prev..]);
    result
}

pub fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}

/// True for a plain CSS identifier such as `foo`, `-bar` or `_baz-1`.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    let first = match chars.next() {
        Some(c) => c,
        None => return false,
    };
    let valid_start = match first {
        '-' => matches!(chars.clone().next(), Some(c) if !c.is_ascii_digit() && is_ident_char(c)),
        c => !c.is_ascii_digit() && is_ident_char(c),
    };
    valid_start && chars.all(is_ident_char)
}

/// Decode the escapes of a CSS identifier: `\31 x` is `1x`, `\:` is `:`.
///
/// A hex escape takes up to six digits and swallows one whitespace
/// terminator, `\r\n` counting as one.
pub fn unescape_identifier(raw: &str) -> String {
    if !raw.contains('\\') {
        return raw.to_string();
    }
    let chars: Vec<char> = raw.chars().collect();
    let mut out = String::with_capacity(raw.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c != '\\' {
            out.push(c);
            i += 1;
            continue;
        }
        i += 1;
        let digits = hex_escape_len(&chars, i);
        if digits == 0 {
            out.push(chars.get(i).copied().unwrap_or('\u{FFFD}'));
            i += 1;
            continue;
        }
        let hex: String = chars[i..i + digits].iter().collect();
        let decoded = u32::from_str_radix(&hex, 16)
            .ok()
            .filter(|&code| code != 0)
            .and_then(char::from_u32)
            .unwrap_or('\u{FFFD}');
        out.push(decoded);
        i = skip_escape_terminator(&chars, i + digits);
    }
    out
}

/// Number of hex digits (at most six) of an escape starting at `start`.
pub(crate) fn hex_escape_len(chars: &[char], start: usize) -> usize {
    chars
        .iter()
        .skip(start)
        .take(6)
        .take_while(|c| c.is_ascii_hexdigit())
        .count()
}

/// Index past the optional whitespace that ends a hex escape.
pub(crate) fn skip_escape_terminator(chars: &[char], i: usize) -> usize {
    match chars.get(i).copied() {
        Some('\r') if chars.get(i + 1) == Some(&'\n') => i + 2,
        Some(' ' | '\t' | '\n' | '\r' | '\x0c') => i + 1,
        _ => i,
    }
}

/// Escape `name` for use as a class or id in a selector.
pub fn escape_identifier(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len());
    for (i, &c) in chars.iter().enumerate() {
        let leading_digit = c.is_ascii_digit() && (i == 0 || (i == 1 && chars[0] == '-'));
        if c == '\0' {
            out.push('\u{FFFD}');
        } else if (c.is_ascii() && c.is_control()) || leading_digit {
            out.push_str(&format!("\\{:x} ", c as u32));
        } else if c == '-' && i == 0 && chars.len() == 1 {
            out.push_str("\\-");
        } else if c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii() {
            out.push(c);
        } else {
            out.push('\\');
            out.push(c);
        }
    }
    out
}

/// Strip one level of matching quotes.
pub fn unquote(s: &str) -> &str {
    let s = s.trim();
    let bytes = s.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if first == last && (first == b'"' || first == b'\'') {
            return &s[1..s.len() - 1];
        }
    }
    s
}

pub fn is_quoted(s: &str) -> bool {
    let s = s.trim();
    s.len() >= 2 && unquote(s).len() == s.len() - 2
}

/// Rewrite the whole identifiers of a value through `replace`.
///
/// Quoted strings and `url(...)` contents are copied verbatim. Identifiers
/// that are part of a number, a hash (`#fff`), or a function name are never
/// offered to `replace`.
pub fn rewrite_identifiers<F>(text: &str, mut replace: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    let mut out = String::with_capacity(text.len());
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut i = 0;

    while i < chars.len() {
        let (start, c) = chars[i];
        if c == '"' || c == '\'' {
            let mut j = i + 1;
            while j < chars.len() {
                let ch = chars[j].1;
                if ch == '\\' {
                    j += 2;
                    continue;
                }
                j += 1;
                if ch == c {
                    break;
                }
            }
            let end = chars.get(j).map(|&(idx, _)| idx).unwrap_or(text.len());
            out.push_str(&text[start..end]);
            i = j;
            continue;
        }

        if !is_ident_char(c) {
            out.push(c);
            i += 1;
            continue;
        }

        let mut j = i;
        while j < chars.len() && is_ident_char(chars[j].1) {
            j += 1;
        }
        let end = chars.get(j).map(|&(idx, _)| idx).unwrap_or(text.len());
        let word = &text[start..end];
        let prev = if i > 0 { Some(chars[i - 1].1) } else { None };
        let next = chars.get(j).map(|&(_, ch)| ch);

        if next == Some('(') && word.eq_ignore_ascii_case("url") {
            // Copy `url(...)` through its closing paren.
            let mut k = j;
            while k < chars.len() && chars[k].1 != ')' {
                k += 1;
            }
            let close = chars.get(k + 1).map(|&(idx, _)| idx).unwrap_or(text.len());
            out.push_str(&text[start..close]);
            i = k + 1;
            continue;
        }

        let candidate = is_identifier(word)
            && next != Some('(')
            && !matches!(prev, Some('#') | Some('.') | Some('@') | Some('\\'));
        match candidate.then(|| replace(word)).flatten() {
            Some(replacement) => out.push_str(&replacement),
            None => out.push_str(word),
        }
        i = j;
    }

    out
}
