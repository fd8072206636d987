use unicode_width::UnicodeWidthStr;

/// Display width of a string, accounting for CJK double-width, emoji, etc.
pub(crate) fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Truncate a string to fit within `width` display columns, adding ".." if truncated.
pub(crate) fn truncate_display(s: &str, width: usize) -> String {
    if display_width(s) <= width {
        return s.to_string();
    }
    if width < 3 {
        return s
            .chars()
            .next()
            .filter(|ch| unicode_width::UnicodeWidthChar::width(*ch).unwrap_or(0) <= width)
            .map(|ch| ch.to_string())
            .unwrap_or_default();
    }

    let budget = width - 2;
    let mut used = 0;
    let mut out = String::new();
    for ch in s.chars() {
        let cw = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + cw > budget {
            break;
        }
        used += cw;
        out.push(ch);
    }
    out.push_str("..");
    out
}

/// Pad or truncate a string to exactly `width` display columns.
pub(crate) fn pad_right(s: &str, width: usize) -> String {
    let sw = display_width(s);
    if sw > width {
        truncate_display(s, width)
    } else {
        format!("{}{}", s, " ".repeat(width - sw))
    }
}

/// Right-align a count in `width` columns.
pub(crate) fn pad_left(s: &str, width: usize) -> String {
    let sw = display_width(s);
    if sw >= width {
        s.to_string()
    } else {
        format!("{}{}", " ".repeat(width - sw), s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_width_cjk() {
        assert_eq!(display_width("\u{4e16}\u{754c}"), 4);
        assert_eq!(display_width("PC-01"), 5);
    }

    #[test]
    fn truncate_cuts() {
        assert_eq!(truncate_display("abcdef", 5), "abc..");
        assert_eq!(truncate_display("abc", 5), "abc");
        assert_eq!(truncate_display("abc", 2), "a");
    }

    #[test]
    fn pad_right_variants() {
        assert_eq!(pad_right("ab", 5), "ab   ");
        assert_eq!(pad_right("abcde", 5), "abcde");
        assert_eq!(pad_right("abcdef", 5), "abc..");
    }

    #[test]
    fn pad_left_counts() {
        assert_eq!(pad_left("7", 4), "   7");
        assert_eq!(pad_left("12345", 4), "12345");
    }
}
