/// Convert a string to a sanitized filename
pub fn sanitize_filename(name: &str) -> String {
    let mut name = name.replace("http://", "").replace("https://", "");
    name = name.replace(['/', ':', '?', '&', '=', '#', '%'], "_");

    // Limit filename length
    if name.chars().count() > 100 {
        name.chars().take(100).collect()
    } else {
        name
    }
}

/// Extracts a character window around a byte range of `text`.
///
/// Returns up to `margin` characters before `start` and after `end`, always
/// on UTF-8 character boundaries and never outside the string.
pub fn char_window(text: &str, start: usize, end: usize, margin: usize) -> &str {
    let mut window_start = start;
    for _ in 0..margin {
        match text[..window_start].char_indices().next_back() {
            Some((idx, _)) => window_start = idx,
            None => break,
        }
    }

    let mut window_end = end;
    for _ in 0..margin {
        match text[window_end..].chars().next() {
            Some(c) => window_end += c.len_utf8(),
            None => break,
        }
    }

    &text[window_start..window_end]
}
