/// Returns the longest prefix of `text` holding at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
	match text.char_indices().nth(max_chars) {
		Some((idx, _)) => &text[..idx],
		None => text,
	}
}

/// Display preview: the first `max_chars` characters, suffixed with `...` when cut.
pub fn preview(text: &str, max_chars: usize) -> String {
	let prefix = truncate_chars(text, max_chars);

	if prefix.len() < text.len() { format!("{prefix}...") } else { text.to_string() }
}
