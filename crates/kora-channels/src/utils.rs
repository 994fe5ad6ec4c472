//! Helpers shared by channel implementations.

/// Split text into chunks of at most `max_len` characters.
///
/// A chunk ends after the last whitespace found within the final quarter of
/// the limit; without one, the split is hard at `max_len` characters.
/// Concatenating the chunks gives back the input exactly.
pub fn split_message(text: &str, max_len: usize) -> Vec<&str> {
    let max_len = max_len.max(1);
    let lookback = (max_len / 4).max(1);

    let mut chunks = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        // Byte offset of the first char past the limit.
        let hard = match rest.char_indices().nth(max_len) {
            Some((i, _)) => i,
            None => {
                chunks.push(rest);
                break;
            }
        };

        let cut = if rest[hard..].starts_with(char::is_whitespace) {
            hard
        } else {
            let floor = rest
                .char_indices()
                .nth(max_len - lookback)
                .map(|(i, _)| i)
                .unwrap_or(0);
            rest[..hard]
                .char_indices()
                .rev()
                .take_while(|(i, _)| *i >= floor)
                .find(|(_, c)| c.is_whitespace())
                .map(|(i, c)| i + c.len_utf8())
                .unwrap_or(hard)
        };

        let (chunk, tail) = rest.split_at(cut);
        chunks.push(chunk);
        rest = tail;
    }

    chunks
}
