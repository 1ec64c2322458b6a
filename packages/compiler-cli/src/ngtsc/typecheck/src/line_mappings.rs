// Line Mappings

/// Offsets at which each line of `text` starts. The first line always starts at 0.
pub fn compute_line_starts(text: &str) -> Vec<usize> {
    let mut starts = vec![0];
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\r' => {
                if bytes.get(i + 1) == Some(&b'\n') {
                    i += 1;
                }
                starts.push(i + 1);
            }
            b'\n' => starts.push(i + 1),
            _ => {}
        }
        i += 1;
    }
    starts
}

/// Zero-based `(line, character)` of `position`.
pub fn get_line_and_character_from_position(line_starts: &[usize], position: usize) -> (usize, usize) {
    let line = match line_starts.binary_search(&position) {
        Ok(line) => line,
        Err(next) => next.saturating_sub(1),
    };
    let line_start = line_starts.get(line).copied().unwrap_or(0);
    (line, position - line_start.min(position))
}
