/// Removes a Markdown code fence wrapped around a model reply.
///
/// The text counts as fenced when its first non-blank line opens a fence
/// (three or more backticks or tildes, optionally followed by an info string)
/// and its last non-blank line closes it with the same character at least as
/// many times. In that case everything between the two fence lines is
/// returned. Any other text is returned unchanged.
#[must_use]
pub fn extract(raw: &str) -> String {
    // (byte offset of the line start, line without its terminator)
    let lines: Vec<(usize, &str)> = raw
        .split_inclusive('\n')
        .scan(0, |offset, line| {
            let start = *offset;
            *offset += line.len();
            Some((start, strip_terminator(line)))
        })
        .collect();

    let first = lines.iter().position(|(_, l)| !l.trim().is_empty());
    let last = lines.iter().rposition(|(_, l)| !l.trim().is_empty());
    let (Some(first), Some(last)) = (first, last) else {
        return raw.to_string();
    };
    if first >= last {
        return raw.to_string();
    }

    let Some((marker, width)) = opening_fence(lines[first].1) else {
        return raw.to_string();
    };
    if !closes_fence(lines[last].1, marker, width) {
        return raw.to_string();
    }

    // Body bytes are returned untouched, minus the terminator before the closing fence.
    let body = &raw[lines[first + 1].0..lines[last].0];
    strip_terminator(body).to_string()
}

fn strip_terminator(line: &str) -> &str {
    line.strip_suffix('\n')
        .map_or(line, |l| l.strip_suffix('\r').unwrap_or(l))
}

fn opening_fence(line: &str) -> Option<(char, usize)> {
    let trimmed = line.trim_start();
    let marker = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let width = trimmed.chars().take_while(|c| *c == marker).count();
    if width < 3 {
        return None;
    }
    // A backtick fence's info string may not itself contain backticks.
    if marker == '`' && trimmed[width..].contains('`') {
        return None;
    }
    Some((marker, width))
}

fn closes_fence(line: &str, marker: char, width: usize) -> bool {
    let trimmed = line.trim();
    trimmed.chars().count() >= width && trimmed.chars().all(|c| c == marker)
}
