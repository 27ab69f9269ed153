use crate::upload::util::{line_ending, split_lines};

const MARKER: &str = "---";

fn is_marker(line: &str) -> bool {
    line.trim_end() == MARKER
}

fn is_key(line: &str, key: &str) -> bool {
    line.strip_prefix(key)
        .is_some_and(|rest| rest.trim_start().starts_with(':'))
}

/// Line range `(open, close)` of the leading `---` block, if any.
fn metadata_block(lines: &[&str]) -> Option<(usize, usize)> {
    if !lines.first().is_some_and(|line| is_marker(line.trim_start_matches('\u{feff}'))) {
        return None;
    }
    let close = lines.iter().skip(1).position(|line| is_marker(line))? + 1;
    Some((0, close))
}

/// Stamp `lastmod: <now>` into the leading metadata block.
///
/// An existing `lastmod` is rewritten; otherwise the field goes right after
/// `date`, or just before the closing marker. Documents without a block come
/// back unchanged.
pub fn touch_last_modified(document: &str, now: &str) -> String {
    let lines = split_lines(document);
    let Some((open, close)) = metadata_block(&lines) else {
        log::debug!("no metadata block; lastmod left untouched");
        return document.to_string();
    };

    let stamped = format!("lastmod: {now}");
    let body = open + 1..close;
    let mut out = lines.iter().map(|line| line.to_string()).collect::<Vec<_>>();

    if let Some(idx) = body.clone().find(|&i| is_key(lines[i], "lastmod")) {
        out[idx] = stamped;
    } else if let Some(idx) = body.clone().find(|&i| is_key(lines[i], "date")) {
        out.insert(idx + 1, stamped);
    } else {
        out.insert(close, stamped);
    }
    out.join(line_ending(document))
}
