//! Renders breadcrumbs into the size-limited value attached to crash reports.

/// Upper bound for the breadcrumbs crash key.
pub const CRASH_KEY_MAX_BYTES: usize = 1530;

/// Joins the newest events that fit in `max_bytes` with `'\n'`, oldest first.
/// Events are never split; one that does not fit ends the selection.
pub fn render(events: &[String], max_bytes: usize) -> String {
    let mut used = 0usize;
    let mut start = events.len();
    for (idx, event) in events.iter().enumerate().rev() {
        let separator = usize::from(start != events.len());
        let cost = event.len() + separator;
        if used + cost > max_bytes {
            break;
        }
        used += cost;
        start = idx;
    }
    events[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn keeps_newest_whole_events() {
        let rendered = render(&events(&["aaaa", "bbb", "cc"]), 6);
        assert_eq!(rendered, "bbb\ncc");
    }

    #[test]
    fn everything_fits() {
        let rendered = render(&events(&["a", "b"]), CRASH_KEY_MAX_BYTES);
        assert_eq!(rendered, "a\nb");
    }

    #[test]
    fn oversized_newest_event_yields_empty() {
        assert_eq!(render(&events(&["ok", "far too long"]), 4), "");
        assert_eq!(render(&[], 10), "");
    }
}
