use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Reads the trailing `max_lines` non-empty lines of a breadcrumb file.
/// A missing file is an empty history.
pub fn load_previous_events(path: &Path, max_lines: usize) -> io::Result<Vec<String>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let reader = BufReader::new(File::open(path)?);
    let mut lines = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let line = line.trim_end_matches('\r');
        if !line.is_empty() {
            lines.push(line.to_string());
        }
    }
    let skip = lines.len().saturating_sub(max_lines);
    Ok(lines.split_off(skip))
}
