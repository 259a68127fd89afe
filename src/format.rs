//! Human readable formatting for sizes, bitrates, durations and index ranges

const KB: u64 = 1024;
const MB: u64 = KB * 1024;
const GB: u64 = MB * 1024;

/// Format a byte count, e.g. "1.5 GB", "700 MB"
pub fn size_of(size: u64) -> String {
    if size > GB {
        format!("{:.1} GB", size as f64 / GB as f64)
    } else if size > MB {
        format!("{:.0} MB", size as f64 / MB as f64)
    } else if size > KB {
        format!("{:.0} KB", size as f64 / KB as f64)
    } else {
        format!("{} B", size)
    }
}

/// Format a bitrate in bits per second, e.g. "8.5 Mb/s"
pub fn bitrate_of(bitrate: u64) -> String {
    if bitrate > 1_000_000 {
        format!("{:.1} Mb/s", bitrate as f64 / 1_000_000.0)
    } else if bitrate > 1_000 {
        format!("{:.0} Kb/s", bitrate as f64 / 1_000.0)
    } else {
        format!("{} b/s", bitrate)
    }
}

/// Format a duration in seconds as h:mm:ss
pub fn duration_of(duration: f64) -> String {
    let total = duration.max(0.0) as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{}:{:02}:{:02}", hours, minutes, seconds)
}

/// Collapse sorted indexes into ranges, e.g. [1, 2, 3, 5] -> "1-3,5"
pub fn ranges(indexes: &[u32]) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut iter = indexes.iter().copied().peekable();

    while let Some(first) = iter.next() {
        let mut last = first;
        while let Some(&next) = iter.peek() {
            if next != last + 1 {
                break;
            }
            last = next;
            iter.next();
        }

        if last == first {
            parts.push(first.to_string());
        } else {
            parts.push(format!("{}-{}", first, last));
        }
    }

    parts.join(",")
}
