//! Console formatting helpers

/// Cuts `text` to at most `max_chars` characters for display, marking the cut
/// with `...`. The underlying data is never modified.
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Renders a 0..1 utilization ratio as a percentage with two decimals.
pub fn format_percent(ratio: f64) -> String {
    format!("{:.2}%", ratio * 100.0)
}

/// Last segment of a `/`-separated resource path such as
/// `https://www.googleapis.com/compute/v1/projects/p/zones/us-central1-a`.
pub fn last_path_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::{format_percent, last_path_segment, preview};

    #[test]
    fn preview_keeps_short_text() {
        assert_eq!(preview("gs://bucket-a", 200), "gs://bucket-a");
    }

    #[test]
    fn preview_cuts_on_char_boundary() {
        assert_eq!(preview("héllo wörld", 5), "héllo...");
    }

    #[test]
    fn formats_ratio_as_percent() {
        assert_eq!(format_percent(0.4567), "45.67%");
        assert_eq!(format_percent(0.0), "0.00%");
        assert_eq!(format_percent(1.0), "100.00%");
    }

    #[test]
    fn extracts_zone_from_resource_url() {
        assert_eq!(
            last_path_segment("https://www.googleapis.com/compute/v1/projects/demo/zones/us-central1-a"),
            "us-central1-a"
        );
        assert_eq!(last_path_segment("europe-west1-b"), "europe-west1-b");
        assert_eq!(last_path_segment(""), "");
    }
}
