use std::time::Duration;

use crate::{session::SessionState, types::Video};

/// Roughly two terminal lines of card text.
pub const CARD_TEXT_CHARS: usize = 160;

pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        let whole = d.as_secs();
        format!("{}m {}s", whole / 60, whole % 60)
    }
}

/// Cut `text` to `max_chars` characters on a word boundary when possible.
pub fn clamp_text(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let cut: String = text.chars().take(max_chars).collect();
    let cut = match cut.rfind(char::is_whitespace) {
        Some(pos) if pos > max_chars / 2 => &cut[..pos],
        _ => cut.as_str(),
    };
    format!("{}…", cut.trim_end())
}

pub fn format_video_card(index: usize, video: &Video, summary: Option<&str>) -> String {
    let mut output = String::new();
    output.push_str(&format!("{}. {}\n", index + 1, video.name));
    if !video.text.trim().is_empty() {
        output.push_str(&format!("   {}\n", clamp_text(&video.text, CARD_TEXT_CHARS)));
    }
    if !video.link.is_empty() {
        output.push_str(&format!("   Watch on site: {}\n", video.link));
    }
    if !video.cover_image.is_empty() {
        output.push_str(&format!("   Cover: {}\n", video.cover_image));
    }
    if let Some(summary) = summary {
        output.push_str(&format!("   Summary: {}\n", summary));
    }
    output
}

pub fn format_videos_readable(state: &SessionState) -> String {
    if state.videos_loading {
        return "Loading videos...\n".to_string();
    }
    if state.videos.is_empty() {
        return "No videos found.\n".to_string();
    }

    state
        .videos
        .iter()
        .enumerate()
        .map(|(i, video)| {
            let summary = state.summaries.joined(&video.video_id);
            format_video_card(i, video, summary.as_deref())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(id: &str) -> Video {
        Video {
            name: format!("Video {id}"),
            link: format!("https://videos.local/{id}"),
            cover_image: format!("https://img.local/{id}.jpg"),
            text: "Short description".to_string(),
            video_id: id.to_string(),
        }
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(Duration::from_millis(2500)), "2.5s");
        assert_eq!(format_duration(Duration::from_secs(95)), "1m 35s");
    }

    #[test]
    fn minutes_truncate_instead_of_rounding_to_sixty() {
        assert_eq!(format_duration(Duration::from_millis(119_600)), "1m 59s");
        assert_eq!(format_duration(Duration::from_millis(179_999)), "2m 59s");
        assert_eq!(format_duration(Duration::from_secs(3600)), "60m 0s");
    }

    #[test]
    fn clamps_on_word_boundary() {
        assert_eq!(clamp_text("short", 10), "short");
        assert_eq!(clamp_text("one two three four", 12), "one two…");
        assert_eq!(clamp_text("abcdefghijkl", 5), "abcde…");
    }

    #[test]
    fn cards_include_joined_summaries() {
        let mut state = SessionState::new();
        state.reset();
        state.videos = vec![video("a"), video("b")];
        state.videos_loading = false;
        state.summaries.append("b", "First.".to_string());
        state.summaries.append("b", "Second.".to_string());

        let output = format_videos_readable(&state);
        assert!(output.starts_with("1. Video a\n"));
        assert!(output.contains("2. Video b\n"));
        assert!(output.contains("Summary: First. Second.\n"));
        assert_eq!(output.matches("Summary:").count(), 1);
    }

    #[test]
    fn loading_and_empty_states() {
        let mut state = SessionState::new();
        state.reset();
        assert_eq!(format_videos_readable(&state), "Loading videos...\n");

        state.videos_loading = false;
        assert_eq!(format_videos_readable(&state), "No videos found.\n");
    }
}
