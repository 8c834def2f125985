use std::collections::HashMap;

use serde::Serialize;

/// Streamed summary fragments per video id, in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SummaryMap {
    entries: HashMap<String, Vec<String>>,
}

impl SummaryMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment, creating the entry on first sight. Returns the
    /// number of fragments now stored for the video.
    pub fn append(&mut self, video_id: &str, content: String) -> usize {
        let fragments = self.entries.entry(video_id.to_string()).or_default();
        fragments.push(content);
        fragments.len()
    }

    pub fn get(&self, video_id: &str) -> Option<&[String]> {
        self.entries.get(video_id).map(Vec::as_slice)
    }

    /// Fragments rendered as one paragraph.
    pub fn joined(&self, video_id: &str) -> Option<String> {
        self.get(video_id)
            .filter(|fragments| !fragments.is_empty())
            .map(|fragments| fragments.join(" "))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
