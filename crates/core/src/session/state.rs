use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    answer::AnswerText,
    metrics::StreamMetrics,
    session::StreamEvent,
    summary::SummaryMap,
    types::{SummaryChunk, Video},
};

pub const NO_RESULTS_MARKER: &str = "\n\n[No videos found for your question.]";
pub const SAFETY_MARKER: &str = "\n\n[STREAM FINALIZED FOR SAFETY]";
pub const ERROR_SEPARATOR: &str = "\n\n";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Streaming,
    Completed,
    NoResults,
    Errored,
    TimedOut,
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Phase::Completed | Phase::NoResults | Phase::Errored | Phase::TimedOut
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Streaming => "streaming",
            Phase::Completed => "completed",
            Phase::NoResults => "no results",
            Phase::Errored => "stream error",
            Phase::TimedOut => "timed out",
        }
    }
}

/// What a single event changed, for incremental rendering.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    AnswerAppended(String),
    VideosReplaced(usize),
    SummaryAppended { video_id: String, content: String },
    Dropped { event_type: String, reason: String },
    Unrouted { event_type: String },
    Finished { phase: Phase, marker: &'static str },
    Ignored,
}

/// Render-ready state of the current (or last) session.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionState {
    pub phase: Phase,
    pub answer: AnswerText,
    pub final_text: Option<String>,
    pub videos: Vec<Video>,
    pub videos_loading: bool,
    pub summaries: SummaryMap,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_streaming(&self) -> bool {
        self.phase == Phase::Streaming
    }

    /// Start of a submission: everything from the previous session goes.
    pub fn reset(&mut self) {
        self.phase = Phase::Streaming;
        self.answer.clear();
        self.final_text = None;
        self.videos.clear();
        self.videos_loading = true;
        self.summaries.clear();
    }

    /// Text shown in the output area: the live answer, or the snapshot taken
    /// at `end` when there is no live text.
    pub fn display_text(&self) -> &str {
        if !self.answer.is_empty() {
            return self.answer.as_str();
        }
        self.final_text.as_deref().unwrap_or_default()
    }

    pub fn reduce(&mut self, event: StreamEvent, metrics: &StreamMetrics) -> SessionUpdate {
        if !self.is_streaming() {
            debug!(
                event_type = event.event_type(),
                phase = self.phase.label(),
                "event outside a live session"
            );
            return SessionUpdate::Ignored;
        }

        match event {
            StreamEvent::Videos(payload) => self.on_videos(&payload, metrics),
            StreamEvent::Answer(chunk) => SessionUpdate::AnswerAppended(self.answer.push_chunk(&chunk)),
            StreamEvent::Summary(payload) => self.on_summary(&payload, metrics),
            StreamEvent::End => {
                self.final_text = Some(self.answer.as_str().to_string());
                self.finish(Phase::Completed, "")
            }
            StreamEvent::TransportError(reason) => {
                warn!(%reason, "event stream failed");
                self.finish(Phase::Errored, ERROR_SEPARATOR)
            }
            StreamEvent::Timeout => {
                warn!("no end event before the deadline, closing the stream");
                self.finish(Phase::TimedOut, SAFETY_MARKER)
            }
            StreamEvent::Unrouted { event_type } => {
                metrics.record_unrouted();
                debug!(%event_type, "unrouted event");
                SessionUpdate::Unrouted { event_type }
            }
        }
    }

    fn on_videos(&mut self, payload: &str, metrics: &StreamMetrics) -> SessionUpdate {
        let value: Value = match serde_json::from_str(payload) {
            Ok(value) => value,
            Err(e) => return Self::dropped(StreamEvent::VIDEOS, e, metrics),
        };

        let items = match value {
            Value::Array(items) if !items.is_empty() => items,
            _ => {
                self.videos_loading = false;
                return self.finish(Phase::NoResults, NO_RESULTS_MARKER);
            }
        };

        let videos = match items
            .into_iter()
            .map(serde_json::from_value::<Video>)
            .collect::<Result<Vec<_>, _>>()
        {
            Ok(videos) => videos,
            Err(e) => return Self::dropped(StreamEvent::VIDEOS, e, metrics),
        };

        self.videos = videos;
        self.videos_loading = false;
        SessionUpdate::VideosReplaced(self.videos.len())
    }

    fn on_summary(&mut self, payload: &str, metrics: &StreamMetrics) -> SessionUpdate {
        let chunk: SummaryChunk = match serde_json::from_str(payload) {
            Ok(chunk) => chunk,
            Err(e) => return Self::dropped(StreamEvent::SUMMARY, e, metrics),
        };

        self.summaries.append(&chunk.video_id, chunk.content.clone());
        SessionUpdate::SummaryAppended {
            video_id: chunk.video_id,
            content: chunk.content,
        }
    }

    fn finish(&mut self, phase: Phase, marker: &'static str) -> SessionUpdate {
        self.answer.push_raw(marker);
        self.phase = phase;
        SessionUpdate::Finished { phase, marker }
    }

    fn dropped(
        event_type: &'static str,
        error: serde_json::Error,
        metrics: &StreamMetrics,
    ) -> SessionUpdate {
        metrics.record_malformed();
        warn!(event_type, %error, "dropping malformed payload");
        SessionUpdate::Dropped {
            event_type: event_type.to_string(),
            reason: error.to_string(),
        }
    }
}
