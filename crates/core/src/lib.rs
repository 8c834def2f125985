//! searchstream Core Library
//!
//! Client side of the video search event stream: decodes server-sent events,
//! folds them into render-ready session state and guards each session with a
//! safety deadline.

pub mod answer;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod format;
pub mod metrics;
pub mod session;
pub mod sse;
pub mod summary;
pub mod types;

// Re-export commonly used items at crate root
pub use answer::AnswerText;
pub use config::{Config, ConfigLayer};
pub use endpoint::{Endpoint, QueryParams, SearchRequest};
pub use error::{Result, SearchStreamError};
pub use format::{format_duration, format_video_card, format_videos_readable};
pub use metrics::{MetricsSnapshot, StreamMetrics};
pub use session::{
    IgnoreReason, Phase, SessionSettings, SessionState, SessionUpdate, StartOutcome,
    StreamEvent, StreamSessionController,
};
pub use sse::{Connector, EventStream, HttpConnector, SseDecoder, SseEvent};
pub use summary::SummaryMap;
pub use types::{SummaryChunk, Video};
