use crate::sse::SseEvent;

/// Everything that can move a session forward: the named server events plus
/// the two client-side terminal conditions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Videos(String),
    Answer(String),
    Summary(String),
    End,
    TransportError(String),
    Timeout,
    Unrouted { event_type: String },
}

impl StreamEvent {
    pub const VIDEOS: &'static str = "videos";
    pub const ANSWER: &'static str = "answer";
    pub const SUMMARY: &'static str = "summary";
    pub const END: &'static str = "end";

    pub fn from_sse(event: SseEvent) -> Self {
        match event.event_type.as_str() {
            Self::VIDEOS => StreamEvent::Videos(event.data),
            Self::ANSWER => StreamEvent::Answer(event.data),
            Self::SUMMARY => StreamEvent::Summary(event.data),
            Self::END => StreamEvent::End,
            _ => StreamEvent::Unrouted {
                event_type: event.event_type,
            },
        }
    }

    pub fn event_type(&self) -> &str {
        match self {
            StreamEvent::Videos(_) => Self::VIDEOS,
            StreamEvent::Answer(_) => Self::ANSWER,
            StreamEvent::Summary(_) => Self::SUMMARY,
            StreamEvent::End => Self::END,
            StreamEvent::TransportError(_) => "error",
            StreamEvent::Timeout => "timeout",
            StreamEvent::Unrouted { event_type } => event_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_known_names() {
        assert_eq!(
            StreamEvent::from_sse(SseEvent::new("answer", "hi")),
            StreamEvent::Answer("hi".to_string())
        );
        assert_eq!(
            StreamEvent::from_sse(SseEvent::new("end", "ignored")),
            StreamEvent::End
        );
        assert_eq!(
            StreamEvent::from_sse(SseEvent::new("message", "x")),
            StreamEvent::Unrouted {
                event_type: "message".to_string()
            }
        );
    }
}
