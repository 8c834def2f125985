use bytes::{Buf, BytesMut};

pub const DEFAULT_EVENT_TYPE: &str = "message";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    pub event_type: String,
    pub data: String,
    pub id: Option<String>,
}

impl SseEvent {
    pub fn new(event_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            data: data.into(),
            id: None,
        }
    }
}

/// Incremental `text/event-stream` decoder.
///
/// Bytes are fed as they arrive from the wire; complete events come out.
/// Chunk boundaries can fall anywhere, including inside a UTF-8 sequence or
/// between the `\r` and `\n` of a CRLF terminator.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: BytesMut,
    event_type: Option<String>,
    data: String,
    has_data: bool,
    last_event_id: Option<String>,
    skip_next_lf: bool,
    bom_checked: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_event_id(&self) -> Option<&str> {
        self.last_event_id.as_deref()
    }

    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buf.extend_from_slice(chunk);

        if !self.bom_checked {
            if self.buf.len() < 3 && b"\xEF\xBB\xBF".starts_with(&self.buf) {
                return Vec::new();
            }
            if self.buf.starts_with(b"\xEF\xBB\xBF") {
                self.buf.advance(3);
            }
            self.bom_checked = true;
        }

        let mut events = Vec::new();
        while let Some(line) = self.next_line() {
            if let Some(event) = self.process_line(&line) {
                events.push(event);
            }
        }
        events
    }

    /// End of stream. A trailing event without its blank line is discarded.
    pub fn finish(&mut self) {
        self.buf.clear();
        self.reset_event();
    }

    fn next_line(&mut self) -> Option<String> {
        if self.skip_next_lf {
            if self.buf.is_empty() {
                return None;
            }
            if self.buf[0] == b'\n' {
                self.buf.advance(1);
            }
            self.skip_next_lf = false;
        }

        let end = self.buf.iter().position(|&b| b == b'\n' || b == b'\r')?;
        let line = self.buf.split_to(end);
        let terminator = self.buf[0];
        self.buf.advance(1);

        if terminator == b'\r' {
            self.skip_next_lf = true;
        }

        Some(String::from_utf8_lossy(&line).into_owned())
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.event_type = Some(value.to_string()),
            "data" => {
                if self.has_data {
                    self.data.push('\n');
                }
                self.data.push_str(value);
                self.has_data = true;
            }
            "id" if !value.contains('\0') => self.last_event_id = Some(value.to_string()),
            // no reconnection, so retry hints are meaningless here
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let has_payload = self.has_data && !self.data.is_empty();
        let named = self.event_type.as_deref().is_some_and(|t| !t.is_empty());

        if !has_payload && !named {
            self.reset_event();
            return None;
        }

        let event = SseEvent {
            event_type: self
                .event_type
                .take()
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| DEFAULT_EVENT_TYPE.to_string()),
            data: std::mem::take(&mut self.data),
            id: self.last_event_id.clone(),
        };
        self.reset_event();
        Some(event)
    }

    fn reset_event(&mut self) {
        self.event_type = None;
        self.data.clear();
        self.has_data = false;
    }
}
