use std::{sync::Arc, time::Duration};

use futures_util::StreamExt;
use reqwest::Url;
use tokio::{sync::broadcast, time::Instant};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    endpoint::SearchRequest,
    error::{Result, SearchStreamError},
    metrics::StreamMetrics,
    session::{Phase, SessionState, SessionUpdate, StreamEvent},
    sse::{Connector, EventStream},
};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub base_url: Url,
    pub timeout: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started { session_id: Uuid },
    Ignored(IgnoreReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    EmptyQuery,
    AlreadyStreaming,
}

struct Connection {
    session_id: Uuid,
    events: EventStream,
    deadline: Instant,
}

/// Owns at most one live event stream and folds its events into
/// [`SessionState`].
pub struct StreamSessionController<C> {
    connector: C,
    settings: SessionSettings,
    state: SessionState,
    connection: Option<Connection>,
    metrics: Arc<StreamMetrics>,
}

impl<C: Connector> StreamSessionController<C> {
    pub fn new(connector: C, settings: SessionSettings) -> Self {
        Self {
            connector,
            settings,
            state: SessionState::new(),
            connection: None,
            metrics: Arc::new(StreamMetrics::new()),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn metrics(&self) -> Arc<StreamMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn is_streaming(&self) -> bool {
        self.state.is_streaming()
    }

    pub fn has_connection(&self) -> bool {
        self.connection.is_some()
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.connection.as_ref().map(|c| c.session_id)
    }

    pub fn start_stream(&mut self, request: &SearchRequest) -> Result<StartOutcome> {
        if request.query.trim().is_empty() {
            return Ok(StartOutcome::Ignored(IgnoreReason::EmptyQuery));
        }
        if self.is_streaming() {
            debug!("start ignored, a session is already streaming");
            return Ok(StartOutcome::Ignored(IgnoreReason::AlreadyStreaming));
        }

        let url = request.url(&self.settings.base_url)?;

        self.state.reset();
        self.release();

        let session_id = Uuid::new_v4();
        info!(%session_id, %url, endpoint = %request.endpoint, "starting stream");

        self.connection = Some(Connection {
            session_id,
            events: self.connector.open(url),
            deadline: Instant::now() + self.settings.timeout,
        });

        Ok(StartOutcome::Started { session_id })
    }

    /// Wait for the next event (or the deadline) and apply it. Returns `None`
    /// when no stream is open.
    pub async fn next_update(&mut self) -> Option<SessionUpdate> {
        let connection = self.connection.as_mut()?;

        let event = tokio::select! {
            biased;
            _ = tokio::time::sleep_until(connection.deadline) => StreamEvent::Timeout,
            item = connection.events.next() => match item {
                Some(Ok(sse)) => {
                    self.metrics.record_event();
                    debug!(event_type = %sse.event_type, bytes = sse.data.len(), "event received");
                    StreamEvent::from_sse(sse)
                }
                Some(Err(e)) => StreamEvent::TransportError(e.to_string()),
                None => StreamEvent::TransportError(SearchStreamError::StreamClosed.to_string()),
            },
        };

        let update = self.state.reduce(event, &self.metrics);

        if self.state.phase.is_terminal() {
            if let Some(session_id) = self.session_id() {
                info!(%session_id, phase = self.state.phase.label(), "stream finished");
            }
            self.release();
        }

        Some(update)
    }

    /// Apply updates until the session ends or `shutdown` fires, reporting
    /// each one to `observer`.
    pub async fn drive<F>(&mut self, shutdown: &mut broadcast::Receiver<()>, mut observer: F) -> Phase
    where
        F: FnMut(&SessionUpdate, &SessionState),
    {
        loop {
            tokio::select! {
                Ok(()) = shutdown.recv() => {
                    self.close();
                    return self.state.phase;
                }
                update = self.next_update() => match update {
                    Some(update) => {
                        observer(&update, &self.state);
                        if !self.is_streaming() {
                            return self.state.phase;
                        }
                    }
                    None => return self.state.phase,
                },
            }
        }
    }

    /// Teardown: drop the connection and its deadline. A session interrupted
    /// this way goes back to idle.
    pub fn close(&mut self) {
        if let Some(connection) = self.connection.take() {
            info!(session_id = %connection.session_id, "closing stream");
            if self.state.is_streaming() {
                self.state.phase = Phase::Idle;
            }
        }
    }

    fn release(&mut self) {
        self.connection = None;
    }
}
