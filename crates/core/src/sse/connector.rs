use std::collections::VecDeque;

use bytes::Bytes;
use futures_util::{
    Stream, StreamExt, TryStreamExt,
    stream::{self, BoxStream},
};
use reqwest::{
    Url,
    header::{ACCEPT, CACHE_CONTROL},
};
use tracing::debug;

use crate::{
    error::{Result, SearchStreamError},
    sse::{SseDecoder, SseEvent},
};

/// Decoded events of one connection. The stream ends when the server closes
/// the connection; connection failures surface as the first item.
pub type EventStream = BoxStream<'static, Result<SseEvent>>;

/// Opens event streams. Opening is lazy and never fails up front, the same
/// way an `EventSource` reports everything through its error callback.
pub trait Connector {
    fn open(&self, url: Url) -> EventStream;
}

#[derive(Clone, Default)]
pub struct HttpConnector {
    client: reqwest::Client,
}

impl HttpConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Connector for HttpConnector {
    fn open(&self, url: Url) -> EventStream {
        let client = self.client.clone();

        let connect = async move {
            debug!(%url, "opening event stream");
            let response = client
                .get(url.clone())
                .header(ACCEPT, "text/event-stream")
                .header(CACHE_CONTROL, "no-cache")
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                return Err(SearchStreamError::UnexpectedStatus {
                    url: url.to_string(),
                    status: status.as_u16(),
                });
            }

            Ok::<_, SearchStreamError>(decode_stream(response.bytes_stream()))
        };

        stream::once(connect).try_flatten().boxed()
    }
}

struct DecodeState<E> {
    body: BoxStream<'static, std::result::Result<Bytes, E>>,
    decoder: SseDecoder,
    pending: VecDeque<SseEvent>,
    done: bool,
}

/// Turn a raw body byte stream into decoded events.
pub fn decode_stream<S, E>(body: S) -> EventStream
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Send + 'static,
    E: Into<SearchStreamError> + Send + 'static,
{
    let state = DecodeState {
        body: body.boxed(),
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        done: false,
    };

    stream::unfold(state, |mut st| async move {
        loop {
            if let Some(event) = st.pending.pop_front() {
                return Some((Ok(event), st));
            }
            if st.done {
                return None;
            }

            match st.body.next().await {
                Some(Ok(chunk)) => st.pending.extend(st.decoder.feed(&chunk)),
                Some(Err(e)) => {
                    st.done = true;
                    return Some((Err(e.into()), st));
                }
                None => {
                    st.decoder.finish();
                    st.done = true;
                }
            }
        }
    })
    .boxed()
}
