use std::fmt;
use std::pin::Pin;

use bytes::{Bytes, BytesMut};
use futures::stream::{self, Stream, StreamExt};
use log::debug;
use serde::de::DeserializeOwned;

use crate::errors::{ClientError, ClientResult};

/// Boxed byte stream backing a response body
pub type ByteStream = Pin<Box<dyn Stream<Item = ClientResult<Bytes>> + Send>>;

type CloseHook = Box<dyn FnOnce() -> std::io::Result<()> + Send>;

/// Response body resource.
///
/// The underlying stream (and the connection behind it) is released exactly
/// once: by an explicit [`close`](ResponseBody::close), after a full read, or
/// on drop, whichever comes first.
pub struct ResponseBody {
    stream: Option<ByteStream>,
    length: Option<u64>,
    on_close: Option<CloseHook>,
}

impl ResponseBody {
    /// Wrap a byte stream.
    pub fn from_stream<S>(stream: S, length: Option<u64>) -> Self
    where
        S: Stream<Item = ClientResult<Bytes>> + Send + 'static,
    {
        Self {
            stream: Some(Box::pin(stream)),
            length,
            on_close: None,
        }
    }

    /// Body backed by an in-memory buffer.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        let length = Some(bytes.len() as u64);
        Self::from_stream(stream::iter(vec![Ok(bytes)]), length)
    }

    /// Runs `hook` when the body is released. Its error is reported by `close()`.
    pub fn with_close_hook<F>(mut self, hook: F) -> Self
    where
        F: FnOnce() -> std::io::Result<()> + Send + 'static,
    {
        self.on_close = Some(Box::new(hook));
        self
    }

    /// Declared length, when the transport knew it.
    pub fn length(&self) -> Option<u64> {
        self.length
    }

    pub fn is_closed(&self) -> bool {
        self.stream.is_none()
    }

    /// Next chunk, or `None` once the body is exhausted or closed.
    pub async fn chunk(&mut self) -> ClientResult<Option<Bytes>> {
        let Some(stream) = self.stream.as_mut() else {
            return Ok(None);
        };
        let next = stream.next().await;
        match next {
            Some(Ok(chunk)) => Ok(Some(chunk)),
            Some(Err(e)) => {
                self.release_after_error();
                Err(e)
            }
            None => {
                self.close()?;
                Ok(None)
            }
        }
    }

    /// Reads the rest of the body and releases it.
    pub async fn bytes(&mut self) -> ClientResult<Bytes> {
        let mut buf = BytesMut::new();
        while let Some(chunk) = self.chunk().await? {
            buf.extend_from_slice(&chunk);
        }
        Ok(buf.freeze())
    }

    /// Reads the rest of the body as UTF-8 text.
    pub async fn text(&mut self) -> ClientResult<String> {
        let bytes = self.bytes().await?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| ClientError::Parse(format!("Body is not valid UTF-8: {}", e)))
    }

    /// Reads the rest of the body and decodes it as JSON.
    pub async fn json<T: DeserializeOwned>(&mut self) -> ClientResult<T> {
        let bytes = self.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Release the body. Calling it again is a no-op.
    pub fn close(&mut self) -> ClientResult<()> {
        self.stream = None;
        if let Some(hook) = self.on_close.take() {
            hook()?;
        }
        Ok(())
    }

    // A read already failed; its error wins over any close failure.
    fn release_after_error(&mut self) {
        if let Err(e) = self.close() {
            debug!("Ignoring close failure after read error: {}", e);
        }
    }
}

impl Drop for ResponseBody {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            debug!("Failed to release response body on drop: {}", e);
        }
    }
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseBody")
            .field("length", &self.length)
            .field("closed", &self.is_closed())
            .finish()
    }
}
