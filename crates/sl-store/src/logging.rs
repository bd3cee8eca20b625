//! Call-recording decorator for any [`SessionHandler`].
//!
//! Every operation is forwarded unchanged; afterwards one line of the form
//! `<op> <json args> = <json result>` is emitted on the `sl_store::calls`
//! tracing target and, when recording, appended to an in-memory transcript.
//! Session payloads are rendered as (lossy) UTF-8 strings.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use sl_core::{Result, SessionId};
use tracing::info;

use crate::handler::SessionHandler;

pub struct LoggingHandler<H> {
    inner: H,
    transcript: Option<Vec<String>>,
}

impl<H: SessionHandler> LoggingHandler<H> {
    pub fn new(inner: H) -> Self {
        Self {
            inner,
            transcript: None,
        }
    }

    /// Like [`LoggingHandler::new`], additionally keeping every line.
    pub fn recording(inner: H) -> Self {
        Self {
            inner,
            transcript: Some(Vec::new()),
        }
    }

    pub fn transcript(&self) -> &[String] {
        self.transcript.as_deref().unwrap_or_default()
    }

    pub fn inner(&self) -> &H {
        &self.inner
    }

    fn record(&mut self, op: &str, args: Value, result: Value) {
        let line = format_call(op, &args, &result);
        info!(target: "sl_store::calls", "{line}");
        if let Some(transcript) = &mut self.transcript {
            transcript.push(line);
        }
    }
}

pub fn format_call(op: &str, args: &Value, result: &Value) -> String {
    format!("{op} {args} = {result}")
}

fn outcome<T: Serialize>(result: &Result<T>) -> Value {
    match result {
        Ok(value) => serde_json::to_value(value).unwrap_or(Value::Null),
        Err(e) => json!({ "error": e.to_string() }),
    }
}

fn text(data: &[u8]) -> String {
    String::from_utf8_lossy(data).into_owned()
}

#[async_trait]
impl<H: SessionHandler> SessionHandler for LoggingHandler<H> {
    async fn open(&mut self, save_path: &str, name: &str) -> Result<bool> {
        let result = self.inner.open(save_path, name).await;
        self.record("open", json!([save_path, name]), outcome(&result));
        result
    }

    async fn close(&mut self) -> Result<bool> {
        let result = self.inner.close().await;
        self.record("close", json!([]), outcome(&result));
        result
    }

    async fn read(&mut self, id: &str) -> Result<Vec<u8>> {
        let result = self.inner.read(id).await;
        let rendered = match &result {
            Ok(data) => Value::String(text(data)),
            Err(_) => outcome(&result),
        };
        self.record("read", json!([id]), rendered);
        result
    }

    async fn write(&mut self, id: &str, data: &[u8]) -> Result<bool> {
        let result = self.inner.write(id, data).await;
        self.record("write", json!([id, text(data)]), outcome(&result));
        result
    }

    async fn destroy(&mut self, id: &str) -> Result<bool> {
        let result = self.inner.destroy(id).await;
        self.record("destroy", json!([id]), outcome(&result));
        result
    }

    async fn gc(&mut self, max_lifetime: Duration) -> Result<usize> {
        let result = self.inner.gc(max_lifetime).await;
        self.record("gc", json!([max_lifetime.as_secs()]), outcome(&result));
        result
    }

    async fn create_sid(&mut self) -> Result<SessionId> {
        let result = self.inner.create_sid().await;
        self.record("create_sid", json!([]), outcome(&result));
        result
    }

    async fn validate_id(&mut self, id: &str) -> Result<bool> {
        let result = self.inner.validate_id(id).await;
        self.record("validate_id", json!([id]), outcome(&result));
        result
    }

    async fn update_timestamp(&mut self, id: &str, data: &[u8]) -> Result<bool> {
        let result = self.inner.update_timestamp(id, data).await;
        self.record("update_timestamp", json!([id, text(data)]), outcome(&result));
        result
    }
}
