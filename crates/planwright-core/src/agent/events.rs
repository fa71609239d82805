//! Progress events and the channel that carries them
//!
//! `ProgressEvent` is what a single task reports. `PlanEvent` is the wire
//! protocol for a whole run; transports (SSE, the CLI's JSON lines) serialize
//! it as-is. A run's stream ends at its first `Complete` or `Error`.

use futures::Stream;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Lifecycle step of one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressKind {
    Started,
    Completed,
    Failed,
}

/// Progress report for one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub kind: ProgressKind,
    pub task_name: String,
    /// Set on `Completed`; the section the result was stored under.
    pub result_key: Option<String>,
}

impl ProgressEvent {
    pub fn started(task_name: impl Into<String>) -> Self {
        Self {
            kind: ProgressKind::Started,
            task_name: task_name.into(),
            result_key: None,
        }
    }

    pub fn completed(task_name: impl Into<String>, result_key: impl Into<String>) -> Self {
        Self {
            kind: ProgressKind::Completed,
            task_name: task_name.into(),
            result_key: Some(result_key.into()),
        }
    }

    pub fn failed(task_name: impl Into<String>) -> Self {
        Self {
            kind: ProgressKind::Failed,
            task_name: task_name.into(),
            result_key: None,
        }
    }
}

/// Events emitted over the lifetime of one plan generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlanEvent {
    /// Plan row exists; sections are being generated.
    PlanCreated {
        #[serde(rename = "planId")]
        plan_id: String,
    },

    AgentStart { agent: String },

    AgentComplete { agent: String, section: String },

    AgentError { agent: String },

    /// Plan stored. Terminal.
    Complete {
        #[serde(rename = "planId")]
        plan_id: String,
    },

    /// Run aborted. Terminal.
    Error { message: String },
}

impl PlanEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PlanEvent::Complete { .. } | PlanEvent::Error { .. })
    }
}

impl From<ProgressEvent> for PlanEvent {
    fn from(event: ProgressEvent) -> Self {
        let agent = event.task_name;
        match event.kind {
            ProgressKind::Started => PlanEvent::AgentStart { agent },
            ProgressKind::Completed => PlanEvent::AgentComplete {
                agent,
                section: event.result_key.unwrap_or_default(),
            },
            ProgressKind::Failed => PlanEvent::AgentError { agent },
        }
    }
}

/// Producer half. Cheap to clone; one clone per task.
#[derive(Debug, Clone)]
pub struct ProgressSink {
    tx: mpsc::Sender<PlanEvent>,
}

impl ProgressSink {
    /// Deliver an event, waiting for capacity.
    ///
    /// Returns `false` once the consumer is gone. That is never an error for
    /// the producer; the run carries on and later events are dropped.
    pub async fn emit(&self, event: impl Into<PlanEvent>) -> bool {
        let event = event.into();
        if self.tx.send(event).await.is_err() {
            tracing::debug!("Progress consumer disconnected; dropping event");
            return false;
        }
        true
    }
}

/// Consumer half. Yields events up to and including the first terminal one.
#[derive(Debug)]
pub struct ProgressStream {
    rx: mpsc::Receiver<PlanEvent>,
    finished: bool,
}

impl ProgressStream {
    pub async fn recv(&mut self) -> Option<PlanEvent> {
        if self.finished {
            return None;
        }
        let event = self.rx.recv().await?;
        if event.is_terminal() {
            self.finished = true;
            self.rx.close();
        }
        Some(event)
    }

    pub fn into_stream(self) -> impl Stream<Item = PlanEvent> + Send + 'static {
        futures::stream::unfold(self, |mut stream| async move {
            stream.recv().await.map(|event| (event, stream))
        })
    }
}

/// Bounded single-consumer channel for one run.
pub fn progress_channel(capacity: usize) -> (ProgressSink, ProgressStream) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        ProgressSink { tx },
        ProgressStream {
            rx,
            finished: false,
        },
    )
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;
    use serde_json::json;

    use super::*;

    #[test]
    fn wire_format_matches_protocol() {
        let cases = [
            (
                PlanEvent::PlanCreated {
                    plan_id: "p1".into(),
                },
                json!({"type": "plan_created", "planId": "p1"}),
            ),
            (
                ProgressEvent::started("Market Research").into(),
                json!({"type": "agent_start", "agent": "Market Research"}),
            ),
            (
                ProgressEvent::completed("Market Research", "marketAnalysis").into(),
                json!({"type": "agent_complete", "agent": "Market Research", "section": "marketAnalysis"}),
            ),
            (
                ProgressEvent::failed("Operations").into(),
                json!({"type": "agent_error", "agent": "Operations"}),
            ),
            (
                PlanEvent::Complete {
                    plan_id: "p1".into(),
                },
                json!({"type": "complete", "planId": "p1"}),
            ),
            (
                PlanEvent::Error {
                    message: "boom".into(),
                },
                json!({"type": "error", "message": "boom"}),
            ),
        ];
        for (event, expected) in cases {
            assert_eq!(serde_json::to_value(&event).unwrap(), expected);
        }
    }

    #[tokio::test]
    async fn stream_ends_at_first_terminal_event() {
        let (sink, stream) = progress_channel(8);
        sink.emit(ProgressEvent::started("A")).await;
        sink.emit(PlanEvent::Complete {
            plan_id: "p".into(),
        })
        .await;
        // Never delivered: the stream has finished.
        sink.emit(ProgressEvent::started("B")).await;
        drop(sink);

        let events: Vec<_> = stream.into_stream().collect().await;
        assert_eq!(events.len(), 2);
        assert!(events[1].is_terminal());
    }

    #[tokio::test]
    async fn emit_after_consumer_drop_does_not_fail() {
        let (sink, stream) = progress_channel(1);
        drop(stream);
        assert!(!sink.emit(ProgressEvent::started("A")).await);
        assert!(!sink.emit(ProgressEvent::failed("A")).await);
    }
}
