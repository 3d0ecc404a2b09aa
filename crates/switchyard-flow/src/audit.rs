use std::path::PathBuf;

use chrono::Utc;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use switchyard_core::error::{Result, SwitchyardError};
use switchyard_core::traits::AuditSink;
use switchyard_core::types::AuditRecord;

/// Logs each audit record at info level.
#[derive(Debug, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn name(&self) -> &str {
        "tracing"
    }

    fn record(&self, record: AuditRecord) -> Result<()> {
        let snapshot = serde_json::to_string(record.snapshot())?;
        info!(
            run_id = %record.run_id(),
            node = %record.node(),
            snapshot = %snapshot,
            "AUDIT"
        );
        Ok(())
    }
}

/// Forwards audit records to an unbounded channel. Never blocks.
#[derive(Debug, Clone)]
pub struct ChannelAuditSink {
    tx: mpsc::UnboundedSender<AuditRecord>,
}

impl ChannelAuditSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<AuditRecord>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl AuditSink for ChannelAuditSink {
    fn name(&self) -> &str {
        "channel"
    }

    fn record(&self, record: AuditRecord) -> Result<()> {
        self.tx
            .send(record)
            .map_err(|_| SwitchyardError::Audit("audit channel closed".to_string()))
    }
}

/// JSONL audit trail writer.
///
/// Drains a `ChannelAuditSink` receiver and appends one JSON object per
/// line to `{log_dir}/audit_{timestamp}.jsonl`, flushing after every entry so
/// a crash loses at most the record in flight.
pub struct AuditLogger {
    log_dir: PathBuf,
}

#[derive(Serialize)]
struct AuditEntry<'a> {
    timestamp: String,
    run_id: &'a str,
    node: &'a str,
    snapshot: &'a switchyard_core::types::WorkflowState,
}

impl AuditLogger {
    pub fn new(log_dir: PathBuf) -> Self {
        Self { log_dir }
    }

    /// Run until cancelled or until every sender is dropped.
    /// Returns the path written to, or `None` if the file could not be opened.
    pub async fn run(
        self,
        mut rx: mpsc::UnboundedReceiver<AuditRecord>,
        cancel: CancellationToken,
    ) -> Option<PathBuf> {
        if let Err(e) = tokio::fs::create_dir_all(&self.log_dir).await {
            error!(error = %e, "Failed to create audit log directory");
            return None;
        }

        let timestamp = Utc::now().format("%Y%m%d_%H%M%S").to_string();
        let log_path = self.log_dir.join(format!("audit_{}.jsonl", timestamp));

        let file = match tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .await
        {
            Ok(f) => f,
            Err(e) => {
                error!(error = %e, path = %log_path.display(), "Failed to open audit log");
                return None;
            }
        };

        info!(path = %log_path.display(), "AuditLogger started");

        let mut writer = tokio::io::BufWriter::new(file);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("AuditLogger cancelled");
                    break;
                }
                received = rx.recv() => {
                    let Some(record) = received else {
                        debug!("Audit channel closed, AuditLogger stopping");
                        break;
                    };

                    let entry = AuditEntry {
                        timestamp: record.timestamp().to_rfc3339(),
                        run_id: &record.run_id().0,
                        node: record.node().as_str(),
                        snapshot: record.snapshot(),
                    };

                    if let Ok(json) = serde_json::to_string(&entry) {
                        let line = format!("{}\n", json);
                        if let Err(e) = writer.write_all(line.as_bytes()).await {
                            error!(error = %e, "Failed to write audit entry");
                            break;
                        }
                        if let Err(e) = writer.flush().await {
                            error!(error = %e, "Failed to flush audit log");
                        }
                    }
                }
            }
        }

        // Drain whatever was queued before shutdown.
        while let Ok(record) = rx.try_recv() {
            let entry = AuditEntry {
                timestamp: record.timestamp().to_rfc3339(),
                run_id: &record.run_id().0,
                node: record.node().as_str(),
                snapshot: record.snapshot(),
            };
            if let Ok(json) = serde_json::to_string(&entry) {
                if writer.write_all(format!("{}\n", json).as_bytes()).await.is_err() {
                    break;
                }
            }
        }

        writer.flush().await.ok();
        debug!(path = %log_path.display(), "AuditLogger finished");
        Some(log_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchyard_core::types::{ActionSet, NodeId, RunId, WorkflowState};

    fn record(node: NodeId) -> AuditRecord {
        let mut state = WorkflowState::new("weather in Sacramento", ActionSet::new());
        state.set_str("weather", "Sunny");
        AuditRecord::new(RunId::new(), node, &state)
    }

    #[test]
    fn test_tracing_sink_accepts_records() {
        assert!(TracingAuditSink.record(record(NodeId::Weather)).is_ok());
    }

    #[test]
    fn test_channel_sink_forwards() {
        let (sink, mut rx) = ChannelAuditSink::new();
        sink.record(record(NodeId::Geocode)).unwrap();
        let got = rx.try_recv().unwrap();
        assert_eq!(got.node(), NodeId::Geocode);
    }

    #[test]
    fn test_channel_sink_closed_is_an_audit_error() {
        let (sink, rx) = ChannelAuditSink::new();
        drop(rx);
        let err = sink.record(record(NodeId::Geocode)).unwrap_err();
        assert!(matches!(err, SwitchyardError::Audit(_)));
    }

    #[tokio::test]
    async fn test_logger_writes_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let (sink, rx) = ChannelAuditSink::new();

        sink.record(record(NodeId::Geocode)).unwrap();
        sink.record(record(NodeId::Weather)).unwrap();
        drop(sink);

        let path = AuditLogger::new(dir.path().to_path_buf())
            .run(rx, CancellationToken::new())
            .await
            .unwrap();

        let content = std::fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["node"], "geocode");
        assert_eq!(first["snapshot"]["data"]["weather"], "Sunny");
        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["node"], "weather");
    }
}
