//! Fragment transfer - per-file upload loop
//!
//! A [`FragmentTransfer`] owns a snapshot of one admitted file and sends its
//! fragments one after another. It never touches the registry; everything
//! it observes is reported as [`TransferEvent`]s over an unbounded channel
//! and applied by the session.
//!
//! ## Events per file
//!
//! ```text
//! Progress* FragmentSent   (repeated per fragment)
//! ... then exactly one of Completed | Failed
//! ```

use std::sync::Arc;

use fragload_core::domain::newtypes::{DescriptorKey, ServerId};
use fragload_core::domain::FragmentSpec;
use fragload_core::ports::{
    ExtraFields, FragmentRequest, IByteSource, IUploadTransport, ProgressFn, TransportResponse,
};
use serde::Deserialize;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::UploadError;

// ============================================================================
// Events
// ============================================================================

/// Report sent from a transfer task to its session
#[derive(Debug, Clone)]
pub enum TransferEvent {
    /// `delta` more bytes of the current fragment were sent
    Progress { key: DescriptorKey, delta: u64 },
    /// The server accepted fragment `index`
    FragmentSent { key: DescriptorKey, index: u64 },
    /// The last fragment was accepted and its response parsed
    Completed {
        key: DescriptorKey,
        server_id: ServerId,
        url: String,
        response: TransportResponse,
    },
    /// The transfer stopped; no further events follow for this key
    Failed { key: DescriptorKey, error: UploadError },
}

// ============================================================================
// Completion response
// ============================================================================

#[derive(Debug, Deserialize)]
struct CompletionBody {
    url: String,
    id: ServerId,
}

/// Extracts the server id and url from the last fragment's response body
pub fn parse_completion(body: &str) -> Result<(ServerId, String), UploadError> {
    let parsed: CompletionBody =
        serde_json::from_str(body).map_err(|e| UploadError::MalformedResponse(e.to_string()))?;
    Ok((parsed.id, parsed.url))
}

// ============================================================================
// FragmentTransfer
// ============================================================================

/// Everything a transfer needs, copied out of the registry at admission
#[derive(Debug, Clone)]
pub struct TransferJob {
    pub key: DescriptorKey,
    pub source: Arc<dyn IByteSource>,
    pub name: String,
    pub declared_size: u64,
    pub extra: ExtraFields,
    pub url: String,
    pub field_name: String,
}

/// Sends one file's fragments in strict sequence
pub struct FragmentTransfer {
    job: TransferJob,
    transport: Arc<dyn IUploadTransport>,
    events: UnboundedSender<TransferEvent>,
}

impl FragmentTransfer {
    pub fn new(
        job: TransferJob,
        transport: Arc<dyn IUploadTransport>,
        events: UnboundedSender<TransferEvent>,
    ) -> Self {
        Self {
            job,
            transport,
            events,
        }
    }

    /// Runs the transfer on the tokio runtime
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Sends every fragment, then reports the outcome
    ///
    /// Fragment `k + 1` is only read once fragment `k` was answered.
    pub async fn run(self) {
        let key = self.job.key;
        let outcome = self.send_all().await;

        let event = match outcome {
            Ok((server_id, url, response)) => {
                info!(key = %key, name = %self.job.name, id = %server_id, "File uploaded");
                TransferEvent::Completed {
                    key,
                    server_id,
                    url,
                    response,
                }
            }
            Err(error) => {
                warn!(key = %key, name = %self.job.name, error = %error, "Transfer failed");
                TransferEvent::Failed { key, error }
            }
        };
        self.emit(event);
    }

    async fn send_all(&self) -> Result<(ServerId, String, TransportResponse), UploadError> {
        let job = &self.job;
        let mut fragment = FragmentSpec::at(0, job.declared_size);

        loop {
            let data = job
                .source
                .read_range(fragment.start, fragment.end)
                .await
                .map_err(|e| UploadError::Source(format!("{e:#}")))?;
            if data.len() as u64 != fragment.len() {
                return Err(UploadError::Source(format!(
                    "short read for fragment {}: expected {} bytes, got {}",
                    fragment.index,
                    fragment.len(),
                    data.len()
                )));
            }

            debug!(
                key = %job.key,
                fragment = fragment.index,
                bytes = data.len(),
                last = fragment.is_last,
                "Sending fragment"
            );

            let request = FragmentRequest {
                url: job.url.clone(),
                field_name: job.field_name.clone(),
                file_name: job.name.clone(),
                fragment,
                data,
                extra: job.extra.clone(),
            };
            let response = self
                .transport
                .send_fragment(request, self.progress_reporter())
                .await?;

            self.emit(TransferEvent::FragmentSent {
                key: job.key,
                index: fragment.index,
            });

            match fragment.next(job.declared_size) {
                Some(next) if !fragment.is_last => fragment = next,
                _ => {
                    let (server_id, url) = parse_completion(&response.body)?;
                    return Ok((server_id, url, response));
                }
            }
        }
    }

    fn progress_reporter(&self) -> ProgressFn {
        let key = self.job.key;
        let events = self.events.clone();
        Arc::new(move |delta: u64| {
            let _ = events.send(TransferEvent::Progress { key, delta });
        })
    }

    fn emit(&self, event: TransferEvent) {
        if self.events.send(event).is_err() {
            debug!(key = %self.job.key, "Session dropped; discarding transfer event");
        }
    }
}
