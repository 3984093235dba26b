//! Remote sync - save and delete requests for files already on the server
//!
//! These requests are single multipart forms, not fragmented, and never
//! change the registry. Only descriptors whose canonical copy lives on the
//! server (`ReadyRemoteOnly` or `Completed`) can be targeted.

use std::sync::Arc;

use fragload_core::domain::newtypes::ServerId;
use fragload_core::domain::FileDescriptor;
use fragload_core::ports::{ExtraFields, FormRequest, IUploadTransport, TransportResponse};
use tracing::{debug, info};

use crate::UploadError;

/// Sends save and delete forms through the upload transport
pub struct RemoteSync {
    transport: Arc<dyn IUploadTransport>,
    edit_url: Option<String>,
    delete_url: Option<String>,
}

impl RemoteSync {
    pub fn new(
        transport: Arc<dyn IUploadTransport>,
        edit_url: Option<String>,
        delete_url: Option<String>,
    ) -> Self {
        Self {
            transport,
            edit_url,
            delete_url,
        }
    }

    /// Posts `fileId` and `extra` to the edit endpoint
    pub async fn save(
        &self,
        index: usize,
        file: &FileDescriptor,
        extra: &ExtraFields,
    ) -> Result<TransportResponse, UploadError> {
        let id = server_id(index, file)?;
        let url = self
            .edit_url
            .as_deref()
            .ok_or(UploadError::MissingUrl("edit url"))?;

        debug!(index, id = %id, "Saving remote file");
        let response = self
            .transport
            .send_form(FormRequest::save(url, id, extra))
            .await?;
        info!(index, id = %id, status = response.status, "Remote file saved");
        Ok(response)
    }

    /// Posts `fileId` and `extra` to the delete endpoint, id also in the query
    pub async fn delete(
        &self,
        index: usize,
        file: &FileDescriptor,
        extra: &ExtraFields,
    ) -> Result<TransportResponse, UploadError> {
        let id = server_id(index, file)?;
        let url = self
            .delete_url
            .as_deref()
            .ok_or(UploadError::MissingUrl("delete url"))?;

        debug!(index, id = %id, "Deleting remote file");
        let request = FormRequest::delete(url, id, extra)?;
        let response = self.transport.send_form(request).await?;
        info!(index, id = %id, status = response.status, "Remote file deleted");
        Ok(response)
    }
}

fn server_id(index: usize, file: &FileDescriptor) -> Result<&ServerId, UploadError> {
    if !file.status().is_on_server() {
        return Err(UploadError::NotOnServer { index });
    }
    file.server_id().ok_or(UploadError::NotOnServer { index })
}
