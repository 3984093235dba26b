//! HTTP upload client
//!
//! Implements [`IUploadTransport`] on top of `reqwest`. Every request is a
//! multipart POST; fragment bytes are attached last and streamed in small
//! pieces so the progress callback fires while the body is written.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::collections::BTreeMap;
//! use fragload_http::client::HttpTransport;
//!
//! # fn example() -> anyhow::Result<()> {
//! let mut headers = BTreeMap::new();
//! headers.insert("Authorization".to_string(), "Bearer token".to_string());
//! let transport = HttpTransport::new(&headers, false)?;
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;

use async_trait::async_trait;
use fragload_core::config::UploaderConfig;
use fragload_core::ports::{
    FormRequest, FragmentRequest, IUploadTransport, ProgressFn, TransportError, TransportResponse,
};
use futures_util::stream;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Response};
use tracing::{debug, warn};
use url::Url;

use crate::HttpError;

/// Size of the pieces a fragment body is streamed in
const STREAM_CHUNK_SIZE: usize = 16 * 1024;

/// MIME type attached to the fragment part
const FRAGMENT_MIME: &str = "application/octet-stream";

// ============================================================================
// HttpTransport
// ============================================================================

/// reqwest-backed upload transport
///
/// Wraps a `reqwest::Client` configured with the session's default headers
/// and, when credentials are enabled, a cookie store shared by all requests.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    /// The underlying HTTP client
    client: Client,
}

impl HttpTransport {
    /// Creates a transport sending `headers` with every request
    ///
    /// # Arguments
    /// * `headers` - Header names and values added to every request
    /// * `with_credentials` - Keep cookies returned by the server and resend them
    pub fn new(
        headers: &BTreeMap<String, String>,
        with_credentials: bool,
    ) -> Result<Self, HttpError> {
        let client = Client::builder()
            .default_headers(header_map(headers)?)
            .cookie_store(with_credentials)
            .build()?;
        debug!(
            headers = headers.len(),
            with_credentials, "Created HTTP upload transport"
        );
        Ok(Self { client })
    }

    /// Creates a transport from the uploader section of the configuration
    pub fn from_config(config: &UploaderConfig) -> Result<Self, HttpError> {
        Self::new(&config.headers, config.with_credentials)
    }

    /// Wraps an existing client (useful for testing)
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Returns a reference to the underlying reqwest Client
    pub fn client(&self) -> &Client {
        &self.client
    }

    async fn post(&self, url: Url, form: Form) -> Result<TransportResponse, HttpError> {
        let response = self.client.post(url).multipart(form).send().await?;
        read_response(response).await
    }
}

#[async_trait]
impl IUploadTransport for HttpTransport {
    async fn send_fragment(
        &self,
        request: FragmentRequest,
        progress: ProgressFn,
    ) -> Result<TransportResponse, TransportError> {
        let url = parse_url(&request.url)?;
        let fragment = request.fragment;

        let mut form = Form::new();
        for (name, value) in request.text_fields() {
            form = form.text(name, value);
        }
        let part = fragment_part(request.data, request.file_name, progress)?;
        form = form.part(request.field_name, part);

        debug!(
            url = %url,
            fragment = fragment.index,
            start = fragment.start,
            end = fragment.end,
            last = fragment.is_last,
            "Sending fragment"
        );

        let response = self.post(url, form).await.map_err(|e| {
            warn!(fragment = fragment.index, error = %e, "Fragment request failed");
            TransportError::from(e)
        })?;
        Ok(response)
    }

    async fn send_form(&self, request: FormRequest) -> Result<TransportResponse, TransportError> {
        let url = parse_url(&request.url)?;

        let form = request
            .fields
            .into_iter()
            .fold(Form::new(), |form, (name, value)| form.text(name, value));

        debug!(url = %url, "Sending form request");
        let response = self.post(url, form).await?;
        Ok(response)
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn parse_url(url: &str) -> Result<Url, TransportError> {
    Url::parse(url).map_err(|e| TransportError::InvalidUrl(format!("{url}: {e}")))
}

fn header_map(headers: &BTreeMap<String, String>) -> Result<HeaderMap, HttpError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| HttpError::InvalidHeader {
                name: name.clone(),
                reason: e.to_string(),
            })?;
        let header_value = HeaderValue::from_str(value).map_err(|e| HttpError::InvalidHeader {
            name: name.clone(),
            reason: e.to_string(),
        })?;
        map.insert(header_name, header_value);
    }
    Ok(map)
}

/// Builds the byte part of a fragment request
///
/// The body is split into `STREAM_CHUNK_SIZE` pieces; `progress` receives
/// each piece's length as the HTTP stack pulls it.
fn fragment_part(data: Vec<u8>, file_name: String, progress: ProgressFn) -> Result<Part, HttpError> {
    let len = data.len() as u64;
    let chunks: Vec<Vec<u8>> = data.chunks(STREAM_CHUNK_SIZE).map(<[u8]>::to_vec).collect();
    let body = stream::iter(chunks.into_iter().map(move |chunk| {
        progress(chunk.len() as u64);
        Ok::<_, std::io::Error>(chunk)
    }));

    let part = Part::stream_with_length(Body::wrap_stream(body), len)
        .file_name(file_name)
        .mime_str(FRAGMENT_MIME)?;
    Ok(part)
}

async fn read_response(response: Response) -> Result<TransportResponse, HttpError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(HttpError::Status {
            status: status.as_u16(),
            body,
        });
    }

    Ok(TransportResponse {
        status: status.as_u16(),
        body,
    })
}
