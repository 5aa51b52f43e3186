// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// HTTP client for signed CloudStack API calls.
///
/// The client is built once from [`ClientConfig`] and shared by cloning. It
/// keeps no idle connections, bounds each call with a short connect timeout
/// and a long overall timeout, and never retries.
use std::{sync::Arc, time::Duration};

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::{error::Error, signer::Credentials};

/// Default bound on establishing a connection, TLS handshake included.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5,);
/// Default bound on a whole request, body download included.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(300,);

/// Transport settings applied to every API call.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub struct ClientConfig
{
    /// Timeout for connecting to the endpoint.
    pub connect_timeout: Duration,
    /// Timeout for a complete request.
    pub request_timeout: Duration,
    /// Verify the endpoint certificate chain.
    ///
    /// Disabled by default so that management servers using self-signed
    /// certificates keep working. Turning verification off exposes the API
    /// key and the returned inventory to interception; enable it whenever
    /// the endpoint presents a trusted certificate.
    pub verify_tls:      bool,
}

impl Default for ClientConfig
{
    fn default() -> Self
    {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            verify_tls:      false,
        }
    }
}

/// Signed CloudStack API client.
#[derive(Debug, Clone,)]
pub struct CloudStackClient
{
    http:        reqwest::Client,
    credentials: Arc<Credentials,>,
}

impl CloudStackClient
{
    /// Builds a client from credentials and transport settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when the HTTP client cannot be
    /// initialized from the provided settings.
    pub fn new(credentials: Credentials, config: &ClientConfig,) -> Result<Self, Error,>
    {
        if !config.verify_tls {
            warn!(
                endpoint = credentials.endpoint(),
                "TLS certificate verification is disabled for the CloudStack endpoint"
            );
        }

        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout,)
            .timeout(config.request_timeout,)
            .pool_max_idle_per_host(0,)
            .danger_accept_invalid_certs(!config.verify_tls,)
            .build()
            .map_err(|e| Error::validation(format!("failed to initialize HTTP client: {e}"),),)?;

        Ok(Self {
            http, credentials: Arc::new(credentials,),
        },)
    }

    /// Executes `command` and decodes the JSON body into `T`.
    ///
    /// # Errors
    ///
    /// * [`Error::Signing`] when the request cannot be signed.
    /// * [`Error::Transport`] on network failures, timeouts included.
    /// * [`Error::HttpStatus`] when the API answers with a non-success status.
    /// * [`Error::Decode`] when the body does not match `T`.
    pub async fn execute<T,>(&self, command: &str, params: &[(&str, &str,)],) -> Result<T, Error,>
    where
        T: DeserializeOwned,
    {
        let url = self.credentials.sign(command, params,)?;
        debug!(command, "executing CloudStack command");

        let transport = |source: reqwest::Error| Error::Transport {
            command: command.to_owned(),
            source:  source.without_url(),
        };

        let response = self.http.get(url,).send().await.map_err(transport,)?;
        let status = response.status();
        let body = response.text().await.map_err(transport,)?;

        if !status.is_success() {
            return Err(Error::HttpStatus {
                command: command.to_owned(), status: status.as_u16(), body,
            },);
        }

        serde_json::from_str(&body,).map_err(|source| Error::Decode {
            command: command.to_owned(), source, body,
        },)
    }
}
