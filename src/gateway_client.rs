use crate::config::{BackendEndpoint, Config};
use crate::errors::AppError;
use crate::registry_models::{DomainCode, GatewayRequest, RegistryEnvelope};
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::time::Instant;

/// The four logical registry ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Port {
    LegalEntity,
    MasterRegistry,
    FallbackRegistry,
    WriteBack,
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Port::LegalEntity => "legal_entity",
            Port::MasterRegistry => "master_registry",
            Port::FallbackRegistry => "fallback_registry",
            Port::WriteBack => "write_back",
        };
        f.write_str(name)
    }
}

/// Why a call never produced an HTTP response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportFailure {
    Timeout,
    Connect,
    Other,
}

/// Result of one gateway call.
///
/// Transport failures are values, not errors: the engine decides what they
/// mean for the request.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendOutcome {
    pub port: Port,
    /// Transport completed and the HTTP status is 2xx.
    pub succeeded: bool,
    pub http_status: Option<u16>,
    /// Translated `header.responseCode`, when the registry sent one.
    pub domain_code: Option<DomainCode>,
    /// `header.responseMessage`, verbatim.
    pub response_message: Option<String>,
    /// The envelope's `body` node.
    pub payload: Option<Value>,
    /// Transport or decoding error description.
    pub error_message: Option<String>,
    pub transport_failure: Option<TransportFailure>,
    /// The response body was present but not a registry envelope.
    pub malformed: bool,
    /// Response text of error or malformed responses.
    pub raw_body: Option<String>,
}

impl BackendOutcome {
    /// Builds an outcome from an HTTP status and the raw response text.
    pub fn from_response(port: Port, http_status: u16, text: &str) -> Self {
        let succeeded = (200..300).contains(&http_status);
        let raw_body = Some(text.trim())
            .filter(|t| !t.is_empty())
            .map(str::to_string);

        let parsed = if text.trim().is_empty() {
            Ok(RegistryEnvelope::default())
        } else {
            serde_json::from_str::<RegistryEnvelope>(text)
        };

        match parsed {
            Ok(envelope) => {
                let header = envelope.header.unwrap_or_default();
                Self {
                    port,
                    succeeded,
                    http_status: Some(http_status),
                    domain_code: header.response_code.map(DomainCode::from_response_code),
                    response_message: header.response_message,
                    payload: envelope.body.filter(|body| !body.is_null()),
                    error_message: None,
                    transport_failure: None,
                    malformed: false,
                    raw_body: if succeeded { None } else { raw_body },
                }
            }
            Err(e) => Self {
                port,
                succeeded,
                http_status: Some(http_status),
                domain_code: None,
                response_message: None,
                payload: None,
                error_message: Some(format!("Failed to parse {} response: {}", port, e)),
                transport_failure: None,
                malformed: true,
                raw_body,
            },
        }
    }

    /// Builds an outcome for a call that never got an HTTP response.
    pub fn transport_failure(port: Port, kind: TransportFailure, message: impl Into<String>) -> Self {
        Self {
            port,
            succeeded: false,
            http_status: None,
            domain_code: None,
            response_message: None,
            payload: None,
            error_message: Some(message.into()),
            transport_failure: Some(kind),
            malformed: false,
            raw_body: None,
        }
    }

    /// Whether the registry answered 2xx with the "found" domain code.
    pub fn is_found(&self) -> bool {
        self.succeeded && !self.malformed && self.domain_code == Some(DomainCode::Found)
    }

    /// Whether the registry answered 200 with the "not found" domain code.
    pub fn is_not_found(&self) -> bool {
        self.succeeded
            && !self.malformed
            && self.http_status == Some(200)
            && self.domain_code == Some(DomainCode::NotFound)
    }

    /// Best human-readable description of what the registry said.
    pub fn message(&self) -> Option<&str> {
        self.response_message
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .or(self.error_message.as_deref())
    }

    /// Converts an unusable outcome into the error surfaced to the caller.
    ///
    /// HTTP status is passed through when the registry sent an error status;
    /// a domain failure inside a 2xx passes its code through when that code
    /// is itself an error status.
    pub fn into_error(self) -> AppError {
        let generic = format!("Error calling {} registry", self.port);
        let message = self.message().map(str::to_string).unwrap_or(generic);

        if let Some(kind) = self.transport_failure {
            let status = match kind {
                TransportFailure::Connect => 502,
                TransportFailure::Timeout | TransportFailure::Other => 500,
            };
            return AppError::Transport { status, message };
        }

        let code = self.domain_code.map(|c| c.raw());
        let status = match self.http_status {
            Some(status) if status >= 400 => status,
            _ => code
                .and_then(|c| u16::try_from(c).ok())
                .filter(|c| (400..600).contains(c))
                .unwrap_or(500),
        };

        AppError::BackendReported {
            status,
            code,
            message,
        }
    }
}

/// One request/response exchange with a registry port.
#[async_trait]
pub trait RegistryGateway: Send + Sync {
    async fn send(&self, port: Port, request: &GatewayRequest) -> BackendOutcome;
}

/// Production gateway: JSON POST over HTTP, one endpoint per port.
#[derive(Clone)]
pub struct HttpRegistryGateway {
    client: reqwest::Client,
    legal_entity: BackendEndpoint,
    master_registry: BackendEndpoint,
    fallback_registry: BackendEndpoint,
    write_back: BackendEndpoint,
}

impl HttpRegistryGateway {
    /// Creates a new `HttpRegistryGateway`.
    ///
    /// Timeouts are applied per request from each port's endpoint config.
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let client = reqwest::Client::builder().build().map_err(|e| {
            AppError::InternalError(format!("Failed to create registry client: {}", e))
        })?;

        Ok(Self {
            client,
            legal_entity: config.legal_entity.clone(),
            master_registry: config.master_registry.clone(),
            fallback_registry: config.fallback_registry.clone(),
            write_back: config.write_back.clone(),
        })
    }

    fn endpoint(&self, port: Port) -> &BackendEndpoint {
        match port {
            Port::LegalEntity => &self.legal_entity,
            Port::MasterRegistry => &self.master_registry,
            Port::FallbackRegistry => &self.fallback_registry,
            Port::WriteBack => &self.write_back,
        }
    }
}

#[async_trait]
impl RegistryGateway for HttpRegistryGateway {
    async fn send(&self, port: Port, request: &GatewayRequest) -> BackendOutcome {
        let endpoint = self.endpoint(port);
        let started = Instant::now();

        tracing::info!(
            "Calling {} registry for {} {}: {}",
            port,
            request.identification().type_,
            request.identification().number,
            endpoint.url
        );

        let response = self
            .client
            .post(&endpoint.url)
            .timeout(endpoint.timeout())
            .json(request)
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                let kind = if e.is_timeout() {
                    TransportFailure::Timeout
                } else if e.is_connect() {
                    TransportFailure::Connect
                } else {
                    TransportFailure::Other
                };
                tracing::warn!(
                    "{} registry call failed after {}ms ({:?}): {}",
                    port,
                    started.elapsed().as_millis(),
                    kind,
                    e
                );
                return BackendOutcome::transport_failure(
                    port,
                    kind,
                    format!("{} registry request failed: {}", port, e),
                );
            }
        };

        let status = response.status().as_u16();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                let kind = if e.is_timeout() {
                    TransportFailure::Timeout
                } else {
                    TransportFailure::Other
                };
                tracing::warn!("Failed to read {} registry response: {}", port, e);
                return BackendOutcome::transport_failure(
                    port,
                    kind,
                    format!("Failed to read {} registry response: {}", port, e),
                );
            }
        };

        let outcome = BackendOutcome::from_response(port, status, &text);
        tracing::info!(
            "{} registry answered {} (domain code {:?}) in {}ms",
            port,
            status,
            outcome.domain_code,
            started.elapsed().as_millis()
        );
        outcome
    }
}
