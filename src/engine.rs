//! Per-request orchestration state machine.
//!
//! `Start -> Routed -> PrimaryCalled -> [Escalated] -> FallbackCalled ->
//! [WriteBackPending] -> WriteBackCalled -> Done`, with `Error` reachable
//! from every state.
//!
//! States are values. [`EngineState::advance`] consumes a state and returns
//! the next one without doing I/O; [`Engine::run`] performs the gateway call
//! a state asks for (see [`EngineState::pending_call`]) and feeds the outcome
//! back in.

use crate::classifier::classify;
use crate::errors::{AppError, ResultExt};
use crate::gateway_client::{BackendOutcome, Port, RegistryGateway};
use crate::models::{RequestContext, RoutingClass, SourceKind};
use crate::normalizer::{parse_payload, select_authoritative, write_back_request};
use crate::registry_models::{
    DomainCode, FallbackRegistryBody, GatewayRequest, LookupRequest, SourcePayload,
};

/// Upper bound on transitions; the longest legal walk is eight.
const MAX_TRANSITIONS: usize = 16;

/// What happened to the master-registry refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteBackStatus {
    NotAttempted,
    Stored,
    /// The master registry rejected the empty photo; the request still succeeds.
    Absorbed { message: String },
}

/// Successful end of a walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub class: RoutingClass,
    /// Every source body obtained, in call order.
    pub payloads: Vec<SourcePayload>,
    pub escalated: bool,
    pub write_back: WriteBackStatus,
}

impl Resolution {
    pub fn authoritative(&self) -> Option<&SourcePayload> {
        select_authoritative(&self.payloads)
    }
}

/// Decides which write-back failures are tolerated.
#[derive(Debug, Clone)]
pub struct WriteBackPolicy {
    empty_photo_message: String,
}

impl WriteBackPolicy {
    pub fn new(empty_photo_message: impl Into<String>) -> Self {
        Self {
            empty_photo_message: empty_photo_message.into().to_lowercase(),
        }
    }

    /// Whether a failed write-back was rejected only for its empty photo.
    pub fn is_empty_photo_rejection(&self, outcome: &BackendOutcome) -> bool {
        if self.empty_photo_message.trim().is_empty() || outcome.transport_failure.is_some() {
            return false;
        }
        [
            &outcome.response_message,
            &outcome.error_message,
            &outcome.raw_body,
        ]
        .iter()
        .filter_map(|m| m.as_deref())
        .any(|m| m.to_lowercase().contains(&self.empty_photo_message))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineState {
    Start,
    Routed {
        class: RoutingClass,
    },
    PrimaryCalled {
        class: RoutingClass,
        outcome: BackendOutcome,
    },
    /// Master registry reported not-found; civil registry call pending.
    Escalated,
    FallbackCalled {
        class: RoutingClass,
        escalated: bool,
        outcome: BackendOutcome,
    },
    /// Civil registry returned data; write-back call pending.
    WriteBackPending {
        class: RoutingClass,
        escalated: bool,
        fallback: FallbackRegistryBody,
    },
    WriteBackCalled {
        class: RoutingClass,
        escalated: bool,
        fallback: FallbackRegistryBody,
        outcome: BackendOutcome,
    },
    Done(Resolution),
    Error(AppError),
}

impl EngineState {
    pub fn name(&self) -> &'static str {
        match self {
            EngineState::Start => "start",
            EngineState::Routed { .. } => "routed",
            EngineState::PrimaryCalled { .. } => "primary_called",
            EngineState::Escalated => "escalated",
            EngineState::FallbackCalled { .. } => "fallback_called",
            EngineState::WriteBackPending { .. } => "write_back_pending",
            EngineState::WriteBackCalled { .. } => "write_back_called",
            EngineState::Done(_) => "done",
            EngineState::Error(_) => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, EngineState::Done(_) | EngineState::Error(_))
    }

    /// The gateway call this state waits on, if any.
    pub fn pending_call(&self, ctx: &RequestContext) -> Option<(Port, GatewayRequest)> {
        match self {
            EngineState::Routed { class } => Some((primary_port(*class), lookup(ctx))),
            EngineState::Escalated => Some((Port::FallbackRegistry, lookup(ctx))),
            EngineState::WriteBackPending { fallback, .. } => Some((
                Port::WriteBack,
                GatewayRequest::WriteBack(write_back_request(ctx.identification(), fallback)),
            )),
            _ => None,
        }
    }

    /// Returns the next state.
    ///
    /// `outcome` must be the result of [`pending_call`](Self::pending_call)
    /// for states that have one, and `None` otherwise.
    pub fn advance(
        self,
        ctx: &RequestContext,
        policy: &WriteBackPolicy,
        outcome: Option<BackendOutcome>,
    ) -> EngineState {
        match (self, outcome) {
            (EngineState::Start, None) => EngineState::Routed {
                class: classify(ctx.identification_type, ctx.force_update),
            },
            (EngineState::Routed { class }, Some(outcome)) => {
                EngineState::PrimaryCalled { class, outcome }
            }
            (EngineState::PrimaryCalled { class, outcome }, None) => after_primary(class, outcome),
            (EngineState::Escalated, Some(outcome)) => EngineState::FallbackCalled {
                class: RoutingClass::MasterLookup,
                escalated: true,
                outcome,
            },
            (
                EngineState::FallbackCalled {
                    class,
                    escalated,
                    outcome,
                },
                None,
            ) => after_fallback(class, escalated, outcome),
            (
                EngineState::WriteBackPending {
                    class,
                    escalated,
                    fallback,
                },
                Some(outcome),
            ) => EngineState::WriteBackCalled {
                class,
                escalated,
                fallback,
                outcome,
            },
            (
                EngineState::WriteBackCalled {
                    class,
                    escalated,
                    fallback,
                    outcome,
                },
                None,
            ) => after_write_back(class, escalated, fallback, outcome, policy),
            (state, outcome) if state.is_terminal() && outcome.is_none() => state,
            (state, outcome) => EngineState::Error(AppError::InternalError(format!(
                "invalid engine transition from '{}' (outcome supplied: {})",
                state.name(),
                outcome.is_some()
            ))),
        }
    }
}

fn primary_port(class: RoutingClass) -> Port {
    match class {
        RoutingClass::LegalEntity => Port::LegalEntity,
        RoutingClass::MasterLookup => Port::MasterRegistry,
        RoutingClass::FallbackLookup => Port::FallbackRegistry,
    }
}

fn lookup(ctx: &RequestContext) -> GatewayRequest {
    GatewayRequest::Lookup(LookupRequest {
        identification: ctx.identification(),
        include_binary_photo: ctx.include_binary_photo,
    })
}

fn after_primary(class: RoutingClass, outcome: BackendOutcome) -> EngineState {
    match class {
        RoutingClass::LegalEntity => {
            if outcome.is_found() {
                match parse_body(SourceKind::LegalEntity, &outcome) {
                    Ok(payload) => EngineState::Done(Resolution {
                        class,
                        payloads: vec![payload],
                        escalated: false,
                        write_back: WriteBackStatus::NotAttempted,
                    }),
                    Err(e) => EngineState::Error(e),
                }
            } else {
                EngineState::Error(not_found_or_failure(outcome))
            }
        }
        RoutingClass::MasterLookup => {
            if outcome.is_found() {
                match parse_body(SourceKind::MasterRegistry, &outcome) {
                    Ok(payload) => EngineState::Done(Resolution {
                        class,
                        payloads: vec![payload],
                        escalated: false,
                        write_back: WriteBackStatus::NotAttempted,
                    }),
                    Err(e) => EngineState::Error(e),
                }
            } else if outcome.is_not_found() {
                tracing::info!("Master registry has no record, escalating to civil registry");
                EngineState::Escalated
            } else {
                EngineState::Error(outcome.into_error())
            }
        }
        RoutingClass::FallbackLookup => EngineState::FallbackCalled {
            class,
            escalated: false,
            outcome,
        },
    }
}

fn after_fallback(class: RoutingClass, escalated: bool, outcome: BackendOutcome) -> EngineState {
    if !outcome.is_found() {
        return EngineState::Error(not_found_or_failure(outcome));
    }

    let fallback = match parse_body(SourceKind::FallbackRegistry, &outcome) {
        Ok(SourcePayload::FallbackRegistry(body)) => body,
        Ok(_) => {
            return EngineState::Error(AppError::InternalError(
                "civil registry body parsed as another source".to_string(),
            ))
        }
        Err(e) => return EngineState::Error(e),
    };

    if !fallback.has_client_data() {
        return EngineState::Error(AppError::NotFound(
            outcome
                .message()
                .unwrap_or("Client not found in civil registry")
                .to_string(),
        ));
    }

    EngineState::WriteBackPending {
        class,
        escalated,
        fallback,
    }
}

fn after_write_back(
    class: RoutingClass,
    escalated: bool,
    fallback: FallbackRegistryBody,
    outcome: BackendOutcome,
    policy: &WriteBackPolicy,
) -> EngineState {
    let stored = outcome.succeeded
        && !outcome.malformed
        && matches!(outcome.domain_code, None | Some(DomainCode::Found));

    let write_back = if stored {
        WriteBackStatus::Stored
    } else if policy.is_empty_photo_rejection(&outcome) {
        let message = outcome.message().unwrap_or_default().to_string();
        tracing::warn!(
            "Master registry rejected write-back for empty photo, keeping civil registry data: {}",
            message
        );
        WriteBackStatus::Absorbed { message }
    } else {
        return EngineState::Error(outcome.into_error());
    };

    EngineState::Done(Resolution {
        class,
        payloads: vec![SourcePayload::FallbackRegistry(fallback)],
        escalated,
        write_back,
    })
}

/// A 2xx not-found is a 404 for the caller; anything else passes through.
fn not_found_or_failure(outcome: BackendOutcome) -> AppError {
    if outcome.succeeded && outcome.domain_code == Some(DomainCode::NotFound) {
        let message = outcome
            .message()
            .map(str::to_string)
            .unwrap_or_else(|| format!("Client not found in {} registry", outcome.port));
        AppError::NotFound(message)
    } else {
        outcome.into_error()
    }
}

fn parse_body(kind: SourceKind, outcome: &BackendOutcome) -> Result<SourcePayload, AppError> {
    let Some(raw) = outcome.payload.as_ref() else {
        return Err(AppError::BackendReported {
            status: 500,
            code: outcome.domain_code.map(|c| c.raw()),
            message: format!("{} registry returned no client data", outcome.port),
        });
    };

    parse_payload(kind, raw).with_context(|| format!("Failed to decode {} body", outcome.port))
}

// ============ Driver ============

/// One visited state, and the port called from it, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEntry {
    pub state: &'static str,
    pub port: Option<Port>,
}

/// Terminal state of a walk plus the path taken.
#[derive(Debug)]
pub struct EngineRun {
    pub terminal: EngineState,
    pub trace: Vec<TraceEntry>,
}

impl EngineRun {
    /// Ports called, in order.
    pub fn calls(&self) -> Vec<Port> {
        self.trace.iter().filter_map(|entry| entry.port).collect()
    }

    pub fn into_result(self) -> Result<Resolution, AppError> {
        match self.terminal {
            EngineState::Done(resolution) => Ok(resolution),
            EngineState::Error(e) => Err(e),
            other => Err(AppError::InternalError(format!(
                "engine stopped in non-terminal state '{}'",
                other.name()
            ))),
        }
    }
}

/// Drives one request through the state machine.
pub struct Engine<'a> {
    gateway: &'a dyn RegistryGateway,
    policy: &'a WriteBackPolicy,
}

impl<'a> Engine<'a> {
    pub fn new(gateway: &'a dyn RegistryGateway, policy: &'a WriteBackPolicy) -> Self {
        Self { gateway, policy }
    }

    /// Walks from `Start` to `Done` or `Error`, issuing calls sequentially.
    pub async fn run(&self, ctx: &RequestContext) -> EngineRun {
        let mut state = EngineState::Start;
        let mut trace = Vec::new();

        while !state.is_terminal() {
            if trace.len() >= MAX_TRANSITIONS {
                state = EngineState::Error(AppError::InternalError(format!(
                    "engine exceeded {} transitions",
                    MAX_TRANSITIONS
                )));
                break;
            }

            let outcome = match state.pending_call(ctx) {
                Some((port, request)) => {
                    trace.push(TraceEntry {
                        state: state.name(),
                        port: Some(port),
                    });
                    Some(self.gateway.send(port, &request).await)
                }
                None => {
                    trace.push(TraceEntry {
                        state: state.name(),
                        port: None,
                    });
                    None
                }
            };

            let from = state.name();
            state = state.advance(ctx, self.policy, outcome);
            tracing::debug!("Engine transition: {} -> {}", from, state.name());
        }

        trace.push(TraceEntry {
            state: state.name(),
            port: None,
        });

        EngineRun {
            terminal: state,
            trace,
        }
    }
}
