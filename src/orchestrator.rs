use crate::engine::{Engine, Resolution, WriteBackPolicy, WriteBackStatus};
use crate::errors::AppError;
use crate::gateway_client::{Port, RegistryGateway};
use crate::models::{CanonicalClientRecord, RequestContext, RoutingClass, SourceKind};
use crate::normalizer::normalize_payload;
use std::sync::Arc;
use tracing::Instrument;

/// Outcome of one resolution, with the path that produced it.
#[derive(Debug, Clone)]
pub struct ResolvedClient {
    pub record: CanonicalClientRecord,
    pub class: RoutingClass,
    pub source: SourceKind,
    pub escalated: bool,
    pub write_back: WriteBackStatus,
    /// Ports called, in order.
    pub calls: Vec<Port>,
}

/// Top-level request lifecycle: engine walk, normalization, output shaping.
#[derive(Clone)]
pub struct Orchestrator {
    gateway: Arc<dyn RegistryGateway>,
    policy: WriteBackPolicy,
}

impl Orchestrator {
    pub fn new(gateway: Arc<dyn RegistryGateway>, policy: WriteBackPolicy) -> Self {
        Self { gateway, policy }
    }

    /// Resolves one client identity.
    ///
    /// Always returns either a complete canonical record or a single error;
    /// no partial results.
    pub async fn resolve(&self, ctx: &RequestContext) -> Result<ResolvedClient, AppError> {
        let span = tracing::info_span!(
            "resolve_client",
            session_id = %ctx.session_id,
            identification_type = %ctx.identification_type,
            force_update = ctx.force_update,
        );

        self.resolve_inner(ctx).instrument(span).await
    }

    async fn resolve_inner(&self, ctx: &RequestContext) -> Result<ResolvedClient, AppError> {
        tracing::info!(
            "Resolving {} {}",
            ctx.identification_type,
            ctx.identification_number
        );

        let engine = Engine::new(self.gateway.as_ref(), &self.policy);
        let run = engine.run(ctx).await;
        let calls = run.calls();
        tracing::debug!("Engine trace: {:?}", run.trace);

        let resolution = match run.into_result() {
            Ok(resolution) => resolution,
            Err(e) => {
                tracing::warn!("Resolution failed after calls {:?}: {}", calls, e);
                return Err(e);
            }
        };

        let resolved = build_output(ctx, resolution, calls)?;

        tracing::info!(
            "Resolved from {} (class: {}, escalated: {}, write-back: {:?})",
            resolved.source,
            resolved.class,
            resolved.escalated,
            resolved.write_back
        );

        Ok(resolved)
    }
}

fn build_output(
    ctx: &RequestContext,
    resolution: Resolution,
    calls: Vec<Port>,
) -> Result<ResolvedClient, AppError> {
    let payload = resolution.authoritative().ok_or_else(|| {
        AppError::InternalError("engine finished without any source payload".to_string())
    })?;

    let source = payload.kind();
    let mut record = normalize_payload(payload);

    if record.identification.number.is_empty() {
        record.identification = ctx.identification();
    }
    if !ctx.include_binary_photo {
        record.photo_binary.clear();
    }

    Ok(ResolvedClient {
        record,
        class: resolution.class,
        source,
        escalated: resolution.escalated,
        write_back: resolution.write_back,
        calls,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IdentificationType;
    use crate::registry_models::{MasterRegistryBody, SourcePayload};

    fn ctx(include_binary_photo: bool) -> RequestContext {
        RequestContext {
            identification_number: "40233832993".to_string(),
            identification_type: IdentificationType::Cedula,
            force_update: false,
            include_binary_photo,
            session_id: "s-1".to_string(),
        }
    }

    fn resolution(body: MasterRegistryBody) -> Resolution {
        Resolution {
            class: RoutingClass::MasterLookup,
            payloads: vec![SourcePayload::MasterRegistry(body)],
            escalated: false,
            write_back: WriteBackStatus::NotAttempted,
        }
    }

    #[test]
    fn test_output_fills_missing_identification() {
        let resolved = build_output(
            &ctx(false),
            resolution(MasterRegistryBody {
                names: Some("DOMINGO JUNIOR".into()),
                ..Default::default()
            }),
            vec![Port::MasterRegistry],
        )
        .unwrap();

        assert_eq!(resolved.record.identification.number, "40233832993");
        assert_eq!(resolved.record.identification.type_, "Cedula");
        assert_eq!(resolved.source, SourceKind::MasterRegistry);
    }

    #[test]
    fn test_output_strips_photo_unless_requested() {
        let body = MasterRegistryBody {
            names: Some("DOMINGO JUNIOR".into()),
            photo_binary: Some("aGVsbG8=".into()),
            ..Default::default()
        };

        let without = build_output(&ctx(false), resolution(body.clone()), vec![]).unwrap();
        assert_eq!(without.record.photo_binary, "");

        let with = build_output(&ctx(true), resolution(body), vec![]).unwrap();
        assert_eq!(with.record.photo_binary, "aGVsbG8=");
    }

    #[test]
    fn test_output_without_payload_is_error() {
        let empty = Resolution {
            class: RoutingClass::MasterLookup,
            payloads: vec![],
            escalated: false,
            write_back: WriteBackStatus::NotAttempted,
        };
        assert!(build_output(&ctx(false), empty, vec![]).is_err());
    }
}
