//! Maps each registry's body into the canonical client record.
//!
//! One mapping table per source. Fields a source does not produce are empty
//! strings, and unknown dates collapse to [`DATE_SENTINEL`].

use crate::errors::AppError;
use crate::models::{CanonicalClientRecord, Identification, SourceKind, DATE_SENTINEL};
use crate::registry_models::{
    FallbackRegistryBody, LegalEntityBody, MasterRegistryBody, SourcePayload, WriteBackRequest,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

const CANONICAL_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const BARE_SENTINEL_DATE: &str = "0001-01-01";

const DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];

/// Parses a raw registry body for `kind`.
pub fn parse_payload(kind: SourceKind, raw: &Value) -> Result<SourcePayload, AppError> {
    let payload = match kind {
        SourceKind::LegalEntity => SourcePayload::LegalEntity(serde_json::from_value(raw.clone())?),
        SourceKind::MasterRegistry => {
            SourcePayload::MasterRegistry(serde_json::from_value(raw.clone())?)
        }
        SourceKind::FallbackRegistry => {
            SourcePayload::FallbackRegistry(serde_json::from_value(raw.clone())?)
        }
    };
    Ok(payload)
}

/// Normalizes a raw registry body into the canonical record.
pub fn normalize(kind: SourceKind, raw: &Value) -> Result<CanonicalClientRecord, AppError> {
    let payload = parse_payload(kind, raw)?;
    Ok(normalize_payload(&payload))
}

/// Normalizes an already-parsed body.
pub fn normalize_payload(payload: &SourcePayload) -> CanonicalClientRecord {
    match payload {
        SourcePayload::LegalEntity(body) => from_legal_entity(body),
        SourcePayload::MasterRegistry(body) => from_master_registry(body),
        SourcePayload::FallbackRegistry(body) => from_fallback_registry(body),
    }
}

/// Picks the payload with the highest source precedence.
pub fn select_authoritative(payloads: &[SourcePayload]) -> Option<&SourcePayload> {
    payloads.iter().max_by_key(|p| p.kind().precedence())
}

/// Canonicalizes a registry date.
///
/// Missing, empty and year-one dates (bare `0001-01-01` or the full
/// sentinel) all become [`DATE_SENTINEL`]. Parsable dates are rendered as
/// `YYYY-MM-DDTHH:MM:SS`; anything else passes through trimmed.
pub fn normalize_date(raw: Option<&str>) -> String {
    let Some(value) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return DATE_SENTINEL.to_string();
    };

    if is_year_one(value) {
        return DATE_SENTINEL.to_string();
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return dt.naive_local().format(CANONICAL_DATE_FORMAT).to_string();
    }

    for format in DATE_TIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return dt.format(CANONICAL_DATE_FORMAT).to_string();
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return date
                .and_hms_opt(0, 0, 0)
                .map(|dt| dt.format(CANONICAL_DATE_FORMAT).to_string())
                .unwrap_or_else(|| value.to_string());
        }
    }

    tracing::debug!("Unrecognized registry date passed through: {}", value);
    value.to_string()
}

/// `0001-01-01`, optionally at midnight with zero fractional seconds and a `Z`.
fn is_year_one(value: &str) -> bool {
    let Some(rest) = value.strip_prefix(BARE_SENTINEL_DATE) else {
        return false;
    };
    let rest = rest.strip_suffix('Z').unwrap_or(rest);
    if rest.is_empty() {
        return true;
    }

    let Some(rest) = rest.strip_prefix("T00:00:00") else {
        return false;
    };
    match rest.strip_prefix('.') {
        Some(fraction) => !fraction.is_empty() && fraction.bytes().all(|b| b == b'0'),
        None => rest.is_empty(),
    }
}

fn text(field: &Option<String>) -> String {
    field.as_deref().map(str::trim).unwrap_or_default().to_string()
}

fn identification(kind: SourceKind, number: &Option<String>) -> Identification {
    Identification {
        number: text(number),
        type_: kind.identification_type().as_str().to_string(),
    }
}

fn from_legal_entity(body: &LegalEntityBody) -> CanonicalClientRecord {
    let business_name = text(&body.business_name);
    let names = if business_name.is_empty() {
        text(&body.trade_name)
    } else {
        business_name
    };

    CanonicalClientRecord {
        identification: identification(SourceKind::LegalEntity, &body.rnc),
        names,
        category: text(&body.category),
        status: text(&body.status),
        ..CanonicalClientRecord::empty()
    }
}

fn from_master_registry(body: &MasterRegistryBody) -> CanonicalClientRecord {
    CanonicalClientRecord {
        identification: identification(SourceKind::MasterRegistry, &body.identification_number),
        names: text(&body.names),
        first_last_name: text(&body.first_last_name),
        second_last_name: text(&body.second_last_name),
        birth_date: normalize_date(body.birth_date.as_deref()),
        birth_place: text(&body.birth_place),
        old_id_card: text(&body.old_id_card),
        gender: text(&body.gender),
        marital_status: text(&body.marital_status),
        category: text(&body.category),
        disqualification_reason: text(&body.disqualification_reason),
        cancellation_reason_code: text(&body.cancellation_reason_code),
        status: text(&body.status),
        cancellation_date: normalize_date(body.cancellation_date.as_deref()),
        photo_url: text(&body.photo_url),
        photo_binary: text(&body.photo_binary),
    }
}

fn from_fallback_registry(body: &FallbackRegistryBody) -> CanonicalClientRecord {
    CanonicalClientRecord {
        identification: identification(SourceKind::FallbackRegistry, &body.cedula),
        names: text(&body.nombres),
        first_last_name: text(&body.apellido1),
        second_last_name: text(&body.apellido2),
        birth_date: normalize_date(body.fecha_nacimiento.as_deref()),
        birth_place: text(&body.lugar_nacimiento),
        old_id_card: text(&body.cedula_anterior),
        gender: text(&body.sexo),
        marital_status: text(&body.estado_civil),
        category: text(&body.categoria),
        disqualification_reason: text(&body.causa_inhabilidad),
        cancellation_reason_code: text(&body.codigo_causa_cancelacion),
        status: text(&body.estatus),
        cancellation_date: normalize_date(body.fecha_cancelacion.as_deref()),
        photo_url: text(&body.url_foto),
        photo_binary: text(&body.foto_binario),
    }
}

/// Re-maps a civil-registry body into the master registry's upsert schema.
///
/// The identification is always the one the caller asked for.
pub fn write_back_request(
    identification: Identification,
    body: &FallbackRegistryBody,
) -> WriteBackRequest {
    let record = from_fallback_registry(body);

    WriteBackRequest {
        identification,
        names: record.names,
        first_last_name: record.first_last_name,
        second_last_name: record.second_last_name,
        birth_date: record.birth_date,
        birth_place: record.birth_place,
        old_id_card: record.old_id_card,
        gender: record.gender,
        marital_status: record.marital_status,
        category: record.category,
        disqualification_reason: record.disqualification_reason,
        cancellation_reason_code: record.cancellation_reason_code,
        status: record.status,
        cancellation_date: record.cancellation_date,
        photo_url: record.photo_url,
        photo_binary: record.photo_binary,
    }
}
