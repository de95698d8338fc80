//! Wire models for the four registry ports.
//!
//! Every registry answers with the same envelope,
//! `{ "header": { "responseCode", "responseMessage" }, "body": ... }`,
//! while the body shape differs per source. The master registry speaks
//! English keys, the civil registry speaks Spanish keys.

use crate::models::Identification;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// `header.responseCode` meaning "record found / operation succeeded".
pub const RESPONSE_CODE_FOUND: i64 = 0;
/// `header.responseCode` meaning "no record for this identification".
pub const RESPONSE_CODE_NOT_FOUND: i64 = 1;

/// Domain status embedded in the response header, distinct from HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainCode {
    Found,
    NotFound,
    Other(i64),
}

impl DomainCode {
    pub fn from_response_code(code: i64) -> Self {
        match code {
            RESPONSE_CODE_FOUND => DomainCode::Found,
            RESPONSE_CODE_NOT_FOUND => DomainCode::NotFound,
            other => DomainCode::Other(other),
        }
    }

    /// The raw integer as sent by the registry.
    pub fn raw(&self) -> i64 {
        match self {
            DomainCode::Found => RESPONSE_CODE_FOUND,
            DomainCode::NotFound => RESPONSE_CODE_NOT_FOUND,
            DomainCode::Other(code) => *code,
        }
    }
}

// ============ Envelope ============

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseHeader {
    #[serde(default, deserialize_with = "lenient_code")]
    pub response_code: Option<i64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub response_message: Option<String>,
}

/// Common response envelope of every registry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryEnvelope {
    #[serde(default)]
    pub header: Option<ResponseHeader>,
    #[serde(default)]
    pub body: Option<Value>,
}

// ============ Requests ============

/// Lookup request shared by the legal-entity, master and civil registries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupRequest {
    pub identification: Identification,
    pub include_binary_photo: bool,
}

/// Upsert sent to the master registry after a civil-registry hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteBackRequest {
    pub identification: Identification,
    pub names: String,
    pub first_last_name: String,
    pub second_last_name: String,
    pub birth_date: String,
    pub birth_place: String,
    pub old_id_card: String,
    pub gender: String,
    pub marital_status: String,
    pub category: String,
    pub disqualification_reason: String,
    pub cancellation_reason_code: String,
    pub status: String,
    pub cancellation_date: String,
    pub photo_url: String,
    /// Empty string when the civil registry sent no photo.
    pub photo_binary: String,
}

/// Request object handed to a gateway port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum GatewayRequest {
    Lookup(LookupRequest),
    WriteBack(WriteBackRequest),
}

impl GatewayRequest {
    /// Identification carried by the request, for logging.
    pub fn identification(&self) -> &Identification {
        match self {
            GatewayRequest::Lookup(req) => &req.identification,
            GatewayRequest::WriteBack(req) => &req.identification,
        }
    }
}

// ============ Source Bodies ============

/// Body of the legal-entity (RNC) registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegalEntityBody {
    #[serde(default, deserialize_with = "lenient_string")]
    pub rnc: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub business_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub trade_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub payment_regime: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub economic_activity: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub constitution_date: Option<String>,
}

/// Body of the master registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterRegistryBody {
    #[serde(default, deserialize_with = "lenient_string")]
    pub identification_number: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub names: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub first_last_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub second_last_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub birth_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub birth_place: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub old_id_card: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub gender: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub marital_status: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub disqualification_reason: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub cancellation_reason_code: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub cancellation_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub photo_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub photo_binary: Option<String>,
}

/// Body of the civil registry (fallback source).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackRegistryBody {
    #[serde(default, deserialize_with = "lenient_string")]
    pub cedula: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub nombres: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub apellido1: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub apellido2: Option<String>,
    #[serde(rename = "fechaNacimiento", default, deserialize_with = "lenient_string")]
    pub fecha_nacimiento: Option<String>,
    #[serde(rename = "lugarNacimiento", default, deserialize_with = "lenient_string")]
    pub lugar_nacimiento: Option<String>,
    #[serde(rename = "cedulaAnterior", default, deserialize_with = "lenient_string")]
    pub cedula_anterior: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub sexo: Option<String>,
    #[serde(rename = "estadoCivil", default, deserialize_with = "lenient_string")]
    pub estado_civil: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub categoria: Option<String>,
    #[serde(rename = "causaInhabilidad", default, deserialize_with = "lenient_string")]
    pub causa_inhabilidad: Option<String>,
    #[serde(
        rename = "codigoCausaCancelacion",
        default,
        deserialize_with = "lenient_string"
    )]
    pub codigo_causa_cancelacion: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub estatus: Option<String>,
    #[serde(rename = "fechaCancelacion", default, deserialize_with = "lenient_string")]
    pub fecha_cancelacion: Option<String>,
    #[serde(rename = "urlFoto", default, deserialize_with = "lenient_string")]
    pub url_foto: Option<String>,
    #[serde(rename = "fotoBinario", default, deserialize_with = "lenient_string")]
    pub foto_binario: Option<String>,
}

impl FallbackRegistryBody {
    /// Whether the civil registry actually returned a person.
    pub fn has_client_data(&self) -> bool {
        [&self.cedula, &self.nombres, &self.apellido1]
            .iter()
            .any(|field| field.as_deref().is_some_and(|v| !v.trim().is_empty()))
    }
}

/// A parsed body tagged with the registry it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourcePayload {
    LegalEntity(LegalEntityBody),
    MasterRegistry(MasterRegistryBody),
    FallbackRegistry(FallbackRegistryBody),
}

impl SourcePayload {
    pub fn kind(&self) -> crate::models::SourceKind {
        use crate::models::SourceKind;
        match self {
            SourcePayload::LegalEntity(_) => SourceKind::LegalEntity,
            SourcePayload::MasterRegistry(_) => SourceKind::MasterRegistry,
            SourcePayload::FallbackRegistry(_) => SourceKind::FallbackRegistry,
        }
    }
}

// ============ Lenient field decoding ============

/// Registries are inconsistent about scalar types: codes and categories
/// arrive as strings or numbers depending on the record. Accept both.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        Some(other) => Some(other.to_string()),
    })
}

fn lenient_code<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid response code: {}", n))),
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid response code: {}", s))),
        Some(other) => Err(serde::de::Error::custom(format!(
            "invalid response code: {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_domain_code_translation() {
        assert_eq!(DomainCode::from_response_code(0), DomainCode::Found);
        assert_eq!(DomainCode::from_response_code(1), DomainCode::NotFound);
        assert_eq!(DomainCode::from_response_code(99), DomainCode::Other(99));
        assert_eq!(DomainCode::Other(99).raw(), 99);
    }

    #[test]
    fn test_envelope_accepts_string_code() {
        let envelope: RegistryEnvelope = serde_json::from_value(json!({
            "header": { "responseCode": "1", "responseMessage": "No encontrado" },
            "body": null
        }))
        .unwrap();
        let header = envelope.header.unwrap();
        assert_eq!(header.response_code, Some(1));
        assert_eq!(header.response_message.as_deref(), Some("No encontrado"));
    }

    #[test]
    fn test_envelope_rejects_garbage_code() {
        let result: Result<RegistryEnvelope, _> = serde_json::from_value(json!({
            "header": { "responseCode": "abc" }
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_fallback_body_spanish_keys() {
        let body: FallbackRegistryBody = serde_json::from_value(json!({
            "cedula": "99999999999",
            "nombres": "JUAN CARLOS",
            "apellido1": "PEREZ",
            "fechaNacimiento": "1985-03-12",
            "categoria": 2
        }))
        .unwrap();
        assert_eq!(body.nombres.as_deref(), Some("JUAN CARLOS"));
        assert_eq!(body.categoria.as_deref(), Some("2"));
        assert!(body.foto_binario.is_none());
        assert!(body.has_client_data());
    }

    #[test]
    fn test_empty_fallback_body_has_no_client_data() {
        let body = FallbackRegistryBody {
            nombres: Some("   ".into()),
            ..Default::default()
        };
        assert!(!body.has_client_data());
    }

    #[test]
    fn test_lookup_request_wire_shape() {
        let request = GatewayRequest::Lookup(LookupRequest {
            identification: Identification {
                number: "40233832993".into(),
                type_: "Cedula".into(),
            },
            include_binary_photo: true,
        });
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "identification": { "number": "40233832993", "type": "Cedula" },
                "includeBinaryPhoto": true
            })
        );
    }
}
