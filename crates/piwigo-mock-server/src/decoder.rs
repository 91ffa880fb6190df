// crates/piwigo-mock-server/src/decoder.rs
// ============================================================================
// Module: Request Decoder
// Description: Extracts the RPC method name from Piwigo form bodies.
// Purpose: Normalize multipart and urlencoded bodies into one method string.
// Dependencies: axum, percent-encoding
// ============================================================================

//! ## Overview
//! Piwigo clients post either `multipart/form-data` (uploads) or
//! `application/x-www-form-urlencoded` bodies. The decoder picks the parser
//! from the `Content-Type` essence and returns the first `method` field as
//! UTF-8. Only the `method` value must be UTF-8; other fields may carry
//! arbitrary bytes. Any other content type yields an empty field set, which surfaces as
//! [`DecodeError::MissingMethod`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use axum::body::Bytes;
use axum::extract::FromRequest;
use axum::extract::Multipart;
use axum::extract::Request;
use axum::http::HeaderMap;
use axum::http::header::CONTENT_LENGTH;
use axum::http::header::CONTENT_TYPE;
use percent_encoding::percent_decode;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Form field carrying the RPC method name.
pub const METHOD_FIELD: &str = "method";

// ============================================================================
// SECTION: Types
// ============================================================================

/// Body encodings recognized by the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormEncoding {
    /// `multipart/form-data`
    Multipart,
    /// `application/x-www-form-urlencoded`
    UrlEncoded,
    /// Anything else, including a missing header.
    Unsupported,
}

impl FormEncoding {
    /// Classifies the request by its `Content-Type` essence.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let essence = headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(';').next())
            .map(|value| value.trim().to_ascii_lowercase());
        match essence.as_deref() {
            Some("multipart/form-data") => Self::Multipart,
            Some("application/x-www-form-urlencoded") => Self::UrlEncoded,
            _ => Self::Unsupported,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Reasons a request cannot be routed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// No `method` field in the decoded field set.
    #[error("missing method field")]
    MissingMethod,
    /// The `method` value is not valid UTF-8.
    #[error("method field is not valid utf-8")]
    InvalidEncoding,
    /// The multipart body could not be parsed.
    #[error("malformed multipart body: {0}")]
    Malformed(String),
    /// The body could not be read (including the size limit).
    #[error("request body error: {0}")]
    Body(String),
}

impl DecodeError {
    /// Returns a stable label for logging.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MissingMethod => "missing_method",
            Self::InvalidEncoding => "invalid_encoding",
            Self::Malformed(_) => "malformed_body",
            Self::Body(_) => "body_read",
        }
    }
}

// ============================================================================
// SECTION: Decoding
// ============================================================================

/// Decodes the RPC method name from a request body.
///
/// # Errors
///
/// Returns [`DecodeError`] when the body cannot be read or parsed, when no
/// `method` field exists, or when its value is not UTF-8.
pub async fn decode_method(request: Request, max_body_bytes: usize) -> Result<String, DecodeError> {
    match FormEncoding::from_headers(request.headers()) {
        FormEncoding::Multipart => decode_multipart(request).await,
        FormEncoding::UrlEncoded => {
            let declared = declared_content_length(request.headers());
            let body = axum::body::to_bytes(request.into_body(), max_body_bytes)
                .await
                .map_err(|err| DecodeError::Body(err.to_string()))?;
            method_from_urlencoded(&truncate_to_declared(body, declared))
        }
        FormEncoding::Unsupported => Err(DecodeError::MissingMethod),
    }
}

/// Returns the `Content-Length` header when present and numeric.
#[must_use]
pub fn declared_content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
}

/// Scans multipart fields for the first `method` field.
async fn decode_multipart(request: Request) -> Result<String, DecodeError> {
    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|err| DecodeError::Malformed(err.to_string()))?;
    while let Some(field) =
        multipart.next_field().await.map_err(|err| DecodeError::Malformed(err.to_string()))?
    {
        if field.name() != Some(METHOD_FIELD) {
            continue;
        }
        let value = field.bytes().await.map_err(|err| DecodeError::Malformed(err.to_string()))?;
        return String::from_utf8(value.to_vec()).map_err(|_| DecodeError::InvalidEncoding);
    }
    Err(DecodeError::MissingMethod)
}

/// Parses a query-string body and returns the first `method` value.
fn method_from_urlencoded(body: &[u8]) -> Result<String, DecodeError> {
    let value = body
        .split(|byte| *byte == b'&')
        .filter(|pair| !pair.is_empty())
        .find_map(|pair| {
            let mut parts = pair.splitn(2, |byte| *byte == b'=');
            let key = parts.next().unwrap_or_default();
            let value = parts.next().unwrap_or_default();
            (form_decode(key) == METHOD_FIELD.as_bytes()).then_some(value)
        })
        .ok_or(DecodeError::MissingMethod)?;
    String::from_utf8(form_decode(value)).map_err(|_| DecodeError::InvalidEncoding)
}

/// Decodes one form component (`+` as space, then percent escapes) to raw bytes.
fn form_decode(component: &[u8]) -> Vec<u8> {
    let spaced: Vec<u8> =
        component.iter().map(|byte| if *byte == b'+' { b' ' } else { *byte }).collect();
    percent_decode(&spaced).collect()
}

/// Drops bytes past the declared length.
fn truncate_to_declared(body: Bytes, declared: Option<u64>) -> Bytes {
    match declared.and_then(|len| usize::try_from(len).ok()) {
        Some(len) if len < body.len() => body.slice(..len),
        _ => body,
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
