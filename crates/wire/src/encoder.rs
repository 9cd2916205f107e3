//! Plan parameter encoders
//!
//! The last field of every wire tuple carries the trace's parameters: `{}`
//! when no plan was captured, `{"explain_plan": [headers, rows]}` when one
//! was. How that object travels is pluggable through [`PlanEncoder`]:
//!
//! | Encoder | Value on the wire | Empty representation |
//! |---------|-------------------|----------------------|
//! | [`IdentityEncoder`] | the JSON object itself | `{}` |
//! | [`CompressedEncoder`] (`Deflate`) | base64(zlib(json)) string | `"eJyrrgUAAXUA+Q==\n"` |
//! | [`CompressedEncoder`] (`Zstd`) | base64(zstd(json)) string | codec-specific |
//!
//! Base64 output is split into 60-character lines, each terminated by a
//! newline, which is the framing the collector expects.

use base64::Engine;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use serde_json::{Map, Value};
use slowsql_core::Plan;
use std::io::{Read, Write};
use thiserror::Error;

/// Key of the plan inside the parameters object
pub const EXPLAIN_PLAN_KEY: &str = "explain_plan";

const BASE64_LINE_LEN: usize = 60;

/// Errors while encoding or decoding plan parameters
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Compression or decompression failed
    #[error("compression error: {0}")]
    Io(#[from] std::io::Error),

    /// Parameters could not be (de)serialized
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Base64 text was invalid
    #[error("base64 error: {0}")]
    Base64(String),

    /// The wire value had the wrong shape for this encoder
    #[error("unexpected encoded value: {0}")]
    Unexpected(String),
}

/// Strategy for putting trace parameters on the wire
pub trait PlanEncoder: Send + Sync {
    /// Encode a parameters object
    fn encode(&self, params: &Value) -> Result<Value, EncodeError>;

    /// Representation of a trace without a plan
    fn empty(&self) -> Value;
}

/// Parameters object for a trace
pub fn trace_params(plan: Option<&Plan>) -> Value {
    let mut params = Map::new();
    if let Some(plan) = plan {
        params.insert(EXPLAIN_PLAN_KEY.to_string(), plan.to_json());
    }
    Value::Object(params)
}

// ============================================================================
// Identity
// ============================================================================

/// Sends parameters as a plain JSON object
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityEncoder;

impl PlanEncoder for IdentityEncoder {
    fn encode(&self, params: &Value) -> Result<Value, EncodeError> {
        Ok(params.clone())
    }

    fn empty(&self) -> Value {
        Value::Object(Map::new())
    }
}

// ============================================================================
// Compressed
// ============================================================================

/// Compression applied before base64
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Codec {
    /// zlib stream (RFC 1950), default compression level
    #[default]
    Deflate,
    /// zstd frame, default compression level
    Zstd,
}

/// Sends parameters as compressed, base64-encoded JSON text
#[derive(Debug, Clone, Copy, Default)]
pub struct CompressedEncoder {
    codec: Codec,
}

impl CompressedEncoder {
    /// Encoder using the given codec
    pub fn new(codec: Codec) -> Self {
        Self { codec }
    }

    /// zlib + base64, the collector's default
    pub fn deflate() -> Self {
        Self::new(Codec::Deflate)
    }

    /// zstd + base64
    pub fn zstd() -> Self {
        Self::new(Codec::Zstd)
    }

    /// Codec in use
    pub fn codec(&self) -> Codec {
        self.codec
    }

    /// Reverse [`encode`](PlanEncoder::encode)
    pub fn decode(&self, encoded: &Value) -> Result<Value, EncodeError> {
        let text = encoded
            .as_str()
            .ok_or_else(|| EncodeError::Unexpected(format!("expected string, got {}", encoded)))?;
        let compact: String = text.chars().filter(|c| *c != '\n').collect();
        let compressed = base64::engine::general_purpose::STANDARD
            .decode(compact)
            .map_err(|e| EncodeError::Base64(e.to_string()))?;

        let json = match self.codec {
            Codec::Deflate => {
                let mut out = Vec::new();
                ZlibDecoder::new(compressed.as_slice()).read_to_end(&mut out)?;
                out
            }
            Codec::Zstd => zstd::stream::decode_all(compressed.as_slice())?,
        };
        Ok(serde_json::from_slice(&json)?)
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, EncodeError> {
        match self.codec {
            Codec::Deflate => {
                let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(data)?;
                Ok(encoder.finish()?)
            }
            Codec::Zstd => Ok(zstd::stream::encode_all(data, 0)?),
        }
    }
}

impl PlanEncoder for CompressedEncoder {
    fn encode(&self, params: &Value) -> Result<Value, EncodeError> {
        let json = serde_json::to_vec(params)?;
        let compressed = self.compress(&json)?;
        Ok(Value::String(base64_lines(&compressed)))
    }

    fn empty(&self) -> Value {
        self.encode(&Value::Object(Map::new()))
            .unwrap_or_else(|_| Value::Object(Map::new()))
    }
}

/// Base64 in 60-column lines, each ending with `\n`
fn base64_lines(bytes: &[u8]) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    let mut out = String::with_capacity(encoded.len() + encoded.len() / BASE64_LINE_LEN + 1);
    // Base64 output is ASCII, so every index is a char boundary
    let mut rest = encoded.as_str();
    while !rest.is_empty() {
        let (line, tail) = rest.split_at(rest.len().min(BASE64_LINE_LEN));
        out.push_str(line);
        out.push('\n');
        rest = tail;
    }
    out
}
