//! Response shapes shared by the base and domain clients
//!
//! Every API call can hand back either the untouched HTTP response or its
//! decoded JSON body; [`ResponseMode`] picks which, [`ApiResponse`] carries it.
//! A body that is not valid JSON does not fail the call: it decodes to
//! [`JsonBody::Malformed`] describing the parse failure.

pub mod blocking;

use crate::errors::ConnectMlsError;
use reqwest::blocking::Response;
use serde_json::{Value, json};

/// Which form an API call should return
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResponseMode {
    /// Decode the body as JSON and apply any post-processing.
    #[default]
    Decoded,
    /// Return the HTTP response as received; post-processing is skipped.
    Raw,
}

/// Result of an API call in the requested [`ResponseMode`]
#[derive(Debug)]
pub enum ApiResponse {
    Raw(Response),
    Decoded(JsonBody),
}

impl ApiResponse {
    pub fn into_raw(self) -> Option<Response> {
        match self {
            ApiResponse::Raw(response) => Some(response),
            ApiResponse::Decoded(_) => None,
        }
    }

    pub fn into_decoded(self) -> Option<JsonBody> {
        match self {
            ApiResponse::Decoded(body) => Some(body),
            ApiResponse::Raw(_) => None,
        }
    }
}

/// A decoded response body
#[derive(Debug, Clone, PartialEq)]
pub enum JsonBody {
    Value(Value),
    Malformed(DecodeFailure),
}

impl JsonBody {
    /// Decode `text`, keeping a description of the failure instead of erroring
    pub fn decode(text: String) -> Self {
        match serde_json::from_str(&text) {
            Ok(value) => JsonBody::Value(value),
            Err(e) => JsonBody::Malformed(DecodeFailure::new(&e, text)),
        }
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            JsonBody::Value(value) => Some(value),
            JsonBody::Malformed(_) => None,
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, JsonBody::Malformed(_))
    }

    /// The body as a JSON value; a malformed body becomes the mapping that
    /// describes its failure
    pub fn to_value(&self) -> Value {
        match self {
            JsonBody::Value(value) => value.clone(),
            JsonBody::Malformed(failure) => failure.to_value(),
        }
    }

    /// The decoded value, for callers that cannot go on without one
    pub fn into_value(self) -> Result<Value, ConnectMlsError> {
        match self {
            JsonBody::Value(value) => Ok(value),
            JsonBody::Malformed(failure) => Err(ConnectMlsError::ProtocolError(format!(
                "expected a JSON response: {}",
                failure.msg
            ))),
        }
    }

    /// Post-process a decoded value; a malformed body is passed through as is
    pub fn try_map<F>(self, f: F) -> Result<JsonBody, ConnectMlsError>
    where
        F: FnOnce(Value) -> Result<Value, ConnectMlsError>,
    {
        match self {
            JsonBody::Value(value) => f(value).map(JsonBody::Value),
            malformed @ JsonBody::Malformed(_) => Ok(malformed),
        }
    }
}

/// Why a body failed to decode, and where
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeFailure {
    pub msg: String,
    /// The body that failed to decode.
    pub doc: String,
    /// Character offset of the failure within `doc`.
    pub pos: usize,
    pub lineno: usize,
    pub colno: usize,
}

impl DecodeFailure {
    pub fn new(err: &serde_json::Error, doc: String) -> Self {
        let lineno = err.line();
        let colno = err.column();
        let pos = doc
            .split('\n')
            .take(lineno.saturating_sub(1))
            .map(|line| line.chars().count() + 1)
            .sum::<usize>()
            + colno.saturating_sub(1);

        DecodeFailure {
            msg: err.to_string(),
            doc,
            pos,
            lineno,
            colno,
        }
    }

    pub fn to_value(&self) -> Value {
        json!({
            "msg": self.msg,
            "doc": self.doc,
            "pos": self.pos,
            "lineno": self.lineno,
            "colno": self.colno,
        })
    }
}
