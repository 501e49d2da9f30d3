//! Wire types for the relay control channel.
//!
//! Messages are JSON text frames over a persistent websocket, strictly
//! alternating: one `Instruction` (relay -> worker), one `Reply`
//! (worker -> relay). Body bytes travel as standard base64 strings.

use serde::{Deserialize, Serialize};

/// HTTP methods the relay may delegate. Anything else is rejected at
/// decode time, before a request is attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

/// One delegated HTTP request, as received from the relay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instruction {
    /// Absolute target URL.
    #[serde(rename = "host")]
    pub target_url: String,

    #[serde(rename = "meth")]
    pub method: Method,

    /// Outbound `User-Agent` value.
    #[serde(rename = "user")]
    pub user_agent: String,

    /// Outbound `Content-Type`; empty (or absent) means the header is
    /// not sent.
    #[serde(rename = "cont", default)]
    pub content_type: String,

    /// Request body, base64 on the wire.
    #[serde(rename = "data", with = "base64_bytes")]
    pub body: Vec<u8>,
}

/// Summary of one HTTP response, sent back to the relay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reply {
    /// HTTP status code, or a synthesized gateway code when the request
    /// itself failed (see [`Reply::request_error`]).
    pub status: u16,

    /// Response body, base64 on the wire.
    #[serde(rename = "response", with = "base64_bytes")]
    pub body: Vec<u8>,

    /// `Location` response header, "" if absent.
    #[serde(rename = "location")]
    pub redirect_location: String,
}

impl Reply {
    /// Reply for an instruction frame that could not be decoded. The
    /// relay gets a diagnosable result instead of worker silence.
    pub fn malformed() -> Self {
        Reply {
            status: 400,
            body: Vec::new(),
            redirect_location: String::new(),
        }
    }

    /// Reply for an HTTP request that failed at the transport layer
    /// (DNS, connect, TLS, timeout). Gateway semantics: 504 for a
    /// timeout, 502 otherwise.
    pub fn request_error(err: &reqwest::Error) -> Self {
        Reply {
            status: if err.is_timeout() { 504 } else { 502 },
            body: Vec::new(),
            redirect_location: String::new(),
        }
    }
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(de)?;
        STANDARD.decode(text.as_bytes()).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_instruction_frame() {
        let frame = r#"{"host":"http://localhost:9/echo","meth":"POST","user":"ua1","cont":"text/plain","data":"aGVsbG8="}"#;
        let instr: Instruction = serde_json::from_str(frame).unwrap();
        assert_eq!(instr.target_url, "http://localhost:9/echo");
        assert_eq!(instr.method, Method::Post);
        assert_eq!(instr.user_agent, "ua1");
        assert_eq!(instr.content_type, "text/plain");
        assert_eq!(instr.body, b"hello");
    }

    #[test]
    fn missing_content_type_defaults_to_empty() {
        let frame = r#"{"host":"http://a/","meth":"GET","user":"ua","data":""}"#;
        let instr: Instruction = serde_json::from_str(frame).unwrap();
        assert_eq!(instr.content_type, "");
        assert!(instr.body.is_empty());
    }

    #[test]
    fn rejects_unknown_method() {
        let frame = r#"{"host":"http://a/","meth":"DELETE","user":"ua","cont":"","data":""}"#;
        assert!(serde_json::from_str::<Instruction>(frame).is_err());
    }

    #[test]
    fn rejects_bad_base64_body() {
        let frame = r#"{"host":"http://a/","meth":"GET","user":"ua","cont":"","data":"!!not-base64!!"}"#;
        assert!(serde_json::from_str::<Instruction>(frame).is_err());
    }

    #[test]
    fn body_round_trips_through_transport_encoding() {
        let bytes: Vec<u8> = (0u8..=255).collect();
        let instr = Instruction {
            target_url: "http://a/".into(),
            method: Method::Post,
            user_agent: "ua".into(),
            content_type: "".into(),
            body: bytes.clone(),
        };
        let json = serde_json::to_string(&instr).unwrap();
        let back: Instruction = serde_json::from_str(&json).unwrap();
        assert_eq!(back.body, bytes);
    }

    #[test]
    fn reply_uses_relay_field_names() {
        let reply = Reply {
            status: 200,
            body: b"hello".to_vec(),
            redirect_location: String::new(),
        };
        let json: serde_json::Value = serde_json::to_value(&reply).unwrap();
        assert_eq!(json["status"], 200);
        assert_eq!(json["response"], "aGVsbG8=");
        assert_eq!(json["location"], "");
    }
}
