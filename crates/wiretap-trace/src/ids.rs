use serde::{Deserialize, Serialize};
use std::fmt;

/// Trace identifier: 16 random bytes, hex-rendered.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TraceId(pub [u8; 16]);

/// Span identifier: 8 random bytes, hex-rendered.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SpanId(pub [u8; 8]);

/// Error returned when parsing an id from a hex string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseIdError;

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("invalid hex id")
    }
}

impl std::error::Error for ParseIdError {}

impl TraceId {
    pub fn generate() -> Self {
        let mut bytes = [0u8; 16];
        getrandom::getrandom(&mut bytes).expect("operating system RNG");
        Self(bytes)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, ParseIdError> {
        let raw = hex::decode(s).map_err(|_| ParseIdError)?;
        let bytes: [u8; 16] = raw.try_into().map_err(|_| ParseIdError)?;
        Ok(Self(bytes))
    }
}

impl SpanId {
    pub fn generate() -> Self {
        let mut bytes = [0u8; 8];
        getrandom::getrandom(&mut bytes).expect("operating system RNG");
        Self(bytes)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, ParseIdError> {
        let raw = hex::decode(s).map_err(|_| ParseIdError)?;
        let bytes: [u8; 8] = raw.try_into().map_err(|_| ParseIdError)?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TraceId({})", self.to_hex())
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SpanId({})", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trip() {
        let trace_id = TraceId::generate();
        assert_eq!(TraceId::from_hex(&trace_id.to_hex()), Ok(trace_id));

        let span_id = SpanId::generate();
        assert_eq!(SpanId::from_hex(&span_id.to_hex()), Ok(span_id));
    }

    #[test]
    fn rejects_bad_hex() {
        assert_eq!(TraceId::from_hex("zz"), Err(ParseIdError));
        // Wrong length decodes but does not fit.
        assert_eq!(SpanId::from_hex("abcd"), Err(ParseIdError));
    }

    #[test]
    fn generated_ids_differ() {
        assert_ne!(TraceId::generate(), TraceId::generate());
        assert_ne!(SpanId::generate(), SpanId::generate());
    }
}
