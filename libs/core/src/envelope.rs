use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::message::Message;

/// Outer wrapper of every frame: `{"type": <tag>, "data": <json string>}`
///
/// `data` holds the payload already serialized to JSON, so the payload is
/// encoded twice on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub tag: String,
    pub data: String,
}

impl Envelope {
    /// Wrap a catalog message
    pub fn new<M: Message>(message: &M) -> Result<Self> {
        Self::with_tag(M::TAG, message)
    }

    /// Wrap any serializable payload under an explicit tag
    pub fn with_tag<T: Serialize>(tag: impl Into<String>, payload: &T) -> Result<Self> {
        let data = serde_json::to_string(payload).map_err(Error::Encode)?;
        Ok(Self {
            tag: tag.into(),
            data,
        })
    }

    /// Build an envelope from parts without checking them
    pub fn raw(tag: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            data: data.into(),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(Error::Encode)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let envelope: Envelope =
            serde_json::from_slice(bytes).map_err(|e| Error::decode(e.to_string()))?;
        if envelope.tag.is_empty() {
            return Err(Error::decode("envelope has an empty type tag"));
        }
        Ok(envelope)
    }

    pub fn is<M: Message>(&self) -> bool {
        self.tag == M::TAG
    }

    /// Decode the payload as `M`, refusing envelopes tagged for anything else
    pub fn open<M: Message>(&self) -> Result<M> {
        if !self.is::<M>() {
            return Err(Error::TypeMismatch {
                expected: M::TAG.to_string(),
                found: self.tag.clone(),
            });
        }
        serde_json::from_str(&self.data).map_err(|source| Error::PayloadDecode {
            tag: self.tag.clone(),
            source,
        })
    }
}

/// Serialize `message` into envelope bytes ready for framing
pub fn encode<M: Message>(message: &M) -> Result<Vec<u8>> {
    Envelope::new(message)?.to_bytes()
}

pub fn decode(bytes: &[u8]) -> Result<Envelope> {
    Envelope::from_bytes(bytes)
}

pub fn decode_payload<M: Message>(envelope: &Envelope) -> Result<M> {
    envelope.open()
}
