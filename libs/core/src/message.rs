use serde::de::DeserializeOwned;
use serde::Serialize;

/// A payload that travels inside an [`Envelope`](crate::Envelope)
///
/// `TAG` is written to the envelope's `type` field and checked again on the
/// way back in, so a payload can never be decoded as a different message.
pub trait Message: Serialize + DeserializeOwned + Send + Sync {
    const TAG: &'static str;
}

/// A message the service answers
///
/// Messages that only implement [`Message`] are fire-and-forget.
pub trait Request: Message {
    type Response: Message;
}
