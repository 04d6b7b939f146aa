//! Pairs each request with its response on a shared connection
//!
//! The protocol allows one outstanding request per connection, so pairing is
//! done by exclusion: the lock is held from the first byte written to the
//! last byte of the reply read. Concurrent callers queue on the lock instead
//! of interleaving frames. Tagging requests with ids for pipelining would
//! replace the lock here and nowhere else.

use presence_core::{catalog, Message, Request, ServiceError};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::channel::Channel;
use crate::error::{Error, Result};

struct Slot {
    channel: Channel,
    /// Set for the duration of an exchange
    ///
    /// Still set on the next lock means the previous caller dropped its
    /// future partway through.
    in_flight: bool,
}

pub struct Correlator {
    slot: Mutex<Option<Slot>>,
}

impl Correlator {
    pub fn new(channel: Channel) -> Self {
        Self {
            slot: Mutex::new(Some(Slot {
                channel,
                in_flight: false,
            })),
        }
    }

    fn ready(slot: &mut Option<Slot>) -> Result<&mut Slot> {
        let slot = slot.as_mut().ok_or(Error::ConnectionClosed)?;
        if slot.in_flight {
            warn!("previous exchange was abandoned mid-flight; connection unusable");
            return Err(Error::Broken);
        }
        Ok(slot)
    }

    /// Write one message and return once it is on the wire
    pub async fn send<M: Message>(&self, message: &M) -> Result<()> {
        let mut guard = self.slot.lock().await;
        let slot = Self::ready(&mut guard)?;

        slot.in_flight = true;
        let result = slot.channel.send(message).await;
        slot.in_flight = false;
        result
    }

    /// Write `request` and wait for its reply
    ///
    /// An `Error` envelope from the service comes back as [`Error::Remote`].
    /// A tag outside the catalog is `UnknownMessageType`; any other
    /// unexpected tag is a type mismatch.
    pub async fn exchange<R: Request>(&self, request: &R) -> Result<R::Response> {
        let mut guard = self.slot.lock().await;
        let slot = Self::ready(&mut guard)?;

        slot.in_flight = true;
        let result = Self::round_trip(&mut slot.channel, request).await;
        slot.in_flight = false;
        result
    }

    async fn round_trip<R: Request>(channel: &mut Channel, request: &R) -> Result<R::Response> {
        channel.send(request).await?;
        let envelope = channel.receive_envelope().await?;

        if !catalog::is_known_tag(&envelope.tag) {
            return Err(presence_core::Error::UnknownMessageType(envelope.tag).into());
        }
        if envelope.is::<ServiceError>() && !envelope.is::<R::Response>() {
            let rejected: ServiceError = envelope.open()?;
            return Err(Error::Remote(rejected.message));
        }
        Ok(envelope.open()?)
    }

    pub async fn is_usable(&self) -> bool {
        match self.slot.lock().await.as_ref() {
            Some(slot) => !slot.in_flight && slot.channel.is_usable(),
            None => false,
        }
    }

    /// Release the connection
    ///
    /// Waits for an exchange in progress. Returns `false` when the connection
    /// was already released; later requests fail with `ConnectionClosed`.
    pub async fn close(&self) -> bool {
        let Some(mut slot) = self.slot.lock().await.take() else {
            return false;
        };
        if let Err(e) = slot.channel.close().await {
            debug!(error = %e, "error while closing connection");
        }
        true
    }
}
