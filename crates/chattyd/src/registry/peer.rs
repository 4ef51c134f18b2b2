//! Outbound side of a session as seen by the registry.
//!
//! The registry never touches sockets. Each session hands it a [`Peer`]: its
//! identity plus the sending half of a bounded outbox that the session's
//! writer task drains. Delivery is a non-blocking `try_send`, so a slow or
//! dead client can only lose its own lines.

use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

use chatty_core::SessionId;
use chatty_protocol::ServerLine;

/// One rendered line, shared between every recipient of a broadcast.
pub type OutboundLine = Arc<str>;

/// Sending half of a session's outbox.
pub type Outbox = mpsc::Sender<OutboundLine>;

/// Renders a server line once for fan-out.
pub fn render(line: &ServerLine) -> OutboundLine {
    Arc::from(line.to_string())
}

/// A registered session's identity and outbox.
#[derive(Debug, Clone)]
pub struct Peer {
    id: SessionId,
    outbox: Outbox,
}

impl Peer {
    pub fn new(id: SessionId, outbox: Outbox) -> Self {
        Self { id, outbox }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Queues a line without waiting. Returns false if the line was dropped.
    pub fn deliver(&self, line: &OutboundLine) -> bool {
        match self.outbox.try_send(Arc::clone(line)) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!(session = %self.id, "Outbox full, dropping line");
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!(session = %self.id, "Outbox closed, dropping line");
                false
            }
        }
    }
}

/// Outcome of fanning one line out to a set of peers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delivery {
    /// Lines queued on a recipient's outbox
    pub delivered: usize,

    /// Lines dropped because the outbox was full or closed
    pub dropped: usize,
}

impl Delivery {
    pub(crate) fn record(&mut self, queued: bool) {
        if queued {
            self.delivered += 1;
        } else {
            self.dropped += 1;
        }
    }

    /// Number of recipients the line was addressed to.
    pub fn recipients(&self) -> usize {
        self.delivered + self.dropped
    }
}

/// Outcome of a direct message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectOutcome {
    /// At least one session holds the target name.
    Delivered(Delivery),

    /// Nobody holds the target name; the sender was told so.
    NotFound,
}
