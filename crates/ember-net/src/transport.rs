//! In-process loopback transport with per-pair FIFO and tick latency.

use std::collections::{BTreeMap, VecDeque};

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use ember_core::SessionId;

use crate::{Broadcast, ClientRequest, HostNotice, Message, WireError, decode_message, encode_message};

/// Errors raised when handing a message to the transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The peer has disconnected.
    #[error("session {0} disconnected")]
    Disconnected(SessionId),

    /// No such session is connected to the host.
    #[error("unknown session {0}")]
    UnknownSession(SessionId),

    /// The peer's inbound queue is full.
    #[error("inbound queue of {0} is full")]
    QueueFull(SessionId),

    /// Encoding failed.
    #[error(transparent)]
    Wire(#[from] WireError),
}

/// One encoded message in flight.
#[derive(Debug)]
struct Datagram {
    /// Stamped by the sending endpoint, never by the payload.
    from: SessionId,
    deliver_at: u64,
    bytes: Vec<u8>,
}

/// Holds datagrams until their delivery tick.
#[derive(Debug)]
struct Inbox {
    rx: Receiver<Datagram>,
    pending: VecDeque<Datagram>,
}

impl Inbox {
    fn new(rx: Receiver<Datagram>) -> Self {
        Self {
            rx,
            pending: VecDeque::new(),
        }
    }

    /// Decoded messages due at `tick`, in arrival order.
    fn drain_due(&mut self, tick: u64) -> Vec<(SessionId, Message)> {
        self.pending.extend(self.rx.try_iter());
        let mut out = Vec::new();
        while self
            .pending
            .front()
            .is_some_and(|datagram| datagram.deliver_at <= tick)
        {
            let Some(datagram) = self.pending.pop_front() else {
                break;
            };
            match decode_message(&datagram.bytes) {
                Ok(message) => out.push((datagram.from, message)),
                Err(err) => {
                    tracing::warn!(from = %datagram.from, %err, "dropping undecodable message");
                }
            }
        }
        out
    }
}

fn push(
    tx: &Sender<Datagram>,
    to: SessionId,
    from: SessionId,
    deliver_at: u64,
    message: &Message,
) -> Result<(), TransportError> {
    let bytes = encode_message(message)?;
    tx.try_send(Datagram {
        from,
        deliver_at,
        bytes,
    })
    .map_err(|err| match err {
        TrySendError::Full(_) => TransportError::QueueFull(to),
        TrySendError::Disconnected(_) => TransportError::Disconnected(to),
    })
}

// ---------------------------------------------------------------------------
// HostEndpoint
// ---------------------------------------------------------------------------

/// The authoritative host's side of the loopback network.
#[derive(Debug)]
pub struct HostEndpoint {
    inbox: Inbox,
    clients: BTreeMap<SessionId, Sender<Datagram>>,
    latency_ticks: u64,
}

impl HostEndpoint {
    /// Requests from clients due at `tick`, tagged with the sending session.
    pub fn poll_requests(&mut self, tick: u64) -> Vec<(SessionId, ClientRequest)> {
        self.inbox
            .drain_due(tick)
            .into_iter()
            .filter_map(|(from, message)| match message {
                Message::Request(request) => Some((from, request)),
                other => {
                    tracing::warn!(%from, ?other, "host ignoring non-request message");
                    None
                }
            })
            .collect()
    }

    /// Host → owning session.
    pub fn send_to(
        &self,
        session: SessionId,
        notice: HostNotice,
        tick: u64,
    ) -> Result<(), TransportError> {
        let tx = self
            .clients
            .get(&session)
            .ok_or(TransportError::UnknownSession(session))?;
        push(
            tx,
            session,
            SessionId::HOST,
            tick + self.latency_ticks,
            &Message::Notice(notice),
        )
    }

    /// Host → every connected session. Returns how many accepted it.
    pub fn broadcast(&self, broadcast: Broadcast, tick: u64) -> usize {
        let message = Message::Broadcast(broadcast);
        let mut delivered = 0;
        for (session, tx) in &self.clients {
            match push(tx, *session, SessionId::HOST, tick + self.latency_ticks, &message) {
                Ok(()) => delivered += 1,
                Err(err) => tracing::warn!(%session, %err, "broadcast not delivered"),
            }
        }
        delivered
    }

    /// Forgets a session. Later sends to it fail with `UnknownSession`.
    pub fn disconnect(&mut self, session: SessionId) -> bool {
        self.clients.remove(&session).is_some()
    }

    pub fn sessions(&self) -> impl Iterator<Item = SessionId> + '_ {
        self.clients.keys().copied()
    }
}

// ---------------------------------------------------------------------------
// ClientEndpoint
// ---------------------------------------------------------------------------

/// One client session's side of the loopback network.
#[derive(Debug)]
pub struct ClientEndpoint {
    session: SessionId,
    inbox: Inbox,
    to_host: Sender<Datagram>,
    latency_ticks: u64,
}

impl ClientEndpoint {
    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Owning session → host.
    pub fn send(&self, request: ClientRequest, tick: u64) -> Result<(), TransportError> {
        push(
            &self.to_host,
            SessionId::HOST,
            self.session,
            tick + self.latency_ticks,
            &Message::Request(request),
        )
    }

    /// Notices and broadcasts due at `tick`.
    pub fn poll(&mut self, tick: u64) -> Vec<Message> {
        self.inbox
            .drain_due(tick)
            .into_iter()
            .map(|(_, message)| message)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// LoopbackNetwork
// ---------------------------------------------------------------------------

/// A host endpoint plus `client_count` client endpoints wired together.
///
/// Client sessions are numbered from 1; 0 is the host.
#[derive(Debug)]
pub struct LoopbackNetwork {
    pub host: HostEndpoint,
    pub clients: Vec<ClientEndpoint>,
}

impl LoopbackNetwork {
    pub fn new(client_count: u32, latency_ticks: u32, queue_capacity: usize) -> Self {
        let capacity = queue_capacity.max(1);
        let latency = u64::from(latency_ticks);
        let (to_host, host_rx) = bounded(capacity);
        let mut senders = BTreeMap::new();
        let mut clients = Vec::with_capacity(client_count as usize);
        for n in 1..=client_count {
            let session = SessionId(n);
            let (tx, rx) = bounded(capacity);
            senders.insert(session, tx);
            clients.push(ClientEndpoint {
                session,
                inbox: Inbox::new(rx),
                to_host: to_host.clone(),
                latency_ticks: latency,
            });
        }
        tracing::debug!(client_count, latency_ticks, "loopback network created");
        Self {
            host: HostEndpoint {
                inbox: Inbox::new(host_rx),
                clients: senders,
                latency_ticks: latency,
            },
            clients,
        }
    }
}
