use std::time::Duration;
use thiserror::Error;

/// Blocking source of raw bus messages.
pub trait Transport {
    /// Next message, or `Ok(None)` when nothing arrived within the receive
    /// timeout.
    fn receive(&mut self) -> Result<Option<Vec<u8>>, TransportError>;

    /// Drops the current connection and subscribes again.
    fn reconnect(&mut self) -> Result<(), TransportError>;
}

/// ZeroMQ SUB socket subscribed to every topic of one publisher.
pub struct ZmqSubscriber {
    context: zmq::Context,
    endpoint: String,
    receive_timeout: Duration,
    max_message_size: u64,
    socket: Option<zmq::Socket>,
}

impl ZmqSubscriber {
    /// The socket is opened lazily, on the first receive.
    /// Larger messages are discarded by the socket itself.
    pub fn new(endpoint: &str, receive_timeout: Duration, max_message_size: u64) -> Self {
        Self {
            context: zmq::Context::new(),
            endpoint: endpoint.to_string(),
            receive_timeout,
            max_message_size,
            socket: None,
        }
    }

    fn connect(&self) -> Result<zmq::Socket, TransportError> {
        // Zero would turn every receive into a busy poll.
        let timeout = i32::try_from(self.receive_timeout.as_millis())
            .unwrap_or(i32::MAX)
            .max(1);

        let socket = self.context.socket(zmq::SUB).map_err(TransportError::Socket)?;
        socket.set_rcvtimeo(timeout).map_err(TransportError::Socket)?;
        socket.set_linger(0).map_err(TransportError::Socket)?;
        socket
            .set_maxmsgsize(i64::try_from(self.max_message_size).unwrap_or(i64::MAX))
            .map_err(TransportError::Socket)?;
        socket
            .connect(&self.endpoint)
            .map_err(TransportError::Connect)?;
        socket.set_subscribe(b"").map_err(TransportError::Socket)?;

        log::info!("Subscribed to {}", self.endpoint);
        Ok(socket)
    }
}

impl Transport for ZmqSubscriber {
    fn receive(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        if self.socket.is_none() {
            self.socket = Some(self.connect()?);
        }
        let Some(socket) = &self.socket else {
            return Ok(None);
        };

        match socket.recv_bytes(0) {
            Ok(bytes) => Ok(Some(bytes)),
            // Timeout, or a signal arrived while blocked.
            Err(zmq::Error::EAGAIN) | Err(zmq::Error::EINTR) => Ok(None),
            Err(err) => Err(TransportError::Receive(err)),
        }
    }

    fn reconnect(&mut self) -> Result<(), TransportError> {
        self.socket = None;
        self.socket = Some(self.connect()?);
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Failed to set up the subscriber socket.")]
    Socket(zmq::Error),

    #[error("Failed to connect to the bus endpoint.")]
    Connect(zmq::Error),

    #[error("Failed to receive a message.")]
    Receive(zmq::Error),
}

impl TransportError {
    pub fn additional_info(&self) -> Option<String> {
        match self {
            TransportError::Socket(err)
            | TransportError::Connect(err)
            | TransportError::Receive(err) => Some(err.to_string()),
        }
    }
}
