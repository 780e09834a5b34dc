// Frames on the socket are a 4-byte big-endian length (counting itself)
// followed by the payload. One Connection owns one socket; a request and its
// response must not interleave with another caller's, so `command` and
// `fetch` hold the command lock across the send/receive pair.

use crate::config::Config;
use crate::core::field_size;
use crate::error::{NyzoError, Result};
use crate::network::message::Message;
use data_encoding::HEXLOWER;
use log::{debug, error, info, warn};
use std::io::{ErrorKind, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

const READ_CHUNK: usize = 2048;
// cap on up-front allocation; longer payloads grow as bytes arrive
const MAX_PREALLOCATION: usize = 1 << 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

// Reads and writes run on a cloned handle outside this lock, so `close` and
// `state` never wait on the socket. `generation` counts opened sockets.
struct Inner {
    stream: Option<TcpStream>,
    state: ConnectionState,
    generation: u64,
}

/// Lazily connected, length-framed TCP link to one peer
pub struct Connection {
    host: String,
    port: u16,
    timeout: Duration,
    dump_packets: bool,
    inner: Mutex<Inner>,
    command_lock: Mutex<()>,
}

/// Prefix `payload` with its framed length
pub fn frame(payload: &[u8]) -> Result<Vec<u8>> {
    let length = u32::try_from(payload.len() + field_size::MESSAGE_LENGTH).map_err(|_| {
        NyzoError::MalformedBuffer(format!("payload of {} bytes cannot be framed", payload.len()))
    })?;
    let mut vbytes = Vec::with_capacity(payload.len() + field_size::MESSAGE_LENGTH);
    vbytes.extend(&length.to_be_bytes());
    vbytes.extend(payload);
    Ok(vbytes)
}

fn is_timeout(err: &std::io::Error) -> bool {
    matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut)
}

impl Connection {
    pub fn new(host: &str, port: u16, timeout: Duration) -> Connection {
        Connection {
            host: host.to_string(),
            port,
            timeout,
            dump_packets: false,
            inner: Mutex::new(Inner {
                stream: None,
                state: ConnectionState::Disconnected,
                generation: 0,
            }),
            command_lock: Mutex::new(()),
        }
    }

    pub fn from_config(config: &Config) -> Connection {
        let mut connection = Connection::new(&config.host, config.port, config.network_timeout);
        connection.dump_packets = config.dump_packets;
        connection
    }

    pub fn peer_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn state(&self) -> ConnectionState {
        match self.inner.lock() {
            Ok(inner) => inner.state,
            Err(_) => {
                error!("Connection state lock poisoned");
                ConnectionState::Disconnected
            }
        }
    }

    fn lock_inner(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| NyzoError::Connection("Connection lock poisoned".to_string()))
    }

    /// Open the socket if there is none; a single attempt per call.
    pub fn ensure_connected(&self) -> Result<()> {
        let mut inner = self.lock_inner()?;
        self.connect_locked(&mut inner)
    }

    fn connect_locked(&self, inner: &mut Inner) -> Result<()> {
        if inner.stream.is_some() {
            return Ok(());
        }
        inner.state = ConnectionState::Connecting;
        info!("Connecting to {}", self.peer_address());
        match self.open_stream() {
            Ok(stream) => {
                inner.stream = Some(stream);
                inner.state = ConnectionState::Connected;
                inner.generation += 1;
                Ok(())
            }
            Err(e) => {
                inner.state = ConnectionState::Disconnected;
                Err(e)
            }
        }
    }

    fn open_stream(&self) -> Result<TcpStream> {
        let address = self.peer_address();
        let candidates = (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| NyzoError::Connection(format!("Failed to resolve {address}: {e}")))?;

        let mut last_error = None;
        for candidate in candidates {
            match TcpStream::connect_timeout(&candidate, self.timeout) {
                Ok(stream) => {
                    stream.set_read_timeout(Some(self.timeout)).map_err(|e| {
                        NyzoError::Connection(format!("Failed to set read timeout: {e}"))
                    })?;
                    stream.set_write_timeout(Some(self.timeout)).map_err(|e| {
                        NyzoError::Connection(format!("Failed to set write timeout: {e}"))
                    })?;
                    return Ok(stream);
                }
                Err(e) => last_error = Some(e),
            }
        }

        let reason = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no usable address".to_string());
        Err(NyzoError::Connection(format!(
            "Failed to connect to {address}: {reason}"
        )))
    }

    /// Connect if needed and hand out a clone of the live socket, tagged
    /// with the generation it belongs to.
    fn checkout(&self) -> Result<(TcpStream, u64)> {
        let mut inner = self.lock_inner()?;
        self.connect_locked(&mut inner)?;
        let stream = match inner.stream.as_ref() {
            Some(stream) => stream.try_clone().map_err(|e| {
                NyzoError::Connection(format!("Failed to clone socket handle: {e}"))
            })?,
            None => return Err(NyzoError::Connection("No socket to use".to_string())),
        };
        Ok((stream, inner.generation))
    }

    /// Drop the socket of `generation` if it is still the live one.
    /// Returns false when `close` or a reconnect already replaced it.
    fn discard(&self, generation: u64) -> Result<bool> {
        let mut inner = self.lock_inner()?;
        if inner.stream.is_none() || inner.generation != generation {
            return Ok(false);
        }
        inner.stream = None;
        inner.state = ConnectionState::Disconnected;
        Ok(true)
    }

    fn closed_during(&self, operation: &str) -> NyzoError {
        debug!("{operation} on {} abandoned by close", self.peer_address());
        NyzoError::Connection(format!(
            "Connection to {} closed during {operation}",
            self.peer_address()
        ))
    }

    fn write_frame(stream: &mut TcpStream, framed: &[u8]) -> std::io::Result<()> {
        // header and payload leave in one write
        stream.write_all(framed)?;
        stream.flush()
    }

    /// Frame and send `payload`. A failed write drops the socket and is
    /// retried once on a fresh connection before the error surfaces.
    pub fn send(&self, payload: &[u8]) -> Result<()> {
        let framed = frame(payload)?;
        let (mut stream, generation) = self.checkout()?;

        if let Err(e) = Connection::write_frame(&mut stream, &framed) {
            if !self.discard(generation)? {
                return Err(self.closed_during("send"));
            }
            warn!("Send to {} failed ({e}), reconnecting", self.peer_address());
            let (mut stream, generation) = self.checkout()?;
            if let Err(e) = Connection::write_frame(&mut stream, &framed) {
                if !self.discard(generation)? {
                    return Err(self.closed_during("send"));
                }
                error!("Send to {} failed again: {e}", self.peer_address());
                return Err(NyzoError::Connection(format!(
                    "Send to {} failed: {e}",
                    self.peer_address()
                )));
            }
        }

        if self.dump_packets {
            debug!("Sent {} bytes: {}", framed.len(), HEXLOWER.encode(&framed));
        }
        Ok(())
    }

    /// Read one frame and return its payload.
    ///
    /// `Ok(None)` means nothing arrived before the timeout; the socket is
    /// dropped so the next call starts on a fresh connection.
    pub fn receive(&self) -> Result<Option<Vec<u8>>> {
        let (mut stream, generation) = self.checkout()?;

        match self.read_frame(&mut stream) {
            Ok(Some(payload)) => Ok(Some(payload)),
            Ok(None) => {
                self.discard(generation)?;
                Ok(None)
            }
            Err(e) => {
                if !self.discard(generation)? {
                    return Err(self.closed_during("receive"));
                }
                error!("Receive from {} failed: {e}", self.peer_address());
                Err(e)
            }
        }
    }

    fn read_frame(&self, stream: &mut TcpStream) -> Result<Option<Vec<u8>>> {
        let mut header = [0u8; field_size::MESSAGE_LENGTH];
        if let Err(e) = stream.read_exact(&mut header) {
            if is_timeout(&e) {
                debug!("Nothing from {} within {:?}", self.peer_address(), self.timeout);
                return Ok(None);
            }
            return Err(NyzoError::Connection(format!("Failed to read frame header: {e}")));
        }

        let length = u32::from_be_bytes(header) as usize;
        if length < field_size::MESSAGE_LENGTH {
            return Err(NyzoError::MalformedBuffer(format!(
                "frame length {length} is shorter than its own header"
            )));
        }
        let payload_length = length - field_size::MESSAGE_LENGTH;
        if self.dump_packets {
            debug!("Receiving {payload_length} announced bytes");
        }

        let mut payload = Vec::with_capacity(payload_length.min(MAX_PREALLOCATION));
        let mut chunk = [0u8; READ_CHUNK];
        while payload.len() < payload_length {
            let wanted = (payload_length - payload.len()).min(READ_CHUNK);
            match stream.read(&mut chunk[..wanted]) {
                Ok(0) => {
                    return Err(NyzoError::Connection(format!(
                        "Peer closed the socket after {} of {payload_length} bytes",
                        payload.len()
                    )))
                }
                Ok(read) => payload.extend_from_slice(&chunk[..read]),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(NyzoError::Connection(format!(
                        "Failed to read frame payload: {e}"
                    )))
                }
            }
        }

        if self.dump_packets {
            debug!("Received {} bytes: {}", payload.len(), HEXLOWER.encode(&payload));
        }
        Ok(Some(payload))
    }

    /// Send `payload` and wait for the reply, holding the command lock
    /// so no other caller's frames interleave.
    pub fn command(&self, payload: &[u8]) -> Result<Option<Vec<u8>>> {
        let _guard = self
            .command_lock
            .lock()
            .map_err(|_| NyzoError::Connection("Command lock poisoned".to_string()))?;
        self.send(payload)?;
        self.receive()
    }

    /// Send `message` and decode the reply. The reply's signature is not
    /// checked here; see [`Message::verify_signature`].
    pub fn fetch(&self, message: &Message) -> Result<Option<Message>> {
        match self.command(&message.encode_for_transmission())? {
            Some(payload) => Ok(Some(Message::decode(&payload)?)),
            None => Ok(None),
        }
    }

    /// Shut the socket down. A send or receive blocked on it in another
    /// thread returns at once with `NyzoError::Connection`.
    pub fn close(&self) {
        match self.inner.lock() {
            Ok(mut inner) => {
                if let Some(stream) = inner.stream.take() {
                    let _ = stream.shutdown(std::net::Shutdown::Both);
                }
                inner.state = ConnectionState::Disconnected;
            }
            Err(_) => error!("Connection lock poisoned while closing"),
        }
    }
}
