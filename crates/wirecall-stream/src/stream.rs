use std::io::{ErrorKind, Read, Write};
use std::net::TcpStream;
use std::os::unix::net::UnixStream;
use std::time::Duration;

use tracing::trace;
use wirecall_message::{InMessage, MessageError, OutMessage, LEN_PREFIX_SIZE};

use crate::error::{Result, StreamError};

/// Interval between predicate polls while a blocking operation waits.
pub(crate) const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// One connected duplex stream carrying length-prefixed messages.
///
/// The underlying socket is always in non-blocking mode; every operation
/// here loops over `WouldBlock`, consulting the continuation predicate
/// between attempts. A stream carries one top-level request, its callback
/// chain, and the reply — messages are strictly serialized, never
/// interleaved.
pub struct PointToPoint {
    inner: StreamInner,
}

enum StreamInner {
    Unix(UnixStream),
    Tcp(TcpStream),
}

impl PointToPoint {
    pub(crate) fn from_unix(stream: UnixStream) -> Result<Self> {
        stream
            .set_nonblocking(true)
            .map_err(StreamError::SocketApi)?;
        Ok(Self {
            inner: StreamInner::Unix(stream),
        })
    }

    pub(crate) fn from_tcp(stream: TcpStream) -> Result<Self> {
        stream
            .set_nonblocking(true)
            .map_err(StreamError::SocketApi)?;
        Ok(Self {
            inner: StreamInner::Tcp(stream),
        })
    }

    fn read_raw(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            StreamInner::Unix(stream) => stream.read(buf),
            StreamInner::Tcp(stream) => stream.read(buf),
        }
    }

    fn write_raw(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            StreamInner::Unix(stream) => stream.write(buf),
            StreamInner::Tcp(stream) => stream.write(buf),
        }
    }

    fn flush_raw(&mut self) -> std::io::Result<()> {
        match &mut self.inner {
            StreamInner::Unix(stream) => stream.flush(),
            StreamInner::Tcp(stream) => stream.flush(),
        }
    }

    /// Read one complete framed message into `msg`.
    ///
    /// Blocks until the whole frame has arrived. Returns `Ok(false)` only
    /// when the predicate tripped; peer EOF, malformed lengths and I/O
    /// failures are errors.
    pub fn read_message<P: Fn() -> bool>(&mut self, msg: &mut InMessage, pred: &P) -> Result<bool> {
        let mut frame = vec![0u8; LEN_PREFIX_SIZE];
        let mut got = 0usize;

        while got < LEN_PREFIX_SIZE {
            match self.fill(&mut frame[got..LEN_PREFIX_SIZE], pred)? {
                Some(n) => got += n,
                None => return Ok(false),
            }
        }

        let declared = u32::from_le_bytes(
            frame[..LEN_PREFIX_SIZE]
                .try_into()
                .expect("prefix is 4 bytes"),
        ) as usize;
        if declared < LEN_PREFIX_SIZE {
            return Err(MessageError::TooShort {
                required: LEN_PREFIX_SIZE,
                len: declared,
            }
            .into());
        }
        if declared > msg.max_size() {
            return Err(MessageError::Overflow {
                required: declared,
                max: msg.max_size(),
            }
            .into());
        }

        frame.resize(declared, 0);
        while got < declared {
            match self.fill(&mut frame[got..], pred)? {
                Some(n) => got += n,
                None => return Ok(false),
            }
        }

        trace!(len = declared, "received message");
        msg.attach(&frame)?;
        Ok(true)
    }

    /// Write the whole framed buffer.
    ///
    /// Returns `Ok(false)` if the predicate tripped mid-write; the peer
    /// then sees at most a partial frame and must treat the stream as
    /// dead.
    pub fn write_message<P: Fn() -> bool>(&mut self, msg: &OutMessage, pred: &P) -> Result<bool> {
        let bytes = msg.as_bytes();
        let mut written = 0usize;

        while written < bytes.len() {
            match self.write_raw(&bytes[written..]) {
                Ok(0) => return Err(StreamError::Disconnected),
                Ok(n) => written += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => {
                    if !pred() {
                        return Ok(false);
                    }
                    std::thread::sleep(POLL_INTERVAL);
                }
                Err(err) => return Err(StreamError::SocketApi(err)),
            }
        }

        loop {
            match self.flush_raw() {
                Ok(()) => break,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => {
                    if !pred() {
                        return Ok(false);
                    }
                    std::thread::sleep(POLL_INTERVAL);
                }
                Err(err) => return Err(StreamError::SocketApi(err)),
            }
        }

        trace!(len = bytes.len(), "sent message");
        Ok(true)
    }

    /// Wait until the peer closes its end of the stream.
    ///
    /// Used by servers to ensure the client consumed the reply before the
    /// connection is torn down. A predicate trip raises
    /// [`StreamError::Stopped`].
    pub fn wait_for_shutdown<P: Fn() -> bool>(&mut self, pred: &P) -> Result<()> {
        let mut scratch = [0u8; 64];
        loop {
            match self.read_raw(&mut scratch) {
                Ok(0) => return Ok(()),
                // Trailing bytes past the protocol exchange are discarded.
                Ok(_) => continue,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => {
                    if !pred() {
                        return Err(StreamError::Stopped);
                    }
                    std::thread::sleep(POLL_INTERVAL);
                }
                Err(err) if err.kind() == ErrorKind::ConnectionReset => return Ok(()),
                Err(err) => return Err(StreamError::SocketApi(err)),
            }
        }
    }

    /// Half-close the write side, signalling the peer that this side is
    /// done with the exchange.
    pub fn shutdown(&self) -> Result<()> {
        let result = match &self.inner {
            StreamInner::Unix(stream) => stream.shutdown(std::net::Shutdown::Write),
            StreamInner::Tcp(stream) => stream.shutdown(std::net::Shutdown::Write),
        };
        match result {
            Ok(()) => Ok(()),
            // Already gone is fine for teardown.
            Err(err) if err.kind() == ErrorKind::NotConnected => Ok(()),
            Err(err) => Err(StreamError::SocketApi(err)),
        }
    }

    /// Read into `buf`, polling the predicate over `WouldBlock`.
    ///
    /// `Ok(None)` means the predicate tripped.
    fn fill<P: Fn() -> bool>(&mut self, buf: &mut [u8], pred: &P) -> Result<Option<usize>> {
        loop {
            match self.read_raw(buf) {
                Ok(0) => return Err(StreamError::Disconnected),
                Ok(n) => return Ok(Some(n)),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => {
                    if !pred() {
                        return Ok(None);
                    }
                    std::thread::sleep(POLL_INTERVAL);
                }
                Err(err) => return Err(StreamError::SocketApi(err)),
            }
        }
    }
}

impl std::fmt::Debug for PointToPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let transport = match &self.inner {
            StreamInner::Unix(_) => "unix",
            StreamInner::Tcp(_) => "tcp",
        };
        f.debug_struct("PointToPoint")
            .field("transport", &transport)
            .finish()
    }
}
