use bytes::{BufMut, BytesMut};

use crate::error::{MessageError, Result};
use crate::remote::RemotePtr;
use crate::tag::TypeTag;
use crate::{DEFAULT_MAX_MESSAGE, LEN_PREFIX_SIZE, USE_TAGS};

/// Extract cursor consuming a frame built by a peer's `OutMessage`.
///
/// The read offset starts just past the length prefix and only ever
/// advances. The first failed extraction latches the fail flag; only a
/// successful [`attach`](InMessage::attach) resets it.
pub struct InMessage {
    buf: BytesMut,
    offset: usize,
    max_size: usize,
    ok: bool,
}

impl InMessage {
    /// Empty cursor with the default size limit.
    pub fn new() -> Self {
        Self::with_max_size(DEFAULT_MAX_MESSAGE)
    }

    /// Empty cursor with an explicit size limit, prefix included.
    pub fn with_max_size(max_size: usize) -> Self {
        let mut buf = BytesMut::with_capacity(LEN_PREFIX_SIZE);
        buf.put_u32_le(LEN_PREFIX_SIZE as u32);
        Self {
            buf,
            offset: LEN_PREFIX_SIZE,
            max_size,
            ok: true,
        }
    }

    /// Attach one complete frame and rewind to the start of its payload.
    ///
    /// The frame's declared length must match its byte count and fit the
    /// size limit. A successful attach clears the fail flag; a rejected
    /// frame leaves the cursor latched.
    pub fn attach(&mut self, frame: &[u8]) -> Result<()> {
        if frame.len() < LEN_PREFIX_SIZE {
            self.ok = false;
            return Err(MessageError::TooShort {
                required: LEN_PREFIX_SIZE,
                len: frame.len(),
            });
        }
        if frame.len() > self.max_size {
            self.ok = false;
            return Err(MessageError::Overflow {
                required: frame.len(),
                max: self.max_size,
            });
        }
        let declared =
            u32::from_le_bytes(frame[..LEN_PREFIX_SIZE].try_into().expect("prefix is 4 bytes"))
                as usize;
        if declared != frame.len() {
            self.ok = false;
            return Err(MessageError::LengthMismatch {
                declared,
                actual: frame.len(),
            });
        }
        self.buf.clear();
        self.buf.extend_from_slice(frame);
        self.offset = LEN_PREFIX_SIZE;
        self.ok = true;
        Ok(())
    }

    /// Total frame size in bytes, prefix included.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// True when the attached frame has no payload.
    pub fn is_empty(&self) -> bool {
        self.buf.len() <= LEN_PREFIX_SIZE
    }

    /// Bytes left to extract.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.offset
    }

    /// Configured size limit.
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Reset the offset to the start of the payload.
    ///
    /// Used when a received buffer turns out to be a nested callback
    /// request rather than a final reply.
    pub fn rewind(&mut self) {
        self.offset = LEN_PREFIX_SIZE;
    }

    /// Read the first payload word without consuming it.
    ///
    /// Used by dispatch pumps to classify a buffer by its leading function
    /// id. Repeated peeks return the same value.
    pub fn peek_u32(&mut self) -> Result<u32> {
        let body = self.probe(TypeTag::U32, 4, LEN_PREFIX_SIZE)?;
        Ok(u32::from_le_bytes(
            self.buf[body..body + 4].try_into().expect("probed 4 bytes"),
        ))
    }

    /// Extract a `u32` element.
    pub fn read_u32(&mut self) -> Result<u32> {
        let body = self.consume(TypeTag::U32, 4)?;
        Ok(u32::from_le_bytes(
            self.buf[body..body + 4].try_into().expect("consumed 4 bytes"),
        ))
    }

    /// Extract an `i32` element.
    pub fn read_i32(&mut self) -> Result<i32> {
        let body = self.consume(TypeTag::I32, 4)?;
        Ok(i32::from_le_bytes(
            self.buf[body..body + 4].try_into().expect("consumed 4 bytes"),
        ))
    }

    /// Extract a `u64` element.
    pub fn read_u64(&mut self) -> Result<u64> {
        let body = self.consume(TypeTag::U64, 8)?;
        Ok(u64::from_le_bytes(
            self.buf[body..body + 8].try_into().expect("consumed 8 bytes"),
        ))
    }

    /// Extract an `i64` element.
    pub fn read_i64(&mut self) -> Result<i64> {
        let body = self.consume(TypeTag::I64, 8)?;
        Ok(i64::from_le_bytes(
            self.buf[body..body + 8].try_into().expect("consumed 8 bytes"),
        ))
    }

    /// Extract an IEEE-754 double element.
    pub fn read_f64(&mut self) -> Result<f64> {
        let body = self.consume(TypeTag::F64, 8)?;
        Ok(f64::from_le_bytes(
            self.buf[body..body + 8].try_into().expect("consumed 8 bytes"),
        ))
    }

    /// Extract a single-byte character element.
    pub fn read_u8(&mut self) -> Result<u8> {
        let body = self.consume(TypeTag::Char, 1)?;
        Ok(self.buf[body])
    }

    /// Extract a string element.
    ///
    /// Reads up to the terminating zero byte, which is consumed but not
    /// part of the returned value.
    pub fn read_str(&mut self) -> Result<String> {
        // Shortest possible string body is the bare terminator.
        let body = self.probe(TypeTag::Str, 1, self.offset)?;
        let rest = &self.buf[body..];
        let Some(nul) = rest.iter().position(|&b| b == 0) else {
            self.ok = false;
            return Err(MessageError::ContainerOverflow(
                "string terminator not found within message bounds".to_string(),
            ));
        };
        match String::from_utf8(rest[..nul].to_vec()) {
            Ok(text) => {
                self.offset = body + nul + 1;
                Ok(text)
            }
            Err(err) => {
                self.ok = false;
                Err(err.into())
            }
        }
    }

    /// Extract a length-prefixed blob element.
    pub fn read_blob(&mut self) -> Result<Vec<u8>> {
        let body = self.probe(TypeTag::Blob, LEN_PREFIX_SIZE, self.offset)?;
        let blob_len = u32::from_le_bytes(
            self.buf[body..body + LEN_PREFIX_SIZE]
                .try_into()
                .expect("probed 4 bytes"),
        ) as usize;
        let data_start = body + LEN_PREFIX_SIZE;
        if data_start + blob_len > self.buf.len() {
            self.ok = false;
            return Err(MessageError::ContainerOverflow(format!(
                "blob length {blob_len} exceeds message bounds"
            )));
        }
        let data = self.buf[data_start..data_start + blob_len].to_vec();
        self.offset = data_start + blob_len;
        Ok(data)
    }

    /// Extract a remote pointer token.
    pub fn read_remote_ptr(&mut self) -> Result<RemotePtr> {
        let body = self.consume(TypeTag::RemotePtr, 9)?;
        let addr = u64::from_le_bytes(
            self.buf[body..body + 8].try_into().expect("consumed 8 bytes"),
        );
        Ok(if self.buf[body + 8] != 0 {
            RemotePtr::new_const(addr)
        } else {
            RemotePtr::new(addr)
        })
    }

    /// Validate the element at `at` and return its body offset without
    /// advancing the cursor. Errors latch the fail flag and leave the
    /// offset untouched.
    fn probe(&mut self, expected: TypeTag, body_len: usize, at: usize) -> Result<usize> {
        if !self.ok {
            return Err(MessageError::BadMessage);
        }
        let overhead = usize::from(USE_TAGS);
        let required = at + overhead + body_len;
        if required > self.buf.len() {
            self.ok = false;
            return Err(MessageError::TooShort {
                required,
                len: self.buf.len(),
            });
        }
        if USE_TAGS {
            let byte = self.buf[at];
            if byte != expected as u8 {
                self.ok = false;
                return Err(MessageError::TypeMismatch {
                    got: TypeTag::name_of(byte),
                    expected: expected.name(),
                });
            }
        }
        Ok(at + overhead)
    }

    /// Validate a fixed-size element at the cursor and advance past it.
    fn consume(&mut self, expected: TypeTag, body_len: usize) -> Result<usize> {
        let body = self.probe(expected, body_len, self.offset)?;
        self.offset = body + body_len;
        Ok(body)
    }
}

impl Default for InMessage {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMessage")
            .field("len", &self.buf.len())
            .field("offset", &self.offset)
            .field("ok", &self.ok)
            .finish()
    }
}
