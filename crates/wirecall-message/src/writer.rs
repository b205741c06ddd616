use bytes::{BufMut, BytesMut};

use crate::error::{MessageError, Result};
use crate::remote::RemotePtr;
use crate::tag::TypeTag;
use crate::{DEFAULT_MAX_MESSAGE, LEN_PREFIX_SIZE, USE_TAGS};

const INITIAL_BUFFER_CAPACITY: usize = 256;

/// Append cursor building one length-prefixed message.
///
/// The length prefix is kept current after every append, so the buffer
/// returned by [`as_bytes`](OutMessage::as_bytes) is always a complete,
/// transmittable frame. The first failed append latches the fail flag;
/// only [`clear`](OutMessage::clear) resets it.
pub struct OutMessage {
    buf: BytesMut,
    max_size: usize,
    ok: bool,
}

impl OutMessage {
    /// Cursor with the default size limit.
    pub fn new() -> Self {
        Self::with_max_size(DEFAULT_MAX_MESSAGE)
    }

    /// Cursor with an explicit size limit, prefix included.
    ///
    /// Both peers must agree on the limit.
    pub fn with_max_size(max_size: usize) -> Self {
        let mut msg = Self {
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            max_size,
            ok: true,
        };
        msg.clear();
        msg
    }

    /// Reset to an empty message and clear the fail flag.
    pub fn clear(&mut self) {
        self.buf.clear();
        self.buf.put_u32_le(LEN_PREFIX_SIZE as u32);
        self.ok = true;
    }

    /// The encoded frame, ready for transmission.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Current frame size in bytes, prefix included.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// True when no elements have been appended.
    pub fn is_empty(&self) -> bool {
        self.buf.len() <= LEN_PREFIX_SIZE
    }

    /// Configured size limit.
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Append a `u32` element.
    pub fn write_u32(&mut self, v: u32) -> Result<()> {
        self.append(TypeTag::U32, 4, |buf| buf.put_u32_le(v))
    }

    /// Append an `i32` element.
    pub fn write_i32(&mut self, v: i32) -> Result<()> {
        self.append(TypeTag::I32, 4, |buf| buf.put_i32_le(v))
    }

    /// Append a `u64` element.
    pub fn write_u64(&mut self, v: u64) -> Result<()> {
        self.append(TypeTag::U64, 8, |buf| buf.put_u64_le(v))
    }

    /// Append an `i64` element.
    pub fn write_i64(&mut self, v: i64) -> Result<()> {
        self.append(TypeTag::I64, 8, |buf| buf.put_i64_le(v))
    }

    /// Append an IEEE-754 double element.
    pub fn write_f64(&mut self, v: f64) -> Result<()> {
        self.append(TypeTag::F64, 8, |buf| buf.put_f64_le(v))
    }

    /// Append a single-byte character element.
    pub fn write_u8(&mut self, v: u8) -> Result<()> {
        self.append(TypeTag::Char, 1, |buf| buf.put_u8(v))
    }

    /// Append a string element.
    ///
    /// The terminating zero byte is emitted by the framer; callers never
    /// include one.
    pub fn write_str(&mut self, s: &str) -> Result<()> {
        self.append(TypeTag::Str, s.len() + 1, |buf| {
            buf.put_slice(s.as_bytes());
            buf.put_u8(0);
        })
    }

    /// Append a length-prefixed blob element.
    pub fn write_blob(&mut self, data: &[u8]) -> Result<()> {
        self.append(TypeTag::Blob, LEN_PREFIX_SIZE + data.len(), |buf| {
            buf.put_u32_le(data.len() as u32);
            buf.put_slice(data);
        })
    }

    /// Append a remote pointer token.
    pub fn write_remote_ptr(&mut self, ptr: RemotePtr) -> Result<()> {
        self.append(TypeTag::RemotePtr, 9, |buf| {
            buf.put_u64_le(ptr.addr());
            buf.put_u8(ptr.is_const() as u8);
        })
    }

    fn append(
        &mut self,
        tag: TypeTag,
        body_len: usize,
        fill: impl FnOnce(&mut BytesMut),
    ) -> Result<()> {
        if !self.ok {
            return Err(MessageError::BadMessage);
        }
        let overhead = usize::from(USE_TAGS);
        let required = self.buf.len() + overhead + body_len;
        if required > self.max_size {
            self.ok = false;
            return Err(MessageError::Overflow {
                required,
                max: self.max_size,
            });
        }
        if USE_TAGS {
            self.buf.put_u8(tag as u8);
        }
        fill(&mut self.buf);
        let total = self.buf.len() as u32;
        self.buf[..LEN_PREFIX_SIZE].copy_from_slice(&total.to_le_bytes());
        Ok(())
    }
}

impl Default for OutMessage {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for OutMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutMessage")
            .field("len", &self.buf.len())
            .field("max_size", &self.max_size)
            .field("ok", &self.ok)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn declared_len(msg: &OutMessage) -> usize {
        let bytes = msg.as_bytes();
        u32::from_le_bytes(bytes[..LEN_PREFIX_SIZE].try_into().unwrap()) as usize
    }

    #[test]
    fn fresh_message_is_bare_prefix() {
        let msg = OutMessage::new();
        assert_eq!(msg.len(), LEN_PREFIX_SIZE);
        assert!(msg.is_empty());
        assert_eq!(declared_len(&msg), LEN_PREFIX_SIZE);
    }

    #[test]
    fn prefix_tracks_every_append() {
        let mut msg = OutMessage::new();

        msg.write_u32(1).unwrap();
        assert_eq!(declared_len(&msg), msg.len());

        msg.write_str("abc").unwrap();
        assert_eq!(declared_len(&msg), msg.len());

        msg.write_blob(&[0xAB; 100]).unwrap();
        assert_eq!(declared_len(&msg), msg.len());
    }

    #[test]
    fn string_payload_carries_terminator() {
        let mut msg = OutMessage::new();
        msg.write_str("abc").unwrap();

        let bytes = msg.as_bytes();
        let body_start = LEN_PREFIX_SIZE + usize::from(USE_TAGS);
        assert_eq!(&bytes[body_start..body_start + 3], b"abc");
        assert_eq!(bytes[body_start + 3], 0);
    }

    #[test]
    fn exact_fit_succeeds_one_more_overflows() {
        let overhead = usize::from(USE_TAGS);
        // Limit sized so one u32 element lands exactly on the boundary.
        let max = LEN_PREFIX_SIZE + overhead + 4;
        let mut msg = OutMessage::with_max_size(max);

        msg.write_u32(7).unwrap();
        assert_eq!(msg.len(), max);

        let err = msg.write_u8(1).unwrap_err();
        assert!(matches!(err, MessageError::Overflow { .. }));
    }

    #[test]
    fn overflow_latches_fail_flag() {
        let mut msg = OutMessage::with_max_size(LEN_PREFIX_SIZE + 2);

        let err = msg.write_u64(1).unwrap_err();
        assert!(matches!(err, MessageError::Overflow { .. }));

        let err = msg.write_u8(1).unwrap_err();
        assert!(matches!(err, MessageError::BadMessage));

        msg.clear();
        msg.write_u8(1).expect("clear should reset the fail flag");
    }

    #[test]
    fn oversized_blob_rejected_then_bad_message() {
        let mut msg = OutMessage::new();
        let blob = vec![0u8; msg.max_size()];

        let err = msg.write_blob(&blob).unwrap_err();
        assert!(matches!(err, MessageError::Overflow { .. }));

        let err = msg.write_u32(1).unwrap_err();
        assert!(matches!(err, MessageError::BadMessage));
    }

    #[test]
    fn remote_ptr_encoding_is_nine_bytes() {
        let mut msg = OutMessage::new();
        msg.write_remote_ptr(RemotePtr::new_const(0x1122_3344_5566_7788))
            .unwrap();

        let bytes = msg.as_bytes();
        let body_start = LEN_PREFIX_SIZE + usize::from(USE_TAGS);
        assert_eq!(
            &bytes[body_start..body_start + 8],
            &0x1122_3344_5566_7788u64.to_le_bytes()
        );
        assert_eq!(bytes[body_start + 8], 1);
    }
}
