//! Canonical value codec
//!
//! Every value is written in a fixed, architecture-independent byte order so
//! identical logical values hash identically on every host.
//!
//! # Format
//!
//! - Unsigned integers: big-endian ("network order"), 1/2/4/8 bytes for
//!   `u8`/`u16`/`u32`/`u64`
//! - Text and byte buffers: raw bytes, no framing. Decoding consumes the
//!   rest of the stream unless wrapped in [`Prefixed`]
//! - [`Prefixed`]: `u64` big-endian length followed by the inner encoding
//! - Fixed-width integers and digests: their stored bytes verbatim
//!
//! Reads check the remaining length before consuming anything, so a failed
//! read leaves the cursor where it was.

use crate::{Error, Result};

/// Host/network byte order conversion for fixed-width integers
pub trait NetworkOrder: Copy {
    /// Value whose in-memory bytes are the big-endian bytes of `self`
    fn host_to_net(self) -> Self;

    /// Inverse of [`NetworkOrder::host_to_net`]
    fn net_to_host(self) -> Self;
}

macro_rules! impl_network_order {
    ($($t:ty),*) => {
        $(
            impl NetworkOrder for $t {
                fn host_to_net(self) -> Self {
                    self.to_be()
                }

                fn net_to_host(self) -> Self {
                    <$t>::from_be(self)
                }
            }
        )*
    };
}

impl_network_order!(u8, u16, u32, u64);

/// Convert a host-order integer to network order
pub fn host_to_net<T: NetworkOrder>(value: T) -> T {
    value.host_to_net()
}

/// Convert a network-order integer to host order
pub fn net_to_host<T: NetworkOrder>(value: T) -> T {
    value.net_to_host()
}

/// Append-only output buffer for canonical encodings
#[derive(Debug, Default, Clone)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    /// Create empty writer
    pub fn new() -> Self {
        Self::default()
    }

    /// Create writer with preallocated capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Bytes written so far
    pub fn position(&self) -> usize {
        self.buf.len()
    }

    /// Write a single byte
    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    /// Write a `u16` big-endian
    pub fn write_u16(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Write a `u32` big-endian
    pub fn write_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Write a `u64` big-endian
    pub fn write_u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Write raw bytes with no framing
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Write a `u64` length prefix followed by the bytes
    pub fn write_prefixed(&mut self, bytes: &[u8]) {
        self.write_u64(bytes.len() as u64);
        self.write_bytes(bytes);
    }

    /// Written bytes
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Consume the writer, returning the encoded bytes
    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

/// Cursor over a borrowed byte slice
#[derive(Debug, Clone, Copy)]
pub struct ByteReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    /// Create a cursor at the start of `bytes`
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    /// Current read offset
    pub fn position(&self) -> usize {
        self.offset
    }

    /// Bytes left to read
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }

    /// Check if the cursor is exhausted
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Read exactly `len` bytes
    pub fn read_exact(&mut self, len: usize) -> Result<&'a [u8]> {
        let remaining = self.remaining();
        if len > remaining {
            return Err(Error::Underflow {
                needed: len,
                remaining,
            });
        }
        let start = self.offset;
        self.offset += len;
        Ok(&self.bytes[start..start + len])
    }

    /// Read a fixed-size array
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let bytes = self.read_exact(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    /// Read a single byte
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    /// Read a big-endian `u16`
    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }

    /// Read a big-endian `u32`
    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    /// Read a big-endian `u64`
    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(u64::from_be_bytes(self.read_array()?))
    }

    /// Read everything left in the stream
    pub fn read_to_end(&mut self) -> &'a [u8] {
        let rest = &self.bytes[self.offset..];
        self.offset = self.bytes.len();
        rest
    }

    /// Read a `u64` length prefix and that many bytes.
    ///
    /// The cursor is left untouched if the payload is truncated.
    pub fn read_prefixed(&mut self) -> Result<&'a [u8]> {
        let mut probe = *self;
        let len = probe.read_u64()?;
        let len = usize::try_from(len)
            .map_err(|_| Error::InvalidFormat(format!("length prefix {} too large", len)))?;
        let payload = probe.read_exact(len)?;
        *self = probe;
        Ok(payload)
    }

    /// Fail if any bytes remain
    pub fn ensure_consumed(&self) -> Result<()> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(Error::InvalidFormat(format!(
                "{} trailing bytes at offset {}",
                n, self.offset
            ))),
        }
    }
}

/// Canonical encoding of a value
pub trait Encode {
    /// Append the canonical bytes of `self`
    fn encode(&self, out: &mut ByteWriter);

    /// Canonical bytes as an owned buffer
    fn to_canonical_bytes(&self) -> Vec<u8> {
        let mut out = ByteWriter::new();
        self.encode(&mut out);
        out.into_inner()
    }
}

/// Canonical decoding of a value
pub trait Decode: Sized {
    /// Read a value, advancing the cursor
    fn decode(reader: &mut ByteReader<'_>) -> Result<Self>;

    /// Decode a value that must span all of `bytes`
    fn from_canonical_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new(bytes);
        let value = Self::decode(&mut reader)?;
        reader.ensure_consumed()?;
        Ok(value)
    }
}

impl<T: Encode + ?Sized> Encode for &T {
    fn encode(&self, out: &mut ByteWriter) {
        (**self).encode(out)
    }
}

macro_rules! impl_int_codec {
    ($($t:ty),*) => {
        $(
            impl Encode for $t {
                fn encode(&self, out: &mut ByteWriter) {
                    out.write_bytes(&self.to_be_bytes());
                }
            }

            impl Decode for $t {
                fn decode(reader: &mut ByteReader<'_>) -> Result<Self> {
                    Ok(<$t>::from_be_bytes(reader.read_array()?))
                }
            }
        )*
    };
}

impl_int_codec!(u8, u16, u32, u64);

impl Encode for [u8] {
    fn encode(&self, out: &mut ByteWriter) {
        out.write_bytes(self);
    }
}

impl Encode for Vec<u8> {
    fn encode(&self, out: &mut ByteWriter) {
        out.write_bytes(self);
    }
}

impl Decode for Vec<u8> {
    fn decode(reader: &mut ByteReader<'_>) -> Result<Self> {
        Ok(reader.read_to_end().to_vec())
    }
}

impl<const N: usize> Encode for [u8; N] {
    fn encode(&self, out: &mut ByteWriter) {
        out.write_bytes(self);
    }
}

impl<const N: usize> Decode for [u8; N] {
    fn decode(reader: &mut ByteReader<'_>) -> Result<Self> {
        reader.read_array()
    }
}

impl Encode for str {
    fn encode(&self, out: &mut ByteWriter) {
        out.write_bytes(self.as_bytes());
    }
}

impl Encode for String {
    fn encode(&self, out: &mut ByteWriter) {
        out.write_bytes(self.as_bytes());
    }
}

impl Decode for String {
    fn decode(reader: &mut ByteReader<'_>) -> Result<Self> {
        let bytes = reader.read_to_end();
        String::from_utf8(bytes.to_vec())
            .map_err(|e| Error::InvalidFormat(format!("text is not UTF-8: {}", e)))
    }
}

/// Length-prefixed framing for values that would otherwise consume the
/// whole stream
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Prefixed<T>(pub T);

impl<T> Prefixed<T> {
    /// Unwrap the framed value
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: Encode> Encode for Prefixed<T> {
    fn encode(&self, out: &mut ByteWriter) {
        out.write_prefixed(&self.0.to_canonical_bytes());
    }
}

impl<T: Decode> Decode for Prefixed<T> {
    fn decode(reader: &mut ByteReader<'_>) -> Result<Self> {
        let payload = reader.read_prefixed()?;
        Ok(Prefixed(T::from_canonical_bytes(payload)?))
    }
}
