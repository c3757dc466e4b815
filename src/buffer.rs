//! Seekable byte buffer with typed, endian-aware reads and writes.
//!
//! [`ByteCursor`] is the unit both codecs work in: parsers wrap the input
//! bytes in one and read records field by field, encoders allocate one per
//! record and concatenate them at the end.
//!
//! The buffer has a fixed length. Every access is bounds checked and
//! returns [`Error::OutOfBounds`] instead of growing or panicking.

use std::fmt;
use std::io::Read;
use std::str::FromStr;

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use flate2::read::{DeflateDecoder, DeflateEncoder, GzDecoder, GzEncoder};

use crate::error::{Error, Result};

/// Byte order applied to multi-byte reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endianness {
    #[default]
    Big,
    Little,
}

/// A fixed-width value that can be read from or written to a [`ByteCursor`].
pub trait Scalar: Copy {
    const WIDTH: usize;

    fn decode(bytes: &[u8], endianness: Endianness) -> Self;

    fn encode(self, bytes: &mut [u8], endianness: Endianness);
}

impl Scalar for u8 {
    const WIDTH: usize = 1;

    fn decode(bytes: &[u8], _: Endianness) -> Self {
        bytes[0]
    }

    fn encode(self, bytes: &mut [u8], _: Endianness) {
        bytes[0] = self;
    }
}

impl Scalar for i8 {
    const WIDTH: usize = 1;

    fn decode(bytes: &[u8], _: Endianness) -> Self {
        bytes[0] as i8
    }

    fn encode(self, bytes: &mut [u8], _: Endianness) {
        bytes[0] = self as u8;
    }
}

macro_rules! scalar {
    ($ty:ty, $read:ident, $write:ident) => {
        impl Scalar for $ty {
            const WIDTH: usize = std::mem::size_of::<$ty>();

            fn decode(bytes: &[u8], endianness: Endianness) -> Self {
                match endianness {
                    Endianness::Big => BigEndian::$read(bytes),
                    Endianness::Little => LittleEndian::$read(bytes),
                }
            }

            fn encode(self, bytes: &mut [u8], endianness: Endianness) {
                match endianness {
                    Endianness::Big => BigEndian::$write(bytes, self),
                    Endianness::Little => LittleEndian::$write(bytes, self),
                }
            }
        }
    };
}

scalar!(u16, read_u16, write_u16);
scalar!(i16, read_i16, write_i16);
scalar!(u32, read_u32, write_u32);
scalar!(i32, read_i32, write_i32);
scalar!(u64, read_u64, write_u64);
scalar!(i64, read_i64, write_i64);
scalar!(f32, read_f32, write_f32);
scalar!(f64, read_f64, write_f64);

/// Stream compression algorithms understood by [`ByteCursor::compress`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Bytes are copied unchanged.
    Store,
    /// Raw deflate without a zlib or gzip wrapper, as stored in ZIP entries.
    Deflate,
    /// Deflate wrapped in a gzip member, as stored in CATS entries.
    Gzip,
}

impl Method {
    pub fn name(&self) -> &'static str {
        match self {
            Method::Store => "store",
            Method::Deflate => "deflate",
            Method::Gzip => "gzip",
        }
    }

    fn compress(self, data: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        let level = flate2::Compression::default();
        let result = match self {
            Method::Store => {
                out.extend_from_slice(data);
                Ok(data.len())
            }
            Method::Deflate => DeflateEncoder::new(data, level).read_to_end(&mut out),
            Method::Gzip => GzEncoder::new(data, level).read_to_end(&mut out),
        };
        result.map_err(|source| Error::Codec {
            method: self.name(),
            source,
        })?;
        Ok(out)
    }

    fn decompress(self, data: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        let result = match self {
            Method::Store => {
                out.extend_from_slice(data);
                Ok(data.len())
            }
            Method::Deflate => DeflateDecoder::new(data).read_to_end(&mut out),
            Method::Gzip => GzDecoder::new(data).read_to_end(&mut out),
        };
        result.map_err(|source| Error::Codec {
            method: self.name(),
            source,
        })?;
        Ok(out)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "store" => Ok(Method::Store),
            "deflate" => Ok(Method::Deflate),
            "gzip" => Ok(Method::Gzip),
            other => Err(Error::UnsupportedFormat(other.to_string())),
        }
    }
}

/// A fixed-length byte region with a read/write position.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ByteCursor {
    data: Vec<u8>,
    position: usize,
    endianness: Endianness,
}

impl ByteCursor {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            position: 0,
            endianness: Endianness::default(),
        }
    }

    /// Create a zero-filled buffer of `len` bytes.
    pub fn allocate(len: usize) -> Self {
        Self::new(vec![0; len])
    }

    /// Like [`allocate`](Self::allocate) with the byte order already set.
    pub fn allocate_with(len: usize, endianness: Endianness) -> Self {
        let mut cursor = Self::allocate(len);
        cursor.endianness = endianness;
        cursor
    }

    /// Join `parts` into one buffer in order. The result is positioned at 0.
    pub fn concat<'a, I>(parts: I) -> Self
    where
        I: IntoIterator<Item = &'a ByteCursor>,
        I::IntoIter: Clone,
    {
        let parts = parts.into_iter();
        let total = parts.clone().map(ByteCursor::len).sum();
        let mut data = Vec::with_capacity(total);
        for part in parts {
            data.extend_from_slice(&part.data);
        }
        Self::new(data)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }

    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    pub fn set_endianness(&mut self, endianness: Endianness) {
        self.endianness = endianness;
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Move to `position` and return the previous position so the caller
    /// can restore it afterwards.
    pub fn seek(&mut self, position: usize) -> Result<usize> {
        if position > self.data.len() {
            return Err(self.out_of_bounds(position, 0));
        }
        Ok(std::mem::replace(&mut self.position, position))
    }

    pub fn advance(&mut self, count: usize) -> Result<()> {
        self.check(count)?;
        self.position += count;
        Ok(())
    }

    pub fn reset(&mut self) {
        self.position = 0;
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    /// Whether `count` more bytes can be read from the current position.
    pub fn has(&self, count: usize) -> bool {
        count <= self.remaining()
    }

    pub fn valid_index(&self, index: usize) -> bool {
        index < self.data.len()
    }

    pub fn read<T: Scalar>(&mut self) -> Result<T> {
        self.check(T::WIDTH)?;
        let start = self.position;
        self.position += T::WIDTH;
        Ok(T::decode(&self.data[start..self.position], self.endianness))
    }

    pub fn write<T: Scalar>(&mut self, value: T) -> Result<()> {
        self.check(T::WIDTH)?;
        let start = self.position;
        self.position += T::WIDTH;
        value.encode(&mut self.data[start..self.position], self.endianness);
        Ok(())
    }

    /// Read a value without moving the position.
    pub fn peek<T: Scalar>(&mut self) -> Result<T> {
        let position = self.position;
        let value = self.read();
        self.position = position;
        value
    }

    /// Read a fixed-width name of `len` bytes. Zero bytes are padding and
    /// are dropped.
    pub fn read_string(&mut self, len: usize) -> Result<String> {
        let bytes = self.take(len)?;
        let bytes: Vec<u8> = bytes.iter().copied().filter(|&b| b != 0).collect();
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Read up to (not including) the next zero byte, then skip it.
    pub fn read_null_terminated_string(&mut self) -> Result<String> {
        let rest = &self.data[self.position..];
        let len = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| self.out_of_bounds(self.position, rest.len() + 1))?;
        let value = String::from_utf8_lossy(&rest[..len]).into_owned();
        self.position += len + 1;
        Ok(value)
    }

    /// Write the bytes of `value` and return how many were written.
    pub fn write_string(&mut self, value: &str) -> Result<usize> {
        self.write_bytes(value.as_bytes())?;
        Ok(value.len())
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.check(bytes.len())?;
        let start = self.position;
        self.position += bytes.len();
        self.data[start..self.position].copy_from_slice(bytes);
        Ok(())
    }

    /// Copy the next `len` bytes into a new, independent buffer and advance
    /// past them.
    pub fn sub_buffer(&mut self, len: usize) -> Result<ByteCursor> {
        Ok(ByteCursor::new(self.take(len)?.to_vec()))
    }

    pub fn write_sub_buffer(&mut self, other: &ByteCursor) -> Result<()> {
        self.write_bytes(&other.data)
    }

    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }

    /// CRC-32 (IEEE, reflected polynomial `0xEDB88320`) of the whole region.
    pub fn crc32(&self) -> u32 {
        crc32fast::hash(&self.data)
    }

    /// Compress the whole region into a new buffer on the blocking pool.
    ///
    /// Empty regions are returned as they are.
    pub async fn compress(&self, method: Method) -> Result<ByteCursor> {
        if self.is_empty() {
            return Ok(ByteCursor::default());
        }
        let data = self.data.clone();
        let out = tokio::task::spawn_blocking(move || method.compress(&data)).await??;
        Ok(ByteCursor::new(out))
    }

    /// Inverse of [`compress`](Self::compress).
    pub async fn decompress(&self, method: Method) -> Result<ByteCursor> {
        if self.is_empty() {
            return Ok(ByteCursor::default());
        }
        let data = self.data.clone();
        let out = tokio::task::spawn_blocking(move || method.decompress(&data)).await??;
        Ok(ByteCursor::new(out))
    }

    fn take(&mut self, len: usize) -> Result<&[u8]> {
        self.check(len)?;
        let start = self.position;
        self.position += len;
        Ok(&self.data[start..self.position])
    }

    fn check(&self, len: usize) -> Result<()> {
        if self.has(len) {
            Ok(())
        } else {
            Err(self.out_of_bounds(self.position, len))
        }
    }

    fn out_of_bounds(&self, offset: usize, len: usize) -> Error {
        Error::OutOfBounds {
            offset,
            len,
            size: self.data.len(),
        }
    }
}

impl From<Vec<u8>> for ByteCursor {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

impl From<&[u8]> for ByteCursor {
    fn from(data: &[u8]) -> Self {
        Self::new(data.to_vec())
    }
}

impl fmt::Debug for ByteCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteCursor")
            .field("len", &self.data.len())
            .field("position", &self.position)
            .field("endianness", &self.endianness)
            .finish()
    }
}
