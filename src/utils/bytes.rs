//! Bounded big-endian reading and the few writing helpers the codecs share
//!
//! Every decoder works on a `ByteReader` over the slice it was handed, so a
//! short buffer becomes `MalformedBuffer` instead of a panic, and nested
//! decoders report how many bytes they consumed so the caller can advance.

use crate::error::{NyzoError, Result};

pub struct ByteReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        ByteReader { bytes, offset: 0 }
    }

    /// Bytes consumed so far
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// The unread tail, for handing to a nested decoder
    pub fn rest(&self) -> &'a [u8] {
        &self.bytes[self.offset..]
    }

    pub fn take(&mut self, len: usize, field: &str) -> Result<&'a [u8]> {
        if self.remaining() < len {
            return Err(NyzoError::MalformedBuffer(format!(
                "{field} needs {len} bytes at offset {}, only {} remain",
                self.offset,
                self.remaining()
            )));
        }
        let slice = &self.bytes[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    pub fn read_u8(&mut self, field: &str) -> Result<u8> {
        Ok(self.take(1, field)?[0])
    }

    pub fn read_bool(&mut self, field: &str) -> Result<bool> {
        Ok(self.read_u8(field)? == 1)
    }

    pub fn read_u16(&mut self, field: &str) -> Result<u16> {
        Ok(u16::from_be_bytes(self.read_array::<2>(field)?))
    }

    pub fn read_u32(&mut self, field: &str) -> Result<u32> {
        Ok(u32::from_be_bytes(self.read_array::<4>(field)?))
    }

    pub fn read_u64(&mut self, field: &str) -> Result<u64> {
        Ok(u64::from_be_bytes(self.read_array::<8>(field)?))
    }

    pub fn read_array<const N: usize>(&mut self, field: &str) -> Result<[u8; N]> {
        let slice = self.take(N, field)?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }

    /// `u16` length followed by that many UTF-8 bytes
    pub fn read_string(&mut self, field: &str) -> Result<String> {
        let len = self.read_u16(field)? as usize;
        let start = self.offset;
        let raw = self.take(len, field)?;
        String::from_utf8(raw.to_vec()).map_err(|e| {
            NyzoError::MalformedBuffer(format!("{field} at offset {start} is not UTF-8: {e}"))
        })
    }

    /// Run a nested decoder on the unread tail and advance past what it consumed.
    pub fn decode_with<T, F>(&mut self, decode: F) -> Result<T>
    where
        F: FnOnce(&'a [u8]) -> Result<(T, usize)>,
    {
        let (value, consumed) = decode(self.rest())?;
        if consumed > self.remaining() {
            return Err(NyzoError::MalformedBuffer(format!(
                "nested decoder claimed {consumed} bytes, only {} remain",
                self.remaining()
            )));
        }
        self.offset += consumed;
        Ok(value)
    }

    /// Upper bound for pre-allocating a list whose entries are at least
    /// `min_entry_size` bytes; a hostile count cannot force a huge allocation.
    pub fn capacity_hint(&self, count: usize, min_entry_size: usize) -> usize {
        count.min(self.remaining() / min_entry_size.max(1))
    }
}

/// Largest prefix of `value` that fits a `u16` length without splitting a character
pub fn truncated_string(value: &str) -> &str {
    let max = u16::MAX as usize;
    if value.len() <= max {
        return value;
    }
    let mut end = max;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    &value[..end]
}

pub fn string_byte_size(value: &str) -> usize {
    2 + truncated_string(value).len()
}

pub fn write_string(vbytes: &mut Vec<u8>, value: &str) {
    let value = truncated_string(value);
    vbytes.extend(&(value.len() as u16).to_be_bytes());
    vbytes.extend(value.as_bytes());
}
