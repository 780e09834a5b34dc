use crate::error::Result;
use crate::utils::{string_byte_size, write_string, ByteReader};
use serde::Serialize;

/// Free-form status lines a verifier reports about itself.
///
/// Wire form: line count (1 byte), then each line as `u16` length + UTF-8.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusResponse {
    lines: Vec<String>,
}

impl StatusResponse {
    pub fn new(lines: Vec<String>) -> Self {
        StatusResponse { lines }
    }

    pub fn decode(bytes: &[u8]) -> Result<StatusResponse> {
        let mut reader = ByteReader::new(bytes);
        let count = reader.read_u8("status line count")? as usize;
        let mut lines = Vec::with_capacity(count);
        for _ in 0..count {
            lines.push(reader.read_string("status line")?);
        }
        Ok(StatusResponse { lines })
    }

    pub fn encode(&self) -> Vec<u8> {
        let lines = self.wire_lines();
        let mut vbytes = Vec::with_capacity(self.byte_size());
        vbytes.push(lines.len() as u8);
        for line in lines {
            write_string(&mut vbytes, line);
        }
        vbytes
    }

    pub fn byte_size(&self) -> usize {
        // line count
        1 + self
            .wire_lines()
            .iter()
            .map(|line| string_byte_size(line))
            .sum::<usize>()
    }

    pub fn get_lines(&self) -> &[String] {
        &self.lines
    }

    // the count is a single byte
    fn wire_lines(&self) -> &[String] {
        &self.lines[..self.lines.len().min(u8::MAX as usize)]
    }
}
