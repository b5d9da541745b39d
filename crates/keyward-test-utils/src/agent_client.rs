// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Minimal blocking client for the SSH agent protocol.
//!
//! Messages are a big-endian `u32` length followed by a type byte and body;
//! strings inside a body are `u32` length-prefixed.

use std::io::{self, Read, Write};
use std::os::unix::net::UnixStream;
use std::path::Path;
use std::time::Duration;

pub const SSH_AGENT_FAILURE: u8 = 5;
pub const SSH_AGENTC_REQUEST_IDENTITIES: u8 = 11;
pub const SSH_AGENT_IDENTITIES_ANSWER: u8 = 12;
pub const SSH_AGENTC_SIGN_REQUEST: u8 = 13;
pub const SSH_AGENT_SIGN_RESPONSE: u8 = 14;

/// One identity from an `SSH_AGENT_IDENTITIES_ANSWER`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedIdentity {
    /// Public key in SSH wire encoding.
    pub key_blob: Vec<u8>,
    pub comment: String,
}

/// A connected client.
pub struct AgentClient {
    stream: UnixStream,
}

impl AgentClient {
    pub fn connect(socket: &Path) -> io::Result<Self> {
        let stream = UnixStream::connect(socket)?;
        stream.set_read_timeout(Some(Duration::from_secs(10)))?;
        Ok(Self { stream })
    }

    /// Send one message and return the reply's type byte and body.
    pub fn request(&mut self, message_type: u8, body: &[u8]) -> io::Result<(u8, Vec<u8>)> {
        let len = u32::try_from(body.len() + 1)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "message too large"))?;
        let mut frame = len.to_be_bytes().to_vec();
        frame.push(message_type);
        frame.extend_from_slice(body);
        self.stream.write_all(&frame)?;

        let mut len_buf = [0u8; 4];
        self.stream.read_exact(&mut len_buf)?;
        let mut reply = vec![0u8; u32::from_be_bytes(len_buf) as usize];
        self.stream.read_exact(&mut reply)?;
        match reply.split_first() {
            Some((&kind, rest)) => Ok((kind, rest.to_vec())),
            None => Err(io::Error::new(io::ErrorKind::InvalidData, "empty reply")),
        }
    }

    pub fn list_identities(&mut self) -> io::Result<Vec<ListedIdentity>> {
        let (kind, body) = self.request(SSH_AGENTC_REQUEST_IDENTITIES, &[])?;
        if kind != SSH_AGENT_IDENTITIES_ANSWER {
            return Err(unexpected(kind));
        }
        let mut reader = body.as_slice();
        let count = read_u32(&mut reader)?;
        (0..count)
            .map(|_| {
                let key_blob = read_string(&mut reader)?;
                let comment = String::from_utf8(read_string(&mut reader)?)
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
                Ok(ListedIdentity { key_blob, comment })
            })
            .collect()
    }

    /// Ask the agent to sign `data` with the key whose wire blob is `key_blob`.
    /// Returns the signature in SSH wire encoding.
    pub fn sign(&mut self, key_blob: &[u8], data: &[u8]) -> io::Result<Vec<u8>> {
        let mut body = Vec::new();
        write_string(&mut body, key_blob);
        write_string(&mut body, data);
        body.extend_from_slice(&0u32.to_be_bytes());

        let (kind, reply) = self.request(SSH_AGENTC_SIGN_REQUEST, &body)?;
        if kind != SSH_AGENT_SIGN_RESPONSE {
            return Err(unexpected(kind));
        }
        read_string(&mut reply.as_slice())
    }
}

fn unexpected(kind: u8) -> io::Error {
    io::Error::other(format!("unexpected agent reply type {kind}"))
}

fn write_string(out: &mut Vec<u8>, bytes: &[u8]) {
    out.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
    out.extend_from_slice(bytes);
}

fn read_u32(reader: &mut &[u8]) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_be_bytes(buf))
}

fn read_string(reader: &mut &[u8]) -> io::Result<Vec<u8>> {
    let len = read_u32(reader)? as usize;
    if len > reader.len() {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "truncated string"));
    }
    let (head, tail) = reader.split_at(len);
    *reader = tail;
    Ok(head.to_vec())
}
