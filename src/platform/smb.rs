//! Share session over SMB2
//!
//! Opens a TCP connection to the share port, performs the SMB2 NEGOTIATE
//! exchange and then logs on with SESSION_SETUP using NTLMv2 inside SPNEGO.
//! The session counts as established once the server accepts the logon; the
//! server's SecurityMode and SessionFlags are kept for diagnostics. Any
//! failure after the socket opened closes it before the error is returned.

use super::ntlm::{self, Challenge};
use crate::constants::{
    SESSION_CONNECT_TIMEOUT_MS, SESSION_HANDSHAKE_TIMEOUT_MS, SMB2_DIALECTS, SMB2_HEADER_LEN,
    SMB2_MAX_RESPONSE_LEN, SMB2_NEGOTIATE, SMB2_PROTOCOL_ID, SMB2_SESSION_FLAG_IS_GUEST,
    SMB2_SESSION_FLAG_IS_NULL, SMB2_SESSION_SETUP, SMB2_SIGNING_ENABLED, SMB2_SIGNING_REQUIRED,
    STATUS_MORE_PROCESSING_REQUIRED,
};
use crate::core::session::{SessionParams, ShareConnector, ShareSession};
use crate::models::ShareCredentials;
use crate::utils::SessionError;
use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

/// Structure size of the NEGOTIATE request body (fixed part)
const NEGOTIATE_REQUEST_SIZE: u16 = 36;
/// Structure size announced by a NEGOTIATE response
const NEGOTIATE_RESPONSE_SIZE: u16 = 65;
/// Structure size of the SESSION_SETUP request body
const SESSION_SETUP_REQUEST_SIZE: u16 = 25;
/// Structure size announced by a SESSION_SETUP response
const SESSION_SETUP_RESPONSE_SIZE: u16 = 9;
/// Fixed part of the SESSION_SETUP request body preceding the security buffer
const SESSION_SETUP_FIXED_LEN: usize = 24;

/// Values taken from the server's NEGOTIATE response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Negotiated {
    pub security_mode: u16,
    pub dialect: u16,
}

impl Negotiated {
    pub fn signing_required(&self) -> bool {
        self.security_mode & SMB2_SIGNING_REQUIRED != 0
    }
}

/// Human readable dialect revision (0x0302 -> "3.0.2")
pub fn dialect_name(dialect: u16) -> String {
    match dialect {
        0x0202 => "2.0.2".to_string(),
        0x0210 => "2.1".to_string(),
        0x0300 => "3.0".to_string(),
        0x0302 => "3.0.2".to_string(),
        0x0311 => "3.1.1".to_string(),
        other => format!("0x{:04X}", other),
    }
}

fn read_u16(buf: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([buf[at], buf[at + 1]])
}

fn read_u32(buf: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

fn read_u64(buf: &[u8], at: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&buf[at..at + 8]);
    u64::from_le_bytes(bytes)
}

/// SMB2 sync header for a request
fn request_header(command: u16, message_id: u64, session_id: u64) -> Vec<u8> {
    let mut buf = Vec::with_capacity(SMB2_HEADER_LEN);
    buf.extend_from_slice(&SMB2_PROTOCOL_ID);
    buf.extend_from_slice(&(SMB2_HEADER_LEN as u16).to_le_bytes());
    buf.extend_from_slice(&0u16.to_le_bytes()); // credit charge
    buf.extend_from_slice(&0u32.to_le_bytes()); // status
    buf.extend_from_slice(&command.to_le_bytes());
    buf.extend_from_slice(&1u16.to_le_bytes()); // credits requested
    buf.extend_from_slice(&0u32.to_le_bytes()); // flags
    buf.extend_from_slice(&0u32.to_le_bytes()); // next command
    buf.extend_from_slice(&message_id.to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes()); // reserved
    buf.extend_from_slice(&0u32.to_le_bytes()); // tree id
    buf.extend_from_slice(&session_id.to_le_bytes());
    buf.extend_from_slice(&[0u8; 16]); // signature
    buf
}

/// Prefix an SMB2 message with a NetBIOS session header (type 0, 24-bit length)
fn frame(msg: Vec<u8>) -> Vec<u8> {
    let mut buf = Vec::with_capacity(4 + msg.len());
    buf.push(0x00);
    buf.extend_from_slice(&(msg.len() as u32).to_be_bytes()[1..]);
    buf.extend_from_slice(&msg);
    buf
}

/// Fields of a response header the handshake cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ResponseHeader {
    status: u32,
    command: u16,
    session_id: u64,
}

fn parse_header(msg: &[u8], expected_command: u16) -> Result<ResponseHeader, SessionError> {
    if msg.len() < 4 {
        return Err(SessionError::Protocol("empty response".to_string()));
    }
    if msg[..4] == [0xFF, b'S', b'M', b'B'] {
        return Err(SessionError::Protocol(
            "server answered with SMB1 only".to_string(),
        ));
    }
    if msg[..4] != SMB2_PROTOCOL_ID {
        return Err(SessionError::Protocol("not an SMB2 message".to_string()));
    }
    if msg.len() < SMB2_HEADER_LEN + 8 {
        return Err(SessionError::Protocol(format!(
            "response truncated ({} bytes)",
            msg.len()
        )));
    }

    let header = ResponseHeader {
        status: read_u32(msg, 8),
        command: read_u16(msg, 12),
        session_id: read_u64(msg, 40),
    };
    if header.command != expected_command {
        return Err(SessionError::Protocol(format!(
            "unexpected command 0x{:04X}",
            header.command
        )));
    }
    Ok(header)
}

/// NetBIOS-framed SMB2 NEGOTIATE request
pub fn build_negotiate_request(client_guid: [u8; 16]) -> Vec<u8> {
    let mut msg = request_header(SMB2_NEGOTIATE, 0, 0);
    msg.extend_from_slice(&NEGOTIATE_REQUEST_SIZE.to_le_bytes());
    msg.extend_from_slice(&(SMB2_DIALECTS.len() as u16).to_le_bytes());
    msg.extend_from_slice(&SMB2_SIGNING_ENABLED.to_le_bytes());
    msg.extend_from_slice(&0u16.to_le_bytes()); // reserved
    msg.extend_from_slice(&0u32.to_le_bytes()); // capabilities
    msg.extend_from_slice(&client_guid);
    msg.extend_from_slice(&0u64.to_le_bytes()); // client start time
    for dialect in SMB2_DIALECTS {
        msg.extend_from_slice(&dialect.to_le_bytes());
    }
    frame(msg)
}

/// Parse an SMB2 NEGOTIATE response (NetBIOS header already stripped)
pub fn parse_negotiate_response(msg: &[u8]) -> Result<Negotiated, SessionError> {
    let header = parse_header(msg, SMB2_NEGOTIATE)?;
    if header.status != 0 {
        return Err(SessionError::Rejected(header.status));
    }

    let body = &msg[SMB2_HEADER_LEN..];
    let structure_size = read_u16(body, 0);
    if structure_size != NEGOTIATE_RESPONSE_SIZE {
        return Err(SessionError::Protocol(format!(
            "unexpected negotiate structure size {}",
            structure_size
        )));
    }

    Ok(Negotiated {
        security_mode: read_u16(body, 2),
        dialect: read_u16(body, 4),
    })
}

/// NetBIOS-framed SMB2 SESSION_SETUP request carrying `security_blob`
pub fn build_session_setup_request(message_id: u64, session_id: u64, security_blob: &[u8]) -> Vec<u8> {
    let mut msg = request_header(SMB2_SESSION_SETUP, message_id, session_id);
    msg.extend_from_slice(&SESSION_SETUP_REQUEST_SIZE.to_le_bytes());
    msg.push(0); // flags
    msg.push(SMB2_SIGNING_ENABLED as u8);
    msg.extend_from_slice(&0u32.to_le_bytes()); // capabilities
    msg.extend_from_slice(&0u32.to_le_bytes()); // channel
    msg.extend_from_slice(&((SMB2_HEADER_LEN + SESSION_SETUP_FIXED_LEN) as u16).to_le_bytes());
    msg.extend_from_slice(&(security_blob.len() as u16).to_le_bytes());
    msg.extend_from_slice(&0u64.to_le_bytes()); // previous session id
    msg.extend_from_slice(security_blob);
    frame(msg)
}

/// Values taken from a SESSION_SETUP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupReply {
    pub status: u32,
    pub session_id: u64,
    pub session_flags: u16,
    pub security_blob: Vec<u8>,
}

/// Parse an SMB2 SESSION_SETUP response (NetBIOS header already stripped)
///
/// Success and "more processing required" are returned to the caller; any
/// other status is a refused logon.
pub fn parse_session_setup_response(msg: &[u8]) -> Result<SetupReply, SessionError> {
    let header = parse_header(msg, SMB2_SESSION_SETUP)?;
    if header.status != 0 && header.status != STATUS_MORE_PROCESSING_REQUIRED {
        return Err(SessionError::Authentication(header.status));
    }

    let body = &msg[SMB2_HEADER_LEN..];
    let structure_size = read_u16(body, 0);
    if structure_size != SESSION_SETUP_RESPONSE_SIZE {
        return Err(SessionError::Protocol(format!(
            "unexpected session setup structure size {}",
            structure_size
        )));
    }

    let offset = read_u16(body, 4) as usize;
    let len = read_u16(body, 6) as usize;
    let security_blob = if len == 0 {
        Vec::new()
    } else {
        msg.get(offset..offset + len)
            .ok_or_else(|| SessionError::Protocol("security buffer out of range".to_string()))?
            .to_vec()
    };

    Ok(SetupReply {
        status: header.status,
        session_id: header.session_id,
        session_flags: read_u16(body, 2),
        security_blob,
    })
}

/// Read one NetBIOS session message and return its payload
async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>, SessionError> {
    let mut header = [0u8; 4];
    reader
        .read_exact(&mut header)
        .await
        .map_err(|e| SessionError::Connection(format!("reading frame header: {}", e)))?;

    if header[0] != 0x00 {
        return Err(SessionError::Protocol(format!(
            "unexpected NetBIOS message type 0x{:02X}",
            header[0]
        )));
    }

    let len = u32::from_be_bytes([0, header[1], header[2], header[3]]) as usize;
    if len > SMB2_MAX_RESPONSE_LEN {
        return Err(SessionError::Protocol(format!("frame too large ({} bytes)", len)));
    }

    let mut payload = vec![0u8; len];
    reader
        .read_exact(&mut payload)
        .await
        .map_err(|e| SessionError::Connection(format!("reading frame body: {}", e)))?;
    Ok(payload)
}

async fn round_trip<S: AsyncRead + AsyncWrite + Unpin>(
    stream: &mut S,
    request: &[u8],
) -> Result<Vec<u8>, SessionError> {
    stream
        .write_all(request)
        .await
        .map_err(|e| SessionError::Connection(format!("sending request: {}", e)))?;
    read_frame(stream).await
}

/// Outcome of NEGOTIATE plus SESSION_SETUP
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Handshake {
    negotiated: Negotiated,
    session_id: u64,
    session_flags: u16,
}

async fn handshake<S: AsyncRead + AsyncWrite + Unpin>(
    stream: &mut S,
    credentials: &ShareCredentials,
) -> Result<Handshake, SessionError> {
    let client_guid: [u8; 16] = rand::random();
    let client_challenge: [u8; 8] = rand::random();

    let response = round_trip(stream, &build_negotiate_request(client_guid)).await?;
    let negotiated = parse_negotiate_response(&response)?;

    let offer = ntlm::spnego_init(&ntlm::negotiate_message());
    let response = round_trip(stream, &build_session_setup_request(1, 0, &offer)).await?;
    let reply = parse_session_setup_response(&response)?;
    if reply.status != STATUS_MORE_PROCESSING_REQUIRED {
        return Err(SessionError::Protocol(
            "server skipped the NTLM challenge".to_string(),
        ));
    }

    let challenge_msg = ntlm::find_ntlmssp(&reply.security_blob)
        .ok_or_else(|| SessionError::Protocol("no NTLM challenge in reply".to_string()))?;
    let challenge = Challenge::parse(challenge_msg)?;

    let auth = ntlm::authenticate_message(credentials, &challenge, &client_challenge)?;
    let request = build_session_setup_request(2, reply.session_id, &ntlm::spnego_response(&auth));
    let response = round_trip(stream, &request).await?;
    let done = parse_session_setup_response(&response)?;
    if done.status != 0 {
        return Err(SessionError::Protocol(
            "logon still pending after authenticate".to_string(),
        ));
    }

    Ok(Handshake {
        negotiated,
        session_id: reply.session_id,
        session_flags: done.session_flags,
    })
}

/// Connector speaking SMB2 over TCP
#[derive(Debug, Clone)]
pub struct SmbConnector {
    connect_timeout: Duration,
    handshake_timeout: Duration,
}

impl SmbConnector {
    pub fn new() -> Self {
        Self::with_timeouts(
            Duration::from_millis(SESSION_CONNECT_TIMEOUT_MS),
            Duration::from_millis(SESSION_HANDSHAKE_TIMEOUT_MS),
        )
    }

    pub fn with_timeouts(connect_timeout: Duration, handshake_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            handshake_timeout,
        }
    }
}

impl Default for SmbConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ShareConnector for SmbConnector {
    async fn connect(&self, params: &SessionParams) -> Result<Box<dyn ShareSession>, SessionError> {
        let target = params.target();

        let mut stream = timeout(
            self.connect_timeout,
            TcpStream::connect((params.host.as_str(), params.port)),
        )
        .await
        .map_err(|_| SessionError::Timeout(self.connect_timeout))?
        .map_err(|e| SessionError::Connection(format!("{}: {}", target, e)))?;

        let handshake = match timeout(
            self.handshake_timeout,
            handshake(&mut stream, &params.credentials),
        )
        .await
        {
            Ok(Ok(handshake)) => handshake,
            Ok(Err(e)) => {
                let _ = stream.shutdown().await;
                return Err(e);
            }
            Err(_) => {
                let _ = stream.shutdown().await;
                return Err(SessionError::Timeout(self.handshake_timeout));
            }
        };

        debug!(
            target_host = %target,
            dialect = %dialect_name(handshake.negotiated.dialect),
            security_mode = handshake.negotiated.security_mode,
            session_id = handshake.session_id,
            session_flags = handshake.session_flags,
            "SMB2 session established"
        );

        Ok(Box::new(SmbSession { stream, handshake }))
    }
}

/// Logged-on SMB2 connection
pub struct SmbSession {
    stream: TcpStream,
    handshake: Handshake,
}

#[async_trait]
impl ShareSession for SmbSession {
    fn signing_required(&self) -> bool {
        self.handshake.negotiated.signing_required()
    }

    /// False for guest and anonymous sessions
    fn is_authenticated(&self) -> bool {
        self.handshake.session_flags & (SMB2_SESSION_FLAG_IS_GUEST | SMB2_SESSION_FLAG_IS_NULL)
            == 0
    }

    fn dialect(&self) -> String {
        dialect_name(self.handshake.negotiated.dialect)
    }

    async fn release(mut self: Box<Self>) {
        if let Err(e) = self.stream.shutdown().await {
            debug!(error = %e, "SMB session shutdown");
        }
    }
}
