//! NTLMv2 authentication messages for SMB2 SESSION_SETUP
//!
//! Only what a single logon needs: the NEGOTIATE message, parsing the
//! server CHALLENGE, and an AUTHENTICATE message carrying NTLMv2 responses.
//! Key exchange and MIC are not negotiated. Tokens travel inside SPNEGO
//! wrappers built here as well.

use crate::models::ShareCredentials;
use crate::utils::SessionError;
use hmac::{Hmac, Mac};
use md4::{Digest, Md4};
use md5::Md5;

type HmacMd5 = Hmac<Md5>;

pub const NTLMSSP_SIGNATURE: &[u8; 8] = b"NTLMSSP\0";

const NEGOTIATE_UNICODE: u32 = 0x0000_0001;
const REQUEST_TARGET: u32 = 0x0000_0004;
const NEGOTIATE_NTLM: u32 = 0x0000_0200;
const NEGOTIATE_ANONYMOUS: u32 = 0x0000_0800;
const NEGOTIATE_ALWAYS_SIGN: u32 = 0x0000_8000;
const NEGOTIATE_EXTENDED_SESSIONSECURITY: u32 = 0x0008_0000;
const NEGOTIATE_TARGET_INFO: u32 = 0x0080_0000;
const NEGOTIATE_128: u32 = 0x2000_0000;
const NEGOTIATE_56: u32 = 0x8000_0000;

/// Flags offered in NEGOTIATE and echoed in AUTHENTICATE
pub const CLIENT_FLAGS: u32 = NEGOTIATE_UNICODE
    | REQUEST_TARGET
    | NEGOTIATE_NTLM
    | NEGOTIATE_ALWAYS_SIGN
    | NEGOTIATE_EXTENDED_SESSIONSECURITY
    | NEGOTIATE_TARGET_INFO
    | NEGOTIATE_128
    | NEGOTIATE_56;

/// AV pair id carrying the server's FILETIME
const MSV_AV_TIMESTAMP: u16 = 7;
const MSV_AV_EOL: u16 = 0;

/// OID 1.3.6.1.5.5.2 (SPNEGO)
const SPNEGO_OID: &[u8] = &[0x06, 0x06, 0x2b, 0x06, 0x01, 0x05, 0x05, 0x02];
/// OID 1.3.6.1.4.1.311.2.2.10 (NTLMSSP)
const NTLMSSP_OID: &[u8] = &[
    0x06, 0x0a, 0x2b, 0x06, 0x01, 0x04, 0x01, 0x82, 0x37, 0x02, 0x02, 0x0a,
];

fn utf16le(s: &str) -> Vec<u8> {
    s.encode_utf16().flat_map(|u| u.to_le_bytes()).collect()
}

fn hmac_md5(key: &[u8], parts: &[&[u8]]) -> Result<[u8; 16], SessionError> {
    let mut mac = <HmacMd5 as Mac>::new_from_slice(key)
        .map_err(|e| SessionError::Protocol(format!("HMAC key: {}", e)))?;
    for part in parts {
        mac.update(part);
    }
    let mut out = [0u8; 16];
    out.copy_from_slice(&mac.finalize().into_bytes());
    Ok(out)
}

/// NTOWFv1: MD4 over the UTF-16LE password
pub fn nt_hash(password: &str) -> [u8; 16] {
    let mut out = [0u8; 16];
    out.copy_from_slice(&Md4::digest(utf16le(password)));
    out
}

/// NTOWFv2: HMAC-MD5 keyed by the NT hash over UPPER(user) || domain
pub fn ntowf_v2(password: &str, user: &str, domain: &str) -> Result<[u8; 16], SessionError> {
    let identity = utf16le(&format!("{}{}", user.to_uppercase(), domain));
    hmac_md5(&nt_hash(password), &[&identity])
}

/// LMv2 response: HMAC(server || client challenge) followed by the client challenge
pub fn lmv2_response(
    response_key: &[u8; 16],
    server_challenge: &[u8; 8],
    client_challenge: &[u8; 8],
) -> Result<Vec<u8>, SessionError> {
    let proof = hmac_md5(response_key, &[server_challenge, client_challenge])?;
    let mut out = proof.to_vec();
    out.extend_from_slice(client_challenge);
    Ok(out)
}

/// NTLMv2 client blob that follows the NT proof
pub fn client_blob(timestamp: u64, client_challenge: &[u8; 8], target_info: &[u8]) -> Vec<u8> {
    let mut blob = vec![0x01, 0x01, 0, 0, 0, 0, 0, 0];
    blob.extend_from_slice(&timestamp.to_le_bytes());
    blob.extend_from_slice(client_challenge);
    blob.extend_from_slice(&[0u8; 4]);
    blob.extend_from_slice(target_info);
    blob.extend_from_slice(&[0u8; 4]);
    blob
}

/// NTProofStr over the server challenge and client blob
pub fn nt_proof(
    response_key: &[u8; 16],
    server_challenge: &[u8; 8],
    blob: &[u8],
) -> Result<[u8; 16], SessionError> {
    hmac_md5(response_key, &[server_challenge, blob])
}

/// Type 1 message
pub fn negotiate_message() -> Vec<u8> {
    let mut msg = NTLMSSP_SIGNATURE.to_vec();
    msg.extend_from_slice(&1u32.to_le_bytes());
    msg.extend_from_slice(&CLIENT_FLAGS.to_le_bytes());
    msg.extend_from_slice(&[0u8; 16]); // domain + workstation fields
    msg
}

/// Values taken from the server's type 2 message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    pub flags: u32,
    pub server_challenge: [u8; 8],
    pub target_info: Vec<u8>,
}

impl Challenge {
    pub fn parse(msg: &[u8]) -> Result<Self, SessionError> {
        if msg.len() < 48 || &msg[..8] != NTLMSSP_SIGNATURE {
            return Err(SessionError::Protocol("malformed NTLM challenge".to_string()));
        }
        if u32::from_le_bytes([msg[8], msg[9], msg[10], msg[11]]) != 2 {
            return Err(SessionError::Protocol("expected NTLM challenge message".to_string()));
        }

        let flags = u32::from_le_bytes([msg[20], msg[21], msg[22], msg[23]]);
        let mut server_challenge = [0u8; 8];
        server_challenge.copy_from_slice(&msg[24..32]);

        let info_len = u16::from_le_bytes([msg[40], msg[41]]) as usize;
        let info_off = u32::from_le_bytes([msg[44], msg[45], msg[46], msg[47]]) as usize;
        let target_info = msg
            .get(info_off..info_off + info_len)
            .ok_or_else(|| SessionError::Protocol("NTLM target info out of range".to_string()))?
            .to_vec();

        Ok(Self {
            flags,
            server_challenge,
            target_info,
        })
    }

    /// Server FILETIME from the target info, if present
    pub fn timestamp(&self) -> Option<u64> {
        let mut rest = self.target_info.as_slice();
        while rest.len() >= 4 {
            let id = u16::from_le_bytes([rest[0], rest[1]]);
            let len = u16::from_le_bytes([rest[2], rest[3]]) as usize;
            let value = rest.get(4..4 + len)?;
            match id {
                MSV_AV_EOL => return None,
                MSV_AV_TIMESTAMP if len == 8 => {
                    let mut ts = [0u8; 8];
                    ts.copy_from_slice(value);
                    return Some(u64::from_le_bytes(ts));
                }
                _ => rest = &rest[4 + len..],
            }
        }
        None
    }
}

/// Current time as a Windows FILETIME (100 ns ticks since 1601)
pub fn filetime_now() -> u64 {
    const EPOCH_DIFF_SECS: u64 = 11_644_473_600;
    let since_unix = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    (since_unix.as_secs() + EPOCH_DIFF_SECS) * 10_000_000 + u64::from(since_unix.subsec_nanos() / 100)
}

/// Type 3 message
///
/// Without a configured user an anonymous AUTHENTICATE is produced.
pub fn authenticate_message(
    credentials: &ShareCredentials,
    challenge: &Challenge,
    client_challenge: &[u8; 8],
) -> Result<Vec<u8>, SessionError> {
    let workstation = utf16le(credentials.workstation());
    let domain = utf16le(credentials.domain());

    let (user, lm, nt, flags) = match credentials.user() {
        Some(user) => {
            let key = ntowf_v2(
                credentials.password().as_str(),
                user.as_str(),
                credentials.domain(),
            )?;
            let timestamp = challenge.timestamp().unwrap_or_else(filetime_now);
            let blob = client_blob(timestamp, client_challenge, &challenge.target_info);
            let proof = nt_proof(&key, &challenge.server_challenge, &blob)?;
            let mut nt = proof.to_vec();
            nt.extend_from_slice(&blob);
            let lm = lmv2_response(&key, &challenge.server_challenge, client_challenge)?;
            (utf16le(user.as_str()), lm, nt, CLIENT_FLAGS)
        }
        None => (Vec::new(), vec![0u8], Vec::new(), CLIENT_FLAGS | NEGOTIATE_ANONYMOUS),
    };

    const HEADER_LEN: usize = 64;
    let mut msg = NTLMSSP_SIGNATURE.to_vec();
    msg.extend_from_slice(&3u32.to_le_bytes());

    let mut payload = Vec::new();
    let mut field = |msg: &mut Vec<u8>, data: &[u8]| {
        let offset = (HEADER_LEN + payload.len()) as u32;
        msg.extend_from_slice(&(data.len() as u16).to_le_bytes());
        msg.extend_from_slice(&(data.len() as u16).to_le_bytes());
        msg.extend_from_slice(&offset.to_le_bytes());
        payload.extend_from_slice(data);
    };
    field(&mut msg, &lm);
    field(&mut msg, &nt);
    field(&mut msg, &domain);
    field(&mut msg, &user);
    field(&mut msg, &workstation);
    field(&mut msg, &[]); // encrypted random session key

    msg.extend_from_slice(&flags.to_le_bytes());
    msg.extend_from_slice(&payload);
    Ok(msg)
}

fn der_len(len: usize) -> Vec<u8> {
    match len {
        0..=0x7f => vec![len as u8],
        0x80..=0xff => vec![0x81, len as u8],
        _ => vec![0x82, (len >> 8) as u8, len as u8],
    }
}

fn der(tag: u8, content: &[u8]) -> Vec<u8> {
    let mut out = vec![tag];
    out.extend_from_slice(&der_len(content.len()));
    out.extend_from_slice(content);
    out
}

/// SPNEGO NegTokenInit offering NTLMSSP with `token` as the mech token
pub fn spnego_init(token: &[u8]) -> Vec<u8> {
    let mech_types = der(0xa0, &der(0x30, NTLMSSP_OID));
    let mech_token = der(0xa2, &der(0x04, token));
    let neg_token_init = der(0xa0, &der(0x30, &[mech_types, mech_token].concat()));
    der(0x60, &[SPNEGO_OID, neg_token_init.as_slice()].concat())
}

/// SPNEGO NegTokenResp carrying `token`
pub fn spnego_response(token: &[u8]) -> Vec<u8> {
    der(0xa1, &der(0x30, &der(0xa2, &der(0x04, token))))
}

/// Locate the NTLMSSP message inside a (possibly SPNEGO wrapped) blob
pub fn find_ntlmssp(blob: &[u8]) -> Option<&[u8]> {
    blob.windows(NTLMSSP_SIGNATURE.len())
        .position(|w| w == NTLMSSP_SIGNATURE)
        .map(|at| &blob[at..])
}

/// Type 2 message as a server would send it
#[cfg(test)]
pub(crate) fn challenge_message(server_challenge: [u8; 8], target_info: &[u8]) -> Vec<u8> {
    let mut msg = NTLMSSP_SIGNATURE.to_vec();
    msg.extend_from_slice(&2u32.to_le_bytes());
    msg.extend_from_slice(&[0u8; 8]); // target name
    msg.extend_from_slice(&CLIENT_FLAGS.to_le_bytes());
    msg.extend_from_slice(&server_challenge);
    msg.extend_from_slice(&[0u8; 8]);
    msg.extend_from_slice(&(target_info.len() as u16).to_le_bytes());
    msg.extend_from_slice(&(target_info.len() as u16).to_le_bytes());
    msg.extend_from_slice(&48u32.to_le_bytes());
    msg.extend_from_slice(target_info);
    msg
}
