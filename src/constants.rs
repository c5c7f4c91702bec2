//! # Application-Wide Constants
//!
//! Defaults and protocol values used throughout sharewatch.
//!
//! ## Usage
//!
//! ```rust
//! use sharewatch::constants::*;
//! use std::time::Duration;
//!
//! let tick = Duration::from_millis(DEFAULT_TICK_MS);
//! ```

/// Windows API flag to create a process without a visible console window
///
/// Used when spawning the ping utility so no console flashes up every tick.
#[cfg(windows)]
pub const CREATE_NO_WINDOW: u32 = 0x08000000;

// ============================================================================
// Configuration Defaults
// ============================================================================

/// Default port of the share service (SMB over TCP)
pub const DEFAULT_SHARE_PORT: u16 = 445;

/// Default interval between ticks (milliseconds)
///
/// **Rationale**: one second keeps transitions visible almost immediately
/// while each tick only costs one ping, one TCP handshake and one file read.
pub const DEFAULT_TICK_MS: u64 = 1000;

/// Maximum hostname length (characters)
///
/// **Rationale**: DNS hostnames are limited to 253 characters (RFC 1035),
/// 255 leaves room for a trailing dot and matches common validation.
pub const MAX_HOSTNAME_LENGTH: usize = 255;

/// Environment variable that turns on debug logging (`1` = on)
pub const ENV_LOG_VERBOSE: &str = "SHAREWATCH_LOG_VERBOSE";

/// Environment variable consulted for the share password
pub const ENV_PASSWORD: &str = "SHAREWATCH_PASSWORD";

// ============================================================================
// Timeouts
// ============================================================================

/// TCP connect timeout for the share session probe (milliseconds)
pub const SESSION_CONNECT_TIMEOUT_MS: u64 = 5000;

/// Timeout for negotiate plus session setup once the socket is open (milliseconds)
pub const SESSION_HANDSHAKE_TIMEOUT_MS: u64 = 5000;

/// Upper bound on a single `ping` invocation (seconds)
///
/// The ping utility enforces its own reply timeout; this only catches a
/// utility that never exits.
pub const PING_GUARD_TIMEOUT_SECS: u64 = 10;

// ============================================================================
// Logging
// ============================================================================

/// Log files above this size are rotated to `.log.bak` at startup
pub const MAX_LOG_BYTES: u64 = 10 * 1024 * 1024;

// ============================================================================
// SMB2 Wire Constants
// ============================================================================

/// SMB2 protocol identifier (`0xFE 'S' 'M' 'B'`)
pub const SMB2_PROTOCOL_ID: [u8; 4] = [0xFE, b'S', b'M', b'B'];

/// Fixed size of an SMB2 packet header
pub const SMB2_HEADER_LEN: usize = 64;

/// SMB2 NEGOTIATE command code
pub const SMB2_NEGOTIATE: u16 = 0x0000;

/// SMB2 SESSION_SETUP command code
pub const SMB2_SESSION_SETUP: u16 = 0x0001;

/// NT status returned between the NTLM challenge and authenticate legs
pub const STATUS_MORE_PROCESSING_REQUIRED: u32 = 0xC000_0016;

/// NT status for a rejected logon (bad user or password)
pub const STATUS_LOGON_FAILURE: u32 = 0xC000_006D;

/// SessionFlags: logged on as guest
pub const SMB2_SESSION_FLAG_IS_GUEST: u16 = 0x0001;

/// SessionFlags: anonymous session
pub const SMB2_SESSION_FLAG_IS_NULL: u16 = 0x0002;

/// Dialects offered in the NEGOTIATE request: 2.0.2, 2.1, 3.0, 3.0.2
pub const SMB2_DIALECTS: &[u16] = &[0x0202, 0x0210, 0x0300, 0x0302];

/// SecurityMode flag: signing enabled
pub const SMB2_SIGNING_ENABLED: u16 = 0x0001;

/// SecurityMode flag: signing required
pub const SMB2_SIGNING_REQUIRED: u16 = 0x0002;

/// Largest NetBIOS-framed response accepted from the server
///
/// **Rationale**: NEGOTIATE and SESSION_SETUP responses carry security blobs
/// of a few hundred bytes; 64 KiB rejects garbage lengths without truncating real
/// servers.
pub const SMB2_MAX_RESPONSE_LEN: usize = 64 * 1024;
