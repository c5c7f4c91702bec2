//! Concrete capabilities (system ping, SMB2 over TCP with NTLMv2 logon)
//!
//! Everything that touches processes or sockets on behalf of the probes is
//! isolated here.

pub mod ntlm;
pub mod ping;
pub mod smb;

pub use ping::SystemPinger;
pub use smb::SmbConnector;
