//! Row projections and insert payloads for the record tables.

use serde::Serialize;
use sqlx::FromRow;

use crate::join::Joined;

/// Raw projection of the singleton `log` row.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct LogRow {
    /// Whether logging is disabled in the rendered configuration.
    pub disabled: bool,
    /// Log level string.
    pub level: String,
    /// Output path for the proxy's log file.
    pub output: String,
    /// Whether log lines carry timestamps.
    pub timestamp: bool,
}

/// Payload written to the singleton `log` row.
#[derive(Debug, Clone)]
pub struct NewLog {
    /// Whether logging is disabled.
    pub disabled: bool,
    /// Log level string.
    pub level: String,
    /// Output path.
    pub output: String,
    /// Whether log lines carry timestamps.
    pub timestamp: bool,
}

/// Raw projection of the `users` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct UserRow {
    /// Primary key.
    pub id: i64,
    /// Display name, also used as the per-user file name.
    pub name: String,
    /// Credential identifier rendered into documents.
    pub uuid: String,
    /// Subscription token used in the per-user route path.
    pub sub: String,
    /// Soft-disable flag; inactive users are never rendered.
    pub active: bool,
}

/// Payload for inserting a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Display name.
    pub name: String,
    /// Credential identifier.
    pub uuid: String,
    /// Subscription token.
    pub sub: String,
    /// Initial active flag.
    pub active: bool,
}

/// Raw projection of the `transports` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct TransportRow {
    /// Primary key.
    pub id: i64,
    /// Transport protocol tag (for example `ws`).
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: String,
    /// Request path.
    pub path: String,
}

/// Payload for inserting a transport.
#[derive(Debug, Clone)]
pub struct NewTransport {
    /// Transport protocol tag.
    pub kind: String,
    /// Request path.
    pub path: String,
}

/// Raw projection of the `tls` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct TlsRow {
    /// Primary key.
    pub id: i64,
    /// Enabled flag.
    pub enabled: bool,
    /// SNI server name.
    pub server_name: Option<String>,
    /// Minimum protocol version.
    pub min_version: Option<String>,
    /// Maximum protocol version.
    pub max_version: Option<String>,
    /// Certificate file path.
    pub certificate_path: Option<String>,
    /// Private key file path.
    pub key_path: Option<String>,
}

/// Payload for inserting a TLS configuration.
#[derive(Debug, Clone, Default)]
pub struct NewTls {
    /// Enabled flag.
    pub enabled: bool,
    /// SNI server name.
    pub server_name: Option<String>,
    /// Minimum protocol version.
    pub min_version: Option<String>,
    /// Maximum protocol version.
    pub max_version: Option<String>,
    /// Certificate file path.
    pub certificate_path: Option<String>,
    /// Private key file path.
    pub key_path: Option<String>,
}

/// Raw projection of the `reality` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct RealityRow {
    /// Primary key.
    pub id: i64,
    /// Enabled flag.
    pub enabled: bool,
    /// Reality private key.
    pub private_key: Option<String>,
    /// Reality short id.
    pub short_id: Option<String>,
}

/// Payload for inserting a reality configuration.
#[derive(Debug, Clone, Default)]
pub struct NewReality {
    /// Enabled flag.
    pub enabled: bool,
    /// Reality private key.
    pub private_key: Option<String>,
    /// Reality short id.
    pub short_id: Option<String>,
}

/// Raw projection of the `handshake` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct HandshakeRow {
    /// Primary key.
    pub id: i64,
    /// Handshake server address.
    pub server: Option<String>,
    /// Handshake server port.
    pub server_port: Option<i64>,
}

/// Payload for inserting a handshake configuration.
#[derive(Debug, Clone, Default)]
pub struct NewHandshake {
    /// Handshake server address.
    pub server: Option<String>,
    /// Handshake server port.
    pub server_port: Option<u16>,
}

/// Raw projection of the `inbounds` table, references left as stored ids.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct InboundRow {
    /// Primary key.
    pub id: i64,
    /// Inbound protocol type.
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: String,
    /// Unique tag.
    pub tag: String,
    /// Listen address.
    pub listen: String,
    /// Listen port.
    pub listen_port: i64,
    /// Sniff flag.
    pub sniff: bool,
    /// Sniff override destination flag.
    pub sniff_override_destination: bool,
    /// Sniff timeout duration string.
    pub sniff_timeout: String,
    /// Domain strategy.
    pub domain_strategy: Option<String>,
    /// Transport reference.
    pub transport_id: Option<i64>,
    /// TLS reference.
    pub tls_id: Option<i64>,
    /// Reality reference.
    pub reality_id: Option<i64>,
    /// Handshake reference.
    pub handshake_id: Option<i64>,
}

/// Optional listen-level fields of an inbound.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListenOptions {
    /// TCP fast open.
    pub tcp_fast_open: Option<bool>,
    /// Multipath TCP.
    pub tcp_multi_path: Option<bool>,
    /// UDP fragmentation.
    pub udp_fragment: Option<bool>,
    /// UDP NAT expiration.
    pub udp_timeout: Option<String>,
    /// Detour outbound tag.
    pub detour: Option<String>,
    /// Disable domain unmapping for UDP.
    pub udp_disable_domain_unmapping: Option<bool>,
}

/// Payload for inserting an inbound.
#[derive(Debug, Clone)]
pub struct NewInbound {
    /// Inbound protocol type.
    pub kind: String,
    /// Unique tag.
    pub tag: String,
    /// Listen address.
    pub listen: String,
    /// Listen port.
    pub listen_port: u16,
    /// Sniff flag.
    pub sniff: bool,
    /// Sniff override destination flag.
    pub sniff_override_destination: bool,
    /// Sniff timeout duration string.
    pub sniff_timeout: String,
    /// Domain strategy.
    pub domain_strategy: Option<String>,
    /// Optional listen-level fields.
    pub listen_options: ListenOptions,
    /// Transport reference.
    pub transport_id: Option<i64>,
    /// TLS reference.
    pub tls_id: Option<i64>,
    /// Reality reference.
    pub reality_id: Option<i64>,
    /// Handshake reference.
    pub handshake_id: Option<i64>,
}

/// Inbound columns of a projection row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundColumns {
    /// Primary key.
    pub id: i64,
    /// Inbound protocol type.
    pub kind: String,
    /// Unique tag.
    pub tag: String,
    /// Listen address.
    pub listen: String,
    /// Listen port.
    pub listen_port: u16,
    /// Sniff flag.
    pub sniff: bool,
    /// Sniff override destination flag.
    pub sniff_override_destination: bool,
    /// Sniff timeout duration string.
    pub sniff_timeout: String,
    /// Domain strategy.
    pub domain_strategy: Option<String>,
    /// Optional listen-level fields.
    pub listen_options: ListenOptions,
}

/// Transport columns reached through the inbound's `transport_id`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportJoin {
    /// Transport protocol tag.
    pub kind: Joined<String>,
    /// Request path.
    pub path: Joined<String>,
}

/// TLS columns reached through the inbound's `tls_id`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsJoin {
    /// Enabled flag.
    pub enabled: Joined<bool>,
    /// SNI server name.
    pub server_name: Joined<String>,
    /// Minimum protocol version.
    pub min_version: Joined<String>,
    /// Maximum protocol version.
    pub max_version: Joined<String>,
    /// Certificate file path.
    pub certificate_path: Joined<String>,
    /// Private key file path.
    pub key_path: Joined<String>,
}

/// Reality columns reached through the inbound's `reality_id`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RealityJoin {
    /// Enabled flag.
    pub enabled: Joined<bool>,
    /// Reality private key.
    pub private_key: Joined<String>,
    /// Reality short id.
    pub short_id: Joined<String>,
}

/// Handshake columns reached through the inbound's `handshake_id`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandshakeJoin {
    /// Handshake server address.
    pub server: Joined<String>,
    /// Handshake server port.
    pub server_port: Joined<u16>,
}

/// One flat row of the inbound projection query.
///
/// The four sibling joins are independent: a reality row may be joined while
/// the TLS reference is absent, and the projection decides how to nest them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundJoinRow {
    /// Columns owned by the inbound itself.
    pub inbound: InboundColumns,
    /// Transport join.
    pub transport: TransportJoin,
    /// TLS join.
    pub tls: TlsJoin,
    /// Reality join.
    pub reality: RealityJoin,
    /// Handshake join.
    pub handshake: HandshakeJoin,
}
