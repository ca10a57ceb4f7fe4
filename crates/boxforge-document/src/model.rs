//! The configuration document tree.
//!
//! Optional values stay `Option` in memory and only turn into presence or
//! omission when serialized. A scalar is written when it carries a
//! non-default value (non-empty string, non-zero number, `true`); the
//! mandatory inbound fields are always written. Nested blocks are always
//! written as objects, even when empty. Field order is the key order.

use serde::Serialize;
use serde_json::Value;

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn is_false(value: &bool) -> bool {
    !*value
}

#[allow(clippy::ref_option)]
const fn is_unset_flag(value: &Option<bool>) -> bool {
    !matches!(value, Some(true))
}

#[allow(clippy::ref_option)]
fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(str::is_empty)
}

#[allow(clippy::ref_option)]
const fn is_unset_port(value: &Option<u16>) -> bool {
    matches!(value, None | Some(0))
}

#[allow(clippy::ref_option)]
const fn is_unset_mark(value: &Option<u32>) -> bool {
    matches!(value, None | Some(0))
}

/// Root of the rendered configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Document {
    /// Logging block.
    pub log: Log,
    /// DNS block; not populated from records.
    pub dns: Dns,
    /// NTP block; not populated from records.
    pub ntp: Ntp,
    /// Inbounds in ascending record id order.
    pub inbounds: Vec<Inbound>,
    /// Outbounds; not populated from records.
    pub outbounds: Vec<Value>,
    /// Routing block; not populated from records.
    pub route: Route,
    /// Experimental block; not populated from records.
    pub experimental: Experimental,
}

/// Logging block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Log {
    /// Logging disabled.
    #[serde(skip_serializing_if = "is_false")]
    pub disabled: bool,
    /// Level name.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub level: String,
    /// Output file.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub output: String,
    /// Timestamps on log lines.
    #[serde(skip_serializing_if = "is_false")]
    pub timestamp: bool,
}

/// DNS block.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Dns {
    /// Upstream servers.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<DnsServer>,
    /// DNS rules, passed through untyped.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<Value>,
    /// Default server tag.
    #[serde(rename = "final", skip_serializing_if = "is_blank")]
    pub final_server: Option<String>,
    /// Resolution strategy.
    #[serde(skip_serializing_if = "is_blank")]
    pub strategy: Option<String>,
    /// Disable the DNS cache.
    #[serde(skip_serializing_if = "is_false")]
    pub disable_cache: bool,
    /// Disable cache expiry.
    #[serde(skip_serializing_if = "is_false")]
    pub disable_expire: bool,
    /// Per-server caches.
    #[serde(skip_serializing_if = "is_false")]
    pub independent_cache: bool,
    /// Keep reverse mappings.
    #[serde(skip_serializing_if = "is_false")]
    pub reverse_mapping: bool,
    /// EDNS client subnet.
    #[serde(skip_serializing_if = "is_blank")]
    pub client_subnet: Option<String>,
    /// Fake-IP settings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fakeip: Option<FakeIp>,
}

/// One DNS upstream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DnsServer {
    /// Server tag.
    #[serde(skip_serializing_if = "is_blank")]
    pub tag: Option<String>,
    /// Server address.
    #[serde(skip_serializing_if = "is_blank")]
    pub address: Option<String>,
    /// Tag of the server resolving `address`.
    #[serde(skip_serializing_if = "is_blank")]
    pub address_resolver: Option<String>,
    /// Strategy used for `address`.
    #[serde(skip_serializing_if = "is_blank")]
    pub address_strategy: Option<String>,
    /// Resolution strategy.
    #[serde(skip_serializing_if = "is_blank")]
    pub strategy: Option<String>,
    /// Outbound used to reach the server.
    #[serde(skip_serializing_if = "is_blank")]
    pub detour: Option<String>,
    /// EDNS client subnet.
    #[serde(skip_serializing_if = "is_blank")]
    pub client_subnet: Option<String>,
}

/// Fake-IP settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FakeIp {
    /// Fake-IP enabled.
    #[serde(skip_serializing_if = "is_false")]
    pub enabled: bool,
    /// IPv4 range.
    #[serde(skip_serializing_if = "is_blank")]
    pub inet4_range: Option<String>,
    /// IPv6 range.
    #[serde(skip_serializing_if = "is_blank")]
    pub inet6_range: Option<String>,
}

/// NTP block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Ntp {
    /// NTP enabled.
    #[serde(skip_serializing_if = "is_false")]
    pub enabled: bool,
    /// Server address.
    #[serde(skip_serializing_if = "is_blank")]
    pub server: Option<String>,
    /// Server port.
    #[serde(skip_serializing_if = "is_unset_port")]
    pub server_port: Option<u16>,
    /// Sync interval.
    #[serde(skip_serializing_if = "is_blank")]
    pub interval: Option<String>,
}

/// One listener.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Inbound {
    /// Protocol type.
    #[serde(rename = "type")]
    pub kind: String,
    /// Unique tag.
    pub tag: String,
    /// Listen address.
    pub listen: String,
    /// Listen port.
    pub listen_port: u16,
    /// TCP fast open.
    #[serde(skip_serializing_if = "is_unset_flag")]
    pub tcp_fast_open: Option<bool>,
    /// Multipath TCP.
    #[serde(skip_serializing_if = "is_unset_flag")]
    pub tcp_multi_path: Option<bool>,
    /// UDP fragmentation.
    #[serde(skip_serializing_if = "is_unset_flag")]
    pub udp_fragment: Option<bool>,
    /// UDP NAT expiration.
    #[serde(skip_serializing_if = "is_blank")]
    pub udp_timeout: Option<String>,
    /// Detour outbound tag.
    #[serde(skip_serializing_if = "is_blank")]
    pub detour: Option<String>,
    /// Protocol sniffing.
    pub sniff: bool,
    /// Replace the destination with the sniffed domain.
    pub sniff_override_destination: bool,
    /// Sniffing timeout.
    pub sniff_timeout: String,
    /// Domain resolution strategy.
    #[serde(skip_serializing_if = "is_blank")]
    pub domain_strategy: Option<String>,
    /// Disable domain unmapping for UDP.
    #[serde(skip_serializing_if = "is_unset_flag")]
    pub udp_disable_domain_unmapping: Option<bool>,
    /// Users allowed on this listener.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub users: Vec<DocumentUser>,
    /// TLS block with Reality nested inside.
    pub tls: Tls,
    /// Transport block.
    pub transport: Transport,
}

/// A user entry attached to every inbound.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocumentUser {
    /// Display name.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Credential identifier.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub uuid: String,
    /// Subscription token, only when requested.
    #[serde(skip_serializing_if = "is_blank")]
    pub sub: Option<String>,
}

/// TLS block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Tls {
    /// TLS enabled.
    #[serde(skip_serializing_if = "is_false")]
    pub enabled: bool,
    /// SNI server name.
    #[serde(skip_serializing_if = "is_blank")]
    pub server_name: Option<String>,
    /// Minimum protocol version.
    #[serde(skip_serializing_if = "is_blank")]
    pub min_version: Option<String>,
    /// Maximum protocol version.
    #[serde(skip_serializing_if = "is_blank")]
    pub max_version: Option<String>,
    /// Certificate file path.
    #[serde(skip_serializing_if = "is_blank")]
    pub certificate_path: Option<String>,
    /// Private key file path.
    #[serde(skip_serializing_if = "is_blank")]
    pub key_path: Option<String>,
    /// Reality block.
    pub reality: Reality,
}

/// Reality block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Reality {
    /// Reality enabled.
    #[serde(skip_serializing_if = "is_false")]
    pub enabled: bool,
    /// Handshake target.
    pub handshake: Handshake,
    /// Private key.
    #[serde(skip_serializing_if = "is_blank")]
    pub private_key: Option<String>,
    /// Short id.
    #[serde(skip_serializing_if = "is_blank")]
    pub short_id: Option<String>,
}

/// Handshake target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Handshake {
    /// Server address.
    #[serde(skip_serializing_if = "is_blank")]
    pub server: Option<String>,
    /// Server port.
    #[serde(skip_serializing_if = "is_unset_port")]
    pub server_port: Option<u16>,
}

/// Transport block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Transport {
    /// Transport type.
    #[serde(rename = "type", skip_serializing_if = "is_blank")]
    pub kind: Option<String>,
    /// Request path.
    #[serde(skip_serializing_if = "is_blank")]
    pub path: Option<String>,
}

/// Routing block.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Route {
    /// Route rules, passed through untyped.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<Value>,
    /// Rule sets, passed through untyped.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rule_set: Vec<Value>,
    /// Default outbound tag.
    #[serde(rename = "final", skip_serializing_if = "is_blank")]
    pub final_outbound: Option<String>,
    /// Bind outbound connections to the default interface.
    #[serde(skip_serializing_if = "is_false")]
    pub auto_detect_interface: bool,
    /// Accept Android VPN as an upstream interface.
    #[serde(skip_serializing_if = "is_false")]
    pub override_android_vpn: bool,
    /// Default interface name.
    #[serde(skip_serializing_if = "is_blank")]
    pub default_interface: Option<String>,
    /// Default routing mark.
    #[serde(skip_serializing_if = "is_unset_mark")]
    pub default_mark: Option<u32>,
}

/// Experimental block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Experimental {
    /// Cache file settings.
    pub cache_file: CacheFile,
    /// Clash API settings.
    pub clash_api: ClashApi,
    /// V2Ray API settings.
    pub v2ray_api: V2rayApi,
}

/// Cache file settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheFile {}

/// Clash API settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClashApi {}

/// V2Ray API settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct V2rayApi {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_document_keeps_every_top_level_block() -> serde_json::Result<()> {
        let value = serde_json::to_value(Document::default())?;
        assert_eq!(
            value,
            json!({
                "log": {},
                "dns": {},
                "ntp": {},
                "inbounds": [],
                "outbounds": [],
                "route": {},
                "experimental": {"cache_file": {}, "clash_api": {}, "v2ray_api": {}}
            })
        );
        Ok(())
    }

    #[test]
    fn default_scalars_are_omitted_but_mandatory_fields_stay() -> serde_json::Result<()> {
        let inbound = Inbound {
            kind: "vless".into(),
            tag: "in1".into(),
            listen: "::".into(),
            listen_port: 8080,
            tcp_fast_open: Some(false),
            udp_timeout: Some(String::new()),
            sniff: false,
            sniff_override_destination: false,
            sniff_timeout: "300ms".into(),
            ..Inbound::default()
        };
        assert_eq!(
            serde_json::to_value(&inbound)?,
            json!({
                "type": "vless",
                "tag": "in1",
                "listen": "::",
                "listen_port": 8080,
                "sniff": false,
                "sniff_override_destination": false,
                "sniff_timeout": "300ms",
                "tls": {"reality": {"handshake": {}}},
                "transport": {}
            })
        );
        Ok(())
    }

    #[test]
    fn set_values_are_written_in_declaration_order() -> serde_json::Result<()> {
        let tls = Tls {
            enabled: true,
            server_name: Some("example.com".into()),
            reality: Reality {
                enabled: true,
                handshake: Handshake {
                    server: Some("www.example.com".into()),
                    server_port: Some(443),
                },
                private_key: Some("pk".into()),
                short_id: Some("ab".into()),
            },
            ..Tls::default()
        };
        let text = serde_json::to_string(&tls)?;
        assert_eq!(
            text,
            r#"{"enabled":true,"server_name":"example.com","reality":{"enabled":true,"handshake":{"server":"www.example.com","server_port":443},"private_key":"pk","short_id":"ab"}}"#
        );
        Ok(())
    }
}
