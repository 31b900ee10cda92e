//! Topic grammar: `/xmtp/0/<kind>-<qualifier>/proto`.
//!
//! Four kinds are produced by the core:
//! - `dm-<addrA>-<addrB>` — v1 direct-message topic, addresses sorted ascending.
//! - `intro-<addr>` — per-address introduction channel.
//! - `invite-<addr>` — per-address invitation channel.
//! - `m-<opaque>` — v2 conversation topic, opaque hex or base64url qualifier.

use xmtp_crypto::WalletAddress;

const PREFIX: &str = "/xmtp/0/";
const SUFFIX: &str = "/proto";

/// Build the v1 direct-message topic for a pair of addresses, sorted by raw
/// bytes so both participants derive the identical topic independently.
pub fn dm_topic(a: &WalletAddress, b: &WalletAddress) -> String {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    format!(
        "{PREFIX}dm-{}-{}{SUFFIX}",
        lo.to_checksum(),
        hi.to_checksum()
    )
}

pub fn intro_topic(addr: &WalletAddress) -> String {
    format!("{PREFIX}intro-{}{SUFFIX}", addr.to_checksum())
}

pub fn invite_topic(addr: &WalletAddress) -> String {
    format!("{PREFIX}invite-{}{SUFFIX}", addr.to_checksum())
}

pub fn v2_topic(opaque_qualifier: &str) -> String {
    format!("{PREFIX}m-{opaque_qualifier}{SUFFIX}")
}

/// The parsed kind of a topic, with its qualifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicKind {
    Dm { addr_a: String, addr_b: String },
    Intro { addr: String },
    Invite { addr: String },
    V2 { opaque: String },
}

/// Parse a topic string into its kind. Returns `None` for anything that
/// doesn't match the grammar.
pub fn parse(topic: &str) -> Option<TopicKind> {
    let body = topic.strip_prefix(PREFIX)?.strip_suffix(SUFFIX)?;
    let (kind, qualifier) = body.split_once('-')?;
    match kind {
        "dm" => {
            let (a, b) = qualifier.split_once('-')?;
            Some(TopicKind::Dm {
                addr_a: a.to_string(),
                addr_b: b.to_string(),
            })
        }
        "intro" => Some(TopicKind::Intro {
            addr: qualifier.to_string(),
        }),
        "invite" => Some(TopicKind::Invite {
            addr: qualifier.to_string(),
        }),
        "m" => Some(TopicKind::V2 {
            opaque: qualifier.to_string(),
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(b: u8) -> WalletAddress {
        WalletAddress::from_bytes([b; 20])
    }

    #[test]
    fn dm_topic_orders_addresses() {
        let a = addr(0x01);
        let b = addr(0x02);
        assert_eq!(dm_topic(&a, &b), dm_topic(&b, &a));
    }

    #[test]
    fn dm_topic_roundtrips_through_parse() {
        let a = addr(0x01);
        let b = addr(0x02);
        let topic = dm_topic(&a, &b);
        match parse(&topic) {
            Some(TopicKind::Dm { addr_a, addr_b }) => {
                assert_eq!(addr_a, a.to_checksum());
                assert_eq!(addr_b, b.to_checksum());
            }
            other => panic!("unexpected parse: {other:?}"),
        }
    }

    #[test]
    fn v2_topic_roundtrips() {
        let topic = v2_topic("deadbeef");
        assert_eq!(parse(&topic), Some(TopicKind::V2 { opaque: "deadbeef".into() }));
    }

    #[test]
    fn rejects_malformed_topic() {
        assert_eq!(parse("not-a-topic"), None);
        assert_eq!(parse("/xmtp/0/unknownkind-x/proto"), None);
    }
}
