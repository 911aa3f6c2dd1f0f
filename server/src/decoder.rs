use crate::frame::FrameFields;
use pmt::{Pmt, PmtError};
use serde_json::{Map, Value};
use strum_macros::{Display, EnumString};
use thiserror::Error;

/// Encoding of messages on the bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum WireFormat {
    /// Serialized PMT dictionary, as written by GNU Radio message blocks.
    Pmt,
    /// JSON object with the same keys.
    Json,
}

/// Typed, per-key access to a decoded mapping. `None` covers both a missing
/// key and a value of another type.
pub trait FieldSource {
    fn string(&self, key: &str) -> Option<String>;
    fn integer(&self, key: &str) -> Option<i64>;
    fn boolean(&self, key: &str) -> Option<bool>;
}

struct PmtDict<'a>(&'a Pmt);

impl FieldSource for PmtDict<'_> {
    fn string(&self, key: &str) -> Option<String> {
        self.0.dict_ref(key).and_then(Pmt::as_symbol).map(str::to_string)
    }

    fn integer(&self, key: &str) -> Option<i64> {
        self.0.dict_ref(key).and_then(Pmt::as_integer)
    }

    fn boolean(&self, key: &str) -> Option<bool> {
        self.0.dict_ref(key).and_then(Pmt::as_bool)
    }
}

struct JsonObject<'a>(&'a Map<String, Value>);

impl FieldSource for JsonObject<'_> {
    fn string(&self, key: &str) -> Option<String> {
        self.0.get(key).and_then(Value::as_str).map(str::to_string)
    }

    fn integer(&self, key: &str) -> Option<i64> {
        self.0.get(key).and_then(Value::as_i64)
    }

    fn boolean(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(Value::as_bool)
    }
}

pub fn decode(bytes: &[u8], format: WireFormat) -> Result<FrameFields, DecodeError> {
    match format {
        WireFormat::Pmt => {
            let value = pmt::deserialize(bytes)?;
            if !value.is_dict() {
                return Err(DecodeError::NotAMapping);
            }
            Ok(extract(&PmtDict(&value)))
        },
        WireFormat::Json => {
            let value: Value = serde_json::from_slice(bytes)?;
            let object = value.as_object().ok_or(DecodeError::NotAMapping)?;
            Ok(extract(&JsonObject(object)))
        },
    }
}

/// Resolves every field on its own. A bad field never fails the record.
pub fn extract(source: &impl FieldSource) -> FrameFields {
    let string = |key: &str| source.string(key).unwrap_or_default();
    let integer = |key: &str| source.integer(key).unwrap_or(-1);

    FrameFields {
        mac_src: string("mac_src"),
        mac_dst: string("mac_dst"),
        ethertype: source
            .integer("ethertype")
            .and_then(|value| u16::try_from(value).ok())
            .unwrap_or(0),
        ethertype_name: string("ethertype_name"),
        frame_len: integer("frame_length"),
        has_vlan: source.boolean("has_vlan").unwrap_or(false),
        vlan_id: integer("vlan_id"),

        ip_version: match source.integer("ip_version") {
            Some(4) => 4,
            Some(6) => 6,
            _ => 0,
        },
        ip_src: string("ip_src"),
        ip_dst: string("ip_dst"),
        ip_ttl: integer("ip_ttl"),

        l4_proto: integer("l4_proto"),
        l4_name: string("l4_name"),
        src_port: integer("src_port"),
        dst_port: integer("dst_port"),
        tcp_flags: string("tcp_flags"),
        icmp_type: integer("icmp_type"),
        icmp_code: integer("icmp_code"),

        payload_preview: string("payload_preview"),
        info: string("info"),
    }
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Failed to decode PMT message.")]
    Pmt(#[from] PmtError),

    #[error("Failed to decode JSON message.")]
    Json(#[from] serde_json::Error),

    #[error("Message is not a mapping.")]
    NotAMapping,
}

impl DecodeError {
    pub fn additional_info(&self) -> Option<String> {
        match self {
            DecodeError::Pmt(err) => match err.additional_info() {
                Some(info) => Some(format!("{err} {info}")),
                None => Some(err.to_string()),
            },
            DecodeError::Json(err) => Some(err.to_string()),
            DecodeError::NotAMapping => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tcp_message() -> Pmt {
        Pmt::dict([
            ("frame_num", Pmt::Integer(12)),
            ("frame_length", Pmt::Integer(74)),
            ("mac_dst", Pmt::symbol("ff:ff:ff:ff:ff:ff")),
            ("mac_src", Pmt::symbol("00:1a:2b:3c:4d:5e")),
            ("ethertype", Pmt::Integer(0x0800)),
            ("ethertype_name", Pmt::symbol("IPv4")),
            ("has_vlan", Pmt::Bool(false)),
            ("vlan_id", Pmt::Integer(-1)),
            ("ip_version", Pmt::Integer(4)),
            ("ip_src", Pmt::symbol("192.168.1.10")),
            ("ip_dst", Pmt::symbol("192.168.1.1")),
            ("ip_ttl", Pmt::Integer(64)),
            ("l4_proto", Pmt::Integer(6)),
            ("l4_name", Pmt::symbol("TCP")),
            ("src_port", Pmt::Integer(51514)),
            ("dst_port", Pmt::Integer(80)),
            ("tcp_flags", Pmt::symbol("SYN")),
            ("icmp_type", Pmt::Integer(-1)),
            ("icmp_code", Pmt::Integer(-1)),
            ("payload_preview", Pmt::symbol("")),
            ("info", Pmt::symbol("51514 -> 80 [SYN]")),
        ])
    }

    #[test]
    fn test_full_pmt_message() {
        let bytes = pmt::serialize(&tcp_message());
        let actual = decode(&bytes, WireFormat::Pmt).unwrap();

        let expected = FrameFields {
            mac_src: "00:1a:2b:3c:4d:5e".to_string(),
            mac_dst: "ff:ff:ff:ff:ff:ff".to_string(),
            ethertype: 0x0800,
            ethertype_name: "IPv4".to_string(),
            frame_len: 74,
            has_vlan: false,
            vlan_id: -1,
            ip_version: 4,
            ip_src: "192.168.1.10".to_string(),
            ip_dst: "192.168.1.1".to_string(),
            ip_ttl: 64,
            l4_proto: 6,
            l4_name: "TCP".to_string(),
            src_port: 51514,
            dst_port: 80,
            tcp_flags: "SYN".to_string(),
            icmp_type: -1,
            icmp_code: -1,
            payload_preview: String::new(),
            info: "51514 -> 80 [SYN]".to_string(),
        };

        assert_eq!(actual, expected);
        assert_eq!(actual.proto_label(), "IPv4/TCP");
    }

    #[test]
    fn test_missing_ttl_defaults() {
        let message = Pmt::dict([
            ("ethertype_name", Pmt::symbol("IPv6")),
            ("ip_version", Pmt::Integer(6)),
        ]);
        let actual = decode(&pmt::serialize(&message), WireFormat::Pmt).unwrap();

        assert_eq!(actual.ip_version, 6);
        assert_eq!(actual.ip_ttl, -1);
    }

    #[test]
    fn test_empty_mapping_is_all_defaults() {
        let actual = decode(&pmt::serialize(&Pmt::Null), WireFormat::Pmt).unwrap();
        assert_eq!(actual, FrameFields::default());

        let actual = decode(b"{}", WireFormat::Json).unwrap();
        assert_eq!(actual, FrameFields::default());
    }

    #[test]
    fn test_mistyped_fields_default() {
        let message = Pmt::dict([
            ("mac_src", Pmt::Integer(1)),
            ("ip_ttl", Pmt::symbol("64")),
            ("has_vlan", Pmt::Integer(1)),
            ("src_port", Pmt::UInt64(443)),
            ("ethertype", Pmt::Integer(0x1_0000)),
            ("ip_version", Pmt::Integer(5)),
            ("info", Pmt::symbol("kept")),
        ]);
        let actual = decode(&pmt::serialize(&message), WireFormat::Pmt).unwrap();

        let expected = FrameFields {
            info: "kept".to_string(),
            ..FrameFields::default()
        };
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_vlan_fields() {
        let message = Pmt::dict([
            ("has_vlan", Pmt::Bool(true)),
            ("vlan_id", Pmt::Integer(100)),
        ]);
        let actual = decode(&pmt::serialize(&message), WireFormat::Pmt).unwrap();

        assert!(actual.has_vlan);
        assert_eq!(actual.vlan_id, 100);
    }

    #[test]
    fn test_corrupt_pmt() {
        assert!(matches!(
            decode(&[0x07, 0x07, 0x02, 0x00], WireFormat::Pmt),
            Err(DecodeError::Pmt(PmtError::Truncated))
        ));
        assert!(matches!(
            decode(&[0x42], WireFormat::Pmt),
            Err(DecodeError::Pmt(PmtError::UnknownTag(0x42)))
        ));
    }

    #[test]
    fn test_list_without_pairs_takes_defaults() {
        let list = Pmt::cons(Pmt::symbol("mac_src"), Pmt::cons(Pmt::Integer(1), Pmt::Null));
        let actual = decode(&pmt::serialize(&list), WireFormat::Pmt).unwrap();

        assert_eq!(actual, FrameFields::default());
    }

    #[test]
    fn test_pmt_not_a_dictionary() {
        let bytes = pmt::serialize(&Pmt::Integer(5));
        assert!(matches!(
            decode(&bytes, WireFormat::Pmt),
            Err(DecodeError::NotAMapping)
        ));
    }

    #[test]
    fn test_json_message() {
        let bytes = br#"{
            "mac_src": "aa:bb:cc:dd:ee:ff",
            "ethertype": 2054,
            "ethertype_name": "ARP",
            "frame_length": 60,
            "has_vlan": true,
            "ip_ttl": "sixty-four",
            "info": "Who has 10.0.0.1?"
        }"#;
        let actual = decode(bytes, WireFormat::Json).unwrap();

        assert_eq!(actual.mac_src, "aa:bb:cc:dd:ee:ff");
        assert_eq!(actual.ethertype, 0x0806);
        assert_eq!(actual.frame_len, 60);
        assert!(actual.has_vlan);
        assert_eq!(actual.ip_ttl, -1);
        assert_eq!(actual.proto_label(), "ARP");
    }

    #[test]
    fn test_json_failures() {
        assert!(matches!(
            decode(b"{\"mac_src\":", WireFormat::Json),
            Err(DecodeError::Json(_))
        ));
        assert!(matches!(
            decode(b"[1, 2]", WireFormat::Json),
            Err(DecodeError::NotAMapping)
        ));
    }

    #[test]
    fn test_wire_format_names() {
        assert_eq!("pmt".parse::<WireFormat>().unwrap(), WireFormat::Pmt);
        assert_eq!("JSON".parse::<WireFormat>().unwrap(), WireFormat::Json);
        assert_eq!(WireFormat::Json.to_string(), "json");
        assert!("xml".parse::<WireFormat>().is_err());
    }
}
