use serde::{Serialize, Serializer};

/// Fields of one frame as published by the upstream decoder. Every field that
/// can be missing has a marker default (`""` or `-1`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FrameFields {
    // Ethernet
    pub mac_src: String,
    pub mac_dst: String,
    #[serde(serialize_with = "ethertype_hex")]
    pub ethertype: u16,
    pub ethertype_name: String,
    pub frame_len: i64,
    pub has_vlan: bool,
    pub vlan_id: i64,

    // Network
    pub ip_version: u8,
    pub ip_src: String,
    pub ip_dst: String,
    pub ip_ttl: i64,

    // Transport
    pub l4_proto: i64,
    pub l4_name: String,
    pub src_port: i64,
    pub dst_port: i64,
    pub tcp_flags: String,
    pub icmp_type: i64,
    pub icmp_code: i64,

    pub payload_preview: String,
    pub info: String,
}

impl Default for FrameFields {
    fn default() -> Self {
        Self {
            mac_src: String::new(),
            mac_dst: String::new(),
            ethertype: 0,
            ethertype_name: String::new(),
            frame_len: -1,
            has_vlan: false,
            vlan_id: -1,

            ip_version: 0,
            ip_src: String::new(),
            ip_dst: String::new(),
            ip_ttl: -1,

            l4_proto: -1,
            l4_name: String::new(),
            src_port: -1,
            dst_port: -1,
            tcp_flags: String::new(),
            icmp_type: -1,
            icmp_code: -1,

            payload_preview: String::new(),
            info: String::new(),
        }
    }
}

impl FrameFields {
    /// `IPv4/TCP` style label for IP frames with a transport layer, the bare
    /// ethertype name otherwise.
    pub fn proto_label(&self) -> String {
        if self.ethertype_name.starts_with("IPv") && !self.l4_name.is_empty() {
            format!("{}/{}", self.ethertype_name, self.l4_name)
        } else {
            self.ethertype_name.clone()
        }
    }
}

/// A fully built frame waiting for its id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Frame {
    #[serde(rename = "timestamp")]
    pub captured_at: String,
    #[serde(flatten)]
    pub fields: FrameFields,
    pub proto_label: String,
}

impl Frame {
    pub fn new(fields: FrameFields, captured_at: String) -> Self {
        Self {
            proto_label: fields.proto_label(),
            captured_at,
            fields,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct FrameRecord {
    pub id: u64,
    #[serde(flatten)]
    pub frame: Frame,
}

fn ethertype_hex<S>(ethertype: &u16, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format!("0x{ethertype:04x}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(ethertype_name: &str, l4_name: &str) -> FrameFields {
        FrameFields {
            ethertype_name: ethertype_name.to_string(),
            l4_name: l4_name.to_string(),
            ..FrameFields::default()
        }
    }

    #[test]
    fn test_proto_label_ip_with_transport() {
        assert_eq!(fields("IPv4", "TCP").proto_label(), "IPv4/TCP");
        assert_eq!(fields("IPv6", "ICMPv6").proto_label(), "IPv6/ICMPv6");
    }

    #[test]
    fn test_proto_label_without_transport() {
        assert_eq!(fields("ARP", "").proto_label(), "ARP");
        assert_eq!(fields("IPv4", "").proto_label(), "IPv4");
    }

    #[test]
    fn test_proto_label_non_ip_ignores_transport() {
        assert_eq!(fields("LLDP", "TCP").proto_label(), "LLDP");
        assert_eq!(fields("", "").proto_label(), "");
    }

    #[test]
    fn test_record_json_shape() {
        let record = FrameRecord {
            id: 7,
            frame: Frame::new(
                FrameFields {
                    mac_src: "00:1a:2b:3c:4d:5e".to_string(),
                    ethertype: 0x0800,
                    ethertype_name: "IPv4".to_string(),
                    ip_version: 4,
                    l4_name: "UDP".to_string(),
                    src_port: 5353,
                    ..FrameFields::default()
                },
                "12:30:05".to_string(),
            ),
        };

        let actual = serde_json::to_value(&record).unwrap();

        assert_eq!(actual["id"], 7);
        assert_eq!(actual["timestamp"], "12:30:05");
        assert_eq!(actual["ethertype"], "0x0800");
        assert_eq!(actual["proto_label"], "IPv4/UDP");
        assert_eq!(actual["mac_src"], "00:1a:2b:3c:4d:5e");
        assert_eq!(actual["src_port"], 5353);
        assert_eq!(actual["dst_port"], -1);
        assert_eq!(actual["frame_len"], -1);
        assert_eq!(actual["has_vlan"], false);
        assert_eq!(actual["info"], "");
        assert!(actual.get("fields").is_none());
        assert!(actual.get("captured_at").is_none());
    }

    #[test]
    fn test_unknown_ethertype_is_zero_padded() {
        let record = FrameRecord {
            id: 1,
            frame: Frame::new(FrameFields::default(), String::new()),
        };

        let actual = serde_json::to_value(&record).unwrap();
        assert_eq!(actual["ethertype"], "0x0000");
    }
}
