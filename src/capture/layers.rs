use pnet::packet::{
    arp::ArpPacket,
    ethernet::{EtherType, EtherTypes, EthernetPacket},
    gre::GrePacket,
    icmp::IcmpPacket,
    icmpv6::{Icmpv6Packet, Icmpv6Type, Icmpv6Types},
    ip::{IpNextHeaderProtocol, IpNextHeaderProtocols},
    ipv4::Ipv4Packet,
    ipv6::Ipv6Packet,
    sll::SLLPacket,
    tcp::TcpPacket,
    udp::UdpPacket,
    vlan::VlanPacket,
};
use pnet::util::MacAddr;
use std::fmt::Display;
use std::net::{Ipv4Addr, Ipv6Addr};

use crate::models::filter::{Classification, ProtocolCategory};
use crate::models::packet::LinkType;

const ETHERNET_HEADER: usize = 14;
const SLL_HEADER: usize = 16;
const VLAN_TAG: usize = 4;
const IPV4_MIN_HEADER: usize = 20;
const IPV6_HEADER: usize = 40;
const PPPOE_HEADER: usize = 6;
const IGMP_MIN_LENGTH: usize = 8;

/// ARPHRD_ETHER, the SLL address is a MAC
const SLL_HARDWARE_ADDRESS: u16 = 1;

const PPP_IPV4: u16 = 0x0021;
const PPP_IPV6: u16 = 0x0057;

const AF_INET: u32 = 2;
// Linux, NetBSD/OpenBSD, FreeBSD, Darwin
const AF_INET6: [u32; 4] = [10, 24, 28, 30];

// Multicast listener discovery messages (RFC 2710, RFC 3810)
const MLD_QUERY: Icmpv6Type = Icmpv6Type(130);
const MLD_REPORT: Icmpv6Type = Icmpv6Type(131);
const MLD_DONE: Icmpv6Type = Icmpv6Type(132);
const MLD_V2_REPORT: Icmpv6Type = Icmpv6Type(143);

/// One decoded protocol header together with the bytes it encapsulates
#[derive(Debug, Clone, PartialEq)]
pub enum Layer<'a> {
    Ethernet {
        source: MacAddr,
        destination: MacAddr,
        ethertype: EtherType,
        payload: &'a [u8],
    },
    LinuxSll {
        ethertype: EtherType,
        source: Option<MacAddr>,
        payload: &'a [u8],
    },
    Null {
        family: u32,
        payload: &'a [u8],
    },
    Ppp {
        protocol: u16,
        payload: &'a [u8],
    },
    RawIp {
        version: u8,
        payload: &'a [u8],
    },
    /// 802.11 MAC, radiotap and PPI framing; never looked into
    Wireless,
    Vlan {
        ethertype: EtherType,
        payload: &'a [u8],
    },
    Ipv4 {
        source: Ipv4Addr,
        destination: Ipv4Addr,
        protocol: IpNextHeaderProtocol,
        /// `None` for non-initial fragments
        payload: Option<&'a [u8]>,
    },
    Ipv6 {
        source: Ipv6Addr,
        destination: Ipv6Addr,
        /// Upper-layer protocol after any extension headers
        protocol: IpNextHeaderProtocol,
        payload: Option<&'a [u8]>,
    },
    Arp,
    Lldp,
    WakeOnLan,
    Pppoe {
        /// `None` for discovery stage frames
        payload: Option<&'a [u8]>,
    },
    Ospf,
    Gre,
    Tcp {
        source: u16,
        destination: u16,
    },
    Udp {
        source: u16,
        destination: u16,
    },
    Icmpv4 {
        icmp_type: u8,
        code: u8,
    },
    Icmpv6 {
        icmp_type: Icmpv6Type,
        code: u8,
    },
    Igmp,
}

impl<'a> Layer<'a> {
    /// Decode the outermost header of a frame with the given framing
    pub fn link(link_type: LinkType, data: &'a [u8]) -> Option<Self> {
        match link_type {
            LinkType::Ethernet => Self::ethernet(data),
            LinkType::LinuxSll => Self::linux_sll(data),
            LinkType::Null => Self::null(data, false),
            LinkType::Loop => Self::null(data, true),
            LinkType::Ppp => Self::ppp(data),
            LinkType::RawIp => {
                let version = data.first()? >> 4;
                Some(Layer::RawIp {
                    version,
                    payload: data,
                })
            }
            LinkType::Ieee80211 | LinkType::Ieee80211Radiotap | LinkType::Ppi => {
                Some(Layer::Wireless)
            }
            LinkType::Unsupported(_) => None,
        }
    }

    fn ethernet(data: &'a [u8]) -> Option<Self> {
        let packet = EthernetPacket::new(data)?;
        Some(Layer::Ethernet {
            source: packet.get_source(),
            destination: packet.get_destination(),
            ethertype: packet.get_ethertype(),
            payload: &data[ETHERNET_HEADER..],
        })
    }

    fn linux_sll(data: &'a [u8]) -> Option<Self> {
        // SLLPacket's minimum size leaves out the 8-byte address field
        if data.len() < SLL_HEADER {
            return None;
        }
        let packet = SLLPacket::new(data)?;
        let source = if packet.get_link_layer_address_type() == SLL_HARDWARE_ADDRESS
            && packet.get_link_layer_address_len() >= 6
        {
            let a = packet.get_link_layer_address();
            Some(MacAddr::new(a[0], a[1], a[2], a[3], a[4], a[5]))
        } else {
            None
        };

        Some(Layer::LinuxSll {
            ethertype: packet.get_protocol(),
            source,
            payload: &data[SLL_HEADER..],
        })
    }

    fn null(data: &'a [u8], network_order: bool) -> Option<Self> {
        let header: [u8; 4] = data.get(..4)?.try_into().ok()?;
        // DLT_NULL is in the capturing host's byte order; small values leave one half zero
        let family = if network_order || (header[0] == 0 && header[1] == 0) {
            u32::from_be_bytes(header)
        } else {
            u32::from_le_bytes(header)
        };

        Some(Layer::Null {
            family,
            payload: &data[4..],
        })
    }

    fn ppp(data: &'a [u8]) -> Option<Self> {
        let data = data.strip_prefix(&[0xff, 0x03]).unwrap_or(data);
        let protocol = u16::from_be_bytes([*data.first()?, *data.get(1)?]);
        Some(Layer::Ppp {
            protocol,
            payload: &data[2..],
        })
    }

    fn vlan(data: &'a [u8]) -> Option<Self> {
        let packet = VlanPacket::new(data)?;
        Some(Layer::Vlan {
            ethertype: packet.get_ethertype(),
            payload: &data[VLAN_TAG..],
        })
    }

    fn pppoe(data: &'a [u8], session: bool) -> Option<Self> {
        if data.len() < PPPOE_HEADER {
            return None;
        }
        let length = u16::from_be_bytes([data[4], data[5]]) as usize;
        let end = (PPPOE_HEADER + length).min(data.len());
        Some(Layer::Pppoe {
            payload: session.then(|| &data[PPPOE_HEADER..end]),
        })
    }

    fn ipv4(data: &'a [u8]) -> Option<Self> {
        let packet = Ipv4Packet::new(data)?;
        if packet.get_version() != 4 {
            return None;
        }

        let header_len = packet.get_header_length() as usize * 4;
        if header_len < IPV4_MIN_HEADER || header_len > data.len() {
            return None;
        }

        // Offloaded segments are often captured with a zero total length
        let end = match packet.get_total_length() as usize {
            0 => data.len(),
            total => total.clamp(header_len, data.len()),
        };

        Some(Layer::Ipv4 {
            source: packet.get_source(),
            destination: packet.get_destination(),
            protocol: packet.get_next_level_protocol(),
            payload: (packet.get_fragment_offset() == 0).then(|| &data[header_len..end]),
        })
    }

    fn ipv6(data: &'a [u8]) -> Option<Self> {
        let packet = Ipv6Packet::new(data)?;
        if packet.get_version() != 6 {
            return None;
        }

        // Zero means a jumbogram; take whatever was captured
        let end = match packet.get_payload_length() as usize {
            0 => data.len(),
            length => (IPV6_HEADER + length).min(data.len()),
        };
        let (protocol, payload) = skip_extension_headers(packet.get_next_header(), &data[IPV6_HEADER..end]);

        Some(Layer::Ipv6 {
            source: packet.get_source(),
            destination: packet.get_destination(),
            protocol,
            payload,
        })
    }

    fn from_ethertype(ethertype: EtherType, payload: &'a [u8]) -> Option<Self> {
        match ethertype {
            EtherTypes::Ipv4 => Self::ipv4(payload),
            EtherTypes::Ipv6 => Self::ipv6(payload),
            EtherTypes::Arp => ArpPacket::new(payload).map(|_| Layer::Arp),
            EtherTypes::Lldp => Some(Layer::Lldp),
            EtherTypes::WakeOnLan => Some(Layer::WakeOnLan),
            EtherTypes::PppoeSession => Self::pppoe(payload, true),
            EtherTypes::PppoeDiscovery => Self::pppoe(payload, false),
            EtherTypes::Vlan | EtherTypes::QinQ | EtherTypes::PBridge => Self::vlan(payload),
            _ => None,
        }
    }

    fn from_ip_protocol(protocol: IpNextHeaderProtocol, payload: &'a [u8]) -> Option<Self> {
        match protocol {
            IpNextHeaderProtocols::Tcp => TcpPacket::new(payload).map(|tcp| Layer::Tcp {
                source: tcp.get_source(),
                destination: tcp.get_destination(),
            }),
            IpNextHeaderProtocols::Udp => UdpPacket::new(payload).map(|udp| Layer::Udp {
                source: udp.get_source(),
                destination: udp.get_destination(),
            }),
            IpNextHeaderProtocols::Icmp => IcmpPacket::new(payload).map(|icmp| Layer::Icmpv4 {
                icmp_type: icmp.get_icmp_type().0,
                code: icmp.get_icmp_code().0,
            }),
            IpNextHeaderProtocols::Icmpv6 => Icmpv6Packet::new(payload).map(|icmp| Layer::Icmpv6 {
                icmp_type: icmp.get_icmpv6_type(),
                code: icmp.get_icmpv6_code().0,
            }),
            IpNextHeaderProtocols::Igmp if payload.len() >= IGMP_MIN_LENGTH => Some(Layer::Igmp),
            IpNextHeaderProtocols::OspfigP => Some(Layer::Ospf),
            IpNextHeaderProtocols::Ipv4 => Self::ipv4(payload),
            IpNextHeaderProtocols::Ipv6 => Self::ipv6(payload),
            IpNextHeaderProtocols::Gre => GrePacket::new(payload).map(|_| Layer::Gre),
            _ => None,
        }
    }

    /// The layer this one encapsulates, if it is recognized and intact
    pub fn inner(&self) -> Option<Layer<'a>> {
        match *self {
            Layer::Ethernet { ethertype, payload, .. }
            | Layer::LinuxSll { ethertype, payload, .. }
            | Layer::Vlan { ethertype, payload } => Self::from_ethertype(ethertype, payload),
            Layer::Null { family, payload } => match family {
                AF_INET => Self::ipv4(payload),
                f if AF_INET6.contains(&f) => Self::ipv6(payload),
                _ => None,
            },
            Layer::Ppp { protocol, payload } => match protocol {
                PPP_IPV4 => Self::ipv4(payload),
                PPP_IPV6 => Self::ipv6(payload),
                _ => None,
            },
            Layer::RawIp { version, payload } => match version {
                4 => Self::ipv4(payload),
                6 => Self::ipv6(payload),
                _ => None,
            },
            Layer::Ipv4 { protocol, payload, .. } | Layer::Ipv6 { protocol, payload, .. } => {
                payload.and_then(|payload| Self::from_ip_protocol(protocol, payload))
            }
            Layer::Pppoe { payload } => payload.and_then(Self::ppp),
            Layer::Wireless
            | Layer::Arp
            | Layer::Lldp
            | Layer::WakeOnLan
            | Layer::Ospf
            | Layer::Gre
            | Layer::Tcp { .. }
            | Layer::Udp { .. }
            | Layer::Icmpv4 { .. }
            | Layer::Icmpv6 { .. }
            | Layer::Igmp => None,
        }
    }

    /// Classification contributed by this layer when it is the innermost one
    pub fn classify(&self) -> Classification {
        match *self {
            Layer::Tcp { source, destination } => {
                Classification::with_ports(ProtocolCategory::TCP, source, destination)
            }
            Layer::Udp { source, destination } => {
                Classification::with_ports(ProtocolCategory::UDP, source, destination)
            }
            Layer::Icmpv4 { .. } => Classification::of(ProtocolCategory::ICMPV4),
            Layer::Icmpv6 { icmp_type, .. } => Classification::of(icmpv6_categories(icmp_type)),
            Layer::Igmp => Classification::of(ProtocolCategory::IGMP),
            _ => Classification::unclassified(),
        }
    }

    /// Append the report lines for this header
    pub fn describe(&self, lines: &mut Vec<String>) {
        match self {
            Layer::Ethernet {
                source,
                destination,
                ethertype,
                ..
            } => {
                push_line(lines, "src MAC", source);
                push_line(lines, "dst MAC", destination);
                push_line(lines, "L3", ethertype_name(*ethertype));
            }
            Layer::LinuxSll {
                ethertype, source, ..
            } => {
                if let Some(source) = source {
                    push_line(lines, "L3", ethertype_name(*ethertype));
                    push_line(lines, "src MAC", source);
                }
            }
            Layer::Null { family, .. } => push_line(lines, "L3", family_name(*family)),
            Layer::Ppp { protocol, .. } => push_line(lines, "L3", ppp_protocol_name(*protocol)),
            Layer::RawIp { version, .. } => push_line(lines, "L3", ip_version_name(*version)),
            Layer::Vlan { ethertype, .. } => push_line(lines, "L2", ethertype_name(*ethertype)),
            Layer::Ipv4 {
                source,
                destination,
                protocol,
                ..
            } => {
                push_line(lines, "src IP", source);
                push_line(lines, "dst IP", destination);
                push_line(lines, "L4", ip_protocol_name(*protocol));
            }
            Layer::Ipv6 {
                source,
                destination,
                protocol,
                ..
            } => {
                push_line(lines, "src IP", source);
                push_line(lines, "dst IP", destination);
                push_line(lines, "L4", ip_protocol_name(*protocol));
            }
            Layer::Tcp {
                source,
                destination,
            }
            | Layer::Udp {
                source,
                destination,
            } => {
                push_line(lines, "src port", source);
                push_line(lines, "dst port", destination);
            }
            Layer::Icmpv4 { icmp_type, code } => {
                push_line(lines, "type", type_label(*icmp_type, icmpv4_type_name(*icmp_type)));
                push_line(lines, "code", code);
            }
            Layer::Icmpv6 { icmp_type, code } => {
                push_line(lines, "type", type_label(icmp_type.0, icmpv6_type_name(*icmp_type)));
                push_line(lines, "code", code);
            }
            Layer::Wireless
            | Layer::Arp
            | Layer::Lldp
            | Layer::WakeOnLan
            | Layer::Pppoe { .. }
            | Layer::Ospf
            | Layer::Gre
            | Layer::Igmp => {}
        }
    }
}

/// ICMPv6 is refined with MLD or NDP depending on the message type
pub fn icmpv6_categories(icmp_type: Icmpv6Type) -> ProtocolCategory {
    let refinement = match icmp_type {
        MLD_QUERY | MLD_REPORT | MLD_DONE | MLD_V2_REPORT => ProtocolCategory::MLD,
        Icmpv6Types::RouterSolicit
        | Icmpv6Types::RouterAdvert
        | Icmpv6Types::NeighborSolicit
        | Icmpv6Types::NeighborAdvert
        | Icmpv6Types::Redirect => ProtocolCategory::NDP,
        _ => ProtocolCategory::empty(),
    };
    ProtocolCategory::ICMPV6 | refinement
}

/// Walk hop-by-hop, routing and destination option headers to the upper-layer protocol.
///
/// Returns no payload when the headers are truncated or this is not the first fragment.
fn skip_extension_headers(
    mut next: IpNextHeaderProtocol,
    mut data: &[u8],
) -> (IpNextHeaderProtocol, Option<&[u8]>) {
    loop {
        let length = match next {
            IpNextHeaderProtocols::Hopopt
            | IpNextHeaderProtocols::Ipv6Route
            | IpNextHeaderProtocols::Ipv6Opts => match data.get(1) {
                Some(&units) => (units as usize + 1) * 8,
                None => return (next, None),
            },
            IpNextHeaderProtocols::Ipv6Frag => {
                if data.len() < 8 || u16::from_be_bytes([data[2], data[3]]) >> 3 != 0 {
                    return (next, None);
                }
                8
            }
            _ => return (next, Some(data)),
        };

        if length > data.len() {
            return (next, None);
        }
        next = IpNextHeaderProtocol(data[0]);
        data = &data[length..];
    }
}

fn push_line(lines: &mut Vec<String>, label: &str, value: impl Display) {
    lines.push(format!("{:>12}: {}", label, value));
}

fn type_label(value: u8, name: Option<&str>) -> String {
    match name {
        Some(name) => format!("{} ({})", value, name),
        None => value.to_string(),
    }
}

fn ethertype_name(ethertype: EtherType) -> String {
    let name = match ethertype {
        EtherTypes::Ipv4 => "IPv4",
        EtherTypes::Ipv6 => "IPv6",
        EtherTypes::Arp => "ARP",
        EtherTypes::Rarp => "RARP",
        EtherTypes::Lldp => "LLDP",
        EtherTypes::WakeOnLan => "WakeOnLan",
        EtherTypes::PppoeSession => "PPPoE session",
        EtherTypes::PppoeDiscovery => "PPPoE discovery",
        EtherTypes::Vlan => "802.1Q",
        EtherTypes::QinQ | EtherTypes::PBridge => "802.1ad",
        EtherTypes::Mpls => "MPLS",
        _ => return format!("0x{:04x}", ethertype.0),
    };
    name.to_string()
}

fn ip_protocol_name(protocol: IpNextHeaderProtocol) -> String {
    let name = match protocol {
        IpNextHeaderProtocols::Tcp => "TCP",
        IpNextHeaderProtocols::Udp => "UDP",
        IpNextHeaderProtocols::Icmp => "ICMP",
        IpNextHeaderProtocols::Icmpv6 => "ICMPv6",
        IpNextHeaderProtocols::Igmp => "IGMP",
        IpNextHeaderProtocols::OspfigP => "OSPF",
        IpNextHeaderProtocols::Ipv4 => "IPv4",
        IpNextHeaderProtocols::Ipv6 => "IPv6",
        IpNextHeaderProtocols::Gre => "GRE",
        IpNextHeaderProtocols::Ipv6Frag => "IPv6 fragment",
        _ => return protocol.0.to_string(),
    };
    name.to_string()
}

fn family_name(family: u32) -> String {
    match family {
        AF_INET => "IPv4".to_string(),
        f if AF_INET6.contains(&f) => "IPv6".to_string(),
        f => format!("AF {}", f),
    }
}

fn ppp_protocol_name(protocol: u16) -> String {
    match protocol {
        PPP_IPV4 => "IPv4".to_string(),
        PPP_IPV6 => "IPv6".to_string(),
        0xc021 => "LCP".to_string(),
        0x8021 => "IPCP".to_string(),
        p => format!("0x{:04x}", p),
    }
}

fn ip_version_name(version: u8) -> String {
    match version {
        4 => "IPv4".to_string(),
        6 => "IPv6".to_string(),
        v => format!("IP version {}", v),
    }
}

fn icmpv4_type_name(icmp_type: u8) -> Option<&'static str> {
    Some(match icmp_type {
        0 => "echo reply",
        3 => "destination unreachable",
        4 => "source quench",
        5 => "redirect",
        8 => "echo request",
        9 => "router advertisement",
        10 => "router solicitation",
        11 => "time exceeded",
        12 => "parameter problem",
        13 => "timestamp",
        14 => "timestamp reply",
        _ => return None,
    })
}

fn icmpv6_type_name(icmp_type: Icmpv6Type) -> Option<&'static str> {
    Some(match icmp_type.0 {
        1 => "destination unreachable",
        2 => "packet too big",
        3 => "time exceeded",
        4 => "parameter problem",
        128 => "echo request",
        129 => "echo reply",
        130 => "multicast listener query",
        131 => "multicast listener report",
        132 => "multicast listener done",
        133 => "router solicitation",
        134 => "router advertisement",
        135 => "neighbor solicitation",
        136 => "neighbor advertisement",
        137 => "redirect",
        143 => "multicast listener report v2",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn icmpv6_refinements() {
        assert_eq!(
            icmpv6_categories(Icmpv6Types::NeighborAdvert),
            ProtocolCategory::ICMPV6 | ProtocolCategory::NDP
        );
        assert_eq!(
            icmpv6_categories(MLD_REPORT),
            ProtocolCategory::ICMPV6 | ProtocolCategory::MLD
        );
        assert_eq!(
            icmpv6_categories(MLD_V2_REPORT),
            ProtocolCategory::ICMPV6 | ProtocolCategory::MLD
        );
        assert_eq!(
            icmpv6_categories(Icmpv6Types::Redirect),
            ProtocolCategory::ICMPV6 | ProtocolCategory::NDP
        );
        assert_eq!(icmpv6_categories(Icmpv6Types::EchoRequest), ProtocolCategory::ICMPV6);
        assert_eq!(icmpv6_categories(Icmpv6Type(200)), ProtocolCategory::ICMPV6);
    }

    #[test]
    fn only_transport_layers_classify() {
        let outer = [
            Layer::Arp,
            Layer::Lldp,
            Layer::Gre,
            Layer::Ospf,
            Layer::Wireless,
            Layer::Pppoe { payload: None },
        ];
        for layer in outer {
            assert_eq!(layer.classify(), Classification::unclassified());
        }

        let tcp = Layer::Tcp {
            source: 443,
            destination: 55000,
        };
        assert_eq!(
            tcp.classify(),
            Classification::with_ports(ProtocolCategory::TCP, 443, 55000)
        );
        assert_eq!(
            Layer::Igmp.classify(),
            Classification::of(ProtocolCategory::IGMP)
        );
    }

    #[test]
    fn lines_use_right_aligned_labels() {
        let mut lines = Vec::new();
        Layer::Udp {
            source: 53,
            destination: 40000,
        }
        .describe(&mut lines);

        assert_eq!(lines, vec!["    src port: 53", "    dst port: 40000"]);
    }

    #[test]
    fn null_family_in_either_byte_order() {
        let little = [2, 0, 0, 0, 0x45];
        let big = [0, 0, 0, 30, 0x60];

        assert!(matches!(
            Layer::link(LinkType::Null, &little),
            Some(Layer::Null { family: AF_INET, .. })
        ));
        assert!(matches!(
            Layer::link(LinkType::Null, &big),
            Some(Layer::Null { family: 30, .. })
        ));
        assert!(matches!(
            Layer::link(LinkType::Loop, &[0, 0, 0, 2]),
            Some(Layer::Null { family: AF_INET, .. })
        ));
    }

    #[test]
    fn short_cooked_header_is_rejected() {
        for len in 0..SLL_HEADER {
            assert_eq!(Layer::link(LinkType::LinuxSll, &vec![0u8; len]), None, "len {}", len);
        }
        assert!(matches!(
            Layer::link(LinkType::LinuxSll, &[0u8; SLL_HEADER]),
            Some(Layer::LinuxSll { payload: [], .. })
        ));
    }

    #[test]
    fn ppp_with_and_without_hdlc_prefix() {
        let framed = [0xff, 0x03, 0x00, 0x21, 0x45];
        let bare = [0x00, 0x57, 0x60];

        assert!(matches!(
            Layer::link(LinkType::Ppp, &framed),
            Some(Layer::Ppp { protocol: PPP_IPV4, payload: [0x45] })
        ));
        assert!(matches!(
            Layer::link(LinkType::Ppp, &bare),
            Some(Layer::Ppp { protocol: PPP_IPV6, payload: [0x60] })
        ));
        assert_eq!(Layer::link(LinkType::Ppp, &[0xff, 0x03, 0x00]), None);
    }

    #[test]
    fn extension_headers_are_skipped() {
        // hop-by-hop (8 bytes) then ICMPv6
        let mut data = vec![58, 0, 5, 2, 0, 0, 1, 0];
        data.extend_from_slice(&[143, 0, 0, 0]);

        let (protocol, payload) = skip_extension_headers(IpNextHeaderProtocols::Hopopt, &data);
        assert_eq!(protocol, IpNextHeaderProtocols::Icmpv6);
        assert_eq!(payload, Some(&[143u8, 0, 0, 0][..]));
    }

    #[test]
    fn later_fragments_stop_descent() {
        // fragment header with offset 1
        let data = [17, 0, 0, 8, 0, 0, 0, 1, 0, 0];
        let (_, payload) = skip_extension_headers(IpNextHeaderProtocols::Ipv6Frag, &data);
        assert_eq!(payload, None);

        let truncated = [58, 4, 0];
        let (_, payload) = skip_extension_headers(IpNextHeaderProtocols::Ipv6Opts, &truncated);
        assert_eq!(payload, None);
    }

    #[test]
    fn wireless_framing_is_opaque() {
        let layer = Layer::link(LinkType::Ieee80211Radiotap, &[0, 0, 8, 0]);
        assert_eq!(layer, Some(Layer::Wireless));
        assert_eq!(layer.and_then(|l| l.inner()), None);
        assert_eq!(Layer::link(LinkType::Unsupported(147), &[1, 2, 3]), None);
    }
}
