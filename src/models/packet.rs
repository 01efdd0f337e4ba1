use chrono::{DateTime, Local};

/// Link-layer framing reported by the capture device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkType {
    /// DLT_EN10MB
    Ethernet,
    /// Linux "cooked" capture (DLT_LINUX_SLL)
    LinuxSll,
    /// BSD loopback, address family in host byte order (DLT_NULL)
    Null,
    /// OpenBSD loopback, address family in network byte order (DLT_LOOP)
    Loop,
    /// PPP, optionally with HDLC address/control bytes
    Ppp,
    /// No link-layer header, IP starts at offset 0
    RawIp,
    /// 802.11 MAC frames
    Ieee80211,
    /// 802.11 with a radiotap header
    Ieee80211Radiotap,
    /// Per-packet information header
    Ppi,
    /// Anything else, carried as the raw DLT number
    Unsupported(i32),
}

impl LinkType {
    /// Map a libpcap DLT/LINKTYPE number
    pub fn from_dlt(dlt: i32) -> Self {
        match dlt {
            0 => LinkType::Null,
            1 => LinkType::Ethernet,
            9 | 50 => LinkType::Ppp,
            // DLT_RAW moved around between platforms before LINKTYPE_RAW settled on 101
            12 | 14 | 101 | 228 | 229 => LinkType::RawIp,
            105 => LinkType::Ieee80211,
            108 => LinkType::Loop,
            113 => LinkType::LinuxSll,
            127 => LinkType::Ieee80211Radiotap,
            192 => LinkType::Ppi,
            other => LinkType::Unsupported(other),
        }
    }
}

/// One captured frame as delivered by the capture device
#[derive(Debug, Clone)]
pub struct Frame {
    /// Framing of `data`
    pub link_type: LinkType,

    /// Capture timestamp
    pub timestamp: DateTime<Local>,

    /// Length of the frame on the wire (may exceed `data.len()` when truncated by snaplen)
    pub wire_length: usize,

    /// The captured bytes
    pub data: Vec<u8>,
}

impl Frame {
    /// Frame stamped with the current time, as captured in full
    #[cfg(test)]
    pub fn now(link_type: LinkType, data: Vec<u8>) -> Self {
        Self {
            link_type,
            timestamp: Local::now(),
            wire_length: data.len(),
            data,
        }
    }
}
