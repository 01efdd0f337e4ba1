use bitflags::bitflags;
use std::fmt;
use thiserror::Error;

bitflags! {
    /// Protocol categories a frame can be classified as, or a filter can ask for.
    ///
    /// The empty set means "unclassified" on the frame side and "no
    /// restriction" on the filter side.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ProtocolCategory: u8 {
        const TCP = 0x01;
        const UDP = 0x02;
        const ICMPV4 = 0x04;
        const ICMPV6 = 0x08;
        const ARP = 0x10;
        /// Neighbor discovery, only ever seen together with `ICMPV6`
        const NDP = 0x20;
        const IGMP = 0x40;
        /// Multicast listener discovery, only ever seen together with `ICMPV6`
        const MLD = 0x80;
    }
}

impl ProtocolCategory {
    /// Categories whose frames carry transport ports
    pub const PORTED: Self = Self::TCP.union(Self::UDP);
}

impl fmt::Display for ProtocolCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("any");
        }
        let names: Vec<String> = self
            .iter_names()
            .map(|(name, _)| name.to_lowercase())
            .collect();
        f.write_str(&names.join(","))
    }
}

/// Result of dissecting one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Classification {
    /// Categories of the innermost recognized transport/control layer
    pub categories: ProtocolCategory,

    /// Source port (TCP/UDP only)
    pub src_port: Option<u16>,

    /// Destination port (TCP/UDP only)
    pub dst_port: Option<u16>,
}

impl Classification {
    /// A frame that reached no transport/control layer
    pub fn unclassified() -> Self {
        Self::default()
    }

    /// A classification without ports
    pub fn of(categories: ProtocolCategory) -> Self {
        Self {
            categories,
            src_port: None,
            dst_port: None,
        }
    }

    /// A TCP or UDP classification with both ports set
    pub fn with_ports(categories: ProtocolCategory, src_port: u16, dst_port: u16) -> Self {
        Self {
            categories,
            src_port: Some(src_port),
            dst_port: Some(dst_port),
        }
    }
}

/// Filter configuration errors, raised before a capture starts
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    /// A source or destination port can only match TCP or UDP traffic
    #[error("Filtering port has no effect without --tcp or --udp")]
    PortWithoutTransport,
}

/// User filter deciding which frames are reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FilterExpression {
    categories: ProtocolCategory,
    any_port: Option<u16>,
    src_port: Option<u16>,
    dst_port: Option<u16>,
}

impl FilterExpression {
    /// Build a filter, rejecting source/destination ports that could never match
    pub fn new(
        categories: ProtocolCategory,
        any_port: Option<u16>,
        src_port: Option<u16>,
        dst_port: Option<u16>,
    ) -> Result<Self, FilterError> {
        if (src_port.is_some() || dst_port.is_some())
            && !categories.intersects(ProtocolCategory::PORTED)
        {
            return Err(FilterError::PortWithoutTransport);
        }

        Ok(Self {
            any_port,
            src_port,
            dst_port,
            ..Self::categories(categories)
        })
    }

    /// Filter that shows every frame
    #[cfg(test)]
    pub fn everything() -> Self {
        Self::default()
    }

    /// Filter on categories only
    pub fn categories(categories: ProtocolCategory) -> Self {
        Self {
            categories,
            ..Self::default()
        }
    }

    fn has_port_constraint(&self) -> bool {
        self.any_port.is_some() || self.src_port.is_some() || self.dst_port.is_some()
    }

    /// Decide whether a classified frame should be reported.
    ///
    /// Port constraints only refine TCP/UDP matches: once any other category
    /// matches, the frame is shown regardless of ports.
    pub fn matches(&self, frame: &Classification) -> bool {
        if self.categories.is_empty() {
            return true;
        }

        let matched = self.categories & frame.categories;
        if matched.is_empty() {
            return false;
        }

        if !matched.difference(ProtocolCategory::PORTED).is_empty() {
            return true;
        }

        if let Some(port) = self.any_port {
            if frame.src_port == Some(port) || frame.dst_port == Some(port) {
                return true;
            }
        }

        if self.src_port.is_some() && self.src_port == frame.src_port {
            return true;
        }

        if self.dst_port.is_some() && self.dst_port == frame.dst_port {
            return true;
        }

        !self.has_port_constraint()
    }
}

impl fmt::Display for FilterExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.categories)?;
        if let Some(port) = self.any_port {
            write!(f, " port {}", port)?;
        }
        if let Some(port) = self.src_port {
            write!(f, " src port {}", port)?;
        }
        if let Some(port) = self.dst_port {
            write!(f, " dst port {}", port)?;
        }
        Ok(())
    }
}
