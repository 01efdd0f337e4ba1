use chrono::{DateTime, Local, Utc};
use log::{debug, info, warn};
use pcap::{Active, Capture, Device, Inactive};

use crate::models::config::SessionConfig;
use crate::models::packet::{Frame, LinkType};
use crate::utils::error::DeviceError;

/// Outcome of one read from a capture device
#[derive(Debug)]
pub enum Poll {
    /// A frame arrived
    Frame(Frame),
    /// Nothing arrived within the read timeout
    Timeout,
    /// The device will not deliver any more frames
    Closed,
}

/// A live source of frames.
///
/// Opening happens in the implementor's constructor and closing when it is
/// dropped; `start` and `stop` bracket frame delivery.
pub trait CaptureDevice: Send {
    /// Begin delivering frames
    fn start(&mut self) -> Result<(), DeviceError>;

    /// Wait up to the read timeout for the next frame
    fn next_frame(&mut self) -> Result<Poll, DeviceError>;

    /// Stop delivering frames and release the handle
    fn stop(&mut self);
}

/// Names of all devices libpcap can capture on
pub fn list_devices() -> Result<Vec<String>, DeviceError> {
    let devices = Device::list().map_err(DeviceError::List)?;
    Ok(devices.into_iter().map(|device| device.name).collect())
}

/// Live capture through libpcap
pub struct PcapDevice {
    interface: String,
    inactive: Option<Capture<Inactive>>,
    active: Option<Capture<Active>>,
    link_type: LinkType,
}

impl PcapDevice {
    /// Resolve the configured interface and prepare a capture handle on it
    pub fn open(config: &SessionConfig) -> Result<Self, DeviceError> {
        let device = Device::list()
            .map_err(DeviceError::List)?
            .into_iter()
            .find(|device| device.name == config.interface)
            .ok_or_else(|| DeviceError::InterfaceNotFound(config.interface.clone()))?;

        info!("Creating capture from device: {}", device.name);
        let open_error = |source: pcap::Error| DeviceError::Open {
            interface: config.interface.clone(),
            source,
        };

        let capture = Capture::from_device(device)
            .map_err(open_error)?
            .promisc(config.promiscuous)
            .snaplen(config.snaplen)
            .timeout(config.read_timeout_ms)
            .immediate_mode(true);
        debug!(
            "Capture configured: promiscuous {}, snaplen {}, timeout {}ms",
            config.promiscuous, config.snaplen, config.read_timeout_ms
        );

        Ok(Self {
            interface: config.interface.clone(),
            inactive: Some(capture),
            active: None,
            link_type: LinkType::Unsupported(-1),
        })
    }
}

impl CaptureDevice for PcapDevice {
    fn start(&mut self) -> Result<(), DeviceError> {
        let inactive = self.inactive.take().ok_or(DeviceError::NotStarted)?;
        let active = inactive.open().map_err(|source| DeviceError::Open {
            interface: self.interface.clone(),
            source,
        })?;

        let datalink = active.get_datalink();
        self.link_type = LinkType::from_dlt(datalink.0);
        info!(
            "Capture started on {} (link type {})",
            self.interface,
            datalink.get_name().unwrap_or_else(|_| datalink.0.to_string())
        );
        if let LinkType::Unsupported(dlt) = self.link_type {
            warn!("Link type {} is not dissected; frames will be unclassified", dlt);
        }

        self.active = Some(active);
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Poll, DeviceError> {
        let capture = self.active.as_mut().ok_or(DeviceError::NotStarted)?;

        match capture.next_packet() {
            Ok(packet) => {
                if packet.header.caplen as usize != packet.data.len() {
                    warn!(
                        "Packet length mismatch: header says {} but data is {} bytes",
                        packet.header.caplen,
                        packet.data.len()
                    );
                }

                let ts = packet.header.ts;
                let nanos = (ts.tv_usec as u32).saturating_mul(1000);
                let timestamp = DateTime::<Utc>::from_timestamp(ts.tv_sec as i64, nanos)
                    .map(|utc| utc.with_timezone(&Local))
                    .unwrap_or_else(Local::now);

                Ok(Poll::Frame(Frame {
                    link_type: self.link_type,
                    timestamp,
                    wire_length: packet.header.len as usize,
                    data: packet.data.to_vec(),
                }))
            }
            Err(pcap::Error::TimeoutExpired) => Ok(Poll::Timeout),
            Err(pcap::Error::NoMorePackets) => Ok(Poll::Closed),
            Err(e) => Err(DeviceError::Read(e)),
        }
    }

    fn stop(&mut self) {
        if let Some(mut capture) = self.active.take() {
            match capture.stats() {
                Ok(stats) => info!(
                    "Device statistics: {} received, {} dropped, {} dropped by interface",
                    stats.received, stats.dropped, stats.if_dropped
                ),
                Err(e) => debug!("Device statistics unavailable: {}", e),
            }
        }
        self.inactive = None;
        info!("Capture device on {} closed", self.interface);
    }
}
