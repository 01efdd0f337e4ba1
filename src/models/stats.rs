use chrono::{DateTime, Utc};

/// Statistics for one capture session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureStats {
    /// Frames delivered by the device
    pub frames_seen: u64,

    /// Frames that passed the filter and went to the report sink
    pub frames_reported: u64,

    /// Frames rejected by the filter
    pub frames_hidden: u64,

    /// Frames that arrived after the budget was already spent
    pub frames_dropped: u64,

    /// Capture start time
    pub start_time: Option<DateTime<Utc>>,

    /// Capture end time
    pub end_time: Option<DateTime<Utc>>,
}

impl CaptureStats {
    /// Wall time between start and end, if both are known
    pub fn elapsed_ms(&self) -> Option<i64> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Some(end.signed_duration_since(start).num_milliseconds()),
            _ => None,
        }
    }
}
