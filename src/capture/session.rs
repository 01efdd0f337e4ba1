use chrono::Utc;
use log::{debug, error, info, trace};
use std::future::Future;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

use crate::capture::device::{CaptureDevice, Poll};
use crate::capture::parser;
use crate::models::config::SessionConfig;
use crate::models::filter::FilterExpression;
use crate::models::packet::Frame;
use crate::models::stats::CaptureStats;
use crate::report::ReportSink;
use crate::utils::error::{AppError, AppResult};

/// Frame budget and cancellation flag shared by the delivery path and the control loop.
///
/// Only the delivery path increments `count`; the control loop only reads it.
#[derive(Debug)]
pub struct CaptureBudget {
    count: AtomicU64,
    max_count: u64,
    cancelled: AtomicBool,
}

impl CaptureBudget {
    pub fn new(max_count: u64) -> Self {
        Self {
            count: AtomicU64::new(0),
            max_count,
            cancelled: AtomicBool::new(false),
        }
    }

    /// Frames reported so far
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::SeqCst)
    }

    pub fn max_count(&self) -> u64 {
        self.max_count
    }

    /// Whether no more frames may be reported
    pub fn is_spent(&self) -> bool {
        self.count() >= self.max_count
    }

    fn record_report(&self) -> u64 {
        self.count.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Request the session to end; later calls have no effect
    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::SeqCst) {
            info!("Cancellation requested");
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Lifecycle of a capture session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Capturing,
    Draining,
    Closed,
}

impl SessionState {
    fn advance(&mut self, next: SessionState) {
        debug!("Capture session {:?} -> {:?}", self, next);
        *self = next;
    }
}

/// Why a session left the capturing state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// `max_count` frames were reported
    BudgetReached,
    /// The user interrupted the capture
    Cancelled,
    /// The device stopped delivering frames on its own
    DeviceClosed,
}

/// What happened to one delivered frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Arrived after the budget was spent; not dissected
    Dropped,
    /// Rejected by the filter
    Hidden,
    /// Passed the filter and went to the report sink
    Reported,
}

/// Outcome of a finished session
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub reason: StopReason,
    pub stats: CaptureStats,
}

/// The per-frame path: budget check, classification, filter, report
pub struct Deliverer<S: ReportSink> {
    sink: S,
    filter: FilterExpression,
    budget: Arc<CaptureBudget>,
    stats: CaptureStats,
}

impl<S: ReportSink> Deliverer<S> {
    pub fn new(sink: S, filter: FilterExpression, budget: Arc<CaptureBudget>) -> Self {
        Self {
            sink,
            filter,
            budget,
            stats: CaptureStats::default(),
        }
    }

    pub fn deliver(&mut self, frame: &Frame) -> io::Result<Delivery> {
        self.stats.frames_seen += 1;

        if self.budget.is_spent() {
            self.stats.frames_dropped += 1;
            trace!("Dropping frame of {} bytes, budget spent", frame.data.len());
            return Ok(Delivery::Dropped);
        }

        let classification = parser::classify(frame.link_type, &frame.data);
        if !self.filter.matches(&classification) {
            self.stats.frames_hidden += 1;
            trace!("Hiding frame classified as {:?}", classification);
            return Ok(Delivery::Hidden);
        }

        let dissection = parser::dissect(frame.link_type, &frame.data);
        self.sink.report(frame, &dissection.lines)?;
        let count = self.budget.record_report();
        self.stats.frames_reported += 1;
        debug!(
            "Reported frame {}/{} ({:?})",
            count,
            self.budget.max_count(),
            classification
        );

        Ok(Delivery::Reported)
    }

    pub fn into_parts(self) -> (S, CaptureStats) {
        (self.sink, self.stats)
    }
}

/// A bounded, cancellable live capture
pub struct CaptureSession<D, S>
where
    D: CaptureDevice + 'static,
    S: ReportSink + 'static,
{
    device: D,
    sink: S,
    filter: FilterExpression,
    budget: Arc<CaptureBudget>,
    poll_interval: Duration,
}

impl<D, S> CaptureSession<D, S>
where
    D: CaptureDevice + 'static,
    S: ReportSink + 'static,
{
    pub fn new(device: D, sink: S, filter: FilterExpression, config: &SessionConfig) -> Self {
        Self {
            device,
            sink,
            filter,
            budget: Arc::new(CaptureBudget::new(config.max_count)),
            poll_interval: config.poll_interval,
        }
    }

    #[cfg(test)]
    pub fn budget(&self) -> Arc<CaptureBudget> {
        self.budget.clone()
    }

    /// Capture until the budget is spent, `cancel` completes or the device closes.
    ///
    /// The device is stopped exactly once on every path out of this function.
    pub async fn run<F>(mut self, cancel: F) -> AppResult<SessionSummary>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut state = SessionState::Idle;
        if let Err(e) = self.device.start() {
            error!("Failed to start capture: {}", e);
            self.device.stop();
            state.advance(SessionState::Closed);
            return Err(e.into());
        }
        let start_time = Utc::now();
        state.advance(SessionState::Capturing);

        let cancel_budget = self.budget.clone();
        let cancel_task = tokio::spawn(async move {
            cancel.await;
            cancel_budget.cancel();
        });

        let stop = Arc::new(AtomicBool::new(false));
        let Self {
            device,
            sink,
            filter,
            budget,
            poll_interval,
            ..
        } = self;
        let deliverer = Deliverer::new(sink, filter, budget.clone());
        let delivery_stop = stop.clone();
        let delivery =
            tokio::task::spawn_blocking(move || run_delivery(device, deliverer, delivery_stop));

        let mut ticker = tokio::time::interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let reason = loop {
            ticker.tick().await;
            if budget.is_spent() {
                break StopReason::BudgetReached;
            }
            if budget.is_cancelled() {
                break StopReason::Cancelled;
            }
            if delivery.is_finished() {
                break StopReason::DeviceClosed;
            }
        };
        debug!("Stopping capture: {:?}", reason);
        state.advance(SessionState::Draining);

        stop.store(true, Ordering::SeqCst);
        cancel_task.abort();
        let (result, mut stats) = delivery
            .await
            .map_err(|e| AppError::Capture(format!("delivery task failed: {}", e)))?;
        state.advance(SessionState::Closed);

        stats.start_time = Some(start_time);
        stats.end_time = Some(Utc::now());
        result?;

        info!(
            "Capture finished ({:?}): {} reported, {} hidden, {} dropped of {} frames",
            reason, stats.frames_reported, stats.frames_hidden, stats.frames_dropped, stats.frames_seen
        );
        Ok(SessionSummary { reason, stats })
    }
}

/// Delivery path: reads frames until told to stop, the device closes or an error occurs,
/// then stops the device.
fn run_delivery<D, S>(
    mut device: D,
    mut deliverer: Deliverer<S>,
    stop: Arc<AtomicBool>,
) -> (AppResult<()>, CaptureStats)
where
    D: CaptureDevice,
    S: ReportSink,
{
    let result = loop {
        if stop.load(Ordering::SeqCst) {
            break Ok(());
        }

        match device.next_frame() {
            Ok(Poll::Frame(frame)) => {
                if let Err(e) = deliverer.deliver(&frame) {
                    error!("Failed to write report: {}", e);
                    break Err(AppError::from(e));
                }
            }
            Ok(Poll::Timeout) => {}
            Ok(Poll::Closed) => {
                info!("Capture device has no more frames");
                break Ok(());
            }
            Err(e) => {
                error!("{}", e);
                break Err(AppError::from(e));
            }
        }
    };

    device.stop();
    let (_, stats) = deliverer.into_parts();
    (result, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::parser::tests::{ethernet, ipv4, neighbor_solicitation_frame, tcp_frame, udp};
    use crate::models::filter::ProtocolCategory;
    use crate::models::packet::LinkType;
    use crate::utils::error::DeviceError;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;

    /// Device replaying a fixed script, then idling or closing
    struct ScriptedDevice {
        script: VecDeque<Result<Poll, DeviceError>>,
        close_when_done: bool,
        fail_start: bool,
        stops: Arc<AtomicUsize>,
    }

    impl ScriptedDevice {
        fn new(frames: Vec<Vec<u8>>) -> Self {
            Self {
                script: frames
                    .into_iter()
                    .map(|data| Ok(Poll::Frame(Frame::now(LinkType::Ethernet, data))))
                    .collect(),
                close_when_done: false,
                fail_start: false,
                stops: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl CaptureDevice for ScriptedDevice {
        fn start(&mut self) -> Result<(), DeviceError> {
            if self.fail_start {
                return Err(DeviceError::InterfaceNotFound("test0".to_string()));
            }
            Ok(())
        }

        fn next_frame(&mut self) -> Result<Poll, DeviceError> {
            match self.script.pop_front() {
                Some(next) => next,
                None if self.close_when_done => Ok(Poll::Closed),
                None => {
                    std::thread::sleep(Duration::from_millis(1));
                    Ok(Poll::Timeout)
                }
            }
        }

        fn stop(&mut self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Clone, Default)]
    struct CollectingSink {
        reports: Arc<Mutex<Vec<(Frame, Vec<String>)>>>,
    }

    impl ReportSink for CollectingSink {
        fn report(&mut self, frame: &Frame, lines: &[String]) -> io::Result<()> {
            self.reports.lock().push((frame.clone(), lines.to_vec()));
            Ok(())
        }
    }

    fn config(max_count: u64) -> SessionConfig {
        let mut config = SessionConfig::new("test0");
        config.max_count = max_count;
        config.poll_interval = Duration::from_millis(1);
        config
    }

    fn never() -> impl Future<Output = ()> + Send + 'static {
        std::future::pending()
    }

    fn udp_frame(src: u16, dst: u16) -> Vec<u8> {
        ethernet(0x0800, &ipv4(17, [10, 0, 0, 1], [10, 0, 0, 2], &udp(src, dst)))
    }

    #[tokio::test]
    async fn stops_at_frame_budget() {
        let device = ScriptedDevice::new((0..5).map(|i| tcp_frame(1000 + i, 80)).collect());
        let stops = device.stops.clone();
        let sink = CollectingSink::default();
        let reports = sink.reports.clone();

        let session = CaptureSession::new(device, sink, FilterExpression::everything(), &config(2));
        let budget = session.budget();
        let summary = session.run(never()).await.unwrap();

        assert_eq!(summary.reason, StopReason::BudgetReached);
        assert_eq!(summary.stats.frames_reported, 2);
        assert_eq!(budget.count(), 2);
        assert_eq!(reports.lock().len(), 2);
        assert_eq!(stops.load(Ordering::SeqCst), 1);
        assert!(summary.stats.frames_dropped <= 3);
        assert!(summary.stats.start_time.is_some() && summary.stats.end_time.is_some());
    }

    #[tokio::test]
    async fn hidden_frames_do_not_count() {
        let frames = vec![udp_frame(53, 5353), udp_frame(53, 5353), tcp_frame(443, 55000)];
        let filter = FilterExpression::new(ProtocolCategory::TCP, None, None, Some(55000)).unwrap();
        let sink = CollectingSink::default();
        let reports = sink.reports.clone();

        let session = CaptureSession::new(ScriptedDevice::new(frames), sink, filter, &config(1));
        let summary = session.run(never()).await.unwrap();

        assert_eq!(summary.reason, StopReason::BudgetReached);
        assert_eq!(summary.stats.frames_hidden, 2);
        assert_eq!(summary.stats.frames_reported, 1);

        let reports = reports.lock();
        assert_eq!(reports.len(), 1);
        assert!(reports[0].1.contains(&"    dst port: 55000".to_string()));
    }

    #[tokio::test]
    async fn cancellation_ends_an_idle_capture() {
        let device = ScriptedDevice::new(Vec::new());
        let stops = device.stops.clone();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        let session = CaptureSession::new(
            device,
            CollectingSink::default(),
            FilterExpression::everything(),
            &config(10),
        );
        let budget = session.budget();
        let run = tokio::spawn(session.run(async move {
            let _ = rx.await;
        }));

        tokio::time::sleep(Duration::from_millis(20)).await;
        tx.send(()).unwrap();
        let summary = run.await.unwrap().unwrap();

        assert_eq!(summary.reason, StopReason::Cancelled);
        assert!(budget.is_cancelled());
        assert_eq!(budget.count(), 0);
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn device_closing_ends_the_session() {
        let mut device = ScriptedDevice::new(vec![udp_frame(1, 2)]);
        device.close_when_done = true;
        let stops = device.stops.clone();

        let filter = FilterExpression::categories(ProtocolCategory::ICMPV4);
        let session = CaptureSession::new(device, CollectingSink::default(), filter, &config(10));
        let summary = session.run(never()).await.unwrap();

        assert_eq!(summary.reason, StopReason::DeviceClosed);
        assert_eq!(summary.stats.frames_seen, 1);
        assert_eq!(summary.stats.frames_hidden, 1);
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn start_failure_never_captures() {
        let mut device = ScriptedDevice::new(vec![tcp_frame(1, 2)]);
        device.fail_start = true;
        let stops = device.stops.clone();
        let sink = CollectingSink::default();
        let reports = sink.reports.clone();

        let session = CaptureSession::new(device, sink, FilterExpression::everything(), &config(1));
        let result = session.run(never()).await;

        assert!(matches!(
            result,
            Err(AppError::Device(DeviceError::InterfaceNotFound(_)))
        ));
        assert!(reports.lock().is_empty());
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn read_error_is_fatal_and_releases_device() {
        let mut device = ScriptedDevice::new(vec![tcp_frame(1, 2)]);
        device
            .script
            .push_back(Err(DeviceError::Read(pcap::Error::PcapError("link down".to_string()))));
        let stops = device.stops.clone();

        let session = CaptureSession::new(
            device,
            CollectingSink::default(),
            FilterExpression::everything(),
            &config(5),
        );
        let result = session.run(never()).await;

        assert!(matches!(result, Err(AppError::Device(DeviceError::Read(_)))));
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn late_frames_are_dropped_without_reporting() {
        let budget = Arc::new(CaptureBudget::new(1));
        let sink = CollectingSink::default();
        let reports = sink.reports.clone();
        let mut deliverer = Deliverer::new(sink, FilterExpression::everything(), budget.clone());
        let frame = Frame::now(LinkType::Ethernet, tcp_frame(1, 2));

        assert_eq!(deliverer.deliver(&frame).unwrap(), Delivery::Reported);
        assert_eq!(deliverer.deliver(&frame).unwrap(), Delivery::Dropped);
        assert_eq!(deliverer.deliver(&frame).unwrap(), Delivery::Dropped);

        assert_eq!(budget.count(), 1);
        assert_eq!(reports.lock().len(), 1);
        let (_, stats) = deliverer.into_parts();
        assert_eq!(stats.frames_dropped, 2);
        assert_eq!(stats.frames_seen, 3);
    }

    #[test]
    fn count_never_exceeds_budget() {
        let budget = Arc::new(CaptureBudget::new(7));
        let mut deliverer =
            Deliverer::new(CollectingSink::default(), FilterExpression::everything(), budget.clone());

        let mut last = 0;
        for i in 0..50 {
            let frame = Frame::now(LinkType::Ethernet, tcp_frame(i, 80));
            deliverer.deliver(&frame).unwrap();
            assert!(budget.count() >= last);
            assert!(budget.count() <= budget.max_count());
            last = budget.count();
        }
        assert_eq!(last, 7);
    }

    #[test]
    fn filter_decisions_end_to_end() {
        let cases = [
            (tcp_frame(443, 55000), FilterExpression::new(ProtocolCategory::TCP, None, None, Some(55000)).unwrap(), Delivery::Reported),
            (tcp_frame(443, 55000), FilterExpression::categories(ProtocolCategory::UDP), Delivery::Hidden),
            (neighbor_solicitation_frame(), FilterExpression::categories(ProtocolCategory::NDP), Delivery::Reported),
            (neighbor_solicitation_frame(), FilterExpression::categories(ProtocolCategory::ICMPV6), Delivery::Reported),
            (neighbor_solicitation_frame(), FilterExpression::categories(ProtocolCategory::MLD), Delivery::Hidden),
        ];

        for (data, filter, expected) in cases {
            let budget = Arc::new(CaptureBudget::new(10));
            let mut deliverer = Deliverer::new(CollectingSink::default(), filter, budget);
            let frame = Frame::now(LinkType::Ethernet, data);
            assert_eq!(deliverer.deliver(&frame).unwrap(), expected, "filter {}", filter);
        }
    }

    struct BrokenPipeSink;

    impl ReportSink for BrokenPipeSink {
        fn report(&mut self, _frame: &Frame, _lines: &[String]) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }
    }

    #[test]
    fn failed_write_is_not_counted() {
        let budget = Arc::new(CaptureBudget::new(1));
        let mut deliverer = Deliverer::new(BrokenPipeSink, FilterExpression::everything(), budget.clone());
        let frame = Frame::now(LinkType::Ethernet, tcp_frame(1, 2));

        let err = deliverer.deliver(&frame).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        assert_eq!(budget.count(), 0);
        assert!(!budget.is_spent());

        let (_, stats) = deliverer.into_parts();
        assert_eq!(stats.frames_reported, 0);
    }

    #[tokio::test]
    async fn write_failure_ends_the_session() {
        let device = ScriptedDevice::new(vec![tcp_frame(1, 2)]);
        let stops = device.stops.clone();

        let session = CaptureSession::new(device, BrokenPipeSink, FilterExpression::everything(), &config(1));
        let result = session.run(never()).await;

        assert!(matches!(result, Err(AppError::Io(_))));
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn state_advances_in_order() {
        let mut state = SessionState::Idle;
        for next in [SessionState::Capturing, SessionState::Draining, SessionState::Closed] {
            state.advance(next);
            assert_eq!(state, next);
        }
    }

    #[test]
    fn cancel_is_sticky() {
        let budget = CaptureBudget::new(1);
        assert!(!budget.is_cancelled());
        budget.cancel();
        budget.cancel();
        assert!(budget.is_cancelled());
    }
}
