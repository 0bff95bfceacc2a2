use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::models::config::RecorderConfig;
use crate::models::error::RecorderError;
use crate::models::frame::AudioFrame;
use crate::models::state::SessionState;
use crate::models::summary::{RecordingSummary, SessionDiagnostics};
use crate::processing::ring_buffer::FrameRing;
use crate::session::store::{AccumulationStore, RecordingSnapshot};
use crate::traits::device_provider::{AudioInputCallback, DeviceProvider};
use crate::traits::session_delegate::SessionDelegate;

/// Producer-side gate, shared with the device callback.
///
/// The callback evaluates `state` under this mutex and the transition
/// methods write it under the same mutex, so a pause or stop takes effect
/// before the next frame is considered for acceptance — there is no window
/// where a frame lands after stop.
struct ProducerGate {
    state: SessionState,
    next_seq: u64,
    diagnostics: SessionDiagnostics,
}

impl ProducerGate {
    fn new() -> Self {
        Self {
            state: SessionState::Idle,
            next_seq: 0,
            diagnostics: SessionDiagnostics::default(),
        }
    }
}

/// Wall-clock bookkeeping, touched only from the control thread.
#[derive(Default)]
struct Timing {
    started_at: Option<Instant>,
    stopped_at: Option<Instant>,
    paused_total: Duration,
    paused_since: Option<Instant>,
}

impl Timing {
    fn active_duration(&self) -> Duration {
        let Some(started) = self.started_at else {
            return Duration::ZERO;
        };
        let end = self.stopped_at.unwrap_or_else(Instant::now);
        let mut paused = self.paused_total;
        if let Some(since) = self.paused_since {
            paused += since.elapsed();
        }
        end.duration_since(started)
            .checked_sub(paused)
            .unwrap_or_default()
    }
}

/// Recording session orchestrator, generic over the device backend.
///
/// Owns the device provider, the accumulation store, the display ring and
/// the state machine; it is the single source of truth for session state.
/// Data flow:
/// ```text
/// [DeviceProvider] → gate (state check) ─┬→ [AccumulationStore]   (recording only)
///                                        └→ [FrameRing] → {LevelMeter, WaveformFeed}
/// ```
/// The capture callback does bounded work only: a state check, a sequence
/// assignment, an amortized-O(1) append, and a ring push. Export runs
/// strictly after `stop()`, so no lock is ever contended between the
/// producer and the exporter.
pub struct CaptureSession<P: DeviceProvider> {
    provider: P,
    config: RecorderConfig,
    gate: Arc<Mutex<ProducerGate>>,
    store: Arc<Mutex<AccumulationStore>>,
    ring: Arc<Mutex<FrameRing>>,
    timing: Timing,
    delegate: Option<Arc<dyn SessionDelegate>>,
}

impl<P: DeviceProvider> CaptureSession<P> {
    pub fn new(provider: P, config: RecorderConfig) -> Result<Self, RecorderError> {
        config.validate().map_err(RecorderError::InvalidConfig)?;
        Ok(Self {
            provider,
            config,
            gate: Arc::new(Mutex::new(ProducerGate::new())),
            store: Arc::new(Mutex::new(AccumulationStore::with_reserve(0))),
            ring: Arc::new(Mutex::new(FrameRing::new(config.ring_frames))),
            timing: Timing::default(),
            delegate: None,
        })
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn SessionDelegate>) {
        self.delegate = Some(delegate);
    }

    pub fn state(&self) -> SessionState {
        self.gate.lock().state
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    /// Display ring handle for constructing meters and waveform feeds.
    pub fn frame_ring(&self) -> Arc<Mutex<FrameRing>> {
        Arc::clone(&self.ring)
    }

    /// Active recording time in seconds, excluding paused intervals.
    /// Frozen once the session stops.
    pub fn elapsed_secs(&self) -> f64 {
        self.timing.active_duration().as_secs_f64()
    }

    pub fn diagnostics(&self) -> SessionDiagnostics {
        let mut diagnostics = self.gate.lock().diagnostics;
        diagnostics.display_frames_dropped = self.ring.lock().dropped();
        diagnostics
    }

    /// Begin recording. Idle → Recording.
    ///
    /// Resets the store, ring and sequence counter, then opens the device
    /// stream. If the device fails to open the session returns to Idle with
    /// no partial accumulation.
    pub fn start(&mut self) -> Result<(), RecorderError> {
        {
            let gate = self.gate.lock();
            if !gate.state.is_idle() {
                return Err(RecorderError::InvalidTransition {
                    op: "start",
                    from: gate.state,
                });
            }
        }

        let format = self.config.format;
        let prealloc = format.sample_rate as usize
            * format.channels as usize
            * self.config.prealloc_secs as usize;
        self.store.lock().reset(prealloc);
        self.ring.lock().clear();

        // Flip to Recording before the stream opens so the first callback
        // is already accepted; reverted if the device fails to open.
        {
            let mut gate = self.gate.lock();
            gate.next_seq = 0;
            gate.diagnostics = SessionDiagnostics::default();
            gate.state = SessionState::Recording;
        }

        let callback = self.producer_callback();
        if let Err(err) = self.provider.start(format, callback) {
            self.gate.lock().state = SessionState::Idle;
            self.store.lock().reset(0);
            log::error!("failed to open input device: {err}");
            self.notify_error(&err);
            return Err(err);
        }

        self.timing = Timing {
            started_at: Some(Instant::now()),
            ..Timing::default()
        };
        log::info!(
            "recording started: {} Hz, {} ch, {}-bit",
            format.sample_rate,
            format.channels,
            format.bit_depth
        );
        self.notify_state(SessionState::Recording);
        Ok(())
    }

    /// Pause recording. Recording → Paused.
    ///
    /// The device stream keeps running: frames delivered while paused skip
    /// the store but reach the display ring with `muted` set, so the UI can
    /// meter the live signal without recording it. The recorded sample
    /// sequence therefore has no gap and no duplicate across a pause.
    pub fn pause(&mut self) -> Result<(), RecorderError> {
        {
            let mut gate = self.gate.lock();
            if !gate.state.is_recording() {
                return Err(RecorderError::InvalidTransition {
                    op: "pause",
                    from: gate.state,
                });
            }
            gate.state = SessionState::Paused;
        }
        self.timing.paused_since = Some(Instant::now());
        self.notify_state(SessionState::Paused);
        Ok(())
    }

    /// Resume recording. Paused → Recording.
    pub fn resume(&mut self) -> Result<(), RecorderError> {
        {
            let mut gate = self.gate.lock();
            if !gate.state.is_paused() {
                return Err(RecorderError::InvalidTransition {
                    op: "resume",
                    from: gate.state,
                });
            }
            gate.state = SessionState::Recording;
        }
        if let Some(since) = self.timing.paused_since.take() {
            self.timing.paused_total += since.elapsed();
        }
        self.notify_state(SessionState::Recording);
        Ok(())
    }

    /// Stop recording. Recording or Paused → Stopped.
    ///
    /// The state flips first — no frame is accepted past that point — then
    /// the provider closes the device, quiescing the callback, and the
    /// store is considered frozen. Export is a separate explicit action;
    /// the same stopped session can be exported any number of times.
    pub fn stop(&mut self) -> Result<RecordingSummary, RecorderError> {
        {
            let mut gate = self.gate.lock();
            if !gate.state.is_active() {
                return Err(RecorderError::InvalidTransition {
                    op: "stop",
                    from: gate.state,
                });
            }
            gate.state = SessionState::Stopped;
        }
        if let Some(since) = self.timing.paused_since.take() {
            self.timing.paused_total += since.elapsed();
        }
        self.timing.stopped_at = Some(Instant::now());

        if let Err(err) = self.provider.stop() {
            log::error!("failed to close input device: {err}");
            self.notify_error(&err);
            return Err(err);
        }

        let (frames, samples) = {
            let store = self.store.lock();
            (store.frame_count(), store.sample_count() as u64)
        };
        let summary = RecordingSummary {
            frames,
            samples,
            duration_secs: self.elapsed_secs(),
        };

        let dropped = self.ring.lock().dropped();
        if dropped > 0 {
            log::warn!("display ring dropped {dropped} frames (readers fell behind)");
        }
        log::info!(
            "recording stopped: {} frames, {:.2}s",
            summary.frames,
            summary.duration_secs
        );
        self.notify_state(SessionState::Stopped);
        Ok(summary)
    }

    /// Frozen view of the recording for export.
    ///
    /// Available only once the session is stopped and non-empty; export
    /// never mutates the store, so every snapshot of the same session
    /// carries identical samples.
    pub fn snapshot(&self) -> Result<RecordingSnapshot, RecorderError> {
        if !self.state().is_stopped() {
            return Err(RecorderError::NothingToExport);
        }
        let snapshot = self.store.lock().snapshot(self.config.format);
        if snapshot.is_empty() {
            return Err(RecorderError::NothingToExport);
        }
        Ok(snapshot)
    }

    /// Build the producer callback handed to the device backend.
    ///
    /// Lock order is gate → store → ring; no other path takes these locks
    /// in a different order.
    fn producer_callback(&self) -> AudioInputCallback {
        let gate = Arc::clone(&self.gate);
        let store = Arc::clone(&self.store);
        let ring = Arc::clone(&self.ring);

        Arc::new(move |samples: &[f32]| {
            let mut gate = gate.lock();
            gate.diagnostics.callbacks += 1;
            match gate.state {
                SessionState::Recording => {
                    let frame = AudioFrame::new(gate.next_seq, false, samples);
                    gate.next_seq += 1;
                    gate.diagnostics.frames_accepted += 1;
                    gate.diagnostics.samples_accepted += samples.len() as u64;
                    store.lock().append(samples);
                    ring.lock().push(frame);
                }
                SessionState::Paused => {
                    let frame = AudioFrame::new(gate.next_seq, true, samples);
                    gate.next_seq += 1;
                    gate.diagnostics.frames_muted += 1;
                    ring.lock().push(frame);
                }
                SessionState::Idle | SessionState::Stopped => {}
            }
        })
    }

    fn notify_state(&self, state: SessionState) {
        if let Some(ref delegate) = self.delegate {
            delegate.on_state_changed(state);
        }
    }

    fn notify_error(&self, error: &RecorderError) {
        if let Some(ref delegate) = self.delegate {
            delegate.on_error(error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::AudioFormat;
    use crate::processing::level_meter::LevelMeter;
    use crate::processing::waveform_feed::WaveformFeed;
    use crate::storage::exporter::{self, ExportFormat};
    use crate::traits::device_provider::DeviceInfo;

    type CallbackSlot = Arc<Mutex<Option<AudioInputCallback>>>;

    /// Backend double: hands the producer callback to the test, which
    /// plays the role of the audio thread.
    struct FakeDevice {
        slot: CallbackSlot,
        fail_start: bool,
    }

    impl FakeDevice {
        fn new() -> (Self, CallbackSlot) {
            let slot: CallbackSlot = Arc::new(Mutex::new(None));
            (
                Self {
                    slot: Arc::clone(&slot),
                    fail_start: false,
                },
                slot,
            )
        }

        fn failing() -> Self {
            Self {
                slot: Arc::new(Mutex::new(None)),
                fail_start: true,
            }
        }
    }

    impl DeviceProvider for FakeDevice {
        fn is_available(&self) -> bool {
            !self.fail_start
        }

        fn device_info(&self) -> DeviceInfo {
            DeviceInfo {
                id: "fake".into(),
                name: "fake input".into(),
                is_default: true,
            }
        }

        fn start(
            &mut self,
            _format: AudioFormat,
            callback: AudioInputCallback,
        ) -> Result<(), RecorderError> {
            if self.fail_start {
                return Err(RecorderError::DeviceError("no input device".into()));
            }
            *self.slot.lock() = Some(callback);
            Ok(())
        }

        fn stop(&mut self) -> Result<(), RecorderError> {
            *self.slot.lock() = None;
            Ok(())
        }
    }

    fn emit(slot: &CallbackSlot, samples: &[f32]) {
        let callback = slot.lock().clone();
        if let Some(callback) = callback {
            callback(samples);
        }
    }

    fn test_config() -> RecorderConfig {
        RecorderConfig {
            chunk_samples: 4,
            ring_frames: 16,
            prealloc_secs: 1,
            ..RecorderConfig::default()
        }
    }

    fn session() -> (CaptureSession<FakeDevice>, CallbackSlot) {
        let (device, slot) = FakeDevice::new();
        (CaptureSession::new(device, test_config()).unwrap(), slot)
    }

    #[test]
    fn initial_state_is_idle() {
        let (session, _slot) = session();
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn invalid_transitions_are_rejected_and_state_unchanged() {
        let (mut session, _slot) = session();

        assert!(matches!(
            session.pause(),
            Err(RecorderError::InvalidTransition { op: "pause", .. })
        ));
        assert!(matches!(
            session.resume(),
            Err(RecorderError::InvalidTransition { op: "resume", .. })
        ));
        assert!(matches!(
            session.stop(),
            Err(RecorderError::InvalidTransition { op: "stop", .. })
        ));
        assert_eq!(session.state(), SessionState::Idle);

        session.start().unwrap();
        assert!(matches!(
            session.start(),
            Err(RecorderError::InvalidTransition { op: "start", .. })
        ));
        assert!(matches!(
            session.resume(),
            Err(RecorderError::InvalidTransition { op: "resume", .. })
        ));
        assert_eq!(session.state(), SessionState::Recording);
    }

    #[test]
    fn frames_accepted_only_while_recording() {
        let (mut session, slot) = session();

        // Nothing is delivered before start.
        emit(&slot, &[0.1; 4]);
        session.start().unwrap();

        emit(&slot, &[0.1; 4]);
        emit(&slot, &[0.2; 4]);

        session.pause().unwrap();
        emit(&slot, &[0.9; 4]); // discarded from accumulation

        session.resume().unwrap();
        emit(&slot, &[0.3; 4]);

        let summary = session.stop().unwrap();
        emit(&slot, &[0.4; 4]); // after stop: quiesced, never seen

        assert_eq!(summary.frames, 3);
        assert_eq!(summary.samples, 12);

        let diagnostics = session.diagnostics();
        assert_eq!(diagnostics.frames_accepted, 3);
        assert_eq!(diagnostics.frames_muted, 1);
    }

    #[test]
    fn pause_does_not_gap_or_duplicate_the_recording() {
        let (mut session, slot) = session();
        session.start().unwrap();

        emit(&slot, &[0.1, 0.1, 0.1, 0.1]);
        session.pause().unwrap();
        emit(&slot, &[0.9, 0.9, 0.9, 0.9]);
        session.resume().unwrap();
        emit(&slot, &[0.2, 0.2, 0.2, 0.2]);

        session.stop().unwrap();
        let snapshot = session.snapshot().unwrap();

        // Contiguous accepted samples, nothing from the paused interval.
        assert_eq!(snapshot.sample_count(), 8);
        assert!(snapshot.samples[..4].iter().all(|&s| (s - 0.1).abs() < 1e-6));
        assert!(snapshot.samples[4..].iter().all(|&s| (s - 0.2).abs() < 1e-6));
    }

    #[test]
    fn muted_frames_reach_display_readers_but_not_the_store() {
        let (mut session, slot) = session();
        let ring = session.frame_ring();
        session.start().unwrap();

        let mut meter = LevelMeter::new();
        let mut feed = WaveformFeed::new(4, 8);

        session.pause().unwrap();
        emit(&slot, &[0.5, 0.5, 0.5, 0.5]);

        {
            let ring = ring.lock();
            let reading = meter.sample(&ring);
            assert!(reading.peak > 0.4);
            let points = feed.poll(&ring);
            assert_eq!(points.len(), 1);
        }

        session.resume().unwrap();
        let summary = session.stop().unwrap();
        assert_eq!(summary.frames, 0);
        assert!(session.snapshot().is_err());
    }

    #[test]
    fn device_failure_on_start_leaves_idle_and_empty() {
        let mut session = CaptureSession::new(FakeDevice::failing(), test_config()).unwrap();

        let err = session.start().unwrap_err();
        assert!(matches!(err, RecorderError::DeviceError(_)));
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.diagnostics().frames_accepted, 0);
    }

    #[test]
    fn snapshot_requires_stopped_nonempty_session() {
        let (mut session, slot) = session();
        assert!(matches!(
            session.snapshot(),
            Err(RecorderError::NothingToExport)
        ));

        session.start().unwrap();
        emit(&slot, &[0.1; 4]);
        assert!(matches!(
            session.snapshot(),
            Err(RecorderError::NothingToExport)
        ));

        session.stop().unwrap();
        assert!(session.snapshot().is_ok());
    }

    #[test]
    fn stop_works_from_paused() {
        let (mut session, slot) = session();
        session.start().unwrap();
        emit(&slot, &[0.1; 4]);
        session.pause().unwrap();

        let summary = session.stop().unwrap();
        assert_eq!(summary.frames, 1);
        assert_eq!(session.state(), SessionState::Stopped);
    }

    #[test]
    fn repeated_snapshots_are_identical() {
        let (mut session, slot) = session();
        session.start().unwrap();
        emit(&slot, &[0.1, -0.2, 0.3, -0.4]);
        session.stop().unwrap();

        let a = session.snapshot().unwrap();
        let b = session.snapshot().unwrap();
        assert_eq!(&a.samples[..], &b.samples[..]);
        assert_eq!(a.frames, b.frames);
    }

    #[test]
    fn delegate_observes_transitions() {
        struct Recording(Mutex<Vec<SessionState>>);
        impl SessionDelegate for Recording {
            fn on_state_changed(&self, state: SessionState) {
                self.0.lock().push(state);
            }
            fn on_error(&self, _error: &RecorderError) {}
        }

        let (mut session, _slot) = session();
        let delegate = Arc::new(Recording(Mutex::new(Vec::new())));
        session.set_delegate(Arc::clone(&delegate) as Arc<dyn SessionDelegate>);

        session.start().unwrap();
        session.pause().unwrap();
        session.resume().unwrap();
        session.stop().unwrap();

        assert_eq!(
            *delegate.0.lock(),
            vec![
                SessionState::Recording,
                SessionState::Paused,
                SessionState::Recording,
                SessionState::Stopped,
            ]
        );
    }

    #[test]
    fn sessions_do_not_interfere() {
        let (mut a, slot_a) = session();
        let (mut b, slot_b) = session();

        a.start().unwrap();
        b.start().unwrap();
        emit(&slot_a, &[0.1; 4]);
        emit(&slot_b, &[0.2; 4]);
        emit(&slot_b, &[0.2; 4]);

        assert_eq!(a.stop().unwrap().frames, 1);
        assert_eq!(b.stop().unwrap().frames, 2);
    }

    /// Full pipeline: the six accepted frames land in the file with an
    /// exact declared data length.
    #[test]
    fn record_pause_resume_export_scenario() {
        let (mut session, slot) = session();
        session.start().unwrap();

        for _ in 0..3 {
            emit(&slot, &[0.1, 0.2, 0.3, 0.4]);
        }
        session.pause().unwrap();
        for _ in 0..2 {
            emit(&slot, &[0.9; 4]);
        }
        session.resume().unwrap();
        for _ in 0..3 {
            emit(&slot, &[-0.1, -0.2, -0.3, -0.4]);
        }

        let summary = session.stop().unwrap();
        assert_eq!(summary.frames, 6);
        assert_eq!(summary.samples, 24);

        let snapshot = session.snapshot().unwrap();
        assert_eq!(snapshot.frames, 6);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("take.wav");
        let artifact = exporter::export(&snapshot, ExportFormat::Wav, &path).unwrap();

        // 24 samples of 16-bit mono PCM.
        assert_eq!(artifact.payload_bytes, 48);

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len(), 44 + 48);
        let declared = u32::from_le_bytes([bytes[40], bytes[41], bytes[42], bytes[43]]);
        assert_eq!(declared, 48);
        let sample_rate = u32::from_le_bytes([bytes[24], bytes[25], bytes[26], bytes[27]]);
        assert_eq!(sample_rate, 44_100);
        let channels = u16::from_le_bytes([bytes[22], bytes[23]]);
        assert_eq!(channels, 1);
        let bit_depth = u16::from_le_bytes([bytes[34], bytes[35]]);
        assert_eq!(bit_depth, 16);
    }
}
