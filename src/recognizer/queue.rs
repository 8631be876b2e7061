use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use crate::landmarks::LandmarkFrame;
use crate::ml::KnnClassifier;
use crate::training::FrameRecorder;

/// One frame waiting for recognition.
#[derive(Debug)]
pub(super) struct FrameJob {
    pub(super) seq: u64,
    pub(super) frame: LandmarkFrame,
}

/// State changes applied by the worker between frames.
#[derive(Debug)]
pub(super) enum Control {
    ReplaceClassifier(Box<KnnClassifier>),
    ResetStabilizer,
    AttachRecorder(FrameRecorder),
    DetachRecorder,
}

#[derive(Debug)]
pub(super) enum WorkItem {
    Control(Control),
    Frame(FrameJob),
    Shutdown,
}

#[derive(Default)]
struct QueueState {
    pending: Option<FrameJob>,
    controls: VecDeque<Control>,
    shutdown: bool,
}

/// Latest-only frame queue with an ordered control lane.
///
/// A frame that has not been picked up is replaced by a newer one. Controls are
/// never dropped and are handed out before any pending frame.
pub(super) struct RecognitionQueue {
    state: Mutex<QueueState>,
    ready: Condvar,
}

impl RecognitionQueue {
    pub(super) fn new() -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            ready: Condvar::new(),
        }
    }

    /// Queue `job`, returning the sequence number of the frame it superseded.
    pub(super) fn submit_frame(&self, job: FrameJob) -> Option<u64> {
        let mut state = self.lock();
        let superseded = state.pending.replace(job).map(|old| old.seq);
        self.ready.notify_one();
        superseded
    }

    pub(super) fn push_control(&self, control: Control) {
        let mut state = self.lock();
        state.controls.push_back(control);
        self.ready.notify_one();
    }

    pub(super) fn shutdown(&self) {
        let mut state = self.lock();
        state.shutdown = true;
        self.ready.notify_all();
    }

    pub(super) fn take_blocking(&self) -> WorkItem {
        let mut state = self.lock();
        loop {
            if let Some(item) = Self::next_item(&mut state) {
                return item;
            }
            state = self
                .ready
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    #[cfg(test)]
    pub(super) fn try_take(&self) -> Option<WorkItem> {
        let mut state = self.lock();
        Self::next_item(&mut state)
    }

    fn next_item(state: &mut QueueState) -> Option<WorkItem> {
        if let Some(control) = state.controls.pop_front() {
            return Some(WorkItem::Control(control));
        }
        if state.shutdown {
            return Some(WorkItem::Shutdown);
        }
        state.pending.take().map(WorkItem::Frame)
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(seq: u64) -> FrameJob {
        FrameJob {
            seq,
            frame: LandmarkFrame::default(),
        }
    }

    #[test]
    fn newer_frame_replaces_pending_one() {
        let queue = RecognitionQueue::new();
        assert_eq!(queue.submit_frame(job(1)), None);
        assert_eq!(queue.submit_frame(job(2)), Some(1));
        match queue.try_take() {
            Some(WorkItem::Frame(frame)) => assert_eq!(frame.seq, 2),
            other => panic!("expected frame, got {other:?}"),
        }
        assert!(queue.try_take().is_none());
    }

    #[test]
    fn controls_come_before_frames_and_are_kept() {
        let queue = RecognitionQueue::new();
        queue.submit_frame(job(1));
        queue.push_control(Control::ResetStabilizer);
        queue.push_control(Control::DetachRecorder);
        assert!(matches!(
            queue.try_take(),
            Some(WorkItem::Control(Control::ResetStabilizer))
        ));
        assert!(matches!(
            queue.try_take(),
            Some(WorkItem::Control(Control::DetachRecorder))
        ));
        assert!(matches!(queue.try_take(), Some(WorkItem::Frame(_))));
    }

    #[test]
    fn shutdown_wins_over_pending_frame() {
        let queue = RecognitionQueue::new();
        queue.submit_frame(job(1));
        queue.shutdown();
        assert!(matches!(queue.try_take(), Some(WorkItem::Shutdown)));
    }

    #[test]
    fn take_blocking_wakes_on_submit() {
        let queue = std::sync::Arc::new(RecognitionQueue::new());
        let producer = std::sync::Arc::clone(&queue);
        let handle = std::thread::spawn(move || {
            std::thread::sleep(std::time::Duration::from_millis(20));
            producer.submit_frame(job(9));
        });
        match queue.take_blocking() {
            WorkItem::Frame(frame) => assert_eq!(frame.seq, 9),
            other => panic!("expected frame, got {other:?}"),
        }
        handle.join().unwrap();
    }
}
