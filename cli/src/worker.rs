//! Background execution of a batch run.
//!
//! The engine runs on exactly one worker thread; the caller keeps the
//! receiving end of the event channel and stays responsive (rendering,
//! cancellation) while the run executes.

use crate::progress::{ChannelProgress, WorkerEvent};
use crossbeam_channel::{unbounded, Receiver};
use engine::{run_batch, BatchJob, BatchSummary, CancelFlag, EngineError};
use std::thread::{self, JoinHandle};

/// Execute a planned job on a background thread.
///
/// Returns the event receiver and the join handle carrying the run result.
/// The channel disconnects when the run finishes, so draining the receiver
/// to exhaustion and then joining observes every event exactly once, in
/// emission order.
pub fn spawn_batch(
    mut job: BatchJob,
    cancel: CancelFlag,
) -> (
    Receiver<WorkerEvent>,
    JoinHandle<Result<BatchSummary, EngineError>>,
) {
    let (tx, rx) = unbounded::<WorkerEvent>();

    let handle = thread::spawn(move || {
        let callback = ChannelProgress::new(tx);
        run_batch(&mut job, Some(&callback), Some(&cancel))
    });

    (rx, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::{create_batch, plan_batch, BatchConfig, XorKey};
    use std::fs;

    #[test]
    fn test_events_arrive_in_order_and_complete() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let input = temp_dir.path().join("in");
        let output = temp_dir.path().join("out");
        fs::create_dir(&input).unwrap();
        fs::create_dir(&output).unwrap();
        fs::write(input.join("a.bin"), b"one").unwrap();
        fs::write(input.join("b.bin"), b"two").unwrap();

        let key = XorKey::new(vec![0x7f]).unwrap();
        let config = BatchConfig::new(input, output, key);
        let mut job = create_batch(config).unwrap();
        plan_batch(&mut job).unwrap();

        let (events, handle) = spawn_batch(job, CancelFlag::new());
        let events: Vec<WorkerEvent> = events.iter().collect();
        let summary = handle.join().expect("worker panicked").expect("run failed");

        assert_eq!(summary.done_count, 2);
        assert!(matches!(events.first(), Some(WorkerEvent::BatchStarted { total_files: 2, .. })));
        assert!(matches!(events.last(), Some(WorkerEvent::BatchCompleted)));

        let percents: Vec<u8> = events
            .iter()
            .filter_map(|e| match e {
                WorkerEvent::Progress { percent } => Some(*percent),
                _ => None,
            })
            .collect();
        assert_eq!(percents, vec![50, 100]);
    }
}
