//! Integration tests for forked workers.
//!
//! Each test forks real child processes and reads their results back
//! through the channel.

use std::io::Write;
use std::thread;
use std::time::{Duration, Instant};

use greendots_core::{Worker, WorkerConfig};

/// A single write comes back unchanged.
#[test]
fn test_single_write_round_trip() {
    let worker = Worker::fork(|writer| {
        writer.write_all(b"hello").unwrap();
    })
    .unwrap();

    assert_eq!(worker.wait().unwrap(), b"hello");
}

/// Separate writes are concatenated, not truncated to the first read.
#[test]
fn test_multiple_writes_are_accumulated() {
    let worker = Worker::fork(|writer| {
        writer.write_all(b"a").unwrap();
        writer.write_all(b"b").unwrap();
        writer.write_all(b"c").unwrap();
    })
    .unwrap();

    assert_eq!(worker.wait().unwrap(), b"abc");
}

/// A child that writes nothing still lets wait complete.
#[test]
fn test_empty_result_completes() {
    let start = Instant::now();
    let worker = Worker::fork(|_| {}).unwrap();

    let bytes = worker.wait().unwrap();

    assert!(bytes.is_empty());
    assert!(start.elapsed() < Duration::from_secs(10));
}

/// Two workers never see each other's output, whichever is waited first.
#[test]
fn test_two_workers_are_independent() {
    let one = Worker::fork(|writer| writer.write_all(b"one").unwrap()).unwrap();
    let two = Worker::fork(|writer| writer.write_all(b"two").unwrap()).unwrap();
    assert_ne!(one.pid(), two.pid());

    assert_eq!(two.wait().unwrap(), b"two");
    assert_eq!(one.wait().unwrap(), b"one");

    let one = Worker::fork(|writer| writer.write_all(b"one").unwrap()).unwrap();
    let two = Worker::fork(|writer| writer.write_all(b"two").unwrap()).unwrap();

    assert_eq!(one.wait().unwrap(), b"one");
    assert_eq!(two.wait().unwrap(), b"two");
}

/// Output larger than the pipe buffer does not deadlock the parent.
#[test]
fn test_large_payload_does_not_deadlock() {
    let payload: Vec<u8> = (0..1024 * 1024).map(|i| (i % 251) as u8).collect();
    let expected = payload.clone();

    let worker = Worker::fork(move |writer| {
        for chunk in payload.chunks(4096) {
            writer.write_all(chunk).unwrap();
        }
    })
    .unwrap();

    let bytes = worker.wait().unwrap();
    assert_eq!(bytes.len(), expected.len());
    assert_eq!(bytes, expected);
}

/// A panicking child still releases the writer; partial output survives.
#[test]
fn test_panicking_work_returns_partial_output() {
    let worker = Worker::fork(|writer| {
        writer.write_all(b"partial").unwrap();
        panic!("unit of work failed");
    })
    .unwrap();

    assert_eq!(worker.wait().unwrap(), b"partial");
}

/// The result reflects what the child computed, not the parent's state.
#[test]
fn test_child_mutations_stay_in_child() {
    let mut counter = 0u32;
    let worker = Worker::fork(|writer| {
        counter += 41;
        counter += 1;
        write!(writer, "{}", counter).unwrap();
    })
    .unwrap();

    assert_eq!(worker.wait().unwrap(), b"42");
    assert_eq!(counter, 0);
}

/// wait blocks until a slow child finishes.
#[test]
fn test_wait_blocks_until_child_exits() {
    let start = Instant::now();
    let worker = Worker::fork(|writer| {
        thread::sleep(Duration::from_millis(200));
        writer.write_all(b"late").unwrap();
    })
    .unwrap();

    assert_eq!(worker.wait().unwrap(), b"late");
    assert!(start.elapsed() >= Duration::from_millis(200));
}

/// A worker can be moved to another thread and waited there.
#[test]
fn test_wait_from_another_thread() {
    let worker = Worker::fork(|writer| writer.write_all(b"moved").unwrap()).unwrap();

    let handle = thread::spawn(move || worker.wait().unwrap());

    assert_eq!(handle.join().unwrap(), b"moved");
}

/// Many workers in flight at once all report correctly.
#[test]
fn test_fan_out_fan_in() {
    let workers: Vec<Worker> = (0..8)
        .map(|i| {
            Worker::fork_with(&WorkerConfig::default().read_chunk_size(16), move |writer| {
                write!(writer, "worker-{}", i).unwrap();
            })
            .unwrap()
        })
        .collect();

    let results: Vec<String> = workers
        .into_iter()
        .map(|worker| String::from_utf8(worker.wait().unwrap()).unwrap())
        .collect();

    let expected: Vec<String> = (0..8).map(|i| format!("worker-{}", i)).collect();
    assert_eq!(results, expected);
}

/// Dropping an unwaited worker does not disturb others.
#[test]
fn test_dropped_worker_does_not_interfere() {
    let dropped = Worker::fork(|writer| {
        let _ = writer.write_all(b"ignored");
    })
    .unwrap();
    let kept = Worker::fork(|writer| writer.write_all(b"kept").unwrap()).unwrap();

    drop(dropped);

    assert_eq!(kept.wait().unwrap(), b"kept");
}
