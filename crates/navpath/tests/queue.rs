use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use navpath::{
    DrainOrder, PathFindingOptions, PathRequestQueue, PathResponse, Pathfinder,
    QueueConfig, Vec3,
};

mod common;

fn grid_pathfinder(width: usize, height: usize) -> Arc<Pathfinder> {
    Arc::new(Pathfinder::init(&common::grid_mesh(width, height)).expect("valid mesh"))
}

/// Pump until `done` reports true or five seconds pass.
fn pump_until(queue: &PathRequestQueue, mut done: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !done() {
        assert!(Instant::now() < deadline, "timed out waiting for completions");
        if queue.pump_completions() == 0 {
            std::thread::sleep(Duration::from_millis(1));
        }
    }
}

fn collector() -> (
    Arc<Mutex<Vec<PathResponse>>>,
    impl Fn() -> Box<dyn FnOnce(PathResponse) + Send + 'static>,
) {
    let sink = Arc::new(Mutex::new(Vec::new()));
    let make = {
        let sink = Arc::clone(&sink);
        move || {
            let sink = Arc::clone(&sink);
            Box::new(move |response: PathResponse| {
                sink.lock().expect("sink").push(response);
            }) as Box<dyn FnOnce(PathResponse) + Send + 'static>
        }
    };
    (sink, make)
}

#[test]
fn completed_requests_match_synchronous_searches() {
    let pf = grid_pathfinder(8, 8);
    let queue = PathRequestQueue::new(Arc::clone(&pf)).expect("spawn worker");
    let (sink, callback) = collector();

    let requests = [
        (Vec3::new(0.5, 0.0, 0.2), Vec3::new(7.5, 0.0, 7.1)),
        (Vec3::new(7.2, 0.0, 0.4), Vec3::new(0.3, 0.0, 6.6)),
        (Vec3::new(3.3, 0.0, 3.1), Vec3::new(3.6, 0.0, 3.2)),
    ];
    for (id, &(start, end)) in requests.iter().enumerate() {
        let buffer = Vec::with_capacity(32);
        queue.submit(
            id as u64,
            start,
            end,
            buffer,
            PathFindingOptions::simplified(),
            callback(),
        );
    }

    pump_until(&queue, || sink.lock().expect("sink").len() == requests.len());

    let responses = sink.lock().expect("sink").clone();
    for response in responses {
        let (start, end) = requests[response.id as usize];
        let expected = pf
            .find_path_alloc(start, end, PathFindingOptions::simplified())
            .expect("connected");
        assert!(response.found);
        assert_eq!(response.path, expected.points);
        assert!(response.path.capacity() >= 32, "caller buffer is handed back");
    }
    assert_eq!(queue.pending_len(), 0);
}

#[test]
fn oldest_first_completes_in_submission_order() {
    let pf = grid_pathfinder(4, 4);
    let config = QueueConfig {
        drain_order: DrainOrder::OldestFirst,
        ..QueueConfig::default()
    };
    let queue = PathRequestQueue::with_config(pf, config).expect("spawn worker");
    let (sink, callback) = collector();

    for id in 0..20u64 {
        queue.submit(
            id,
            Vec3::new(0.5, 0.0, 0.2),
            Vec3::new(3.5, 0.0, 3.1),
            Vec::new(),
            PathFindingOptions::raw(),
            callback(),
        );
    }

    pump_until(&queue, || sink.lock().expect("sink").len() == 20);
    let ids: Vec<u64> = sink.lock().expect("sink").iter().map(|r| r.id).collect();
    assert_eq!(ids, (0..20).collect::<Vec<_>>());
}

#[test]
fn failed_requests_report_not_found_and_worker_keeps_serving() {
    let pf = grid_pathfinder(4, 4);
    let queue = PathRequestQueue::new(pf).expect("spawn worker");
    let (sink, callback) = collector();

    let on_mesh = Vec3::new(0.5, 0.0, 0.2);
    let bad = [
        Vec3::new(100.0, 0.0, 100.0),
        Vec3::new(f32::NAN, 0.0, 1.0),
        Vec3::new(1.0, 0.0, f32::INFINITY),
    ];
    for (id, &end) in bad.iter().enumerate() {
        queue.submit(
            id as u64,
            on_mesh,
            end,
            vec![Vec3::ZERO; 3],
            PathFindingOptions::simplified(),
            callback(),
        );
    }
    pump_until(&queue, || sink.lock().expect("sink").len() == bad.len());
    for response in sink.lock().expect("sink").iter() {
        assert!(!response.found);
        assert!(response.path.is_empty());
    }

    queue.submit(
        99,
        on_mesh,
        Vec3::new(3.5, 0.0, 3.1),
        Vec::new(),
        PathFindingOptions::simplified(),
        callback(),
    );
    pump_until(&queue, || sink.lock().expect("sink").len() == bad.len() + 1);
    let last = sink.lock().expect("sink").last().cloned().expect("response");
    assert_eq!(last.id, 99);
    assert!(last.found);
}

#[test]
fn callbacks_run_on_the_pumping_thread_and_may_resubmit() {
    let pf = grid_pathfinder(4, 4);
    let queue = Arc::new(PathRequestQueue::new(pf).expect("spawn worker"));
    let (tx, rx) = mpsc::channel();
    let pumping_thread = std::thread::current().id();

    let resubmit = {
        let queue = Arc::clone(&queue);
        let tx = tx.clone();
        move |first: PathResponse| {
            assert_eq!(std::thread::current().id(), pumping_thread);
            tx.send(first.id).expect("receiver alive");
            let tx = tx.clone();
            queue.submit(
                2,
                Vec3::new(3.5, 0.0, 3.1),
                Vec3::new(0.5, 0.0, 0.2),
                first.path,
                PathFindingOptions::simplified(),
                move |second| {
                    tx.send(second.id).expect("receiver alive");
                },
            );
        }
    };
    queue.submit(
        1,
        Vec3::new(0.5, 0.0, 0.2),
        Vec3::new(3.5, 0.0, 3.1),
        Vec::new(),
        PathFindingOptions::simplified(),
        resubmit,
    );

    let mut seen = Vec::new();
    pump_until(&queue, || {
        seen.extend(rx.try_iter());
        seen.len() == 2
    });
    assert_eq!(seen, vec![1, 2]);
}

#[test]
fn shutdown_is_idempotent_and_keeps_finished_results() {
    let pf = grid_pathfinder(4, 4);
    let mut queue = PathRequestQueue::new(pf).expect("spawn worker");
    let (sink, callback) = collector();

    queue.submit(
        7,
        Vec3::new(0.5, 0.0, 0.2),
        Vec3::new(3.5, 0.0, 3.1),
        Vec::new(),
        PathFindingOptions::raw(),
        callback(),
    );
    pump_until(&queue, || sink.lock().expect("sink").len() == 1);

    queue.shutdown();
    queue.shutdown();
    assert_eq!(queue.pump_completions(), 0);
    drop(queue);

    assert_eq!(sink.lock().expect("sink")[0].id, 7);
}

#[test]
fn dropping_an_idle_queue_joins_the_worker() {
    let pf = grid_pathfinder(2, 2);
    let queue = PathRequestQueue::new(Arc::clone(&pf)).expect("spawn worker");
    drop(queue);
    assert_eq!(Arc::strong_count(&pf), 1);
}
