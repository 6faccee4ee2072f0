//! End-to-end scenarios exercising the hosted back-end the way an
//! application would: through the public crate surface only.

use osal::flags::EventWaitOptions;
use osal::mutex::MutexAttr;
use osal::queue::MessageQueue;
use osal::semaphore::SemaphoreAttr;
use osal::thread::ThreadAttr;
use osal::{EventFlags, Mutex, Semaphore, Status, Thread, Timeout};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[test]
fn mutex_contention_across_eight_threads_reaches_exact_count() {
    let mutex = Arc::new(Mutex::new(MutexAttr::default()).unwrap());
    let counter = Arc::new(AtomicU32::new(0));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let mutex = Arc::clone(&mutex);
            let counter = Arc::clone(&counter);
            Thread::spawn(
                ThreadAttr {
                    name: "contender",
                    ..ThreadAttr::default()
                },
                move || {
                    let _ = i;
                    for _ in 0..25 {
                        assert_eq!(mutex.lock(Timeout::WAIT_FOREVER), Status::Success);
                        counter.fetch_add(1, Ordering::Relaxed);
                        assert_eq!(mutex.unlock(), Status::Success);
                    }
                    0
                },
            )
            .unwrap()
        })
        .collect();

    for h in handles {
        assert_eq!(h.join(), Ok(0));
    }
    assert_eq!(counter.load(Ordering::Relaxed), 200);
}

#[test]
fn semaphore_hand_off_between_two_threads_takes_about_fifty_ms() {
    let sema = Arc::new(
        Semaphore::new(SemaphoreAttr {
            initial_count: 0,
            max_count: 1,
        })
        .unwrap(),
    );
    let giver = Arc::clone(&sema);
    let start = Instant::now();
    let handle = Thread::spawn(ThreadAttr::default(), move || {
        std::thread::sleep(std::time::Duration::from_millis(50));
        giver.give();
        0
    })
    .unwrap();

    assert_eq!(sema.take(Timeout::WAIT_FOREVER), Status::Success);
    let elapsed = start.elapsed().as_millis() as i64;
    assert!((20..=130).contains(&elapsed), "elapsed={elapsed}");
    assert_eq!(handle.join(), Ok(0));
}

#[test]
fn message_queue_preserves_fifo_order_at_full_depth() {
    let queue: MessageQueue<i32, 5> = MessageQueue::new().unwrap();
    for i in 0..5 {
        assert_eq!(queue.send(i, Timeout::NO_WAIT), Status::Success);
    }
    assert_eq!(queue.len(), 5);
    assert_eq!(queue.send(99, Timeout::NO_WAIT), Status::Timeout);
    for i in 0..5 {
        assert_eq!(queue.receive(Timeout::NO_WAIT), (Status::Success, Some(i)));
    }
}

#[test]
fn event_flags_wait_all_needs_every_requested_bit() {
    let flags = EventFlags::new().unwrap();
    flags.set(0x01);
    flags.set(0x02);
    assert_eq!(
        flags.wait(0x07, EventWaitOptions::ALL, Timeout::NO_WAIT),
        (Status::Timeout, None)
    );
    flags.set(0x04);
    assert_eq!(
        flags.wait(0x07, EventWaitOptions::ALL, Timeout::NO_WAIT),
        (Status::Success, Some(0x07))
    );
}

#[test]
fn event_flags_cross_thread_signal_wakes_waiter_in_about_fifty_ms() {
    let flags = Arc::new(EventFlags::new().unwrap());
    let setter = Arc::clone(&flags);
    let start = Instant::now();
    let handle = Thread::spawn(ThreadAttr::default(), move || {
        std::thread::sleep(std::time::Duration::from_millis(50));
        setter.set(0x01);
        0
    })
    .unwrap();

    let (status, observed) = flags.wait(0x01, EventWaitOptions::ANY, Timeout::WAIT_FOREVER);
    assert_eq!(status, Status::Success);
    assert_eq!(observed, Some(0x01));
    let elapsed = start.elapsed().as_millis() as i64;
    assert!((20..=130).contains(&elapsed), "elapsed={elapsed}");
    assert_eq!(handle.join(), Ok(0));
}

#[test]
fn finite_timeout_waits_at_least_the_requested_duration() {
    let mutex = Mutex::new(MutexAttr::default()).unwrap();
    assert_eq!(mutex.lock(Timeout::WAIT_FOREVER), Status::Success);

    let start = Instant::now();
    assert_eq!(mutex.lock(Timeout::from_millis(10)), Status::Timeout);
    let elapsed = start.elapsed().as_millis();
    assert!(elapsed >= 10, "elapsed={elapsed}");

    assert_eq!(mutex.unlock(), Status::Success);
}

#[test]
fn unix_time_is_after_the_year_2020() {
    let now = osal::time::get_unix_time().expect("hosted back-end always reports wall-clock time");
    assert!(now.secs > 1_577_836_800);
}
