//! Scheduler stress and liveness tests
//!
//! These tests verify the quiescence protocol at scale:
//! - The clock advances exactly once per cycle no matter how many tasks
//!   reach the stall together
//! - The spawning thread's liveness holds the clock while tasks start up
//! - Tasks blocked on channels count toward quiescence
//! - A task that never blocks keeps virtual time frozen

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use brook_core::sched::{sim_channel, spawn_task, SimScheduler};

#[test]
fn hundred_sleepers_advance_in_lockstep() {
    let sched = Arc::new(SimScheduler::new());
    let root = sched.root_token();
    let handles: Vec<_> = (0..100)
        .map(|i| {
            let task_sched = Arc::clone(&sched);
            spawn_task(&sched, &format!("sleeper-{i}"), move |token| {
                for _ in 0..20 {
                    task_sched.sleep(token, 1);
                }
                task_sched.elapsed_seconds()
            })
            .unwrap()
        })
        .collect();

    for handle in handles {
        // Every task wakes from its final sleep at the same second.
        assert_eq!(handle.join(&*sched, root).unwrap(), 20);
    }
    assert_eq!(sched.elapsed_seconds(), 20);
    // Only the root task remains.
    assert_eq!(sched.live_tasks(), 1);
}

#[test]
fn early_sleepers_cannot_outrun_the_spawning_thread() {
    // The first workers reach their sleeps long before the last one is
    // spawned. The root task stays live across the whole spawn loop, so
    // not a single tick may fire until it blocks in the joins; otherwise
    // early sleepers would burn seconds alone and the cohort would
    // scatter across different wake times.
    let sched = Arc::new(SimScheduler::new());
    let root = sched.root_token();
    let handles: Vec<_> = (0..64)
        .map(|i| {
            let task_sched = Arc::clone(&sched);
            spawn_task(&sched, &format!("worker-{i}"), move |token| {
                task_sched.sleep(token, 10);
                task_sched.elapsed_seconds()
            })
            .unwrap()
        })
        .collect();

    assert_eq!(sched.elapsed_seconds(), 0, "clock moved during spawning");
    for handle in handles {
        assert_eq!(handle.join(&*sched, root).unwrap(), 10);
    }
    assert_eq!(sched.elapsed_seconds(), 10);
}

#[test]
fn mixed_sleep_durations_still_tick_one_second_at_a_time() {
    let sched = Arc::new(SimScheduler::new());
    let root = sched.root_token();
    let handles: Vec<_> = (0..30)
        .map(|i| {
            let task_sched = Arc::clone(&sched);
            let stride = i % 3 + 1;
            spawn_task(&sched, &format!("strider-{i}"), move |token| {
                while task_sched.elapsed_seconds() < 30 {
                    task_sched.sleep(token, stride);
                }
            })
            .unwrap()
        })
        .collect();

    for handle in handles {
        handle.join(&*sched, root).unwrap();
    }
    // The longest stride can overshoot the threshold by at most 2.
    let elapsed = sched.elapsed_seconds();
    assert!((30..=32).contains(&elapsed), "elapsed = {elapsed}");
}

#[test]
fn channel_waiters_count_as_stalled() {
    let sched = Arc::new(SimScheduler::new());
    let root = sched.root_token();
    let (tx, rx) = sim_channel::<u64>(&sched, 1);

    let consumer = spawn_task(&sched, "consumer", move |token| {
        // Blocks immediately; the producer's sleeps must still tick.
        rx.recv(token).unwrap()
    })
    .unwrap();

    let producer_sched = Arc::clone(&sched);
    let producer = spawn_task(&sched, "producer", move |token| {
        producer_sched.sleep(token, 5);
        tx.send(token, producer_sched.elapsed_seconds()).unwrap();
    })
    .unwrap();

    producer.join(&*sched, root).unwrap();
    assert_eq!(consumer.join(&*sched, root).unwrap(), 5);
    assert_eq!(sched.elapsed_seconds(), 5);
}

#[test]
fn a_spinning_task_freezes_virtual_time() {
    let sched = Arc::new(SimScheduler::new());
    let root = sched.root_token();
    let stop = Arc::new(AtomicBool::new(false));

    let spinner_stop = Arc::clone(&stop);
    let spinner = spawn_task(&sched, "spinner", move |_token| {
        // Registered but never blocked: the system can never stall.
        while !spinner_stop.load(Ordering::Acquire) {
            std::hint::spin_loop();
        }
    })
    .unwrap();

    let sleeper_sched = Arc::clone(&sched);
    let sleeper = spawn_task(&sched, "sleeper", move |token| {
        sleeper_sched.sleep(token, 1);
    })
    .unwrap();

    // The harness thread steps aside so the spinner is the only unblocked
    // task left, and is therefore what holds the clock.
    sched.enter_blocked(root);
    assert!(!sched.try_await_global_stall(Duration::from_millis(200)));
    assert_eq!(sched.elapsed_seconds(), 0);
    sched.exit_blocked(root);

    stop.store(true, Ordering::Release);
    spinner.join(&*sched, root).unwrap();
    sleeper.join(&*sched, root).unwrap();
    assert_eq!(sched.elapsed_seconds(), 1);
}
