use super::*;
use std::sync::Arc;

#[test]
fn items_come_out_in_fifo_order() {
    let q = WorkQueue::default();
    for i in 0..5 {
        q.enqueue(i).unwrap();
    }
    assert_eq!(q.len(), 5);
    let out: Vec<_> = (0..5).filter_map(|_| q.dequeue_blocking()).collect();
    assert_eq!(out, vec![0, 1, 2, 3, 4]);
    assert!(q.is_empty());
    assert_eq!(q.try_dequeue(), None);
}

#[test]
fn blocked_consumer_wakes_on_enqueue() {
    let q = Arc::new(WorkQueue::new(QueueOpts {
        spin_checks: 0,
        idle_wait_ms: 1000,
    }));
    let consumer = {
        let q = Arc::clone(&q);
        std::thread::spawn(move || q.dequeue_blocking())
    };
    std::thread::sleep(Duration::from_millis(20));
    q.enqueue("job").unwrap();
    assert_eq!(consumer.join().unwrap(), Some("job"));
}

#[test]
fn concurrent_producers_keep_per_producer_order() {
    let q = Arc::new(WorkQueue::default());
    let producers: Vec<_> = (0..4u32)
        .map(|p| {
            let q = Arc::clone(&q);
            std::thread::spawn(move || {
                for i in 0..100u32 {
                    q.enqueue((p, i)).unwrap();
                }
            })
        })
        .collect();
    for h in producers {
        h.join().unwrap();
    }
    q.close();

    let mut last = [None::<u32>; 4];
    let mut n = 0;
    while let Some((p, i)) = q.dequeue_blocking() {
        assert!(last[p as usize].is_none_or(|prev| prev < i));
        last[p as usize] = Some(i);
        n += 1;
    }
    assert_eq!(n, 400);
}

#[test]
fn close_drains_then_rejects() {
    let q = WorkQueue::default();
    q.enqueue(1).unwrap();
    q.close();
    assert!(q.is_closed());
    assert!(matches!(q.enqueue(2), Err(OrrbError::Shutdown(_))));
    assert_eq!(q.dequeue_blocking(), Some(1));
    assert_eq!(q.dequeue_blocking(), None);
}

#[test]
fn close_releases_a_parked_consumer() {
    let q = Arc::new(WorkQueue::<u8>::new(QueueOpts {
        spin_checks: 1,
        idle_wait_ms: 5_000,
    }));
    let consumer = {
        let q = Arc::clone(&q);
        std::thread::spawn(move || q.dequeue_blocking())
    };
    std::thread::sleep(Duration::from_millis(20));
    q.close();
    assert_eq!(consumer.join().unwrap(), None);
}
