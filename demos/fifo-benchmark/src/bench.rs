use std::collections::VecDeque;
use std::hint::black_box;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use criterion::{Criterion, criterion_group, criterion_main};
use splitq::Queue;

const PAIRS: &[usize] = &[1, 2, 4, 8];

type BenchFn = fn(usize) -> Duration;
type ContendedFn = fn(usize, usize) -> Duration;

trait Fifo<T>: Default + Sync {
    fn push(&self, value: T);
    fn pop(&self) -> Option<T>;
}

impl<T: Send> Fifo<T> for Queue<T> {
    fn push(&self, value: T) {
        self.enqueue(value)
    }

    fn pop(&self) -> Option<T> {
        self.dequeue()
    }
}

/// The single-lock baseline the split locks are measured against.
#[derive(Default)]
struct Coarse<T>(Mutex<VecDeque<T>>);

impl<T: Send> Fifo<T> for Coarse<T> {
    fn push(&self, value: T) {
        self.0.lock().unwrap().push_back(value)
    }

    fn pop(&self) -> Option<T> {
        self.0.lock().unwrap().pop_front()
    }
}

fn enqueue<Q: Fifo<u64>>(iters: usize) -> Duration {
    let input = std::iter::repeat_with(|| fastrand::u64(..))
        .take(iters)
        .collect::<Vec<_>>();
    let q = Q::default();

    let now = Instant::now();
    for &value in &input {
        q.push(black_box(value));
    }
    now.elapsed()
}

fn dequeue<Q: Fifo<u64>>(iters: usize) -> Duration {
    let q = Q::default();
    for _ in 0..iters {
        q.push(fastrand::u64(..));
    }

    let now = Instant::now();
    for _ in 0..iters {
        black_box(q.pop());
    }
    now.elapsed()
}

fn ping_pong<Q: Fifo<u64>>(iters: usize, pairs: usize) -> Duration {
    let per = iters.div_ceil(pairs);
    let total = per * pairs;
    let q = Q::default();
    let popped = AtomicUsize::new(0);

    let now = Instant::now();
    std::thread::scope(|cx| {
        for _ in 0..pairs {
            let q = &q;
            cx.spawn(move || {
                for i in 0..per {
                    q.push(black_box(i as u64));
                }
            });
        }
        for _ in 0..pairs {
            let (q, popped) = (&q, &popped);
            cx.spawn(move || {
                while popped.load(Ordering::Relaxed) < total {
                    if black_box(q.pop()).is_some() {
                        popped.fetch_add(1, Ordering::Relaxed);
                    } else {
                        std::thread::yield_now();
                    }
                }
            });
        }
    });
    now.elapsed()
}

fn groups(c: &mut Criterion) {
    let mut g = c.benchmark_group("fifo_benchmark");

    for (name, f) in [
        ("enqueue_splitq", enqueue::<Queue<u64>> as BenchFn),
        ("enqueue_coarse", enqueue::<Coarse<u64>> as BenchFn),
        ("dequeue_splitq", dequeue::<Queue<u64>> as BenchFn),
        ("dequeue_coarse", dequeue::<Coarse<u64>> as BenchFn),
    ] {
        let id = format!("fifo_benchmark_{name}");
        g.bench_function(&id, |b| b.iter_custom(|iters| f(iters as usize)));
    }

    for (i, pairs) in PAIRS.iter().copied().enumerate() {
        for (name, f) in [
            ("splitq", ping_pong::<Queue<u64>> as ContendedFn),
            ("coarse", ping_pong::<Coarse<u64>> as ContendedFn),
        ] {
            let id = format!("fifo_benchmark_{i:02}_pingpong_{pairs}x{pairs}_{name}");
            g.bench_function(&id, |b| b.iter_custom(|iters| f(iters as usize, pairs)));
        }
    }
}

criterion_group!(
    name = fifo_benchmark;
    config = Criterion::default().sample_size(50);
    targets = groups
);
criterion_main!(fifo_benchmark);
