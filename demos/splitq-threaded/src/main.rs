use anyhow::{Result, anyhow};
use argh::FromArgs;
use splitq::Queue;

#[derive(Debug, FromArgs)]
/// Threaded order feed on a shared FIFO queue
#[argh(help_triggers("--help"))]
struct Args {
    /// number of producer threads
    #[argh(option, arg_name = "int", default = "5")]
    producers: usize,
    /// orders submitted by each producer
    #[argh(option, arg_name = "int", default = "3")]
    orders: usize,
}

pub fn main() -> Result<()> {
    let args = argh::from_env::<Args>();
    tracing_subscriber::fmt()
        .with_thread_names(true)
        .without_time()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    if args.producers == 0 {
        return Err(anyhow!("producers must not be zero"));
    }

    let q = Queue::new();

    // A round of sequential calls first.
    q.enqueue(10);
    q.enqueue(20);
    q.enqueue(30);
    tracing::info!("seeded queue, len={}", q.len());

    if let Some(front) = q.peek() {
        tracing::info!("peeked front, value={front}");
    }
    if let Some(value) = q.dequeue() {
        tracing::info!("dequeued, value={value}");
    }
    if let Some(value) = q.dequeue() {
        tracing::info!("dequeued, value={value}");
    }
    tracing::info!("after two dequeues, len={}", q.len());

    // Then a burst of concurrent submissions.
    let orders = args.orders;
    std::thread::scope(|cx| {
        for t in 0..args.producers {
            let q = &q;
            cx.spawn(move || {
                for i in 0..orders {
                    let id = (t * orders + i + 1) * 100;
                    q.enqueue(id);
                    tracing::info!("submitted order, id={id}");
                }
            });
        }
    });
    tracing::info!("all producers finished, len={}", q.len());

    while let Some(id) = q.dequeue() {
        tracing::info!("drained order, id={id}");
    }
    tracing::info!("queue drained, len={}", q.len());

    Ok(())
}
