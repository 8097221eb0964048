//! Event bus throughput: frames published through the full dispatch path.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use coach_client::events::{CoachEvent, CoachEventKind, TelemetryFramePayload};
use coach_core::TelemetryFrame;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use eventbus::{EventBus, EventBusConfig, EventHandler, HandlerContext, HandlerError};
use uuid::Uuid;

/// Subscriber that only counts deliveries.
struct CountingHandler {
    count: Arc<AtomicU64>,
}

#[async_trait]
impl EventHandler<CoachEvent> for CountingHandler {
    fn name(&self) -> &'static str {
        "CountingHandler"
    }

    async fn handle(
        &self,
        _event: &CoachEvent,
        _ctx: &HandlerContext<CoachEvent>,
    ) -> Result<(), HandlerError> {
        self.count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

async fn pump_frames(subscribers: usize, frames: u64) {
    let bus: EventBus<CoachEvent> = EventBus::with_config(EventBusConfig {
        queue_capacity: 10_000,
        ..Default::default()
    });

    let count = Arc::new(AtomicU64::new(0));
    for _ in 0..subscribers {
        bus.subscribe(
            CoachEventKind::TelemetryFrame,
            Arc::new(CountingHandler {
                count: count.clone(),
            }),
        );
    }
    bus.start();

    let session_id = Uuid::new_v4();
    for i in 0..frames {
        let frame = TelemetryFrame {
            session_time: i as f64 / 60.0,
            speed: 50.0,
            ..Default::default()
        };
        bus.publish(CoachEvent::TelemetryFrame(TelemetryFramePayload {
            frame,
            session_id,
        }))
        .await
        .expect("publish failed");
    }
    bus.stop().await;

    assert_eq!(count.load(Ordering::Relaxed), frames * subscribers as u64);
}

fn bench_event_throughput(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("runtime");

    let mut group = c.benchmark_group("event_throughput");
    const FRAMES: u64 = 5_000;
    group.throughput(Throughput::Elements(FRAMES));

    for subscribers in [1usize, 4] {
        group.bench_with_input(
            BenchmarkId::from_parameter(subscribers),
            &subscribers,
            |b, &subscribers| {
                b.iter(|| runtime.block_on(pump_frames(subscribers, FRAMES)));
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_event_throughput);
criterion_main!(benches);
