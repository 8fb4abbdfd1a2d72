//! Throughput benchmark: round-trip `DemoMessage`s over a loopback `Entry`
//! pair at a range of payload sizes.
//!
//! Setup overhead (bind/accept/connect) is included but amortized over
//! `MESSAGE_COUNT` round trips per sample.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use netframe::demo_message::{self, DemoMessage};
use netframe::prelude::*;
use netframe_core::endpoint::EndpointCfg;
use netframe_core::socket_options::SocketOptionsCfg;
use netframe_core::stats::NoOpStats;
use std::sync::{mpsc, Arc};

const MESSAGE_SIZES: &[usize] = &[64, 256, 1024, 4096, 16384];
const MESSAGE_COUNT: usize = 2_000;

struct EchoBack;
impl MessageConsumer for EchoBack {
    fn on_message(&mut self, carrier: MessageCarrier, entry: &Entry) {
        if let Ok(msg) = carrier.downcast::<DemoMessage>() {
            entry.send(&msg);
        }
    }
}

struct RecordRoundTrip {
    tx: mpsc::Sender<u32>,
}
impl MessageConsumer for RecordRoundTrip {
    fn on_message(&mut self, carrier: MessageCarrier, _entry: &Entry) {
        if let Ok(msg) = carrier.downcast::<DemoMessage>() {
            let _ = self.tx.send(msg.req_id);
        }
    }
}

struct NoopShutdown;
impl EntryShutdownHandler for NoopShutdown {
    fn on_shutdown(&mut self, _reason: EntryShutdownReason) {}
}

fn entry_round_trip_throughput(c: &mut Criterion) {
    netframe::dev_tracing::init();
    let mut group = c.benchmark_group("throughput/entry/round_trip");
    group.measurement_time(std::time::Duration::from_secs(10));
    group.sample_size(10);

    // Creating/dropping many io_uring runtimes can exhaust kernel resources;
    // reuse one runtime across all iterations of this benchmark.
    let rt = compio::runtime::Runtime::new().unwrap();

    for &size in MESSAGE_SIZES {
        group.throughput(Throughput::Bytes((size * MESSAGE_COUNT) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let payload = vec![0u8; size];

            b.iter(|| {
                rt.block_on(async {
                    let endpoint = EndpointCfg::new("127.0.0.1", 0);
                    let acceptor = Acceptor::bind(&endpoint, SocketOptionsCfg::default())
                        .await
                        .unwrap();
                    let addr = acceptor.local_addr().unwrap();

                    let server_task = compio::runtime::spawn(async move {
                        let (stream, _) = acceptor.accept().await.unwrap();
                        let mut dispatch = Dispatch::new();
                        dispatch.register(demo_message::decoder());
                        Entry::new(
                            stream,
                            None,
                            EntryCfg::default(),
                            dispatch,
                            Arc::new(NoOpStats),
                            Box::new(EchoBack),
                            Box::new(NoopShutdown),
                        )
                    });

                    let stream = compio::net::TcpStream::connect(addr).await.unwrap();
                    let mut client_dispatch = Dispatch::new();
                    client_dispatch.register(demo_message::decoder());
                    let (tx, rx) = mpsc::channel();
                    let client = Entry::new(
                        stream,
                        None,
                        EntryCfg::default(),
                        client_dispatch,
                        Arc::new(NoOpStats),
                        Box::new(RecordRoundTrip { tx }),
                        Box::new(NoopShutdown),
                    );
                    let server = server_task.await;

                    for i in 0..MESSAGE_COUNT as u32 {
                        client.send(&DemoMessage {
                            req_id: i,
                            payload: black_box(payload.clone()),
                        });
                        rx.recv().unwrap();
                    }

                    drop(server);
                    drop(client);
                });
            });
        });
    }
    group.finish();
}

criterion_group!(benches, entry_round_trip_throughput);
criterion_main!(benches);
