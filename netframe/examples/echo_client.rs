/// Echo client: connects to 127.0.0.1:7878, sends a handful of
/// `DemoMessage`s, and prints each echo as it comes back.
use netframe::demo_message::{self, DemoMessage};
use netframe::prelude::*;
use netframe_core::endpoint::EndpointCfg;
use netframe_core::socket_options::SocketOptionsCfg;
use netframe_core::stats::NoOpStats;
use std::sync::{mpsc, Arc};
use std::time::Duration;

struct PrintConsumer {
    tx: mpsc::Sender<DemoMessage>,
}

impl MessageConsumer for PrintConsumer {
    fn on_message(&mut self, carrier: MessageCarrier, _entry: &Entry) {
        if let Ok(msg) = carrier.downcast::<DemoMessage>() {
            let _ = self.tx.send(msg);
        }
    }
}

struct LogShutdown;

impl EntryShutdownHandler for LogShutdown {
    fn on_shutdown(&mut self, reason: EntryShutdownReason) {
        tracing::info!(%reason, "connection closed");
    }
}

fn main() {
    netframe::dev_tracing::init();

    compio::runtime::Runtime::new().unwrap().block_on(async {
        let endpoint = EndpointCfg::new("127.0.0.1", 7878);
        let stream = Connector::new(endpoint, SocketOptionsCfg::default())
            .connect()
            .await
            .expect("connect");

        let mut dispatch = Dispatch::new();
        dispatch.register(demo_message::decoder());

        let (tx, rx) = mpsc::channel();

        let entry = Entry::new(
            stream,
            None,
            EntryCfg::default(),
            dispatch,
            Arc::new(NoOpStats),
            Box::new(PrintConsumer { tx }),
            Box::new(LogShutdown),
        );

        for i in 0..5u32 {
            entry.send(&DemoMessage {
                req_id: i,
                payload: format!("ping {i}").into_bytes(),
            });
            match rx.recv_timeout(Duration::from_secs(5)) {
                Ok(echo) => tracing::info!(req_id = echo.req_id, "got echo"),
                Err(_) => {
                    tracing::warn!("timed out waiting for echo");
                    break;
                }
            }
        }

        entry.shutdown(EntryShutdownReason::UserInitiated);
    });
}
