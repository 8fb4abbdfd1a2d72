/// Echo server: binds on 127.0.0.1:7878 and echoes every `DemoMessage` it
/// receives back to the sender until the connection closes.
use netframe::demo_message::{self, DemoMessage};
use netframe::prelude::*;
use netframe_core::endpoint::EndpointCfg;
use netframe_core::socket_options::SocketOptionsCfg;
use netframe_core::stats::NoOpStats;
use std::sync::Arc;

struct EchoConsumer;

impl MessageConsumer for EchoConsumer {
    fn on_message(&mut self, carrier: MessageCarrier, entry: &Entry) {
        if let Ok(msg) = carrier.downcast::<DemoMessage>() {
            entry.send(&msg);
        }
    }
}

struct LogShutdown {
    remote: Option<String>,
}

impl EntryShutdownHandler for LogShutdown {
    fn on_shutdown(&mut self, reason: EntryShutdownReason) {
        tracing::info!(remote = ?self.remote, %reason, "connection closed");
    }
}

fn main() {
    netframe::dev_tracing::init();

    compio::runtime::Runtime::new().unwrap().block_on(async {
        let endpoint = EndpointCfg::new("127.0.0.1", 7878);
        let acceptor = Acceptor::bind(&endpoint, SocketOptionsCfg::default())
            .await
            .expect("bind");
        tracing::info!(addr = %acceptor.local_addr().unwrap(), "echo server listening");

        // Entries are kept strong-referenced here for as long as their
        // connection is open; dropping the last `Entry` handle tears the
        // strand down even if the underlying socket is still readable.
        let mut entries: Vec<Entry> = Vec::new();

        loop {
            let (stream, addr) = match acceptor.accept().await {
                Ok(pair) => pair,
                Err(e) => {
                    tracing::warn!(error = %e, "accept failed");
                    continue;
                }
            };
            tracing::info!(%addr, "accepted connection");

            let mut dispatch = Dispatch::new();
            dispatch.register(demo_message::decoder());

            let entry = Entry::new(
                stream,
                Some(addr.to_string()),
                EntryCfg::default(),
                dispatch,
                Arc::new(NoOpStats),
                Box::new(EchoConsumer),
                Box::new(LogShutdown {
                    remote: Some(addr.to_string()),
                }),
            );
            entries.push(entry);
        }
    });
}
