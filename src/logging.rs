use tracing::Subscriber;
use tracing_subscriber::{
    fmt::MakeWriter, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// `RUST_LOG` wins when set; otherwise the crate logs at info (debug with
/// `verbose`) and hyper at info. Logs go to stderr; stdout carries only
/// program output.
pub fn init(verbose: bool) {
    subscriber(verbose, std::io::stderr).init();
}

/// The subscriber `init` installs, writing to `writer`.
pub fn subscriber<W>(verbose: bool, writer: W) -> impl Subscriber + Send + Sync
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let crate_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("daisy_chain={},hyper=info", crate_level))
    });

    tracing_subscriber::registry().with(filter).with(
        tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_target(false)
            .compact(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_events_go_to_the_given_writer() {
        let captured = Captured::default();
        let sink = captured.clone();

        tracing::subscriber::with_default(subscriber(false, move || sink.clone()), || {
            tracing::warn!("launch failed, continuing");
        });

        let text = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(text.contains("launch failed, continuing"));
    }
}
