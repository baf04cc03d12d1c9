use std::sync::Once;

use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVE: &str = "pinbar=info";

static INIT: Once = Once::new();

/// Installs the global subscriber once; later calls are no-ops. `RUST_LOG`
/// overrides the default `pinbar=info` filter.
pub fn init() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));
        install(filter);
    });
}

#[cfg(not(target_arch = "wasm32"))]
fn install(filter: EnvFilter) {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

#[cfg(target_arch = "wasm32")]
fn install(filter: EnvFilter) {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(console::ConsoleWriter::default)
        .with_ansi(false)
        .without_time()
        .try_init();
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

#[cfg(target_arch = "wasm32")]
mod console {
    use std::io::{self, Write};

    /// Buffers one formatted event and flushes it to the browser console.
    #[derive(Default)]
    pub struct ConsoleWriter {
        buffer: Vec<u8>,
    }

    impl Write for ConsoleWriter {
        fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
            self.buffer.extend_from_slice(bytes);
            Ok(bytes.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Drop for ConsoleWriter {
        fn drop(&mut self) {
            let line = String::from_utf8_lossy(&self.buffer);
            let line = line.trim_end();
            if !line.is_empty() {
                web_sys::console::log_1(&line.into());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init();
        init();
        tracing::info!("logging initialised twice without panicking");
    }
}
