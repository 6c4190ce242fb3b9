// src/exec/capture.rs

//! Merged stdout/stderr capture.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const CHUNK: usize = 8 * 1024;

/// Shared byte buffer fed by one reader task per stream.
///
/// Chunks are appended in arrival order, so interleaving between the two
/// streams is only as precise as the OS pipe scheduling.
#[derive(Debug, Default)]
pub struct MergedOutput {
    buffer: Arc<Mutex<Vec<u8>>>,
    readers: Vec<JoinHandle<()>>,
}

impl MergedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start draining `stream` into the shared buffer.
    pub fn attach<R>(&mut self, stream: R, label: &'static str)
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let buffer = Arc::clone(&self.buffer);
        self.readers.push(tokio::spawn(async move {
            pump(stream, buffer, label).await;
        }));
    }

    /// Wait for the readers to hit EOF, giving up after `grace`.
    ///
    /// A killed process can leave grandchildren holding the pipe open, so
    /// readers that have not finished by then are aborted.
    pub async fn finish(self, grace: Duration) -> String {
        let deadline = tokio::time::Instant::now() + grace;
        for mut reader in self.readers {
            match tokio::time::timeout_at(deadline, &mut reader).await {
                Ok(_) => {}
                Err(_) => {
                    debug!("output reader still open after grace period; aborting");
                    reader.abort();
                }
            }
        }

        let bytes = match self.buffer.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

async fn pump<R>(mut stream: R, buffer: Arc<Mutex<Vec<u8>>>, label: &'static str)
where
    R: AsyncRead + Unpin,
{
    let mut chunk = vec![0u8; CHUNK];
    loop {
        match stream.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => match buffer.lock() {
                Ok(mut guard) => guard.extend_from_slice(&chunk[..n]),
                Err(poisoned) => poisoned.into_inner().extend_from_slice(&chunk[..n]),
            },
            Err(e) => {
                warn!(stream = label, error = %e, "error reading process output");
                break;
            }
        }
    }
}
