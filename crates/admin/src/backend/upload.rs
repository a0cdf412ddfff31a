//! Streaming image upload body with progress reporting.

use axum::body::Bytes;
use blessed_core::media::progress_percent;
use futures::{Stream, StreamExt, stream};

/// Bytes handed to the backend per chunk.
pub const UPLOAD_CHUNK_SIZE: usize = 16 * 1024;

/// An image received from the admin form.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

/// Split `bytes` into chunks, calling `on_progress` with the running
/// percentage as each chunk is pulled by the HTTP client.
pub fn progress_stream<F>(
    bytes: Bytes,
    on_progress: F,
) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Send + 'static
where
    F: Fn(u8) + Send + Sync + 'static,
{
    let total = bytes.len() as u64;
    let chunks: Vec<Bytes> = (0..bytes.len())
        .step_by(UPLOAD_CHUNK_SIZE)
        .map(|start| bytes.slice(start..bytes.len().min(start + UPLOAD_CHUNK_SIZE)))
        .collect();

    let mut sent = 0u64;
    stream::iter(chunks).map(move |chunk| {
        sent += chunk.len() as u64;
        on_progress(progress_percent(sent, total));
        Ok(chunk)
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[test]
    fn test_progress_reaches_100_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let bytes = Bytes::from(vec![7u8; UPLOAD_CHUNK_SIZE * 3 + 10]);

        let chunks: Vec<_> = futures::executor::block_on(
            progress_stream(bytes, move |pct| sink.lock().unwrap().push(pct)).collect(),
        );

        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks.last().unwrap().as_ref().unwrap().len(), 10);
        let seen = seen.lock().unwrap();
        assert_eq!(*seen, vec![33, 67, 100, 100]);
    }

    #[test]
    fn test_small_file_is_one_chunk() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let chunks: Vec<_> = futures::executor::block_on(
            progress_stream(Bytes::from_static(b"png"), move |pct| {
                sink.lock().unwrap().push(pct);
            })
            .collect(),
        );
        assert_eq!(chunks.len(), 1);
        assert_eq!(*seen.lock().unwrap(), vec![100]);
    }
}
