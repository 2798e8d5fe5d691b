// SPDX-License-Identifier: AGPL-3.0
// Sharesink Core - Transfer engine
//
// Copies a resolved source stream into a destination opened by the host.
// Both streams are owned by the copy and released on every exit path.
// A failed copy leaves whatever was already written at the destination.

use crate::provider::ContentProvider;
use crate::resolver;
use crate::types::{AppError, ResourceRef};
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};

/// Read chunk size for the copy loop
pub const BUFFER_SIZE: usize = 1024;

/// Copy every byte from `source` to `destination`, returning the byte count
pub fn try_copy<R: Read, W: Write>(source: R, destination: W) -> Result<u64, AppError> {
    let mut reader = BufReader::new(source);
    let mut writer = BufWriter::new(destination);
    let mut buf = [0u8; BUFFER_SIZE];
    let mut total: u64 = 0;

    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(AppError::Io(format!("Read failed after {} bytes: {}", total, e))),
        };

        writer
            .write_all(&buf[..n])
            .map_err(|e| AppError::Io(format!("Write failed after {} bytes: {}", total, e)))?;
        total += n as u64;
    }

    writer
        .flush()
        .map_err(|e| AppError::Io(format!("Flush failed: {}", e)))?;

    Ok(total)
}

/// Copy `source` into `destination`, reporting only success or failure
pub fn copy<R: Read, W: Write>(source: R, destination: W) -> bool {
    match try_copy(source, destination) {
        Ok(bytes) => {
            tracing::info!("Copied {} bytes", bytes);
            true
        }
        Err(e) => {
            tracing::error!("Copy failed: {}", e);
            false
        }
    }
}

/// Resolve `source` and copy it into `destination`
pub fn save_file_to_file(
    provider: &dyn ContentProvider,
    source: &ResourceRef,
    destination: &ResourceRef,
) -> bool {
    let input = match resolver::open_source_stream(provider, source) {
        Ok(stream) => stream,
        Err(e) => {
            tracing::error!("Cannot read {}: {}", source, e);
            return false;
        }
    };

    let output = match provider.open_output(destination) {
        Ok(stream) => stream,
        Err(e) => {
            tracing::error!("Cannot open {} for writing: {}", destination, e);
            return false;
        }
    };

    tracing::info!("Saving {} to {}", source, destination);
    copy(input, output)
}

/// Write `content` as UTF-8 into `destination`
pub fn save_text_to_file(
    provider: &dyn ContentProvider,
    destination: &ResourceRef,
    content: &str,
) -> bool {
    let output = match provider.open_output(destination) {
        Ok(stream) => stream,
        Err(e) => {
            tracing::error!("Cannot open {} for writing: {}", destination, e);
            return false;
        }
    };

    tracing::info!("Saving {} bytes of text to {}", content.len(), destination);
    copy(content.as_bytes(), output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        BrokenReader, Call, CloseCounter, Entry, MockProvider, TrackedReader, TrackedWriter,
    };
    use std::io::Cursor;
    use std::sync::atomic::Ordering;
    use std::sync::{Arc, Mutex};

    fn round_trip(data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        assert!(copy(Cursor::new(data.to_vec()), &mut out));
        out
    }

    #[test]
    fn test_copy_preserves_content() {
        assert_eq!(round_trip(b""), b"");
        assert_eq!(round_trip(&[0x42]), vec![0x42]);

        let exact: Vec<u8> = (0..BUFFER_SIZE).map(|i| i as u8).collect();
        assert_eq!(round_trip(&exact), exact);

        let large: Vec<u8> = (0..3 * 1024 * 1024 + 17).map(|i| (i * 31 % 251) as u8).collect();
        assert_eq!(round_trip(&large), large);
    }

    #[test]
    fn test_try_copy_reports_byte_count() {
        let mut out = Vec::new();
        let n = try_copy(Cursor::new(vec![1u8; 5000]), &mut out).unwrap();
        assert_eq!(n, 5000);
    }

    #[test]
    fn test_write_failure_closes_both_streams_once() {
        let source_closes = CloseCounter::default();
        let dest_closes = CloseCounter::default();
        let sink = Arc::new(Mutex::new(Vec::new()));

        let reader = TrackedReader::new(Cursor::new(vec![7u8; 64 * 1024]), source_closes.clone());
        let bytes_read = reader.bytes_read.clone();
        let writer = TrackedWriter::new(sink.clone(), dest_closes.clone()).failing_after(10_000);

        assert!(!copy(reader, writer));
        assert!(bytes_read.load(Ordering::SeqCst) > 0);
        assert_eq!(source_closes.count(), 1);
        assert_eq!(dest_closes.count(), 1);
        // Partial output stays where it was written
        assert!(!sink.lock().unwrap().is_empty());
    }

    #[test]
    fn test_read_failure_closes_destination() {
        let dest_closes = CloseCounter::default();
        let sink = Arc::new(Mutex::new(Vec::new()));
        let writer = TrackedWriter::new(sink, dest_closes.clone());

        assert!(!copy(BrokenReader::new(3000), writer));
        assert_eq!(dest_closes.count(), 1);
    }

    #[test]
    fn test_flush_failure_is_reported() {
        let dest_closes = CloseCounter::default();
        let writer = TrackedWriter::new(Arc::new(Mutex::new(Vec::new())), dest_closes.clone())
            .failing_on_flush();

        assert!(!copy(Cursor::new(b"short".to_vec()), writer));
        assert_eq!(dest_closes.count(), 1);
    }

    #[test]
    fn test_save_file_to_file() {
        let provider = MockProvider::new().with("file:///in.bin", Entry::file(b"payload"));
        assert!(save_file_to_file(&provider, &"file:///in.bin".into(), &"file:///out.bin".into()));
        assert_eq!(provider.output("file:///out.bin").unwrap(), b"payload");
        assert_eq!(provider.source_closes.count(), 1);
        assert_eq!(provider.destination_closes.count(), 1);
    }

    #[test]
    fn test_save_virtual_document_exports_first_type() {
        let provider = MockProvider::new().with(
            "content://docs/document/9",
            Entry::virtual_document(&[("image/png", "png"), ("image/jpeg", "jpeg")]),
        );
        assert!(save_file_to_file(
            &provider,
            &"content://docs/document/9".into(),
            &"file:///out.png".into()
        ));
        assert_eq!(provider.output("file:///out.png").unwrap(), b"png");
    }

    #[test]
    fn test_empty_export_list_never_opens_destination() {
        let provider = MockProvider::new().with("content://docs/document/3", Entry::virtual_document(&[]));
        assert!(!save_file_to_file(
            &provider,
            &"content://docs/document/3".into(),
            &"file:///out".into()
        ));
        assert!(!provider.opened_output());
        assert!(provider.output("file:///out").is_none());
    }

    #[test]
    fn test_missing_source_never_opens_destination() {
        let provider = MockProvider::new();
        assert!(!save_file_to_file(&provider, &"file:///gone".into(), &"file:///out".into()));
        assert_eq!(provider.calls(), vec![Call::OpenInput("file:///gone".into())]);
    }

    #[test]
    fn test_mid_copy_failure_closes_provider_streams() {
        let mut provider = MockProvider::new().with("file:///big", Entry::file(&vec![1u8; 20_000]));
        provider.output_fail_after = Some(4096);

        assert!(!save_file_to_file(&provider, &"file:///big".into(), &"file:///out".into()));
        assert_eq!(provider.source_closes.count(), 1);
        assert_eq!(provider.destination_closes.count(), 1);
    }

    #[test]
    fn test_save_text_to_file() {
        let provider = MockProvider::new();
        assert!(save_text_to_file(&provider, &"file:///text.txt".into(), "hello"));
        let bytes = provider.output("file:///text.txt").unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "hello");
    }

    #[test]
    fn test_save_text_keeps_multibyte_characters() {
        let provider = MockProvider::new();
        assert!(save_text_to_file(&provider, &"file:///t.txt".into(), "olá, 世界"));
        assert_eq!(provider.output("file:///t.txt").unwrap(), "olá, 世界".as_bytes());
    }
}
