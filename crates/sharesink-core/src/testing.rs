// SPDX-License-Identifier: AGPL-3.0
// Sharesink Core - In-memory test doubles

use crate::provider::{
    ColumnValue, ContentProvider, DestinationStream, ProviderRow, SourceStream, COLUMN_FLAGS,
    FLAG_VIRTUAL_DOCUMENT,
};
use crate::types::ResourceRef;
use std::collections::HashMap;
use std::io::{self, Cursor, Read, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Provider calls, recorded in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Query(String),
    StreamTypes(String),
    OpenTyped(String, String),
    OpenInput(String),
    OpenOutput(String),
}

#[derive(Default, Clone)]
pub struct Entry {
    pub document: bool,
    pub mime_type: Option<String>,
    pub row: Option<ProviderRow>,
    pub query_fails: bool,
    pub content: Option<Vec<u8>>,
    pub exports: Option<Vec<String>>,
    pub typed: HashMap<String, Vec<u8>>,
}

impl Entry {
    pub fn file(content: &[u8]) -> Self {
        Self {
            content: Some(content.to_vec()),
            ..Self::default()
        }
    }

    pub fn document(content: &[u8]) -> Self {
        Self {
            document: true,
            row: Some(ProviderRow::new().with(COLUMN_FLAGS, ColumnValue::Integer(0))),
            content: Some(content.to_vec()),
            ..Self::default()
        }
    }

    pub fn virtual_document(exports: &[(&str, &str)]) -> Self {
        Self {
            document: true,
            row: Some(
                ProviderRow::new().with(COLUMN_FLAGS, ColumnValue::Integer(FLAG_VIRTUAL_DOCUMENT)),
            ),
            exports: Some(exports.iter().map(|(m, _)| m.to_string()).collect()),
            typed: exports
                .iter()
                .map(|(m, text)| (m.to_string(), text.as_bytes().to_vec()))
                .collect(),
            ..Self::default()
        }
    }

    pub fn with_row(mut self, row: ProviderRow) -> Self {
        self.row = Some(row);
        self
    }

    pub fn with_mime(mut self, mime: &str) -> Self {
        self.mime_type = Some(mime.to_string());
        self
    }
}

/// Closes observed on a tracked stream
#[derive(Debug, Clone, Default)]
pub struct CloseCounter(Arc<AtomicUsize>);

impl CloseCounter {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct TrackedReader<R> {
    inner: R,
    closes: CloseCounter,
    pub bytes_read: Arc<AtomicUsize>,
}

impl<R: Read> TrackedReader<R> {
    pub fn new(inner: R, closes: CloseCounter) -> Self {
        Self {
            inner,
            closes,
            bytes_read: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl<R: Read> Read for TrackedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.bytes_read.fetch_add(n, Ordering::SeqCst);
        Ok(n)
    }
}

impl<R> Drop for TrackedReader<R> {
    fn drop(&mut self) {
        self.closes.hit();
    }
}

/// Writer into a shared buffer that can be told to fail after a byte budget
pub struct TrackedWriter {
    sink: Arc<Mutex<Vec<u8>>>,
    closes: CloseCounter,
    fail_after: Option<usize>,
    fail_on_flush: bool,
}

impl TrackedWriter {
    pub fn new(sink: Arc<Mutex<Vec<u8>>>, closes: CloseCounter) -> Self {
        Self {
            sink,
            closes,
            fail_after: None,
            fail_on_flush: false,
        }
    }

    pub fn failing_after(mut self, bytes: usize) -> Self {
        self.fail_after = Some(bytes);
        self
    }

    pub fn failing_on_flush(mut self) -> Self {
        self.fail_on_flush = true;
        self
    }
}

impl Write for TrackedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut sink = self.sink.lock().unwrap();
        if let Some(limit) = self.fail_after {
            if sink.len() + buf.len() > limit {
                return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
            }
        }
        sink.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.fail_on_flush {
            return Err(io::Error::new(io::ErrorKind::Other, "flush failed"));
        }
        Ok(())
    }
}

impl Drop for TrackedWriter {
    fn drop(&mut self) {
        self.closes.hit();
    }
}

/// Reader that yields `ok_bytes` bytes and then errors
pub struct BrokenReader {
    remaining: usize,
}

impl BrokenReader {
    pub fn new(ok_bytes: usize) -> Self {
        Self {
            remaining: ok_bytes,
        }
    }
}

impl Read for BrokenReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 {
            return Err(io::Error::new(io::ErrorKind::Other, "device detached"));
        }
        let n = buf.len().min(self.remaining);
        buf[..n].fill(0xAB);
        self.remaining -= n;
        Ok(n)
    }
}

/// In-memory provider that records every call it receives
#[derive(Default)]
pub struct MockProvider {
    entries: HashMap<String, Entry>,
    calls: Mutex<Vec<Call>>,
    outputs: Mutex<HashMap<String, Arc<Mutex<Vec<u8>>>>>,
    pub source_closes: CloseCounter,
    pub destination_closes: CloseCounter,
    pub output_fail_after: Option<usize>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, uri: &str, entry: Entry) -> Self {
        self.entries.insert(uri.to_string(), entry);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn output(&self, uri: &str) -> Option<Vec<u8>> {
        self.outputs
            .lock()
            .unwrap()
            .get(uri)
            .map(|buf| buf.lock().unwrap().clone())
    }

    pub fn opened_output(&self) -> bool {
        self.calls()
            .iter()
            .any(|c| matches!(c, Call::OpenOutput(_)))
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn entry(&self, resource: &ResourceRef) -> io::Result<&Entry> {
        self.entries
            .get(resource.as_str())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, resource.to_string()))
    }
}

impl ContentProvider for MockProvider {
    fn is_document_uri(&self, resource: &ResourceRef) -> bool {
        self.entries
            .get(resource.as_str())
            .map(|e| e.document)
            .unwrap_or(false)
    }

    fn get_type(&self, resource: &ResourceRef) -> Option<String> {
        self.entries
            .get(resource.as_str())
            .and_then(|e| e.mime_type.clone())
    }

    fn query(&self, resource: &ResourceRef, _columns: &[&str]) -> io::Result<Option<ProviderRow>> {
        self.record(Call::Query(resource.to_string()));
        let entry = self.entry(resource)?;
        if entry.query_fails {
            return Err(io::Error::new(io::ErrorKind::Other, "provider crashed"));
        }
        Ok(entry.row.clone())
    }

    fn stream_types(&self, resource: &ResourceRef, _filter: &str) -> io::Result<Option<Vec<String>>> {
        self.record(Call::StreamTypes(resource.to_string()));
        Ok(self.entry(resource)?.exports.clone())
    }

    fn open_typed_stream(
        &self,
        resource: &ResourceRef,
        mime_type: &str,
    ) -> io::Result<Option<SourceStream>> {
        self.record(Call::OpenTyped(resource.to_string(), mime_type.to_string()));
        let entry = self.entry(resource)?;
        Ok(entry.typed.get(mime_type).map(|bytes| {
            Box::new(TrackedReader::new(
                Cursor::new(bytes.clone()),
                self.source_closes.clone(),
            )) as SourceStream
        }))
    }

    fn open_input(&self, resource: &ResourceRef) -> io::Result<SourceStream> {
        self.record(Call::OpenInput(resource.to_string()));
        let content = self
            .entry(resource)?
            .content
            .clone()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no direct stream"))?;
        Ok(Box::new(TrackedReader::new(
            Cursor::new(content),
            self.source_closes.clone(),
        )))
    }

    fn open_output(&self, resource: &ResourceRef) -> io::Result<DestinationStream> {
        self.record(Call::OpenOutput(resource.to_string()));
        let sink = Arc::new(Mutex::new(Vec::new()));
        self.outputs
            .lock()
            .unwrap()
            .insert(resource.to_string(), sink.clone());
        let mut writer = TrackedWriter::new(sink, self.destination_closes.clone());
        if let Some(limit) = self.output_fail_after {
            writer = writer.failing_after(limit);
        }
        Ok(Box::new(writer))
    }
}
