//! Plain-text attribute export

use std::collections::HashSet;

use futures::StreamExt;
use reqwest::Method;

use crate::client::Connection;
use crate::error::Result;

const TEXT_EXPORT_PATH: &str = "attributes/text/download";

impl Connection {
    /// Download `attributes/text/download/<flags...>` and return its lines,
    /// duplicates removed, in first-seen order.
    pub async fn text_export<S: AsRef<str>>(&self, flags: &[S]) -> Result<Vec<String>> {
        let url = self.build_url(
            std::iter::once(TEXT_EXPORT_PATH).chain(flags.iter().map(S::as_ref)),
        )?;
        tracing::debug!(%url, "Sending MISP text export");

        let request = self.build_authenticated_request(Method::GET, url, None);
        let mut body = self.execute(request).await?.bytes_stream();

        let mut lines = UniqueLines::default();
        while let Some(chunk) = body.next().await {
            lines.push_chunk(&chunk?);
        }
        let lines = lines.finish();

        tracing::info!(lines = lines.len(), "MISP text export complete");
        Ok(lines)
    }
}

/// Splits a byte stream into lines and keeps the first occurrence of each.
/// Lines are compared as raw bytes, before any UTF-8 repair.
#[derive(Debug, Default)]
pub struct UniqueLines {
    pending: Vec<u8>,
    seen: HashSet<Vec<u8>>,
    lines: Vec<String>,
}

impl UniqueLines {
    pub fn push_chunk(&mut self, chunk: &[u8]) {
        self.pending.extend_from_slice(chunk);

        let pending = std::mem::take(&mut self.pending);
        let mut start = 0;
        while let Some(offset) = pending[start..].iter().position(|&b| b == b'\n') {
            let end = start + offset;
            self.add(&pending[start..end]);
            start = end + 1;
        }
        self.pending = pending;
        self.pending.drain(..start);
    }

    /// Flush the trailing unterminated line, if any
    pub fn finish(mut self) -> Vec<String> {
        if !self.pending.is_empty() {
            let rest = std::mem::take(&mut self.pending);
            self.add(&rest);
        }
        self.lines
    }

    fn add(&mut self, line: &[u8]) {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        if self.seen.insert(line.to_vec()) {
            self.lines.push(String::from_utf8_lossy(line).into_owned());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unique(chunks: &[&str]) -> Vec<String> {
        let mut lines = UniqueLines::default();
        for chunk in chunks {
            lines.push_chunk(chunk.as_bytes());
        }
        lines.finish()
    }

    #[test]
    fn drops_duplicates_keeping_order() {
        assert_eq!(unique(&["a\nb\na\nc\n"]), ["a", "b", "c"]);
    }

    #[test]
    fn lines_may_span_chunks() {
        assert_eq!(
            unique(&["evil.exa", "mple\nbad.", "example\nevil.example\n"]),
            ["evil.example", "bad.example"]
        );
    }

    #[test]
    fn keeps_unterminated_last_line() {
        assert_eq!(unique(&["a\r\nb\r\nb"]), ["a", "b"]);
    }

    #[test]
    fn invalid_utf8_lines_stay_distinct() {
        let mut lines = UniqueLines::default();
        lines.push_chunk(b"\xff\n\xfe\n\xff\n");
        let lines = lines.finish();

        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|l| l == "\u{fffd}"));
    }

    #[test]
    fn many_lines_in_one_chunk() {
        let body: String = (0..1000).map(|i| format!("host{}.example\n", i % 10)).collect();
        let lines = unique(&[body.as_str()]);

        assert_eq!(lines.len(), 10);
        assert_eq!(lines[0], "host0.example");
        assert_eq!(lines[9], "host9.example");
    }

    #[test]
    fn empty_body_has_no_lines() {
        assert!(unique(&[]).is_empty());
        assert!(unique(&[""]).is_empty());
    }
}
