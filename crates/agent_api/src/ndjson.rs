/// Incremental line framer for NDJSON byte streams.
///
/// Buffers raw bytes, not text: decoding happens only on complete lines, so
/// a chunk boundary inside a multi-byte UTF-8 character cannot corrupt the
/// output. Emitted lines are trimmed and never empty.
#[derive(Debug, Default)]
pub struct NdjsonStreamParser {
    buffer: Vec<u8>,
}

impl NdjsonStreamParser {
    /// Feed arbitrary bytes into the framer and drain complete lines.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);
        let mut lines = Vec::new();

        while let Some(split) = self.buffer.iter().position(|byte| *byte == b'\n') {
            let line: Vec<u8> = self.buffer.drain(0..=split).collect();
            push_line(&mut lines, &line);
        }

        lines
    }

    /// Drain the trailing unterminated record at end of stream, if any.
    pub fn finish(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }

        let rest = std::mem::take(&mut self.buffer);
        let line = String::from_utf8_lossy(&rest);
        let line = line.trim();
        if line.is_empty() {
            None
        } else {
            Some(line.to_string())
        }
    }

    pub fn is_empty_buffer(&self) -> bool {
        String::from_utf8_lossy(&self.buffer).trim().is_empty()
    }
}

fn push_line(lines: &mut Vec<String>, raw: &[u8]) {
    let line = String::from_utf8_lossy(raw);
    let line = line.trim();
    if !line.is_empty() {
        lines.push(line.to_string());
    }
}
