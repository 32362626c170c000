//! Incremental decoder for `text/event-stream` bodies.
//!
//! Network chunks do not respect event (or UTF-8) boundaries, so bytes are
//! buffered until a blank line terminates an event.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    pub event: Option<String>,
    pub data: String,
}

#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk; returns every event completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buf.extend(chunk.iter().copied().filter(|b| *b != b'\r'));

        let mut out = Vec::new();
        while let Some(end) = find_blank_line(&self.buf) {
            let raw: Vec<u8> = self.buf.drain(..end + 2).collect();
            if let Some(event) = parse_event(&raw[..end]) {
                out.push(event);
            }
        }
        out
    }

    /// Bytes received after the last complete event.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}

fn find_blank_line(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\n\n")
}

fn parse_event(raw: &[u8]) -> Option<SseEvent> {
    let text = String::from_utf8_lossy(raw);
    let mut event = None;
    let mut data: Vec<&str> = Vec::new();

    for line in text.split('\n') {
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => event = Some(value.to_string()),
            "data" => data.push(value),
            _ => {}
        }
    }

    if event.is_none() && data.is_empty() {
        return None;
    }

    Some(SseEvent {
        event,
        data: data.join("\n"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_named_events() {
        let mut d = SseDecoder::new();
        let events = d.push(b"event: ping\ndata: {\"type\":\"ping\"}\n\nevent: message_stop\ndata: {}\n\n");
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event.as_deref(), Some("ping"));
        assert_eq!(events[0].data, "{\"type\":\"ping\"}");
        assert_eq!(events[1].event.as_deref(), Some("message_stop"));
        assert_eq!(d.pending(), 0);
    }

    #[test]
    fn buffers_events_split_across_chunks() {
        let mut d = SseDecoder::new();
        assert!(d.push(b"event: content_block_delta\nda").is_empty());
        assert!(d.push(b"ta: {\"a\":1}\n").is_empty());
        let events = d.push(b"\nevent: x\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "{\"a\":1}");
        assert!(d.pending() > 0);
    }

    #[test]
    fn keeps_multibyte_characters_split_mid_codepoint() {
        let mut d = SseDecoder::new();
        let body = "data: perché\n\n".as_bytes();
        let split = body.iter().position(|b| *b == 0xC3).unwrap() + 1;
        assert!(d.push(&body[..split]).is_empty());
        let events = d.push(&body[split..]);
        assert_eq!(events[0].data, "perché");
    }

    #[test]
    fn handles_crlf_comments_and_multiline_data() {
        let mut d = SseDecoder::new();
        let events = d.push(b": keep-alive\r\n\r\ndata: one\r\ndata: two\r\n\r\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event, None);
        assert_eq!(events[0].data, "one\ntwo");
    }
}
