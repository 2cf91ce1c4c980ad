//! Line framing and event parsing for agent stdout.

/// Reassembles newline-delimited records from arbitrarily split text.
///
/// Each complete, non-blank line is trimmed and handed to the callback. The
/// trailing unterminated segment is kept until a later newline completes it.
pub struct LineFramer<F> {
    buffer: String,
    on_line: F,
}

impl<F: FnMut(&str)> LineFramer<F> {
    /// Create a framer that calls `on_line` for every complete line.
    pub fn new(on_line: F) -> Self {
        Self {
            buffer: String::new(),
            on_line,
        }
    }

    /// Append `chunk` and emit every line it completes.
    pub fn feed(&mut self, chunk: &str) {
        self.buffer.push_str(chunk);

        let Some(last_newline) = self.buffer.rfind('\n') else {
            return;
        };
        let rest = self.buffer.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.buffer, rest);

        for line in complete.split('\n') {
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                (self.on_line)(trimmed);
            }
        }
    }

    /// The unterminated text retained for the next `feed`.
    #[must_use]
    pub fn pending(&self) -> &str {
        &self.buffer
    }
}

/// Parse a single line of agent output as JSON.
///
/// Returns `None` for anything that is not valid JSON; malformed lines are
/// expected in agent output and never abort a stream.
#[must_use]
pub fn parse_event_line(line: &str) -> Option<serde_json::Value> {
    match serde_json::from_str(line) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::trace!(line = %line, error = %e, "Discarding non-JSON line");
            None
        }
    }
}
