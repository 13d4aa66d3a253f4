//! Streaming reconstruction of partial say turns
//!
//! Partial messages arrive as growing snapshots sharing one `ts`. The
//! printer writes the turn header once, then only the suffix beyond
//! what it already printed, so the terminal shows a live stream while
//! the concatenated output reproduces the final text exactly.

use std::io::Write;

use crate::protocol::TurnMessage;

/// Progressive printer for one streaming block at a time
pub struct StreamPrinter {
    out: Box<dyn Write + Send>,
    current_ts: Option<i64>,
    printed_len: usize,
}

impl StreamPrinter {
    /// Printer writing to standard output.
    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    /// Printer writing to an arbitrary sink.
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            out,
            current_ts: None,
            printed_len: 0,
        }
    }

    /// Render a say turn.
    ///
    /// The first chunk for a `ts` prints the header plus the chunk;
    /// later chunks for the same `ts` print only the new suffix. A
    /// different `ts` or a non-partial arrival closes the open block.
    pub fn render(&mut self, message: &TurnMessage) {
        let text = message.text();

        if self.current_ts == Some(message.ts) {
            match text.get(self.printed_len..) {
                Some(suffix) => {
                    let _ = write!(self.out, "{suffix}");
                    self.printed_len = text.len();
                }
                // The snapshot shrank or was rewritten; restart the block.
                None => self.restart(message, text),
            }
        } else {
            self.restart(message, text);
        }

        if message.partial {
            let _ = self.out.flush();
        } else {
            self.close();
        }
    }

    /// Close the open streaming block, if any.
    pub fn close(&mut self) {
        if self.current_ts.is_some() {
            let _ = writeln!(self.out);
            let _ = self.out.flush();
            self.current_ts = None;
            self.printed_len = 0;
        }
    }

    fn restart(&mut self, message: &TurnMessage, text: &str) {
        self.close();
        let _ = write!(self.out, "{}{}", message.header(), text);
        self.current_ts = Some(message.ts);
        self.printed_len = text.len();
    }
}

impl std::fmt::Debug for StreamPrinter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamPrinter")
            .field("current_ts", &self.current_ts)
            .field("printed_len", &self.printed_len)
            .finish()
    }
}
