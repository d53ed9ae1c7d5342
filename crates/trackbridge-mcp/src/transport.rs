//! Transport layer for MCP JSON-RPC communication.
//!
//! Two framings are accepted on stdin and detected from the first message:
//!
//! - **Line**: one JSON message per line, newline-terminated.
//! - **Header**: `Content-Length: <n>` plus optional further headers, a blank
//!   line, then exactly `n` bytes of body with no terminator.
//!
//! The detected framing is fixed for the rest of the session and replies are
//! written with the same framing.

use std::io::{self, BufRead, Read, Write};

use thiserror::Error;

const CONTENT_LENGTH: &str = "Content-Length:";

/// Wire framing of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    Line,
    Header,
}

/// Failure of a single read.
#[derive(Error, Debug)]
pub enum FramingError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid Content-Length value: {0:?}")]
    InvalidContentLength(String),

    #[error("Header block has no Content-Length")]
    MissingContentLength,

    #[error("Malformed header line: {0:?}")]
    MalformedHeader(String),

    #[error("Message is not valid UTF-8")]
    InvalidUtf8,
}

/// Transport for reading/writing framed messages.
///
/// Holds the per-session framing state; nothing here is process-global.
pub struct StdioTransport {
    reader: Box<dyn BufRead + Send>,
    writer: Box<dyn Write + Send>,
    framing: Option<Framing>,
}

impl StdioTransport {
    /// Create a transport using stdin/stdout.
    pub fn stdio() -> Self {
        Self::new(
            Box::new(io::BufReader::new(io::stdin())),
            Box::new(io::stdout()),
        )
    }

    /// Create a transport with custom reader/writer.
    pub fn new(reader: Box<dyn BufRead + Send>, writer: Box<dyn Write + Send>) -> Self {
        Self {
            reader,
            writer,
            framing: None,
        }
    }

    /// Framing detected so far, `None` before the first message.
    pub fn framing(&self) -> Option<Framing> {
        self.framing
    }

    /// Read the next message.
    ///
    /// Returns `Ok(None)` at end of stream, including a stream that ends
    /// while body bytes are still owed.
    pub fn read_message(&mut self) -> Result<Option<String>, FramingError> {
        let Some(first) = self.next_non_blank_line()? else {
            return Ok(None);
        };

        let framing = *self.framing.get_or_insert_with(|| {
            let detected = if first.starts_with(CONTENT_LENGTH) {
                Framing::Header
            } else {
                Framing::Line
            };
            tracing::debug!("Detected {:?} framing", detected);
            detected
        });

        let message = match framing {
            Framing::Line => Some(first),
            Framing::Header => self.read_header_framed(first)?,
        };

        if let Some(message) = &message {
            tracing::debug!("Received: {}", message);
        }
        Ok(message)
    }

    /// Write a single message using the session's framing and flush.
    pub fn write_message(&mut self, content: &str) -> io::Result<()> {
        tracing::debug!("Sending: {}", content);

        match self.framing.unwrap_or(Framing::Line) {
            Framing::Header => {
                write!(self.writer, "Content-Length: {}\r\n\r\n", content.len())?;
                self.writer.write_all(content.as_bytes())?;
            }
            Framing::Line => {
                writeln!(self.writer, "{}", content)?;
            }
        }
        self.writer.flush()
    }

    /// Read the rest of a header block starting at `first`, then the body.
    fn read_header_framed(&mut self, first: String) -> Result<Option<String>, FramingError> {
        // A non-header first line means the peer broke framing; fail this
        // read without consuming further lines.
        header_name(&first)?;

        let mut headers = vec![first];
        loop {
            match self.read_raw_line()? {
                None => {
                    tracing::warn!("Stream ended inside a header block");
                    return Ok(None);
                }
                Some(line) if line.is_empty() => break,
                Some(line) => headers.push(line),
            }
        }

        let mut length = None;
        for header in &headers {
            header_name(header)?;
            if let Some(value) = header.strip_prefix(CONTENT_LENGTH) {
                if length.is_none() {
                    length = Some(parse_content_length(value.trim())?);
                }
            }
        }
        let length = length.ok_or(FramingError::MissingContentLength)?;

        // Grow with the bytes that arrive, not the declared length
        let mut body = Vec::new();
        (&mut self.reader).take(length).read_to_end(&mut body)?;
        if (body.len() as u64) < length {
            tracing::warn!(
                "Stream ended after {} of {} body bytes",
                body.len(),
                length
            );
            return Ok(None);
        }

        String::from_utf8(body)
            .map(Some)
            .map_err(|_| FramingError::InvalidUtf8)
    }

    /// Next line that is not blank, with the line terminator removed.
    fn next_non_blank_line(&mut self) -> Result<Option<String>, FramingError> {
        loop {
            match self.read_raw_line()? {
                None => return Ok(None),
                Some(line) if line.trim().is_empty() => continue,
                Some(line) => return Ok(Some(line)),
            }
        }
    }

    /// One line with `\n` / `\r\n` stripped; `None` at end of stream.
    fn read_raw_line(&mut self) -> Result<Option<String>, FramingError> {
        let mut buf = Vec::new();
        if self.reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(None);
        }
        if buf.last() == Some(&b'\n') {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        }
        String::from_utf8(buf)
            .map(Some)
            .map_err(|_| FramingError::InvalidUtf8)
    }
}

/// Parse a `Content-Length` value: ASCII digits only, no sign or spaces.
fn parse_content_length(value: &str) -> Result<u64, FramingError> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FramingError::InvalidContentLength(value.to_string()));
    }
    value
        .parse::<u64>()
        .map_err(|_| FramingError::InvalidContentLength(value.to_string()))
}

/// Validate a `Name: value` header line and return its name.
fn header_name(line: &str) -> Result<&str, FramingError> {
    match line.split_once(':') {
        Some((name, _))
            if !name.is_empty()
                && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') =>
        {
            Ok(name)
        }
        _ => Err(FramingError::MalformedHeader(line.to_string())),
    }
}
