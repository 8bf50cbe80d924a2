//! JSON-lines replay source.
//!
//! Replays a recorded feed, one JSON update per line, optionally pacing the
//! pushes to imitate the live cadence of the glove.

use crate::feed::subscription::{FeedError, FeedSink, FeedSource};
use std::fs::File;
use std::borrow::Cow;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::{Duration, Instant};

/// Granularity of the interruptible wait between pushes.
const PACE_STEP: Duration = Duration::from_millis(20);

/// Replays recorded feed updates from a line-oriented reader.
pub struct ReplaySource {
    name: String,
    reader: Box<dyn BufRead + Send>,
    interval: Duration,
}

impl ReplaySource {
    /// Replay from any buffered reader.
    pub fn from_reader<R: BufRead + Send + 'static>(name: impl Into<String>, reader: R) -> Self {
        Self {
            name: name.into(),
            reader: Box::new(reader),
            interval: Duration::ZERO,
        }
    }

    /// Replay a recorded file.
    pub fn from_path(path: &Path) -> Result<Self, FeedError> {
        let file = File::open(path).map_err(|e| FeedError::Io(format!("{}: {e}", path.display())))?;
        Ok(Self::from_reader(path.display().to_string(), BufReader::new(file)))
    }

    /// Replay whatever arrives on standard input.
    pub fn from_stdin() -> Self {
        Self::from_reader("stdin", BufReader::new(std::io::stdin()))
    }

    /// Wait `interval` between consecutive pushes.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

impl FeedSource for ReplaySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(self: Box<Self>, sink: FeedSink) -> Result<(), FeedError> {
        let ReplaySource {
            mut reader,
            interval,
            ..
        } = *self;

        let mut buf = Vec::new();
        let mut line_no = 0usize;
        loop {
            line_no += 1;
            let Some(line) = read_line_lossy(&mut reader, &mut buf)
                .map_err(|e| FeedError::Io(format!("line {line_no}: {e}")))?
            else {
                break;
            };
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if !sink.push(trimmed) {
                break;
            }
            if !interval.is_zero() && !pace(&sink, interval) {
                break;
            }
        }
        Ok(())
    }
}

/// Read the next line, replacing invalid UTF-8 instead of failing.
///
/// Returns `Ok(None)` at end of input. Only I/O errors are returned as errors;
/// undecodable bytes become U+FFFD so the line still reaches the controller,
/// which skips it as malformed.
pub fn read_line_lossy<R: BufRead + ?Sized>(
    reader: &mut R,
    buf: &mut Vec<u8>,
) -> std::io::Result<Option<String>> {
    buf.clear();
    if reader.read_until(b'\n', buf)? == 0 {
        return Ok(None);
    }
    let line = match String::from_utf8_lossy(buf) {
        Cow::Borrowed(text) => text.to_string(),
        Cow::Owned(text) => {
            tracing::debug!(bytes = buf.len(), "feed line is not valid UTF-8");
            text
        }
    };
    Ok(Some(line))
}

/// Sleep for `interval`, returning early (`false`) if the sink closes.
fn pace(sink: &FeedSink, interval: Duration) -> bool {
    let deadline = Instant::now() + interval;
    loop {
        if !sink.is_running() {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        std::thread::sleep(PACE_STEP.min(deadline - now));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::subscription::Subscription;
    use std::io::Cursor;

    #[test]
    fn test_replay_skips_blank_lines() {
        let data = "{\"a\":1}\n\n   \n{\"b\":2}\nnot json\n";
        let source = ReplaySource::from_reader("memory", Cursor::new(data.to_string()));
        let subscription = Subscription::open(source, 8).unwrap();

        let mut bodies = Vec::new();
        while let Ok(update) = subscription.recv_timeout(Duration::from_secs(2)) {
            bodies.push(update.body);
        }

        // Malformed lines are passed through; the controller decides what to keep.
        assert_eq!(bodies, vec!["{\"a\":1}", "{\"b\":2}", "not json"]);
    }

    #[test]
    fn test_invalid_utf8_line_does_not_end_replay() {
        let data = b"{\"a\":1}\n\xff\xfe\n{\"b\":2}\n".to_vec();
        let source = ReplaySource::from_reader("memory", Cursor::new(data));
        let subscription = Subscription::open(source, 8).unwrap();

        let mut bodies = Vec::new();
        while let Ok(update) = subscription.recv_timeout(Duration::from_secs(2)) {
            bodies.push(update.body);
        }

        assert_eq!(bodies.len(), 3);
        assert_eq!(bodies[0], "{\"a\":1}");
        assert_eq!(bodies[1], "\u{FFFD}\u{FFFD}");
        assert_eq!(bodies[2], "{\"b\":2}");
    }

    #[test]
    fn test_read_line_lossy() {
        let mut reader = Cursor::new(b"ok\n\xffx\nlast".to_vec());
        let mut buf = Vec::new();
        assert_eq!(read_line_lossy(&mut reader, &mut buf).unwrap().as_deref(), Some("ok\n"));
        assert_eq!(
            read_line_lossy(&mut reader, &mut buf).unwrap().as_deref(),
            Some("\u{FFFD}x\n")
        );
        assert_eq!(read_line_lossy(&mut reader, &mut buf).unwrap().as_deref(), Some("last"));
        assert_eq!(read_line_lossy(&mut reader, &mut buf).unwrap(), None);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let path = std::env::temp_dir().join("hand-rehab-no-such-feed.jsonl");
        assert!(ReplaySource::from_path(&path).is_err());
    }
}
