//! The reader loop and its worker thread.
//!
//! [`run`] drives an [`XmlParser`] over a channel of markup events to
//! completion; [`spawn`] does the same on a named worker thread and
//! returns the output channels. Buffer handoff is bounded, so a slow
//! consumer backpressures the parser instead of piling up arenas.

use std::thread;

use crossbeam_channel::{bounded, Receiver};

use osmbuf_arena::ArenaBuffer;
use osmbuf_core::{EntityFilter, Header, ReadError};

use crate::event::XmlEvent;
use crate::parser::XmlParser;

/// Default arena capacity in bytes.
pub const DEFAULT_BUFFER_CAPACITY: usize = 2_000_000;

/// Default bound on in-flight full buffers.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 4;

/// Tuning knobs for a reader run.
#[derive(Clone, Copy, Debug)]
pub struct ReaderConfig {
    /// Arena capacity in bytes. A single record larger than this fails
    /// the run with [`ReadError::Capacity`].
    pub buffer_capacity: usize,
    /// How many full buffers may be in flight before the parser blocks.
    pub channel_capacity: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

/// Drive a parser over `events` until the stream ends or the parser is
/// drained.
///
/// "Drained" means no further input can produce output: the filter
/// selects no entity kinds and the header has already been delivered.
/// In that case remaining events are not consumed and the run ends
/// early, letting the producer notice the dropped receiver.
pub fn run(
    events: Receiver<XmlEvent>,
    filter: EntityFilter,
    config: ReaderConfig,
    buffers: crossbeam_channel::Sender<ArenaBuffer>,
    header: crossbeam_channel::Sender<Header>,
) -> Result<(), ReadError> {
    let mut parser = XmlParser::new(&config, filter, buffers, header);
    for event in events {
        parser.feed(event)?;
        if parser.is_drained() {
            return Ok(());
        }
    }
    parser.finish()
}

/// Spawn the reader loop on a worker thread.
///
/// Returns the thread handle plus the buffer and header receivers. The
/// header arrives exactly once unless the run fails before reaching it;
/// the buffer channel closes when the run ends either way.
pub fn spawn(
    events: Receiver<XmlEvent>,
    filter: EntityFilter,
    config: ReaderConfig,
) -> (
    thread::JoinHandle<Result<(), ReadError>>,
    Receiver<ArenaBuffer>,
    Receiver<Header>,
) {
    let (buffer_tx, buffer_rx) = bounded(config.channel_capacity);
    let (header_tx, header_rx) = bounded(1);
    let handle = thread::Builder::new()
        .name("osmbuf_xml_in".to_owned())
        .spawn(move || run(events, filter, config, buffer_tx, header_tx))
        .expect("failed to spawn reader thread");
    (handle, buffer_rx, header_rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    fn node_document(count: usize) -> Vec<XmlEvent> {
        let mut events = vec![XmlEvent::start(
            "osm",
            &[("version", "0.6"), ("generator", "test")],
        )];
        for i in 0..count {
            events.push(XmlEvent::start("node", &[("id", &(i + 1).to_string() as &str)]));
            events.push(XmlEvent::end("node"));
        }
        events.push(XmlEvent::end("osm"));
        events
    }

    #[test]
    fn spawned_reader_delivers_header_and_buffers() {
        let (event_tx, event_rx) = unbounded();
        let (handle, buffer_rx, header_rx) =
            spawn(event_rx, EntityFilter::ALL, ReaderConfig::default());
        for event in node_document(3) {
            event_tx.send(event).unwrap();
        }
        drop(event_tx);
        handle.join().unwrap().unwrap();

        let header = header_rx.recv().unwrap();
        assert_eq!(header.get("generator"), "test");
        let buffers: Vec<ArenaBuffer> = buffer_rx.iter().collect();
        let total: usize = buffers.iter().map(|b| b.records().count()).sum();
        assert_eq!(total, 3);
    }

    #[test]
    fn empty_filter_ends_run_early() {
        let (event_tx, event_rx) = unbounded();
        let (handle, buffer_rx, header_rx) =
            spawn(event_rx, EntityFilter::EMPTY, ReaderConfig::default());
        for event in node_document(1) {
            // The reader may drop its receiver once drained.
            if event_tx.send(event).is_err() {
                break;
            }
        }
        drop(event_tx);
        handle.join().unwrap().unwrap();
        assert!(header_rx.recv().is_ok());
        assert!(buffer_rx.iter().next().is_none());
    }

    #[test]
    fn parse_error_surfaces_through_join() {
        let (event_tx, event_rx) = unbounded();
        let (handle, _buffer_rx, _header_rx) =
            spawn(event_rx, EntityFilter::ALL, ReaderConfig::default());
        event_tx
            .send(XmlEvent::start("osm", &[("version", "0.5")]))
            .unwrap();
        drop(event_tx);
        let result = handle.join().unwrap();
        assert_eq!(
            result,
            Err(ReadError::FormatVersion {
                version: Some("0.5".to_owned())
            })
        );
    }

    #[test]
    fn dropped_buffer_receiver_disconnects_run() {
        let (event_tx, event_rx) = unbounded();
        let config = ReaderConfig {
            buffer_capacity: 512,
            channel_capacity: 1,
        };
        let (handle, buffer_rx, _header_rx) = spawn(event_rx, EntityFilter::ALL, config);
        drop(buffer_rx);
        for event in node_document(64) {
            if event_tx.send(event).is_err() {
                break;
            }
        }
        drop(event_tx);
        assert_eq!(handle.join().unwrap(), Err(ReadError::Disconnected));
    }
}
