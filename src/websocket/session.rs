//! `RealWebSocket`: the synchronous session built on [`frame`](super::frame)
//! (§4.6 "Session queues", §5 "WebSocket session").
//!
//! Two FIFOs -- pongs and messages/close -- guarded by one
//! `std::sync::Mutex`, matching §5's "single lock" design: the lock is
//! held only to mutate the queues/flags, never across a blocking socket
//! read or write.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::socket::Socket;

use super::close_codes;
use super::config::{Config, MAX_QUEUE_SIZE};
use super::deflate::{Deflater, Inflater};
use super::error::Error;
use super::frame::{self, Assembling, Frame, Opcode};
use super::handshake::DeflateParams;

/// A complete inbound application message, already inflated if it was
/// compressed.
#[derive(Debug, PartialEq, Eq)]
pub enum Message {
    Text(String),
    Binary(Vec<u8>),
}

/// What the reader loop observed on one pass (§4.6 "Reader").
#[derive(Debug)]
pub enum Event {
    Message(Message),
    /// The peer sent a close frame; this side has already queued the
    /// required close reply.
    Closed { code: u16, reason: String },
}

enum Outgoing {
    Message(Message),
    Close(u16, String),
}

struct State {
    pong_queue: VecDeque<Vec<u8>>,
    outgoing_queue: VecDeque<Outgoing>,
    queued_bytes: usize,
    close_sent: bool,
    close_received: bool,
    failed: bool,
    awaiting_pong: bool,
    last_ping_at: Option<Instant>,
    close_deadline: Option<Instant>,
}

pub struct RealWebSocket<S: Socket> {
    socket: S,
    config: Arc<Config>,
    is_client: bool,
    deflate: Option<(Deflater, Inflater)>,
    state: Mutex<State>,
    /// Fragmentation state for the reader. Lives here, not as a local in
    /// `frame::read_message`, because a control frame delivered mid-fragment
    /// returns from that function without the message being complete; the
    /// next `process_next_frame` call must resume assembling where the
    /// previous one left off (§4.6 "Reader").
    assembling: Assembling,
}

impl<S: Socket> RealWebSocket<S> {
    pub fn new(socket: S, config: Arc<Config>, is_client: bool, deflate_params: Option<DeflateParams>) -> RealWebSocket<S> {
        let deflate = deflate_params.map(|params| {
            let compress_no_takeover = if is_client { params.client_no_context_takeover } else { params.server_no_context_takeover };
            let decompress_no_takeover = if is_client { params.server_no_context_takeover } else { params.client_no_context_takeover };
            (Deflater::new(compress_no_takeover), Inflater::new(decompress_no_takeover))
        });
        RealWebSocket {
            socket,
            config,
            is_client,
            deflate,
            state: Mutex::new(State {
                pong_queue: VecDeque::new(),
                outgoing_queue: VecDeque::new(),
                queued_bytes: 0,
                close_sent: false,
                close_received: false,
                failed: false,
                awaiting_pong: false,
                last_ping_at: None,
                close_deadline: None,
            }),
            assembling: None,
        }
    }

    /// The underlying transport, for callers that need to inspect or poll
    /// it directly (tests, or a caller multiplexing reads with a timeout).
    pub fn get_ref(&self) -> &S {
        &self.socket
    }

    pub fn send_text(&self, text: impl Into<String>) -> Result<(), Error> {
        self.enqueue(Outgoing::Message(Message::Text(text.into())))
    }

    pub fn send_binary(&self, data: impl Into<Vec<u8>>) -> Result<(), Error> {
        self.enqueue(Outgoing::Message(Message::Binary(data.into())))
    }

    /// Enqueue a close frame and arm the hard-cancel deadline
    /// (`cancel_after_close`, default 60s, §4.6).
    pub fn close(&self, code: u16, reason: impl Into<String>) -> Result<(), Error> {
        let reason = reason.into();
        let mut state = self.state.lock().unwrap();
        if state.failed || state.close_sent {
            return Ok(());
        }
        let byte_len = 2 + reason.len();
        enqueue_locked(&mut state, Outgoing::Close(code, reason), byte_len)?;
        state.close_sent = true;
        state.close_deadline = Some(Instant::now() + self.config.get_cancel_after_close());
        Ok(())
    }

    /// Whether the hard-cancel deadline has passed; callers poll this from
    /// their own scheduling loop (§5: no task queue is owned here).
    pub fn should_force_cancel(&self, now: Instant) -> bool {
        self.state.lock().unwrap().close_deadline.map(|deadline| now >= deadline).unwrap_or(false)
    }

    fn enqueue(&self, item: Outgoing) -> Result<(), Error> {
        let mut state = self.state.lock().unwrap();
        if state.failed || state.close_sent {
            return Err(Error::Closed);
        }
        let len = outgoing_byte_len(&item);
        enqueue_locked(&mut state, item, len)
    }

    fn enqueue_pong(&self, payload: Vec<u8>) -> Result<(), Error> {
        let mut state = self.state.lock().unwrap();
        if state.failed {
            return Err(Error::Closed);
        }
        if state.queued_bytes + payload.len() > MAX_QUEUE_SIZE {
            state.failed = true;
            return Err(Error::QueueOverflow);
        }
        state.queued_bytes += payload.len();
        state.pong_queue.push_back(payload);
        Ok(())
    }

    /// Drain the pong queue, then the message/close queue, writing each as
    /// a wire frame. Pongs always go first (§4.6 "Writing priority").
    pub fn flush_writes(&mut self) -> Result<(), Error> {
        let (pongs, outgoing, drained_bytes) = {
            let mut state = self.state.lock().unwrap();
            let pongs = std::mem::take(&mut state.pong_queue);
            let outgoing = std::mem::take(&mut state.outgoing_queue);
            let drained_bytes = pongs.iter().map(|p| p.len()).sum::<usize>()
                + outgoing.iter().map(outgoing_byte_len).sum::<usize>();
            (pongs, outgoing, drained_bytes)
        };

        for payload in pongs {
            frame::write_raw_frame(&mut self.socket, true, false, Opcode::Pong, &payload, self.is_client)?;
        }
        for item in outgoing {
            self.write_outgoing(item)?;
        }
        {
            // Subtract what this flush drained rather than zeroing: another
            // thread may have enqueued more bytes while these writes were
            // blocking (§5 permits concurrent enqueues).
            let mut state = self.state.lock().unwrap();
            state.queued_bytes = state.queued_bytes.saturating_sub(drained_bytes);
        }
        Ok(())
    }

    fn write_outgoing(&mut self, item: Outgoing) -> Result<(), Error> {
        match item {
            Outgoing::Message(Message::Text(text)) => self.write_message(Opcode::Text, text.into_bytes()),
            Outgoing::Message(Message::Binary(data)) => self.write_message(Opcode::Binary, data),
            Outgoing::Close(code, reason) => {
                let mut payload = Vec::with_capacity(2 + reason.len());
                payload.extend_from_slice(&code.to_be_bytes());
                payload.extend_from_slice(reason.as_bytes());
                frame::write_raw_frame(&mut self.socket, true, false, Opcode::Close, &payload, self.is_client)
            }
        }
    }

    fn write_message(&mut self, opcode: Opcode, data: Vec<u8>) -> Result<(), Error> {
        let minimum = self.config.get_minimum_deflate_size();
        match &mut self.deflate {
            Some((deflater, _)) if data.len() >= minimum => {
                let compressed = deflater.compress(&data)?;
                frame::write_raw_frame(&mut self.socket, true, true, opcode, &compressed, self.is_client)
            }
            _ => frame::write_raw_frame(&mut self.socket, true, false, opcode, &data, self.is_client),
        }
    }

    /// Read and handle the next wire message, returning the event the
    /// caller should surface (§4.6 "Reader"). Ping frames are answered
    /// automatically by enqueuing a pong; the caller must still call
    /// [`flush_writes`](Self::flush_writes) to actually send it.
    pub fn process_next_frame(&mut self) -> Result<Event, Error> {
        loop {
            let permessage_deflate = self.deflate.is_some();
            let expect_masked = !self.is_client;
            let max_payload = self.config.get_max_packet_size();
            let frame =
                frame::read_message(&mut self.socket, expect_masked, permessage_deflate, max_payload, &mut self.assembling)?;

            match frame {
                Frame::Ping(payload) => {
                    self.enqueue_pong(payload)?;
                    continue;
                }
                Frame::Pong(_) => {
                    self.state.lock().unwrap().awaiting_pong = false;
                    continue;
                }
                Frame::Close { code, reason } => {
                    let mut state = self.state.lock().unwrap();
                    state.close_received = true;
                    let already_sent = state.close_sent;
                    drop(state);
                    if !already_sent {
                        self.close(code, "")?;
                    }
                    return Ok(Event::Closed { code, reason });
                }
                Frame::Text { data, compressed } => {
                    let text = self.inflate_if_needed(data, compressed)?;
                    let text = String::from_utf8(text).map_err(|e| e.utf8_error())?;
                    return Ok(Event::Message(Message::Text(text)));
                }
                Frame::Binary { data, compressed } => {
                    let data = self.inflate_if_needed(data, compressed)?;
                    return Ok(Event::Message(Message::Binary(data)));
                }
            }
        }
    }

    fn inflate_if_needed(&mut self, data: Vec<u8>, compressed: bool) -> Result<Vec<u8>, Error> {
        if !compressed {
            return Ok(data);
        }
        match &mut self.deflate {
            Some((_, inflater)) => inflater.decompress(&data),
            None => Err(Error::ReservedBitSet),
        }
    }

    /// Send a ping and mark this session as awaiting its pong; callers
    /// invoke this from their own ping-interval scheduling (§5).
    pub fn send_ping(&mut self, payload: &[u8]) -> Result<(), Error> {
        {
            let mut state = self.state.lock().unwrap();
            if state.awaiting_pong {
                state.failed = true;
                return Err(Error::PingTimeout);
            }
            state.awaiting_pong = true;
            state.last_ping_at = Some(Instant::now());
        }
        frame::write_raw_frame(&mut self.socket, true, false, Opcode::Ping, payload, self.is_client)
    }
}

fn outgoing_byte_len(item: &Outgoing) -> usize {
    match item {
        Outgoing::Message(Message::Text(t)) => t.len(),
        Outgoing::Message(Message::Binary(b)) => b.len(),
        Outgoing::Close(_, reason) => 2 + reason.len(),
    }
}

fn enqueue_locked(state: &mut State, item: Outgoing, byte_len: usize) -> Result<(), Error> {
    if state.queued_bytes + byte_len > MAX_QUEUE_SIZE {
        state.failed = true;
        state.outgoing_queue.push_back(Outgoing::Close(close_codes::MESSAGE_TOO_BIG, String::new()));
        return Err(Error::QueueOverflow);
    }
    state.queued_bytes += byte_len;
    state.outgoing_queue.push_back(item);
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::socket::DuplexBuffer;
    use std::time::Duration;

    fn config() -> Arc<Config> {
        Config::new().done()
    }

    #[test]
    fn enqueues_and_flushes_a_text_message() {
        let mut ws = RealWebSocket::new(DuplexBuffer::new(Vec::new()), config(), true, None);
        ws.send_text("hello").unwrap();
        ws.flush_writes().unwrap();
        assert!(!ws.socket.output.is_empty());
        assert_eq!(ws.socket.output[0] & 0x0F, 0x1); // text opcode
    }

    #[test]
    fn ping_interleaved_in_a_fragmented_message_does_not_lose_the_fragments() {
        use super::super::frame::{write_raw_frame, Opcode};

        let mut wire = DuplexBuffer::new(Vec::new());
        write_raw_frame(&mut wire, false, false, Opcode::Text, b"hel", false).unwrap();
        write_raw_frame(&mut wire, true, false, Opcode::Ping, b"", false).unwrap();
        write_raw_frame(&mut wire, true, false, Opcode::Continuation, b"lo", false).unwrap();

        let mut ws = RealWebSocket::new(DuplexBuffer::new(wire.output), config(), false, None);

        match ws.process_next_frame().unwrap() {
            Event::Message(Message::Text(text)) => assert_eq!(text, "hello"),
            other => panic!("expected the ping to be answered and the fragmented text to survive it, got {other:?}"),
        }
    }

    #[test]
    fn queue_overflow_is_rejected() {
        let mut small_config = Config::new();
        small_config.max_packet_size(64);
        let ws = RealWebSocket::new(DuplexBuffer::new(Vec::new()), small_config.done(), true, None);
        let big = vec![0u8; MAX_QUEUE_SIZE + 1];
        assert!(matches!(ws.send_binary(big), Err(Error::QueueOverflow)));
    }

    #[test]
    fn close_arms_a_cancel_deadline() {
        let ws = RealWebSocket::new(DuplexBuffer::new(Vec::new()), config(), true, None);
        ws.close(1000, "bye").unwrap();
        assert!(!ws.should_force_cancel(Instant::now()));
        assert!(ws.should_force_cancel(Instant::now() + Duration::from_secs(61)));
    }

    #[test]
    fn ping_without_pong_then_ping_again_is_a_timeout() {
        let mut ws = RealWebSocket::new(DuplexBuffer::new(Vec::new()), config(), true, None);
        ws.send_ping(b"").unwrap();
        assert!(matches!(ws.send_ping(b""), Err(Error::PingTimeout)));
    }
}
