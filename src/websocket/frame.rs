//! WebSocket wire framing (§4.6 "Writer"/"Reader"), generalizing the
//! teacher's `zero_copy::{parse_frame, write_packet}` buffer-splicing style
//! into a `Socket`-driven reader/writer that also assembles fragmented
//! messages and passes control frames through mid-fragment.

use byteorder::{BigEndian, ByteOrder};
use rand::{thread_rng, RngCore};
use std::io::{Read, Write};

use crate::socket::Socket;

use super::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Continuation,
    Text,
    Binary,
    Close,
    Ping,
    Pong,
}

impl Opcode {
    fn from_byte(b: u8) -> Result<Opcode, Error> {
        match b {
            0x0 => Ok(Opcode::Continuation),
            0x1 => Ok(Opcode::Text),
            0x2 => Ok(Opcode::Binary),
            0x8 => Ok(Opcode::Close),
            0x9 => Ok(Opcode::Ping),
            0xA => Ok(Opcode::Pong),
            other => Err(Error::InvalidOpcode(other)),
        }
    }

    fn to_byte(self) -> u8 {
        match self {
            Opcode::Continuation => 0x0,
            Opcode::Text => 0x1,
            Opcode::Binary => 0x2,
            Opcode::Close => 0x8,
            Opcode::Ping => 0x9,
            Opcode::Pong => 0xA,
        }
    }

    fn is_control(self) -> bool {
        matches!(self, Opcode::Close | Opcode::Ping | Opcode::Pong)
    }
}

/// One frame off (or onto) the wire, mask already applied/stripped.
#[derive(Debug)]
pub struct RawFrame {
    pub fin: bool,
    /// Set only on the first frame of a (possibly fragmented) compressed
    /// message, per RFC 7692 §6.
    pub rsv1: bool,
    pub opcode: Opcode,
    pub payload: Vec<u8>,
}

/// A complete, reassembled application message. `compressed` carries
/// whether RSV1 was set on the first fragment, so the session layer knows
/// to run it through the inflater before use.
#[derive(Debug)]
pub enum Frame {
    Text { data: Vec<u8>, compressed: bool },
    Binary { data: Vec<u8>, compressed: bool },
    Ping(Vec<u8>),
    Pong(Vec<u8>),
    Close { code: u16, reason: String },
}

/// Read one wire frame, enforcing mask direction, reserved-bit and
/// control-frame rules. `expect_masked` is `true` on the server side
/// (receiving from a client) and `false` on the client side.
pub fn read_raw_frame<S: Socket>(
    socket: &mut S,
    expect_masked: bool,
    permessage_deflate: bool,
    max_payload: usize,
) -> Result<RawFrame, Error> {
    let reader = socket.reader();
    let mut head = [0u8; 2];
    reader.read_exact(&mut head)?;

    let fin = head[0] & 0x80 != 0;
    let rsv1 = head[0] & 0x40 != 0;
    let rsv2 = head[0] & 0x20 != 0;
    let rsv3 = head[0] & 0x10 != 0;
    let opcode = Opcode::from_byte(head[0] & 0x0F)?;

    if rsv2 || rsv3 || (rsv1 && (!permessage_deflate || opcode.is_control())) {
        return Err(Error::ReservedBitSet);
    }

    let masked = head[1] & 0x80 != 0;
    if masked != expect_masked {
        return Err(Error::WrongMaskDirection);
    }

    let len7 = head[1] & 0x7F;
    let len: u64 = match len7 {
        126 => {
            let mut buf = [0u8; 2];
            reader.read_exact(&mut buf)?;
            BigEndian::read_u16(&buf) as u64
        }
        127 => {
            let mut buf = [0u8; 8];
            reader.read_exact(&mut buf)?;
            BigEndian::read_u64(&buf)
        }
        n => n as u64,
    };

    if len as usize > max_payload {
        return Err(Error::TooLong(len as usize));
    }
    if opcode.is_control() {
        if !fin {
            return Err(Error::ControlFrameFragmented);
        }
        if len > 125 {
            return Err(Error::ControlFrameTooLarge);
        }
    }

    let mask_key = if masked {
        let mut key = [0u8; 4];
        reader.read_exact(&mut key)?;
        Some(key)
    } else {
        None
    };

    let mut payload = vec![0u8; len as usize];
    reader.read_exact(&mut payload)?;
    if let Some(key) = mask_key {
        for (i, byte) in payload.iter_mut().enumerate() {
            *byte ^= key[i % 4];
        }
    }

    Ok(RawFrame { fin, rsv1, opcode, payload })
}

/// Write one wire frame. `mask` is `true` for client-originated frames.
pub fn write_raw_frame<S: Socket>(
    socket: &mut S,
    fin: bool,
    rsv1: bool,
    opcode: Opcode,
    payload: &[u8],
    mask: bool,
) -> Result<(), Error> {
    let writer = socket.writer();
    let mut first = opcode.to_byte();
    if fin {
        first |= 0x80;
    }
    if rsv1 {
        first |= 0x40;
    }
    writer.write_all(&[first])?;

    let mask_bit = if mask { 0x80 } else { 0 };
    match payload.len() {
        len @ 0..=125 => writer.write_all(&[len as u8 | mask_bit])?,
        len if len <= 0xFFFF => {
            let mut buf = [0u8; 2];
            BigEndian::write_u16(&mut buf, len as u16);
            writer.write_all(&[126 | mask_bit])?;
            writer.write_all(&buf)?;
        }
        len => {
            let mut buf = [0u8; 8];
            BigEndian::write_u64(&mut buf, len as u64);
            writer.write_all(&[127 | mask_bit])?;
            writer.write_all(&buf)?;
        }
    }

    if mask {
        let mut key = [0u8; 4];
        thread_rng().fill_bytes(&mut key);
        writer.write_all(&key)?;
        let mut masked = payload.to_vec();
        for (i, byte) in masked.iter_mut().enumerate() {
            *byte ^= key[i % 4];
        }
        writer.write_all(&masked)?;
    } else {
        writer.write_all(payload)?;
    }
    Ok(())
}

/// In-progress fragmented message: the first fragment's opcode and RSV1
/// bit, plus the bytes accumulated so far. Must survive across calls to
/// [`read_message`], since a control frame can legally interrupt a
/// fragmented message and is delivered to the caller before the message
/// is complete (§4.6 "Reader").
pub type Assembling = Option<(Opcode, bool, Vec<u8>)>;

/// Read wire frames until a complete application message or control frame
/// is available, transparently assembling `CONTINUATION` fragments and
/// letting control frames interrupt an in-progress fragmented message
/// (§4.6 "Reader"). `assembling` is the caller's fragmentation state: it
/// must be passed back in on the next call unchanged so a control frame
/// delivered mid-fragment doesn't drop the fragments gathered so far.
pub fn read_message<S: Socket>(
    socket: &mut S,
    expect_masked: bool,
    permessage_deflate: bool,
    max_payload: usize,
    assembling: &mut Assembling,
) -> Result<Frame, Error> {
    loop {
        let raw = read_raw_frame(socket, expect_masked, permessage_deflate, max_payload)?;
        if raw.opcode.is_control() {
            return Ok(control_frame(raw)?);
        }

        match (&mut *assembling, raw.opcode) {
            (None, Opcode::Continuation) => return Err(Error::UnexpectedContinuation),
            (None, _) => {
                if raw.fin {
                    return Ok(message_frame(raw.opcode, raw.rsv1, raw.payload)?);
                }
                *assembling = Some((raw.opcode, raw.rsv1, raw.payload));
            }
            (Some(_), Opcode::Continuation) => {
                let (opcode, rsv1, mut buf) = assembling.take().unwrap();
                buf.extend_from_slice(&raw.payload);
                if raw.fin {
                    return Ok(message_frame(opcode, rsv1, buf)?);
                }
                *assembling = Some((opcode, rsv1, buf));
            }
            (Some(_), _) => return Err(Error::ExpectedContinuation),
        }
    }
}

fn message_frame(opcode: Opcode, compressed: bool, data: Vec<u8>) -> Result<Frame, Error> {
    match opcode {
        Opcode::Text => Ok(Frame::Text { data, compressed }),
        Opcode::Binary => Ok(Frame::Binary { data, compressed }),
        _ => unreachable!("message_frame called with a control opcode"),
    }
}

fn control_frame(raw: RawFrame) -> Result<Frame, Error> {
    match raw.opcode {
        Opcode::Ping => Ok(Frame::Ping(raw.payload)),
        Opcode::Pong => Ok(Frame::Pong(raw.payload)),
        Opcode::Close => {
            if raw.payload.is_empty() {
                Ok(Frame::Close { code: super::close_codes::NO_STATUS_RECEIVED, reason: String::new() })
            } else if raw.payload.len() == 1 {
                Err(Error::TruncatedCloseCode)
            } else {
                let code = BigEndian::read_u16(&raw.payload[..2]);
                if !super::close_codes::is_valid_on_wire(code) {
                    return Err(Error::InvalidCloseCode(code));
                }
                let reason = std::str::from_utf8(&raw.payload[2..])?.to_string();
                Ok(Frame::Close { code, reason })
            }
        }
        _ => unreachable!("control_frame called with a non-control opcode"),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::socket::DuplexBuffer;

    #[test]
    fn round_trips_a_masked_text_frame() {
        let mut socket = DuplexBuffer::new(Vec::new());
        write_raw_frame(&mut socket, true, false, Opcode::Text, b"hello", true).unwrap();

        let mut server_view = DuplexBuffer::new(socket.output);
        let frame = read_raw_frame(&mut server_view, true, false, 1 << 20).unwrap();
        assert_eq!(frame.opcode, Opcode::Text);
        assert_eq!(frame.payload, b"hello");
    }

    #[test]
    fn assembles_fragmented_message() {
        let mut socket = DuplexBuffer::new(Vec::new());
        write_raw_frame(&mut socket, false, false, Opcode::Text, b"hel", true).unwrap();
        write_raw_frame(&mut socket, true, false, Opcode::Continuation, b"lo", true).unwrap();

        let mut server_view = DuplexBuffer::new(socket.output);
        let mut assembling = None;
        let msg = read_message(&mut server_view, true, false, 1 << 20, &mut assembling).unwrap();
        match msg {
            Frame::Text { data, compressed } => {
                assert_eq!(data, b"hello");
                assert!(!compressed);
            }
            _ => panic!("expected text frame"),
        }
    }

    #[test]
    fn control_frame_interrupts_fragmented_message_without_losing_it() {
        let mut socket = DuplexBuffer::new(Vec::new());
        write_raw_frame(&mut socket, false, false, Opcode::Text, b"hel", true).unwrap();
        write_raw_frame(&mut socket, true, false, Opcode::Ping, b"ping-payload", true).unwrap();
        write_raw_frame(&mut socket, true, false, Opcode::Continuation, b"lo", true).unwrap();

        let mut server_view = DuplexBuffer::new(socket.output);
        let mut assembling = None;

        let msg = read_message(&mut server_view, true, false, 1 << 20, &mut assembling).unwrap();
        match msg {
            Frame::Ping(payload) => assert_eq!(payload, b"ping-payload"),
            _ => panic!("expected ping frame to be delivered ahead of the in-progress message"),
        }
        assert!(assembling.is_some(), "fragments gathered so far must survive the control frame");

        let msg = read_message(&mut server_view, true, false, 1 << 20, &mut assembling).unwrap();
        match msg {
            Frame::Text { data, compressed } => {
                assert_eq!(data, b"hello");
                assert!(!compressed);
            }
            _ => panic!("expected the continuation to complete the text message"),
        }
    }

    #[test]
    fn rejects_wrong_mask_direction() {
        let mut socket = DuplexBuffer::new(Vec::new());
        write_raw_frame(&mut socket, true, false, Opcode::Text, b"hi", false).unwrap();
        let mut server_view = DuplexBuffer::new(socket.output);
        assert!(matches!(read_raw_frame(&mut server_view, true, false, 1 << 20), Err(Error::WrongMaskDirection)));
    }

    #[test]
    fn empty_close_frame_defaults_to_no_status_received() {
        let mut socket = DuplexBuffer::new(Vec::new());
        write_raw_frame(&mut socket, true, false, Opcode::Close, b"", true).unwrap();
        let mut server_view = DuplexBuffer::new(socket.output);
        let msg = read_message(&mut server_view, true, false, 1 << 20, &mut None).unwrap();
        match msg {
            Frame::Close { code, reason } => {
                assert_eq!(code, 1005);
                assert!(reason.is_empty());
            }
            _ => panic!("expected close frame"),
        }
    }

    #[test]
    fn rejects_invalid_close_code() {
        let mut socket = DuplexBuffer::new(Vec::new());
        let mut payload = vec![0u8; 2];
        BigEndian::write_u16(&mut payload, 1006);
        write_raw_frame(&mut socket, true, false, Opcode::Close, &payload, true).unwrap();
        let mut server_view = DuplexBuffer::new(socket.output);
        assert!(matches!(
            read_message(&mut server_view, true, false, 1 << 20, &mut None),
            Err(Error::InvalidCloseCode(1006))
        ));
    }
}
