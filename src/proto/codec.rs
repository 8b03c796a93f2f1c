use bytes::{BufMut, BytesMut};
use std::io;
use tokio_util::codec::{Decoder, Encoder};

use crate::proto::command::Command;

const ESC: u8 = 0x1b;
const CR: u8 = b'\r';
const LF: u8 = b'\n';

/// Line codec for the Prologix GPIB-USB controller.
#[derive(Default)]
pub struct ProtocolCodec;

impl ProtocolCodec {
    /// A garbled byte must not fail the stream, that would desynchronise
    /// requests and replies. It shows up as U+FFFD and fails number parsing.
    fn convert_string(payload: impl AsRef<[u8]>) -> String {
        String::from_utf8_lossy(payload.as_ref()).into_owned()
    }

    /// Instrument data must not contain bare CR, LF, ESC or '+',
    /// the controller would treat them as framing.
    fn put_escaped(dst: &mut BytesMut, data: &[u8]) {
        for b in data {
            if matches!(*b, CR | LF | ESC | b'+') {
                dst.put_u8(ESC);
            }
            dst.put_u8(*b);
        }
    }
}

impl Decoder for ProtocolCodec {
    type Item = String;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(n) = src.iter().position(|b| *b == LF) {
            let line = src.split_to(n + 1);
            let mut payload = &line[..n];
            if let Some((&CR, rest)) = payload.split_last() {
                payload = rest;
            }
            Ok(Some(Self::convert_string(payload)))
        } else {
            Ok(None)
        }
    }
}

impl Encoder<Command> for ProtocolCodec {
    type Error = io::Error;

    fn encode(&mut self, item: Command, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match &item {
            Command::Data(data) => Self::put_escaped(dst, data.as_bytes()),
            directive => dst.put_slice(directive.to_string().as_bytes()),
        }
        dst.put_u8(LF);
        Ok(())
    }
}
