//! Byte transport over any [`std::io::Write`].
//!
//! The receive direction belongs to the reader thread
//! ([`spawn_reader`](crate::rpc::io_task::spawn_reader)).

use std::io::Write;

use crate::rpc::transport::Transport;

pub struct IoTransport<W: Write> {
    writer: W,
}

impl<W: Write> IoTransport<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Transport for IoTransport<W> {
    type Error = std::io::Error;

    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error> {
        self.writer.write(data)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.writer.flush()
    }
}
