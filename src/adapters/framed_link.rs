//! [`Link`] over any byte [`Transport`], using length-prefixed
//! [`WireFrame`]s.

use log::warn;
use uuid::Uuid;

use crate::error::LinkError;
use crate::rpc::codec::{WireFrame, encode_wire_frame};
use crate::rpc::dict::Dictionary;
use crate::rpc::registry::TransactionId;
use crate::rpc::transport::{FrameId, Link, Transport};

pub struct FramedLink<T: Transport> {
    transport: T,
    max_frame_size: usize,
}

impl<T: Transport> FramedLink<T> {
    pub fn new(transport: T, max_frame_size: usize) -> Self {
        Self {
            transport,
            max_frame_size,
        }
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    fn write_frame(&mut self, frame: &WireFrame) -> Result<(), LinkError> {
        let bytes = encode_wire_frame(frame, self.max_frame_size)?;
        let mut offset = 0;
        while offset < bytes.len() {
            match self.transport.write(&bytes[offset..]) {
                Ok(0) => return Err(LinkError::Disconnected),
                Ok(n) => offset += n,
                Err(e) => {
                    warn!("IO: write failed: {:?}", e);
                    return Err(LinkError::Io);
                }
            }
        }
        self.transport.flush().map_err(|e| {
            warn!("IO: flush failed: {:?}", e);
            LinkError::Io
        })
    }
}

impl<T: Transport + Send> Link for FramedLink<T> {
    fn send(
        &mut self,
        app: &Uuid,
        transaction_id: TransactionId,
        payload: &Dictionary,
    ) -> Result<(), LinkError> {
        self.write_frame(&WireFrame::Data {
            app: *app,
            frame_id: transaction_id,
            payload: payload.clone(),
        })
    }

    fn ack(&mut self, frame_id: FrameId) -> Result<(), LinkError> {
        self.write_frame(&WireFrame::Ack { frame_id })
    }

    fn nack(&mut self, frame_id: FrameId) -> Result<(), LinkError> {
        self.write_frame(&WireFrame::Nack { frame_id })
    }

    fn start_app(&mut self, app: &Uuid) -> Result<(), LinkError> {
        self.write_frame(&WireFrame::Start { app: *app })
    }

    fn stop_app(&mut self, app: &Uuid) -> Result<(), LinkError> {
        self.write_frame(&WireFrame::Stop { app: *app })
    }
}
