use bytes::{Bytes, BytesMut};

use crate::error::Result;
use crate::header::{MessageKind, RpcHeader};

/// Codec for one message kind's body, framed by the common header.
///
/// `encode` recomputes `payload_size` in the message header, then writes the
/// header followed by the body. `decode` receives the header already read
/// from the connection and exactly the `payload_size` bytes that followed it.
pub trait MessageBodyCodec {
    type Message;

    /// The `msg_type` this codec handles.
    const KIND: MessageKind;

    fn encode(&self, msg: &mut Self::Message, dst: &mut BytesMut) -> Result<()>;

    fn decode(&self, header: RpcHeader, payload: Bytes) -> Result<Self::Message>;

    /// Encode into a fresh buffer.
    fn encode_to_bytes(&self, msg: &mut Self::Message) -> Result<Bytes> {
        let mut dst = BytesMut::new();
        self.encode(msg, &mut dst)?;
        Ok(dst.freeze())
    }
}
