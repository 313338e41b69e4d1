/// Framing for protocol messages
///
/// Every message on the wire is a 4-byte little-endian length prefix
/// followed by the JSON encoding of a [`Message`].
use crate::protocol::messages::Message;
use rpcmesh_common::config::protocol::MAX_MESSAGE_SIZE;
use rpcmesh_common::MeshError;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error};

/// Message codec for sending and receiving messages over byte streams
pub struct MessageCodec;

impl MessageCodec {
    /// Send a message over a stream
    pub async fn send_message<W>(send: &mut W, message: &Message) -> Result<(), MeshError>
    where
        W: AsyncWrite + Unpin,
    {
        let serialized =
            serde_json::to_vec(message).map_err(|e| MeshError::protocol(e.to_string()))?;

        if serialized.len() > MAX_MESSAGE_SIZE {
            return Err(MeshError::protocol(format!(
                "message too large: {} bytes (max {})",
                serialized.len(),
                MAX_MESSAGE_SIZE
            )));
        }

        let len = serialized.len() as u32;
        send.write_all(&len.to_le_bytes()).await?;
        send.write_all(&serialized).await?;
        send.flush().await?;

        debug!(
            "Sent {} message ({} bytes)",
            message.message_type(),
            serialized.len()
        );
        Ok(())
    }

    /// Receive a message from a stream
    ///
    /// Returns `Ok(None)` when the peer closed the stream before a new frame began.
    pub async fn recv_message<R>(recv: &mut R) -> Result<Option<Message>, MeshError>
    where
        R: AsyncRead + Unpin,
    {
        let mut len_buf = [0u8; 4];
        match recv.read_exact(&mut len_buf).await {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                debug!("Stream closed");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        }

        let len = u32::from_le_bytes(len_buf) as usize;

        if len > MAX_MESSAGE_SIZE {
            error!("Message too large: {} bytes (max {})", len, MAX_MESSAGE_SIZE);
            return Err(MeshError::protocol(format!("message too large: {len} bytes")));
        }

        let mut data = vec![0u8; len];
        recv.read_exact(&mut data).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                MeshError::protocol(format!("incomplete message: expected {len} bytes"))
            } else {
                e.into()
            }
        })?;

        let message: Message =
            serde_json::from_slice(&data).map_err(|e| MeshError::protocol(e.to_string()))?;

        debug!("Received {} message ({} bytes)", message.message_type(), len);
        Ok(Some(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::messages::{EchoRequest, MessagePayload, Request};

    #[tokio::test]
    async fn test_send_receive_message() {
        let (mut client, mut server) = tokio::io::duplex(4096);

        let message = Message::request(Request::Parrot(EchoRequest {
            message: "hello".to_string(),
        }));
        MessageCodec::send_message(&mut client, &message).await.unwrap();

        let received = MessageCodec::recv_message(&mut server).await.unwrap().unwrap();
        assert_eq!(message.message_id, received.message_id);
        match received.payload {
            MessagePayload::Request(Request::Parrot(echo)) => assert_eq!(echo.message, "hello"),
            other => panic!("Wrong message type: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_clean_eof_is_none() {
        let (client, mut server) = tokio::io::duplex(64);
        drop(client);
        assert!(MessageCodec::recv_message(&mut server).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_oversized_frame_rejected() {
        let (mut client, mut server) = tokio::io::duplex(64);
        let len = (MAX_MESSAGE_SIZE as u32) + 1;
        client.write_all(&len.to_le_bytes()).await.unwrap();

        let err = MessageCodec::recv_message(&mut server).await.unwrap_err();
        assert!(matches!(err, MeshError::Protocol(_)));
    }

    #[tokio::test]
    async fn test_truncated_frame_rejected() {
        let (mut client, mut server) = tokio::io::duplex(64);
        client.write_all(&10u32.to_le_bytes()).await.unwrap();
        client.write_all(b"{\"a\"").await.unwrap();
        drop(client);

        let err = MessageCodec::recv_message(&mut server).await.unwrap_err();
        assert!(matches!(err, MeshError::Protocol(_)));
    }
}
