use crate::network::MessageCodec;
use crate::protocol::messages::{Message, MessagePayload, Request, Response};
use rpcmesh_common::{Connection, MeshError};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::debug;

/// A TCP channel to one remote node or registry
///
/// Channels are cheap and short-lived: the client opens one per call and
/// drops it afterwards.
#[derive(Debug)]
pub struct Channel {
    stream: TcpStream,

    peer: SocketAddr,
}

impl Channel {
    pub(crate) fn from_stream(stream: TcpStream, peer: SocketAddr) -> Self {
        Self { stream, peer }
    }

    /// Open a channel to `target`, failing fast when nothing is listening
    pub async fn connect(target: &Connection, timeout: Duration) -> Result<Self, MeshError> {
        target.validate()?;
        let address = target.address();

        let stream = match tokio::time::timeout(timeout, TcpStream::connect(&address)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(MeshError::unavailable(address, e)),
            Err(_) => return Err(MeshError::Timeout(format!("connect to {address}"))),
        };
        stream.set_nodelay(true)?;
        let peer = stream.peer_addr()?;

        debug!("Opened channel to {}", peer);
        Ok(Self { stream, peer })
    }

    pub async fn send(&mut self, message: &Message) -> Result<(), MeshError> {
        MessageCodec::send_message(&mut self.stream, message).await
    }

    pub async fn recv(&mut self) -> Result<Option<Message>, MeshError> {
        MessageCodec::recv_message(&mut self.stream).await
    }

    /// Send one request and wait for its response
    pub async fn request(
        &mut self,
        request: Request,
        timeout: Duration,
    ) -> Result<Response, MeshError> {
        let endpoint = request.endpoint();
        let message = Message::request(request);
        let id = message.message_id;

        let exchange = async {
            self.send(&message).await?;
            self.recv().await
        };

        let reply = tokio::time::timeout(timeout, exchange)
            .await
            .map_err(|_| MeshError::Timeout(endpoint.to_string()))??
            .ok_or_else(|| MeshError::protocol(format!("{endpoint}: connection closed")))?;

        if reply.in_reply_to != Some(id) {
            return Err(MeshError::protocol(format!(
                "{endpoint}: response does not match request {id}"
            )));
        }

        match reply.payload {
            MessagePayload::Response(response) => Ok(response),
            MessagePayload::Request(_) => Err(MeshError::protocol(format!(
                "{endpoint}: expected a response"
            ))),
        }
    }

    /// Get remote address
    pub fn remote_addr(&self) -> SocketAddr {
        self.peer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{Listener, ListenerConfig};

    #[tokio::test]
    async fn test_channel_request_reply() {
        let listener = Listener::bind(ListenerConfig::default()).await.unwrap();
        let addr = listener.local_addr();

        let server = tokio::spawn(async move {
            let mut channel = listener.accept().await.unwrap();
            let request = channel.recv().await.unwrap().unwrap();
            let reply = Message::reply(request.message_id, Response::RegisterAck);
            channel.send(&reply).await.unwrap();
        });

        let target = Connection::new("127.0.0.1", addr.port());
        let mut channel = Channel::connect(&target, Duration::from_secs(5)).await.unwrap();
        assert_eq!(channel.remote_addr().port(), addr.port());

        let response = channel
            .request(Request::ListAll, Duration::from_secs(5))
            .await
            .unwrap();
        assert!(matches!(response, Response::RegisterAck));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_connect_refused_is_transport_error() {
        // Grab a free port, then release it so nothing listens there.
        let listener = Listener::bind(ListenerConfig::default()).await.unwrap();
        let port = listener.local_addr().port();
        drop(listener);

        let err = Channel::connect(&Connection::new("127.0.0.1", port), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(err.is_transport(), "{err}");
    }

    #[tokio::test]
    async fn test_connect_rejects_invalid_target() {
        let err = Channel::connect(&Connection::new("", 80), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, MeshError::Domain(_)));
    }

    #[tokio::test]
    async fn test_peer_closing_without_reply() {
        let listener = Listener::bind(ListenerConfig::default()).await.unwrap();
        let addr = listener.local_addr();

        let server = tokio::spawn(async move {
            let mut channel = listener.accept().await.unwrap();
            let _ = channel.recv().await;
        });

        let target = Connection::new("127.0.0.1", addr.port());
        let mut channel = Channel::connect(&target, Duration::from_secs(5)).await.unwrap();
        let err = channel
            .request(Request::Brew, Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, MeshError::Protocol(_)));
        server.await.unwrap();
    }
}
