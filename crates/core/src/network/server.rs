/// Accept loop shared by nodes and the registry
///
/// Each inbound connection gets its own task. A semaphore bounds how many
/// connections are served at once; extra connections wait in the accept
/// loop until a slot frees up.
use crate::network::MessageDispatcher;
use crate::transport::{Channel, Listener};
use rpcmesh_common::MeshError;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

pub struct Server {
    listener: Listener,
    dispatcher: Arc<MessageDispatcher>,
    limit: Arc<Semaphore>,
    grace: Duration,
}

impl Server {
    pub fn new(
        listener: Listener,
        dispatcher: Arc<MessageDispatcher>,
        max_concurrent_calls: usize,
        grace: Duration,
    ) -> Self {
        Self {
            listener,
            dispatcher,
            limit: Arc::new(Semaphore::new(max_concurrent_calls.max(1))),
            grace,
        }
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.listener.local_addr()
    }

    pub fn dispatcher(&self) -> Arc<MessageDispatcher> {
        Arc::clone(&self.dispatcher)
    }

    /// Serve until `shutdown` flips to true, then drain in-flight calls for at
    /// most the grace period before abandoning them.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> Result<(), MeshError> {
        let mut connections = JoinSet::new();
        info!("Serving on {}", self.local_addr());

        loop {
            if *shutdown.borrow() {
                break;
            }

            let permit = tokio::select! {
                permit = Arc::clone(&self.limit).acquire_owned() => {
                    permit.map_err(|e| MeshError::internal(e.to_string()))?
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
            };

            let channel = tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok(channel) => channel,
                    Err(e) => {
                        debug!("Error accepting connection: {}", e);
                        tokio::time::sleep(Duration::from_millis(100)).await;
                        continue;
                    }
                },
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
            };

            debug!("Accepted connection from {}", channel.remote_addr());
            let dispatcher = Arc::clone(&self.dispatcher);
            let shutdown = shutdown.clone();
            connections.spawn(async move {
                serve_channel(channel, dispatcher, shutdown).await;
                drop(permit);
            });

            // Reap finished connection tasks so the set does not grow unbounded.
            while connections.try_join_next().is_some() {}
        }

        info!(
            "Shutting down, waiting up to {:?} for {} connection(s)",
            self.grace,
            connections.len()
        );
        let drain = async { while connections.join_next().await.is_some() {} };
        if tokio::time::timeout(self.grace, drain).await.is_err() {
            warn!("Grace period elapsed, abandoning in-flight calls");
            connections.abort_all();
        }

        self.dispatcher.shutdown().await;
        info!("Server stopped");
        Ok(())
    }
}

/// Answer requests on one channel until the peer hangs up or shutdown begins
async fn serve_channel(
    mut channel: Channel,
    dispatcher: Arc<MessageDispatcher>,
    mut shutdown: watch::Receiver<bool>,
) {
    let peer = channel.remote_addr();
    loop {
        let received = tokio::select! {
            received = channel.recv() => received,
            _ = shutdown.wait_for(|stop| *stop) => {
                debug!("Closing idle connection from {}", peer);
                break;
            }
        };

        let message = match received {
            Ok(Some(message)) => message,
            Ok(None) => break,
            Err(e) => {
                debug!("Error receiving message from {}: {}", peer, e);
                break;
            }
        };

        if let Some(reply) = dispatcher.dispatch_message(message).await {
            if let Err(e) = channel.send(&reply).await {
                warn!("Failed to send response to {}: {}", peer, e);
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::messages::{EchoRequest, Request, Response};
    use crate::services::{CoffeePotService, EchoService};
    use crate::transport::ListenerConfig;
    use rpcmesh_common::Connection;

    async fn start(
        dispatcher: MessageDispatcher,
        grace: Duration,
    ) -> (Connection, watch::Sender<bool>, tokio::task::JoinHandle<Result<(), MeshError>>) {
        let listener = Listener::bind(ListenerConfig::default()).await.unwrap();
        let server = Server::new(listener, Arc::new(dispatcher), 4, grace);
        let target = Connection::new("127.0.0.1", server.local_addr().port());
        let (tx, rx) = watch::channel(false);
        (target, tx, tokio::spawn(server.run(rx)))
    }

    #[tokio::test]
    async fn test_serves_multiple_calls_per_connection() {
        let mut dispatcher = MessageDispatcher::new();
        dispatcher.attach(Arc::new(EchoService::new())).unwrap();
        let (target, stop, handle) = start(dispatcher, Duration::from_secs(5)).await;

        let mut channel = Channel::connect(&target, Duration::from_secs(5)).await.unwrap();
        for word in ["one", "two"] {
            let reply = channel
                .request(
                    Request::Parrot(EchoRequest {
                        message: word.to_string(),
                    }),
                    Duration::from_secs(5),
                )
                .await
                .unwrap();
            assert!(matches!(reply, Response::Echo(echo) if echo.message == word));
        }

        stop.send(true).unwrap();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_client_disconnect_does_not_affect_others() {
        let mut dispatcher = MessageDispatcher::new();
        dispatcher.attach(Arc::new(EchoService::new())).unwrap();
        let (target, stop, handle) = start(dispatcher, Duration::from_secs(5)).await;

        let dropped = Channel::connect(&target, Duration::from_secs(5)).await.unwrap();
        drop(dropped);

        let mut channel = Channel::connect(&target, Duration::from_secs(5)).await.unwrap();
        let reply = channel
            .request(
                Request::Parrot(EchoRequest {
                    message: "still here".to_string(),
                }),
                Duration::from_secs(5),
            )
            .await
            .unwrap();
        assert!(matches!(reply, Response::Echo(_)));

        stop.send(true).unwrap();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_closes_idle_connections_and_runs_hooks() {
        let coffee = Arc::new(CoffeePotService::new());
        let mut dispatcher = MessageDispatcher::new();
        dispatcher.attach(coffee.clone()).unwrap();
        let (target, stop, handle) = start(dispatcher, Duration::from_secs(30)).await;

        let mut channel = Channel::connect(&target, Duration::from_secs(5)).await.unwrap();
        let reply = channel
            .request(Request::Brew, Duration::from_secs(5))
            .await
            .unwrap();
        assert!(matches!(reply, Response::Brew(brew) if brew.accepted));

        // The open channel is idle, so shutdown should not wait out the grace period.
        stop.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("server did not stop")
            .unwrap()
            .unwrap();

        assert_eq!(
            coffee.pot().phase().await,
            crate::services::BrewPhase::Idle
        );
    }
}
