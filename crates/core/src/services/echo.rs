use super::{misrouted, BoxFuture, Service};
use crate::protocol::{EchoResponse, EndpointKind, Request, Response};

/// Echoes a message back to the caller
#[derive(Debug, Default)]
pub struct EchoService;

impl EchoService {
    pub fn new() -> Self {
        Self
    }

    pub fn parrot(&self, message: &str) -> EchoResponse {
        if message.is_empty() {
            return EchoResponse {
                is_success: false,
                error: "No message provided".to_string(),
                ..Default::default()
            };
        }

        EchoResponse {
            is_success: true,
            message: message.to_string(),
            ..Default::default()
        }
    }
}

impl Service for EchoService {
    fn name(&self) -> &'static str {
        "services.Echo"
    }

    fn endpoints(&self) -> &'static [EndpointKind] {
        &[EndpointKind::EchoParrot]
    }

    fn handle(&self, request: Request) -> BoxFuture<'_, Response> {
        Box::pin(async move {
            match request {
                Request::Parrot(echo) => Response::Echo(self.parrot(&echo.message)),
                other => misrouted(self.name(), &other),
            }
        })
    }
}
