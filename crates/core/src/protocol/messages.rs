use crate::protocol::EndpointKind;
use rpcmesh_common::{Connection, EndpointName, MeshError, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Protocol message envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Request or response body
    pub payload: MessagePayload,

    /// Message ID for tracking
    pub message_id: MessageId,

    /// The request this message answers, if it is a response
    pub in_reply_to: Option<MessageId>,

    /// Timestamp when message was created
    pub timestamp: Timestamp,
}

impl Message {
    pub fn new(payload: MessagePayload) -> Self {
        Self {
            payload,
            message_id: MessageId::generate(),
            in_reply_to: None,
            timestamp: Timestamp::now(),
        }
    }

    pub fn request(request: Request) -> Self {
        Self::new(MessagePayload::Request(request))
    }

    pub fn reply(to: MessageId, response: Response) -> Self {
        Self {
            in_reply_to: Some(to),
            ..Self::new(MessagePayload::Response(response))
        }
    }

    pub fn message_type(&self) -> &str {
        match &self.payload {
            MessagePayload::Request(request) => request.endpoint().full_name(),
            MessagePayload::Response(response) => response.response_type(),
        }
    }
}

/// Unique message identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId([u8; 16]);

impl MessageId {
    pub fn generate() -> Self {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        let mut bytes = [0u8; 16];
        rng.fill(&mut bytes);
        Self(bytes)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "body")]
pub enum MessagePayload {
    Request(Request),
    Response(Response),
}

/// One unary call. Each variant maps to exactly one [`EndpointKind`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum Request {
    // Registry
    Register(RegisterRequest),
    ListAll,
    Resolve(ResolveRequest),

    // Node-local catalogue
    ListLocal,

    Parrot(EchoRequest),
    GetJoke(JokeRequest),
    SetJoke(JokeSetRequest),

    // Coffee pot
    Brew,
    GetCup,
    BrewStatus,

    Sort(SortRequest),

    // Vigenere cipher
    Encode(EncodeRequest),
    Decode(DecodeRequest),
    History,
}

impl Request {
    pub fn endpoint(&self) -> EndpointKind {
        match self {
            Self::Register(_) => EndpointKind::RegistryRegister,
            Self::ListAll => EndpointKind::RegistryListAll,
            Self::Resolve(_) => EndpointKind::RegistryResolve,
            Self::ListLocal => EndpointKind::CatalogList,
            Self::Parrot(_) => EndpointKind::EchoParrot,
            Self::GetJoke(_) => EndpointKind::JokeGet,
            Self::SetJoke(_) => EndpointKind::JokeSet,
            Self::Brew => EndpointKind::CoffeeBrew,
            Self::GetCup => EndpointKind::CoffeeGetCup,
            Self::BrewStatus => EndpointKind::CoffeeBrewStatus,
            Self::Sort(_) => EndpointKind::SortSort,
            Self::Encode(_) => EndpointKind::VigenereEncode,
            Self::Decode(_) => EndpointKind::VigenereDecode,
            Self::History => EndpointKind::VigenereHistory,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "body")]
pub enum Response {
    RegisterAck,
    EndpointList(EndpointListResponse),
    Resolved(ResolveResponse),
    Echo(EchoResponse),
    Jokes(JokeResponse),
    JokeSet(JokeSetResponse),
    Brew(BrewResponse),
    BrewStatus(BrewStatusResponse),
    Sorted(SortResponse),
    Cipher(CipherResponse),
    History(HistoryResponse),
    Failure(ErrorMessage),
}

impl Response {
    pub fn failure(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Failure(ErrorMessage {
            code,
            message: message.into(),
        })
    }

    pub fn response_type(&self) -> &str {
        match self {
            Self::RegisterAck => "register_ack",
            Self::EndpointList(_) => "endpoint_list",
            Self::Resolved(_) => "resolved",
            Self::Echo(_) => "echo",
            Self::Jokes(_) => "jokes",
            Self::JokeSet(_) => "joke_set",
            Self::Brew(_) => "brew",
            Self::BrewStatus(_) => "brew_status",
            Self::Sorted(_) => "sorted",
            Self::Cipher(_) => "cipher",
            Self::History(_) => "history",
            Self::Failure(_) => "failure",
        }
    }

    /// Lifts a wire-level failure into the local error taxonomy.
    pub fn into_result(self) -> Result<Response, MeshError> {
        match self {
            Self::Failure(ErrorMessage { code, message }) => Err(match code {
                ErrorCode::NotFound => MeshError::NotFound(message),
                ErrorCode::UnknownEndpoint => MeshError::UnknownEndpoint(message),
                ErrorCode::MalformedInput => MeshError::MalformedInput(message),
                ErrorCode::Internal => MeshError::Remote(message),
            }),
            other => Ok(other),
        }
    }
}

// ============================================================================
// Registry Messages
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub endpoint_name: String,
    pub connection: Connection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveRequest {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointListResponse {
    pub names: Vec<EndpointName>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveResponse {
    pub connection: Connection,
}

// ============================================================================
// Service Messages
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EchoRequest {
    pub message: String,
}

/// Two-channel reply: `is_success` selects between `message` and `error`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EchoResponse {
    pub is_success: bool,
    pub message: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JokeRequest {
    pub number: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JokeResponse {
    pub jokes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JokeSetRequest {
    pub joke: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JokeSetResponse {
    pub ok: bool,
}

/// Reply to `brew` and `getCup`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BrewResponse {
    pub accepted: bool,
    pub message: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BrewStatusResponse {
    pub minutes_remaining: u64,
    pub seconds_remaining: u64,
    pub available_cups: u32,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Algo {
    Merge,
    Quick,
    Intern,
}

impl Algo {
    pub fn from_index(index: u32) -> Option<Self> {
        match index {
            0 => Some(Self::Merge),
            1 => Some(Self::Quick),
            2 => Some(Self::Intern),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortRequest {
    pub data: Vec<i64>,
    pub algo: Option<Algo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SortResponse {
    pub is_success: bool,
    pub data: Vec<i64>,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodeRequest {
    pub plaintext: String,
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeRequest {
    pub ciphertext: String,
    pub key: String,
}

/// Reply to `encode` and `decode`; `text` is the cipher or plain text.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CipherResponse {
    pub is_success: bool,
    pub text: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub operations: Vec<String>,
}

// ============================================================================
// Error Messages
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMessage {
    /// Error code
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    NotFound,
    UnknownEndpoint,
    MalformedInput,
    Internal,
}
