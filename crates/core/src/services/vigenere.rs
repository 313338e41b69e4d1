use super::{misrouted, BoxFuture, Service};
use crate::protocol::{CipherResponse, EndpointKind, HistoryResponse, Request, Response};
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Encode,
    Decode,
}

/// Vigenere cipher over ASCII letters, keeping a log of every operation
#[derive(Debug, Default)]
pub struct VigenereService {
    history: Mutex<Vec<String>>,
}

impl VigenereService {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn encode(&self, plaintext: &str, key: &str) -> CipherResponse {
        self.run(Direction::Encode, plaintext, key).await
    }

    pub async fn decode(&self, ciphertext: &str, key: &str) -> CipherResponse {
        self.run(Direction::Decode, ciphertext, key).await
    }

    pub async fn history(&self) -> Vec<String> {
        self.history.lock().await.clone()
    }

    async fn run(&self, direction: Direction, input: &str, key: &str) -> CipherResponse {
        if let Err(error) = validate(direction, input, key) {
            return CipherResponse {
                is_success: false,
                error: error.to_string(),
                ..Default::default()
            };
        }

        let text = apply(direction, input, key);
        let tag = match direction {
            Direction::Encode => 'E',
            Direction::Decode => 'D',
        };
        self.history
            .lock()
            .await
            .push(format!("{tag}:{input}->{text}"));

        CipherResponse {
            is_success: true,
            text,
            ..Default::default()
        }
    }
}

fn validate(direction: Direction, input: &str, key: &str) -> Result<(), &'static str> {
    if input.is_empty() {
        return Err(match direction {
            Direction::Encode => "Plaintext cannot be empty.",
            Direction::Decode => "Ciphertext cannot be empty.",
        });
    }
    if key.is_empty() {
        return Err("Key cannot be empty.");
    }
    if !key.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err("Key must only contain letters.");
    }
    Ok(())
}

/// Shift letters by the key, preserving case; other characters pass through
/// without consuming a key letter.
fn apply(direction: Direction, input: &str, key: &str) -> String {
    let shifts: Vec<u8> = key.bytes().map(|b| b.to_ascii_uppercase() - b'A').collect();
    let mut k = 0;

    input
        .chars()
        .map(|c| {
            if !c.is_ascii_alphabetic() {
                return c;
            }
            let base = if c.is_ascii_uppercase() { b'A' } else { b'a' };
            let shift = shifts[k % shifts.len()];
            k += 1;

            let offset = c as u8 - base;
            let shifted = match direction {
                Direction::Encode => (offset + shift) % 26,
                Direction::Decode => (offset + 26 - shift) % 26,
            };
            (base + shifted) as char
        })
        .collect()
}

impl Service for VigenereService {
    fn name(&self) -> &'static str {
        "services.Vigenere"
    }

    fn endpoints(&self) -> &'static [EndpointKind] {
        &[
            EndpointKind::VigenereEncode,
            EndpointKind::VigenereDecode,
            EndpointKind::VigenereHistory,
        ]
    }

    fn handle(&self, request: Request) -> BoxFuture<'_, Response> {
        Box::pin(async move {
            match request {
                Request::Encode(req) => {
                    Response::Cipher(self.encode(&req.plaintext, &req.key).await)
                }
                Request::Decode(req) => {
                    Response::Cipher(self.decode(&req.ciphertext, &req.key).await)
                }
                Request::History => Response::History(HistoryResponse {
                    operations: self.history().await,
                }),
                other => misrouted(self.name(), &other),
            }
        })
    }
}
