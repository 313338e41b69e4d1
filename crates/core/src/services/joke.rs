use super::{misrouted, BoxFuture, Service};
use crate::protocol::{EndpointKind, JokeResponse, JokeSetResponse, Request, Response};
use std::collections::VecDeque;
use tokio::sync::Mutex;

const OUT_OF_JOKES: &str = "I am out of jokes...";

const INITIAL_JOKES: [&str; 4] = [
    "Did you hear the rumor about butter? Well, I'm not going to spread it!",
    "What do you call someone with no body and no nose? Nobody knows.",
    "I don't trust stairs. They're always up to something.",
    "How do you get a squirrel to like you? Act like a nut.",
];

/// Hands out jokes, each at most once, and accepts new ones
#[derive(Debug)]
pub struct JokeService {
    jokes: Mutex<VecDeque<String>>,
}

impl Default for JokeService {
    fn default() -> Self {
        Self::new()
    }
}

impl JokeService {
    pub fn new() -> Self {
        Self {
            jokes: Mutex::new(INITIAL_JOKES.iter().map(|j| j.to_string()).collect()),
        }
    }

    /// Take up to `number` jokes off the queue.
    ///
    /// Running dry appends a single out-of-jokes line and stops.
    pub async fn get_jokes(&self, number: u32) -> Vec<String> {
        let mut jokes = self.jokes.lock().await;
        let mut taken = Vec::new();
        for _ in 0..number {
            match jokes.pop_front() {
                Some(joke) => taken.push(joke),
                None => {
                    taken.push(OUT_OF_JOKES.to_string());
                    break;
                }
            }
        }
        taken
    }

    pub async fn set_joke(&self, joke: &str) -> bool {
        if joke.trim().is_empty() {
            return false;
        }
        self.jokes.lock().await.push_back(joke.to_string());
        true
    }
}

impl Service for JokeService {
    fn name(&self) -> &'static str {
        "services.Joke"
    }

    fn endpoints(&self) -> &'static [EndpointKind] {
        &[EndpointKind::JokeGet, EndpointKind::JokeSet]
    }

    fn handle(&self, request: Request) -> BoxFuture<'_, Response> {
        Box::pin(async move {
            match request {
                Request::GetJoke(req) => Response::Jokes(JokeResponse {
                    jokes: self.get_jokes(req.number).await,
                }),
                Request::SetJoke(req) => Response::JokeSet(JokeSetResponse {
                    ok: self.set_joke(&req.joke).await,
                }),
                other => misrouted(self.name(), &other),
            }
        })
    }
}
