/// Scripted end-to-end scenario with a PASS/FAIL table

use super::render::render_error;
use rpcmesh_common::config::brew;
use rpcmesh_core::{
    Algo, DecodeRequest, EchoRequest, EncodeRequest, Invoker, JokeRequest, Request, Response,
    SortRequest,
};
use std::fmt::Write as _;
use std::time::Duration;
use tracing::info;

/// Outcome of one scripted call
#[derive(Debug, Clone)]
pub struct CaseResult {
    pub name: String,
    pub input: String,
    pub expected: String,
    pub actual: String,
    pub passed: bool,
}

pub struct AutoRunner {
    invoker: Invoker,
    brew_wait: Duration,
}

impl AutoRunner {
    pub fn new(invoker: Invoker) -> Self {
        Self {
            invoker,
            brew_wait: Duration::from_secs(brew::BREW_SECS + 1),
        }
    }

    /// How long to wait for a brew cycle to finish
    pub fn with_brew_wait(mut self, brew_wait: Duration) -> Self {
        self.brew_wait = brew_wait;
        self
    }

    async fn check<F>(
        &self,
        name: &str,
        input: &str,
        expected: &str,
        request: Request,
        judge: F,
    ) -> CaseResult
    where
        F: FnOnce(&Response) -> (String, bool),
    {
        let (actual, passed) = match self.invoker.call(request).await {
            Ok(response) => judge(&response),
            Err(err) => (render_error(&err), false),
        };

        CaseResult {
            name: name.to_string(),
            input: input.to_string(),
            expected: expected.to_string(),
            actual,
            passed,
        }
    }

    /// Run every case in order. Call failures become FAIL rows.
    pub async fn run(&self) -> Vec<CaseResult> {
        let mut results = Vec::new();

        results.push(
            self.check("Echo valid", "Hello", "Hello", parrot("Hello"), |r| match r {
                Response::Echo(e) => (e.message.clone(), e.is_success && e.message == "Hello"),
                other => unexpected(other),
            })
            .await,
        );
        results.push(
            self.check("Echo empty", "\"\"", "No message provided", parrot(""), |r| {
                match r {
                    Response::Echo(e) => (e.error.clone(), !e.is_success),
                    other => unexpected(other),
                }
            })
            .await,
        );

        for number in [2, 0] {
            results.push(
                self.check(
                    &format!("Joke {number}"),
                    &number.to_string(),
                    &format!("{number} jokes"),
                    Request::GetJoke(JokeRequest { number }),
                    |r| match r {
                        Response::Jokes(j) => {
                            (format!("{} jokes", j.jokes.len()), j.jokes.len() == number as usize)
                        }
                        other => unexpected(other),
                    },
                )
                .await,
            );
        }

        results.push(
            self.check("getCup before brew", "-", "refused", Request::GetCup, refused)
                .await,
        );
        results.push(
            self.check("brew start", "-", "accepted", Request::Brew, accepted)
                .await,
        );
        results.push(
            self.check("brew again", "-", "refused", Request::Brew, refused)
                .await,
        );

        info!("Waiting {:?} for the brew cycle", self.brew_wait);
        tokio::time::sleep(self.brew_wait).await;

        results.push(
            self.check("brewStatus", "-", "cups ready", Request::BrewStatus, |r| match r {
                Response::BrewStatus(s) => {
                    (format!("{} cups", s.available_cups), s.available_cups > 0)
                }
                other => unexpected(other),
            })
            .await,
        );
        results.push(
            self.check("getCup", "-", "accepted", Request::GetCup, accepted)
                .await,
        );

        let algos = [
            ("Merge", Algo::Merge),
            ("Quick", Algo::Quick),
            ("Intern", Algo::Intern),
        ];
        for (label, algo) in algos {
            results.push(
                self.check(
                    &format!("Sort {label}"),
                    "[5,3,7,1]",
                    "[1, 3, 5, 7]",
                    sort(Some(algo)),
                    |r| sorted(r, &[1, 3, 5, 7]),
                )
                .await,
            );
        }
        results.push(
            self.check("Sort no algo", "[5,3,7,1]", "error", sort(None), |r| match r {
                Response::Sorted(s) => (s.error.clone(), !s.is_success),
                other => unexpected(other),
            })
            .await,
        );

        results.push(
            self.check("Vigenere encode", "HELLO/KEY", "RIJVS", encode("HELLO", "KEY"), |r| {
                cipher(r, Some("RIJVS"))
            })
            .await,
        );
        results.push(
            self.check("Vigenere decode", "RIJVS/KEY", "HELLO", decode("RIJVS", "KEY"), |r| {
                cipher(r, Some("HELLO"))
            })
            .await,
        );
        results.push(
            self.check("Vigenere empty encode", "\"\"/KEY", "error", encode("", "KEY"), |r| {
                cipher(r, None)
            })
            .await,
        );
        results.push(
            self.check("Vigenere wrong key", "RIJVS/BAD", "not HELLO", decode("RIJVS", "BAD"), |r| {
                match r {
                    Response::Cipher(c) => (c.text.clone(), c.is_success && c.text != "HELLO"),
                    other => unexpected(other),
                }
            })
            .await,
        );
        results.push(
            self.check("Vigenere history", "-", "entries", Request::History, |r| match r {
                Response::History(h) => {
                    (format!("{} entries", h.operations.len()), !h.operations.is_empty())
                }
                other => unexpected(other),
            })
            .await,
        );

        results
    }
}

fn parrot(message: &str) -> Request {
    Request::Parrot(EchoRequest {
        message: message.to_string(),
    })
}

fn sort(algo: Option<Algo>) -> Request {
    Request::Sort(SortRequest {
        data: vec![5, 3, 7, 1],
        algo,
    })
}

fn encode(plaintext: &str, key: &str) -> Request {
    Request::Encode(EncodeRequest {
        plaintext: plaintext.to_string(),
        key: key.to_string(),
    })
}

fn decode(ciphertext: &str, key: &str) -> Request {
    Request::Decode(DecodeRequest {
        ciphertext: ciphertext.to_string(),
        key: key.to_string(),
    })
}

fn unexpected(response: &Response) -> (String, bool) {
    (format!("unexpected {}", response.response_type()), false)
}

fn accepted(response: &Response) -> (String, bool) {
    match response {
        Response::Brew(b) if b.accepted => (b.message.clone(), true),
        Response::Brew(b) => (b.error.clone(), false),
        other => unexpected(other),
    }
}

fn refused(response: &Response) -> (String, bool) {
    match response {
        Response::Brew(b) if b.accepted => (b.message.clone(), false),
        Response::Brew(b) => (b.error.clone(), true),
        other => unexpected(other),
    }
}

fn sorted(response: &Response, expected: &[i64]) -> (String, bool) {
    match response {
        Response::Sorted(s) if s.is_success => (format!("{:?}", s.data), s.data == expected),
        Response::Sorted(s) => (s.error.clone(), false),
        other => unexpected(other),
    }
}

fn cipher(response: &Response, expected: Option<&str>) -> (String, bool) {
    match (response, expected) {
        (Response::Cipher(c), Some(text)) if c.is_success => (c.text.clone(), c.text == text),
        (Response::Cipher(c), Some(_)) => (c.error.clone(), false),
        (Response::Cipher(c), None) => (c.error.clone(), !c.is_success),
        (other, _) => unexpected(other),
    }
}

fn clip(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let kept: String = text.chars().take(width.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

/// Fixed-width table followed by a summary line
pub fn render_table(results: &[CaseResult]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<25} | {:<20} | {:<25} | {:<30} | {:<6}",
        "Test", "Input", "Expected", "Actual", "Result"
    );
    let _ = writeln!(out, "{}", "-".repeat(118));

    for result in results {
        let _ = writeln!(
            out,
            "{:<25} | {:<20} | {:<25} | {:<30} | {:<6}",
            clip(&result.name, 25),
            clip(&result.input, 20),
            clip(&result.expected, 25),
            clip(&result.actual, 30),
            if result.passed { "PASS" } else { "FAIL" }
        );
    }

    let passed = results.iter().filter(|r| r.passed).count();
    let _ = writeln!(out, "\nSUMMARY: {}/{} passed", passed, results.len());
    out
}
