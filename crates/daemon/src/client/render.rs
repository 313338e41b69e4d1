/// One-line, human-readable rendering of replies and failures

use rpcmesh_common::MeshError;
use rpcmesh_core::Response;

pub fn render(response: &Response) -> String {
    match response {
        Response::Echo(echo) if echo.is_success => format!("Echo: {}", echo.message),
        Response::Echo(echo) => format!("Echo error: {}", echo.error),
        Response::Jokes(jokes) if jokes.jokes.is_empty() => "No jokes.".to_string(),
        Response::Jokes(jokes) => jokes
            .jokes
            .iter()
            .map(|joke| format!("- {joke}"))
            .collect::<Vec<_>>()
            .join("; "),
        Response::JokeSet(set) if set.ok => "Joke added.".to_string(),
        Response::JokeSet(_) => "Joke rejected.".to_string(),
        Response::Brew(brew) if brew.accepted => brew.message.clone(),
        Response::Brew(brew) => format!("Error: {}", brew.error),
        Response::BrewStatus(status) => format!(
            "Status: {} ({}m {}s)",
            status.message, status.minutes_remaining, status.seconds_remaining
        ),
        Response::Sorted(sorted) if sorted.is_success => format!("Sorted: {:?}", sorted.data),
        Response::Sorted(sorted) => format!("Error: {}", sorted.error),
        Response::Cipher(cipher) if cipher.is_success => format!("Result: {}", cipher.text),
        Response::Cipher(cipher) => format!("Cipher error: {}", cipher.error),
        Response::History(history) if history.operations.is_empty() => {
            "Vigenere history: (empty)".to_string()
        }
        Response::History(history) => {
            format!("Vigenere history: {}", history.operations.join(", "))
        }
        Response::EndpointList(list) => format!("{} endpoints", list.names.len()),
        Response::Resolved(resolved) => format!("Served by {}", resolved.connection),
        Response::RegisterAck => "Registered.".to_string(),
        Response::Failure(failure) => format!("Error: {}", failure.message),
    }
}

pub fn render_error(err: &MeshError) -> String {
    match err {
        MeshError::TransportUnavailable { address, .. } => {
            format!("Could not reach {address}; is it running?")
        }
        MeshError::NotFound(name) => format!("No server registered for {name}."),
        MeshError::UnknownEndpoint(name) => format!("Unknown method: {name}"),
        other => format!("Call failed: {other}"),
    }
}

pub fn render_result(result: &Result<Response, MeshError>) -> String {
    match result {
        Ok(response) => render(response),
        Err(err) => render_error(err),
    }
}
