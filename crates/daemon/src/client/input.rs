/// Validation of user-typed arguments before any call is made

use rpcmesh_core::Algo;

/// Parse a comma-separated integer list. Blank items are skipped; anything
/// else that is not an integer is an error.
pub fn parse_numbers(line: &str) -> Result<Vec<i64>, String> {
    line.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            item.parse::<i64>()
                .map_err(|_| format!("Invalid number: {item}"))
        })
        .collect()
}

pub fn parse_algo(line: &str) -> Result<Algo, String> {
    let index = line
        .trim()
        .parse::<u32>()
        .map_err(|_| "Invalid algorithm selection input.".to_string())?;
    Algo::from_index(index).ok_or_else(|| format!("Invalid algorithm selection: {index}"))
}

pub fn parse_joke_count(line: &str) -> Result<u32, String> {
    line.trim()
        .parse::<u32>()
        .map_err(|_| format!("Invalid number of jokes: {}", line.trim()))
}

/// Non-empty and ASCII letters only
pub fn letters_only(label: &str, value: &str) -> Result<String, String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(format!("{label} cannot be empty."));
    }
    if !value.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(format!("{label} must only contain letters."));
    }
    Ok(value.to_string())
}

/// 1-based menu selection into a 0-based index below `len`
pub fn parse_selection(line: &str, len: usize) -> Option<usize> {
    let choice = line.trim().parse::<usize>().ok()?;
    (1..=len).contains(&choice).then(|| choice - 1)
}
