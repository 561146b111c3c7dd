use std::{env, fmt::Display, str::FromStr};

/// Parse a boolean flag from a string value, or return the given default value otherwise.
pub fn parse_boolean_flag(value: Option<String>, default: bool) -> bool {
    let value = match value {
        Some(v) => v,
        None => return default,
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

/// Reads and parses the environment variable `name`.
///
/// Returns `Err` with a human-readable reason if the variable is missing or malformed, so that callers can log it and
/// fall back to a default.
pub fn parse_env<T>(name: &str) -> Result<T, String>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = env::var(name).map_err(|e| format!("{name} is not set. {e}"))?;
    raw.trim().parse::<T>().map_err(|e| format!("{raw} is not a valid value for {name}. {e}"))
}
