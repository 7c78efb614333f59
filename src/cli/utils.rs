use anyhow::{Context, Result};
use std::io::{self, BufRead, Write};

/// Read a password from stdin
///
/// Only the line terminator is stripped; surrounding spaces are part of the
/// password. Works with piped input, e.g. `echo secret | sabjaano-auth create-user ...`.
pub fn read_password(prompt: &str) -> Result<String> {
    eprint!("{}", prompt);
    io::stderr().flush()?;

    let mut input = String::new();
    io::stdin()
        .lock()
        .read_line(&mut input)
        .context("Failed to read password from stdin")?;

    Ok(strip_line_ending(&input).to_string())
}

fn strip_line_ending(line: &str) -> &str {
    line.strip_suffix("\r\n")
        .or_else(|| line.strip_suffix('\n'))
        .unwrap_or(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_line_ending() {
        assert_eq!(strip_line_ending("secret\n"), "secret");
        assert_eq!(strip_line_ending("secret\r\n"), "secret");
        assert_eq!(strip_line_ending(" spaced \n"), " spaced ");
        assert_eq!(strip_line_ending("no-newline"), "no-newline");
    }
}
