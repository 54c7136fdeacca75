//! Interactive confirmation prompt.

use std::io::{self, BufRead, Write};

/// Ask a yes/no question. An empty answer counts as yes.
pub fn ask_confirm<W: Write, R: BufRead>(out: &mut W, input: &mut R, prompt: &str) -> io::Result<bool> {
    write!(out, "{} [Y/n]", prompt)?;
    out.flush()?;

    let mut response = String::new();
    if input.read_line(&mut response)? == 0 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "no answer given",
        ));
    }

    let response = response.trim().to_lowercase();
    Ok(response.is_empty() || response == "y" || response == "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ask(answer: &str) -> io::Result<bool> {
        let mut out = Vec::new();
        ask_confirm(&mut out, &mut answer.as_bytes(), "Apply changes?")
    }

    #[test]
    fn test_prompt_text() {
        let mut out = Vec::new();
        ask_confirm(&mut out, &mut "y\n".as_bytes(), "Apply changes?").unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Apply changes? [Y/n]");
    }

    #[test]
    fn test_accepting_answers() {
        for answer in ["\n", "y\n", "Y\n", "yes\n", "YES\n", "  Yes  \n", "y"] {
            assert!(ask(answer).unwrap(), "{:?} should confirm", answer);
        }
    }

    #[test]
    fn test_rejecting_answers() {
        for answer in ["n\n", "no\n", "yep\n", "sure\n"] {
            assert!(!ask(answer).unwrap(), "{:?} should not confirm", answer);
        }
    }

    #[test]
    fn test_eof_is_an_error() {
        let err = ask("").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
