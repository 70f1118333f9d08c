//! Blocking operator checkpoints
//!
//! Provisioning needs a human to physically switch Wi-Fi networks twice,
//! and to decide whether a timed-out configure attempt is worth retrying.
//! Both are plain synchronous console interactions with no timeout of
//! their own; the workflow simply suspends until the operator answers.

use std::io::{self, BufRead, Write};

/// Human checkpoints the provisioning workflow suspends on.
pub trait Operator {
    /// Print `message` and block until the operator presses ENTER.
    fn checkpoint(&mut self, message: &str) -> io::Result<()>;

    /// Ask a yes/no question, defaulting to yes on empty input and
    /// re-asking until the answer is recognizable.
    fn confirm(&mut self, message: &str) -> io::Result<bool>;
}

/// Classify one line of confirmation input. `None` means "ask again".
pub fn parse_confirmation(input: &str) -> Option<bool> {
    match input.trim_end_matches(['\r', '\n']) {
        "" | "y" | "Y" => Some(true),
        "n" | "N" => Some(false),
        _ => None,
    }
}

/// Console-backed [`Operator`], generic over its streams so the prompt
/// loop can be driven from buffers in tests.
pub struct ConsolePrompt<R, W> {
    input: R,
    output: W,
}

impl ConsolePrompt<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> ConsolePrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Operator for ConsolePrompt<R, W> {
    fn checkpoint(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.output, "{}", message)?;
        self.output.flush()?;
        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(())
    }

    fn confirm(&mut self, message: &str) -> io::Result<bool> {
        loop {
            write!(self.output, "{}", message)?;
            self.output.flush()?;
            let mut line = String::new();
            // EOF counts as a decline rather than an endless re-prompt.
            if self.input.read_line(&mut line)? == 0 {
                return Ok(false);
            }
            if let Some(answer) = parse_confirmation(&line) {
                return Ok(answer);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_confirmation() {
        assert_eq!(parse_confirmation(""), Some(true));
        assert_eq!(parse_confirmation("\n"), Some(true));
        assert_eq!(parse_confirmation("y\n"), Some(true));
        assert_eq!(parse_confirmation("Y\r\n"), Some(true));
        assert_eq!(parse_confirmation("n\n"), Some(false));
        assert_eq!(parse_confirmation("N"), Some(false));
        assert_eq!(parse_confirmation("yes\n"), None);
        assert_eq!(parse_confirmation("q\n"), None);
        assert_eq!(parse_confirmation(" \n"), None);
    }

    #[test]
    fn test_confirm_reprompts_until_recognizable() {
        let input = Cursor::new(b"maybe\nq\ny\n".to_vec());
        let mut out = Vec::new();
        let mut prompt = ConsolePrompt::new(input, &mut out);

        assert!(prompt.confirm("Retry? [Y/n] ").unwrap());
        let shown = String::from_utf8(out).unwrap();
        assert_eq!(shown.matches("Retry? [Y/n] ").count(), 3);
    }

    #[test]
    fn test_confirm_default_is_yes() {
        let input = Cursor::new(b"\n".to_vec());
        let mut prompt = ConsolePrompt::new(input, Vec::new());
        assert!(prompt.confirm("Retry? [Y/n] ").unwrap());
    }

    #[test]
    fn test_confirm_decline() {
        let input = Cursor::new(b"n\n".to_vec());
        let mut prompt = ConsolePrompt::new(input, Vec::new());
        assert!(!prompt.confirm("Retry? [Y/n] ").unwrap());
    }

    #[test]
    fn test_confirm_declines_on_eof() {
        let input = Cursor::new(Vec::new());
        let mut prompt = ConsolePrompt::new(input, Vec::new());
        assert!(!prompt.confirm("Retry? [Y/n] ").unwrap());
    }

    #[test]
    fn test_checkpoint_consumes_one_line() {
        let input = Cursor::new(b"\n".to_vec());
        let mut out = Vec::new();
        let mut prompt = ConsolePrompt::new(input, &mut out);

        prompt.checkpoint("Join the node's access point, then press ENTER.").unwrap();
        assert!(String::from_utf8(out)
            .unwrap()
            .contains("Join the node's access point"));
    }
}
