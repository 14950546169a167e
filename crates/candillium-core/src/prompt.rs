use std::io::{BufRead, Write};

/// Blocking free-text prompt. `Ok(None)` means the operator cancelled.
pub trait Prompt {
    fn ask(&mut self, message: &str) -> anyhow::Result<Option<String>>;
}

/// Line prompt over any reader/writer pair. End of input cancels; an empty
/// line is an answer, not a cancellation.
pub struct LinePrompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LinePrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Prompt for LinePrompt<R, W> {
    fn ask(&mut self, message: &str) -> anyhow::Result<Option<String>> {
        write!(self.output, "{message}: ")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::{LinePrompt, Prompt};

    #[test]
    fn reads_one_line_per_question() {
        let mut out = Vec::new();
        let mut prompt = LinePrompt::new(Cursor::new("Buy milk\n\n"), &mut out);

        assert_eq!(
            prompt.ask("Todo content").expect("ask"),
            Some("Buy milk".to_string())
        );
        assert_eq!(prompt.ask("Todo content").expect("ask"), Some(String::new()));
        assert_eq!(prompt.ask("Todo content").expect("ask"), None);
        drop(prompt);

        assert!(String::from_utf8_lossy(&out).starts_with("Todo content: "));
    }
}
