use anyhow::{Context, Result};
use std::io::{BufRead, Write};

use crate::output::{format_progress, format_sample_choice};
use crate::scoring::DraftTracker;

/// Line-oriented prompts over any reader/writer pair (stdin/stdout in the
/// binary, in-memory buffers in tests).
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn say(&mut self, message: &str) -> Result<()> {
        writeln!(self.output, "{}", message).context("Failed to write output")
    }

    /// Prompt with a message and return the trimmed input, or None at end of input.
    pub fn ask(&mut self, message: &str) -> Result<Option<String>> {
        write!(self.output, "{}", message).context("Failed to write prompt")?;
        self.output.flush().context("Failed to flush stdout")?;

        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .context("Failed to read input")?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Prompt with a yes/no question. End of input counts as the default.
    pub fn ask_yes_no(&mut self, message: &str, default_yes: bool) -> Result<bool> {
        let hint = if default_yes { "Y/n" } else { "y/N" };
        let input = self.ask(&format!("{} [{}]: ", message, hint))?;
        match input.map(|s| s.to_lowercase()) {
            None => Ok(default_yes),
            Some(s) if s.is_empty() => Ok(default_yes),
            Some(s) => Ok(s == "y" || s == "yes"),
        }
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

/// How a rating session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The draft is complete and the rater asked to submit it
    Submit,
    /// The rater left; the draft may be partial
    Quit,
}

/// Walk a rater through the samples until they submit a complete draft or quit.
pub fn run_rating_session<R: BufRead, W: Write>(
    io: &mut Prompter<R, W>,
    rater: &str,
    draft: &mut DraftTracker,
) -> Result<SessionEnd> {
    let sample_count = draft.rubric().samples().len();

    loop {
        io.say("")?;
        io.say(&format!("Scoring: {}", rater))?;
        let choices: Vec<String> = draft
            .rubric()
            .samples()
            .iter()
            .enumerate()
            .map(|(i, label)| format_sample_choice(i, label, draft.is_sample_complete(i)))
            .collect();
        for choice in choices {
            io.say(&choice)?;
        }
        io.say(&format_progress(draft.progress(), sample_count))?;

        let Some(input) = io.ask(&format!(
            "Select set [1-{}], 's' to submit, 'q' to quit: ",
            sample_count
        ))?
        else {
            return Ok(SessionEnd::Quit);
        };

        match input.as_str() {
            "q" | "Q" => return Ok(SessionEnd::Quit),
            "s" | "S" => {
                if draft.is_complete() {
                    return Ok(SessionEnd::Submit);
                }
                io.say(&format!(
                    "  Not finished: {} score(s) still missing.",
                    draft.missing().len()
                ))?;
            }
            other => match other.parse::<usize>() {
                Ok(n) if (1..=sample_count).contains(&n) => {
                    if !score_sample(io, draft, n - 1)? {
                        return Ok(SessionEnd::Quit);
                    }
                }
                _ => io.say("  Invalid choice. Try again.")?,
            },
        }
    }
}

/// Prompt for every category of one sample. Returns false at end of input.
fn score_sample<R: BufRead, W: Write>(
    io: &mut Prompter<R, W>,
    draft: &mut DraftTracker,
    sample: usize,
) -> Result<bool> {
    let label = draft.rubric().samples()[sample].clone();
    let categories = draft.rubric().categories().to_vec();

    io.say("")?;
    io.say(&label)?;

    for category in &categories {
        let current = draft.score(&label, &category.id);
        let hint = match current {
            Some(v) => format!(" (current {}, enter to keep)", v),
            None => String::new(),
        };

        loop {
            let Some(input) = io.ask(&format!(
                "  {} [{}-{}]{}: ",
                category.name, category.min, category.max, hint
            ))?
            else {
                return Ok(false);
            };

            if input.is_empty() && current.is_some() {
                break;
            }

            match input.parse::<i64>() {
                Ok(value) => match draft.set_score(&label, &category.id, value) {
                    Ok(()) => break,
                    Err(e) => io.say(&format!("  Invalid: {}. Try again.", e))?,
                },
                Err(_) => io.say("  Invalid: enter a whole number. Try again.")?,
            }
        }
    }

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CategoryConfig, Config};
    use crate::scoring::Rubric;
    use std::io::Cursor;
    use std::sync::Arc;

    fn draft() -> DraftTracker {
        let config = Config {
            categories: vec![CategoryConfig::new("a", "Alpha"), CategoryConfig::new("b", "Beta")],
            samples: vec!["S1".to_string(), "S2".to_string()],
            ..Config::default()
        };
        DraftTracker::new(Arc::new(Rubric::from_config(&config).unwrap()))
    }

    fn run(script: &str, draft: &mut DraftTracker) -> (SessionEnd, String) {
        let mut io = Prompter::new(Cursor::new(script.as_bytes().to_vec()), Vec::new());
        let end = run_rating_session(&mut io, "X", draft).unwrap();
        (end, String::from_utf8(io.into_output()).unwrap())
    }

    #[test]
    fn test_full_session_submits() {
        let mut draft = draft();
        let (end, output) = run("1\n8\n6\n2\n4\n4\ns\n", &mut draft);

        assert_eq!(end, SessionEnd::Submit);
        assert!(draft.is_complete());
        assert_eq!(draft.score("S2", "b"), Some(4));
        assert!(output.contains(" 1. S1 ✓"));
        assert!(output.contains("Completed: 2/2 sets"));
    }

    #[test]
    fn test_out_of_range_reprompts() {
        let mut draft = draft();
        let (end, output) = run("1\n11\n7\n3\nq\n", &mut draft);

        assert_eq!(end, SessionEnd::Quit);
        assert_eq!(draft.score("S1", "a"), Some(7));
        assert!(output.contains("Invalid: score 11 for 'a' is outside 0..=10"));
    }

    #[test]
    fn test_submit_refused_while_incomplete() {
        let mut draft = draft();
        let (end, output) = run("1\n1\n1\ns\nq\n", &mut draft);

        assert_eq!(end, SessionEnd::Quit);
        assert!(output.contains("2 score(s) still missing"));
    }

    #[test]
    fn test_enter_keeps_current_value() {
        let mut draft = draft();
        draft.set_score("S1", "a", 9).unwrap();
        let (_, _) = run("1\n\n5\nq\n", &mut draft);

        assert_eq!(draft.score("S1", "a"), Some(9));
        assert_eq!(draft.score("S1", "b"), Some(5));
    }

    #[test]
    fn test_end_of_input_quits() {
        let mut draft = draft();
        let (end, _) = run("1\n4\n", &mut draft);
        assert_eq!(end, SessionEnd::Quit);
        assert_eq!(draft.score("S1", "a"), Some(4));
    }

    #[test]
    fn test_invalid_choice() {
        let mut draft = draft();
        let (_, output) = run("7\nabc\nq\n", &mut draft);
        assert_eq!(output.matches("Invalid choice").count(), 2);
    }

    #[test]
    fn test_yes_no() {
        let mut io = Prompter::new(Cursor::new(b"y\n\nno\n".to_vec()), Vec::new());
        assert!(io.ask_yes_no("Clear?", false).unwrap());
        assert!(!io.ask_yes_no("Clear?", false).unwrap());
        assert!(!io.ask_yes_no("Clear?", true).unwrap());
        // end of input falls back to the default
        assert!(io.ask_yes_no("Clear?", true).unwrap());
    }
}
