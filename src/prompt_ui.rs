//! Console dialogs: the modal request prompt and remediation choices.
//!
//! Both dialogs take their input and output streams as parameters so they
//! can be driven from tests; the plain variants bind them to stdin/stderr.

use crate::host::RemediationAction;
use anyhow::Result;
use std::io::{self, BufRead, Write};
use tracing::info;

pub const PROMPT_TITLE: &str = "CodeDawn: What would you like to do?";
pub const PROMPT_PLACEHOLDER: &str =
    "e.g., 'refactor this to use arrow functions' or 'create a python class for a user'";

/// Interactive dialogs shown by the console host.
///
/// # Example
///
/// ```no_run
/// use codedawn::prompt_ui::PromptUI;
///
/// let ui = PromptUI::new();
/// if let Some(request) = ui.ask_for_request()? {
///     println!("You asked for: {}", request);
/// }
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct PromptUI;

impl PromptUI {
    pub fn new() -> Self {
        Self
    }

    // =========================================================================
    // Core methods with I/O injection (testable)
    // =========================================================================

    /// Asks for a request. Returns `None` when the answer is blank or the
    /// input is closed.
    pub fn ask_for_request_with_io<R: BufRead, W: Write>(
        &self,
        input: &mut R,
        output: &mut W,
    ) -> Result<Option<String>> {
        writeln!(output, "✨ {}", PROMPT_TITLE)?;
        writeln!(output, "   {}", PROMPT_PLACEHOLDER)?;
        write!(output, "> ")?;
        output.flush()?;

        let mut line = String::new();
        input.read_line(&mut line)?;
        let request = line.trim();

        if request.is_empty() {
            Ok(None)
        } else {
            Ok(Some(request.to_string()))
        }
    }

    /// Shows `message` and, when there are `actions`, asks the user to pick
    /// one. `0`, a closed input or no actions at all mean "dismissed".
    pub fn choose_remediation_with_io<R: BufRead, W: Write>(
        &self,
        message: &str,
        actions: &[RemediationAction],
        input: &mut R,
        output: &mut W,
    ) -> Result<Option<RemediationAction>> {
        writeln!(output, "❌ {}", message)?;
        if actions.is_empty() {
            return Ok(None);
        }

        writeln!(output)?;
        for (i, action) in actions.iter().enumerate() {
            writeln!(output, "  {}. {}", i + 1, action.label())?;
        }
        writeln!(output, "  0. Dismiss")?;

        loop {
            write!(output, "\nChoose an option: ")?;
            output.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                return Ok(None);
            }

            match line.trim().parse::<usize>() {
                Ok(0) => return Ok(None),
                Ok(n) if n <= actions.len() => {
                    let action = actions[n - 1];
                    info!("User chose '{}'", action.label());
                    return Ok(Some(action));
                }
                _ => {
                    writeln!(output, "Invalid choice. Please enter 0-{}.", actions.len())?;
                }
            }
        }
    }

    // =========================================================================
    // Convenience methods using standard I/O
    // =========================================================================

    pub fn ask_for_request(&self) -> Result<Option<String>> {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        let mut output = io::stderr();
        self.ask_for_request_with_io(&mut input, &mut output)
    }

    pub fn choose_remediation(
        &self,
        message: &str,
        actions: &[RemediationAction],
    ) -> Result<Option<RemediationAction>> {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        let mut output = io::stderr();
        self.choose_remediation_with_io(message, actions, &mut input, &mut output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_request_is_trimmed() {
        let ui = PromptUI::new();
        let mut input = Cursor::new(b"  convert to const  \n");
        let mut output = Vec::new();

        let request = ui.ask_for_request_with_io(&mut input, &mut output).unwrap();

        assert_eq!(request.as_deref(), Some("convert to const"));
        let output_str = String::from_utf8(output).unwrap();
        assert!(output_str.contains(PROMPT_TITLE));
        assert!(output_str.contains("arrow functions"));
    }

    #[test]
    fn test_blank_request_is_cancelled() {
        let ui = PromptUI::new();
        let mut output = Vec::new();

        let blank = ui
            .ask_for_request_with_io(&mut Cursor::new(b"   \n"), &mut output)
            .unwrap();
        let closed = ui
            .ask_for_request_with_io(&mut Cursor::new(b""), &mut output)
            .unwrap();

        assert!(blank.is_none());
        assert!(closed.is_none());
    }

    #[test]
    fn test_no_actions_only_shows_message() {
        let ui = PromptUI::new();
        let mut input = Cursor::new(b"1\n");
        let mut output = Vec::new();

        let choice = ui
            .choose_remediation_with_io("HTTP 500: boom", &[], &mut input, &mut output)
            .unwrap();

        assert!(choice.is_none());
        let output_str = String::from_utf8(output).unwrap();
        assert!(output_str.contains("HTTP 500: boom"));
        assert!(!output_str.contains("Choose an option"));
    }

    #[test]
    fn test_picks_numbered_action() {
        let ui = PromptUI::new();
        let actions = [
            RemediationAction::SwitchProvider,
            RemediationAction::ChangeCredential,
        ];
        let mut input = Cursor::new(b"2\n");
        let mut output = Vec::new();

        let choice = ui
            .choose_remediation_with_io("quota exceeded", &actions, &mut input, &mut output)
            .unwrap();

        assert_eq!(choice, Some(RemediationAction::ChangeCredential));
        let output_str = String::from_utf8(output).unwrap();
        assert!(output_str.contains("1. Switch Provider"));
        assert!(output_str.contains("2. Change API Key"));
        assert!(output_str.contains("0. Dismiss"));
    }

    #[test]
    fn test_retries_on_invalid_input() {
        let ui = PromptUI::new();
        let actions = [RemediationAction::OpenConfiguration];

        // Out of range, garbage, then valid
        let mut input = Cursor::new(b"7\nnope\n1\n");
        let mut output = Vec::new();

        let choice = ui
            .choose_remediation_with_io("welcome", &actions, &mut input, &mut output)
            .unwrap();

        assert_eq!(choice, Some(RemediationAction::OpenConfiguration));
        let output_str = String::from_utf8(output).unwrap();
        assert_eq!(output_str.matches("Invalid choice").count(), 2);
    }

    #[test]
    fn test_dismiss_and_closed_input() {
        let ui = PromptUI::new();
        let actions = [RemediationAction::ChangeCredential];
        let mut output = Vec::new();

        let dismissed = ui
            .choose_remediation_with_io("bad key", &actions, &mut Cursor::new(b"0\n"), &mut output)
            .unwrap();
        let closed = ui
            .choose_remediation_with_io("bad key", &actions, &mut Cursor::new(b""), &mut output)
            .unwrap();

        assert!(dismissed.is_none());
        assert!(closed.is_none());
    }
}
