//! Shared UI primitives for the phonebook menu
//!
//! Conventions:
//! - Prompts: lowercase with colon and space: `phone: `
//! - Feedback: short sentences: `Deleted.`
//! - Cancel (Esc / Ctrl+C) backs out of the current action, never the app

use anyhow::Result;
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, Clear, ClearType},
    ExecutableCommand,
};
use inquire::{ui::RenderConfig, Confirm, InquireError, Select, Text};
use std::io::{self, Write};

use crate::error::PhonebookError;
use crate::models::PhoneNumber;

// ============================================================================
// Message Functions
// ============================================================================

/// Print a status message to stdout
#[inline]
pub fn status(msg: &str) {
    println!("{}", msg);
}

/// Print an error message to stderr
#[inline]
pub fn error(msg: &str) {
    eprintln!("Error: {}", msg);
}

/// Print a warning message to stderr
#[inline]
pub fn warning(msg: &str) {
    eprintln!("Warning: {}", msg);
}

// ============================================================================
// Layout Primitives
// ============================================================================

/// Truncate a string to max_chars, adding ellipsis if needed.
/// Result will be at most max_chars characters (including ellipsis if truncated).
pub fn truncate(s: &str, max_chars: usize) -> String {
    if max_chars == 0 {
        return String::new();
    }
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let kept: String = s.chars().take(max_chars - 1).collect();
    format!("{}…", kept)
}

/// Clear the terminal screen and move cursor to top-left
pub fn clear_screen() -> Result<()> {
    let mut stdout = io::stdout();
    stdout.execute(Clear(ClearType::All))?;
    stdout.execute(cursor::MoveTo(0, 0))?;
    stdout.flush()?;
    Ok(())
}

/// Get a minimal render config for inquire prompts
pub fn minimal_render_config() -> RenderConfig<'static> {
    RenderConfig::default_colored()
        .with_prompt_prefix(inquire::ui::Styled::new(""))
        .with_answered_prompt_prefix(inquire::ui::Styled::new(""))
}

/// Display a selection menu and return the chosen index
pub fn select<T: ToString>(prompt: &str, options: &[T]) -> Result<Option<usize>> {
    if options.is_empty() {
        return Ok(None);
    }

    let items: Vec<String> = options.iter().map(|o| o.to_string()).collect();

    let result = Select::new(prompt, items.clone())
        .with_render_config(minimal_render_config())
        .with_page_size(items.len())
        .with_vim_mode(true)
        .prompt_skippable()?;

    Ok(result.and_then(|selected| items.iter().position(|o| *o == selected)))
}

/// Prompt for yes/no confirmation (default: no)
pub fn confirm(prompt: &str) -> Result<bool> {
    let result = Confirm::new(prompt)
        .with_render_config(minimal_render_config())
        .with_default(false)
        .prompt_skippable()?;
    Ok(result.unwrap_or(false))
}

// ============================================================================
// Raw Mode Input
// ============================================================================

/// RAII guard that ensures raw mode is disabled on drop
pub struct RawModeGuard;

impl RawModeGuard {
    pub fn new() -> Result<Self> {
        enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}

/// Block until a key is pressed and return it
pub fn read_key() -> Result<KeyCode> {
    let _guard = RawModeGuard::new()?;
    loop {
        if let Event::Key(KeyEvent { code, kind, .. }) = event::read()? {
            if kind != KeyEventKind::Release {
                return Ok(code);
            }
        }
    }
}

/// Wait for user to press enter to continue
pub fn wait_for_continue() {
    println!();
    let _ = Text::new("[enter]")
        .with_render_config(minimal_render_config())
        .prompt_skippable();
}

// ============================================================================
// Form Input Helpers
// ============================================================================

/// Result type for form inputs that can be cancelled
pub enum FormResult<T> {
    Value(T),
    Cancelled,
}

/// Prompt for a field with optional current value
/// Format: `field [current]: ` or `field: ` if no current value
/// Empty input keeps the current value (or empty string if no current)
pub fn prompt_field(field: &str, current: Option<&str>) -> Result<FormResult<String>> {
    let prompt = match current {
        Some(val) if !val.is_empty() => format!("{} [{}]: ", field, truncate(val, 30)),
        _ => format!("{}: ", field),
    };

    let result = Text::new(&prompt)
        .with_render_config(minimal_render_config())
        .prompt();

    match result {
        Ok(input) => {
            let input = input.trim();
            if input.is_empty() {
                Ok(FormResult::Value(current.unwrap_or("").to_string()))
            } else {
                Ok(FormResult::Value(input.to_string()))
            }
        }
        Err(InquireError::OperationCanceled) | Err(InquireError::OperationInterrupted) => {
            Ok(FormResult::Cancelled)
        }
        Err(e) => Err(e.into()),
    }
}

/// Prompt for an optional field (returns empty string if skipped)
pub fn prompt_field_optional(field: &str) -> Result<FormResult<String>> {
    prompt_field(field, None)
}

/// Read and parse input, re-prompting after each invalid value.
///
/// Returns `None` when the user cancels or after `max_attempts` invalid
/// values.
pub fn retry_input<T>(
    max_attempts: u32,
    mut read: impl FnMut() -> Result<FormResult<String>>,
    parse: impl Fn(&str) -> crate::error::Result<T>,
) -> Result<Option<T>> {
    let max_attempts = max_attempts.max(1);

    for attempt in 1..=max_attempts {
        let input = match read()? {
            FormResult::Value(v) => v,
            FormResult::Cancelled => return Ok(None),
        };

        match parse(&input) {
            Ok(value) => return Ok(Some(value)),
            Err(e) => {
                error(&e.to_string());
                if attempt < max_attempts {
                    status(&format!("{} attempt(s) left.", max_attempts - attempt));
                }
            }
        }
    }

    warning("Too many invalid entries.");
    Ok(None)
}

/// [`retry_input`] over an interactive prompt for `field`.
pub fn prompt_validated<T>(
    field: &str,
    current: Option<&str>,
    max_attempts: u32,
    parse: impl Fn(&str) -> crate::error::Result<T>,
) -> Result<Option<T>> {
    retry_input(max_attempts, || prompt_field(field, current), parse)
}

// ============================================================================
// Contact Lookup
// ============================================================================

/// How the user identifies an existing contact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactRef {
    Phone(PhoneNumber),
    Id(i64),
}

impl std::fmt::Display for ContactRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContactRef::Phone(phone) => write!(f, "phone {}", phone),
            ContactRef::Id(id) => write!(f, "ID {}", id),
        }
    }
}

/// Parse a contact ID: a positive integer.
pub fn parse_id(input: &str) -> crate::error::Result<i64> {
    input
        .trim()
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| {
            PhonebookError::validation("contact ID", format!("'{}' is not a valid number", input.trim()))
        })
}

/// Ask whether to look up by phone or ID, then read that value.
pub fn prompt_contact_ref(action: &str, max_attempts: u32) -> Result<Option<ContactRef>> {
    let options = ["Phone number", "Contact ID"];
    let Some(choice) = select(&format!("{} by", action), &options)? else {
        return Ok(None);
    };

    if choice == 0 {
        prompt_validated("phone", None, max_attempts, PhoneNumber::parse)
            .map(|phone| phone.map(ContactRef::Phone))
    } else {
        prompt_validated("id", None, max_attempts, parse_id).map(|id| id.map(ContactRef::Id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scripted(inputs: &[&str]) -> impl FnMut() -> Result<FormResult<String>> {
        let mut inputs: Vec<String> = inputs.iter().rev().map(|s| s.to_string()).collect();
        move || {
            Ok(match inputs.pop() {
                Some(v) => FormResult::Value(v),
                None => FormResult::Cancelled,
            })
        }
    }

    #[test]
    fn test_retry_input_accepts_after_invalid() {
        let phone = retry_input(3, scripted(&["123", "5551234567"]), PhoneNumber::parse).unwrap();
        assert_eq!(phone.unwrap().as_str(), "(555)123-4567");
    }

    #[test]
    fn test_retry_input_gives_up() {
        let mut reads = 0;
        let mut inner = scripted(&["a", "b", "c", "5551234567"]);
        let read = || {
            reads += 1;
            inner()
        };
        let phone = retry_input(3, read, PhoneNumber::parse).unwrap();
        assert!(phone.is_none());
        assert_eq!(reads, 3);
    }

    #[test]
    fn test_retry_input_cancel() {
        let phone = retry_input(3, scripted(&[]), PhoneNumber::parse).unwrap();
        assert!(phone.is_none());
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id(" 42 ").unwrap(), 42);
        assert!(parse_id("0").is_err());
        assert!(parse_id("-3").is_err());
        assert!(parse_id("abc").is_err());
        assert!(parse_id("").is_err());
    }

    #[test]
    fn test_contact_ref_display() {
        let phone = PhoneNumber::parse("5551234567").unwrap();
        assert_eq!(ContactRef::Phone(phone).to_string(), "phone (555)123-4567");
        assert_eq!(ContactRef::Id(7).to_string(), "ID 7");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello", 5), "hello");
        assert_eq!(truncate("hello world", 8), "hello w…");
        assert_eq!(truncate("日本語テスト", 4), "日本語…");
        assert_eq!(truncate("x", 0), "");
    }
}
