//! Local LM command client.
//!
//! Invokes a user-configured LM binary with the prompt on stdin and returns
//! its stdout. Any tool that reads text and writes text works (`llm`,
//! `ollama run <model>`, a wrapper script). The command has no separate
//! system channel, so the instruction is sent as a leading section.

use super::LanguageService;
use anyhow::{anyhow, Context, Result};
use std::io::{self, Write};
use std::process::{ChildStdin, Command, Stdio};
use std::thread;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct CommandLanguageService {
    /// The command to invoke (parsed via shell-words).
    command: String,
}

impl CommandLanguageService {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl LanguageService for CommandLanguageService {
    fn complete(&self, system: &str, prompt: &str) -> Result<String> {
        invoke_lm_command(&self.command, &build_stdin_prompt(system, prompt))
    }
}

fn build_stdin_prompt(system: &str, prompt: &str) -> String {
    format!("# Instructions\n{system}\n\n# Request\n{prompt}\n")
}

/// Run `command` with `prompt` on stdin and return its stdout.
///
/// The prompt is fed from a scoped writer thread while this thread drains
/// stdout/stderr, so a command that streams output before it has consumed
/// all of its input cannot wedge on a full pipe.
fn invoke_lm_command(command: &str, prompt: &str) -> Result<String> {
    let words =
        shell_words::split(command).with_context(|| format!("parse LM command: {command}"))?;
    let (program, args) = words
        .split_first()
        .ok_or_else(|| anyhow!("LM command is empty"))?;

    let start = Instant::now();
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("spawn LM command: {program}"))?;
    let stdin = child.stdin.take();

    let (written, output) = thread::scope(|scope| {
        let writer = scope.spawn(move || feed_prompt(stdin, prompt));
        let output = child.wait_with_output();
        let written = writer
            .join()
            .unwrap_or_else(|_| Err(io::Error::other("prompt writer panicked")));
        (written, output)
    });
    let output = output.with_context(|| format!("wait for LM command: {program}"))?;

    tracing::info!(
        elapsed_ms = start.elapsed().as_millis(),
        prompt_bytes = prompt.len(),
        response_bytes = output.stdout.len(),
        status = %output.status,
        "lm invoke complete"
    );

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!(
            "LM command failed with status {}: {}",
            output.status,
            stderr.trim()
        ));
    }
    written.context("write prompt to LM stdin")?;
    String::from_utf8(output.stdout).context("decode LM stdout as UTF-8")
}

/// Write the whole prompt, then drop the handle so the command sees EOF.
fn feed_prompt(stdin: Option<ChildStdin>, prompt: &str) -> io::Result<()> {
    match stdin {
        Some(mut stdin) => stdin.write_all(prompt.as_bytes()),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stdin_prompt_has_both_sections() {
        let text = build_stdin_prompt("Return JSON.", "Lisbon castle");
        assert!(text.starts_with("# Instructions\nReturn JSON."));
        assert!(text.contains("# Request\nLisbon castle"));
    }

    #[test]
    fn test_empty_command_is_rejected() {
        let err = CommandLanguageService::new("  ")
            .complete("sys", "prompt")
            .unwrap_err();
        assert!(err.to_string().contains("LM command is empty"));
    }

    #[cfg(unix)]
    #[test]
    fn test_command_echoes_stdin() {
        let service = CommandLanguageService::new("cat");
        let reply = service.complete("sys", "hello").expect("cat runs");
        assert!(reply.contains("hello"));
    }

    #[cfg(unix)]
    #[test]
    fn test_large_prompt_streams_through_without_blocking() {
        // Well past a pipe buffer in both directions.
        let prompt = "lisbon ".repeat(200_000);
        let reply = CommandLanguageService::new("cat")
            .complete("sys", &prompt)
            .expect("cat runs");
        assert!(reply.len() > prompt.len());
        assert!(reply.ends_with("lisbon \n"));
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_command_reports_status() {
        let service = CommandLanguageService::new("sh -c 'cat >/dev/null; echo boom >&2; exit 3'");
        let err = service.complete("sys", "hello").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("LM command failed"));
        assert!(message.contains("boom"));
    }
}
