//! Terminal [`Prompter`]: numbered lists and typed answers over stdin, prompts on stderr.
//!
//! stdout is left for the run's outcome line and `list` output.

use std::io::Write;
use std::sync::Mutex;

use async_trait::async_trait;
use stencil::{Prompter, SelectItem, SelectOptions, TextPrompt};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};

pub struct TerminalPrompter<R = BufReader<Stdin>> {
    lines: tokio::sync::Mutex<Lines<R>>,
    out: Mutex<Box<dyn Write + Send>>,
}

impl TerminalPrompter<BufReader<Stdin>> {
    /// Reads stdin, writes to stderr.
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), Box::new(std::io::stderr()))
    }
}

impl<R: AsyncBufRead + Unpin + Send> TerminalPrompter<R> {
    pub fn new(reader: R, out: Box<dyn Write + Send>) -> Self {
        Self {
            lines: tokio::sync::Mutex::new(reader.lines()),
            out: Mutex::new(out),
        }
    }

    fn print(&self, text: &str) {
        if let Ok(mut out) = self.out.lock() {
            let _ = out.write_all(text.as_bytes());
            let _ = out.flush();
        }
    }

    /// Next input line without its terminator; `None` on EOF or a read error.
    async fn read_line(&self) -> Option<String> {
        let mut lines = self.lines.lock().await;
        match lines.next_line().await {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read from stdin");
                None
            }
        }
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> Prompter for TerminalPrompter<R> {
    async fn select_one(&self, options: &SelectOptions, items: &[SelectItem]) -> Option<usize> {
        if items.is_empty() {
            return None;
        }
        let mut menu = format!("\n{}\n", options.title);
        if !options.placeholder.is_empty() {
            menu.push_str(&format!("{}\n", options.placeholder));
        }
        for (i, item) in items.iter().enumerate() {
            menu.push_str(&format!("  {}) {}", i + 1, item.label));
            if !item.description.is_empty() {
                menu.push_str(&format!("  {}", item.description));
            }
            menu.push('\n');
            if !item.detail.is_empty() {
                menu.push_str(&format!("     {}\n", item.detail));
            }
        }
        self.print(&menu);

        loop {
            self.print(&format!("Select 1-{} (q to cancel): ", items.len()));
            let line = self.read_line().await?;
            let answer = line.trim();
            if answer.is_empty() || answer.eq_ignore_ascii_case("q") {
                return None;
            }
            match answer.parse::<usize>() {
                Ok(n) if (1..=items.len()).contains(&n) => return Some(n - 1),
                _ => self.print(&format!("'{}' is not a valid choice\n", answer)),
            }
        }
    }

    async fn prompt_text(&self, prompt: &TextPrompt) -> Option<String> {
        let mut header = format!("\n{}\n", prompt.title);
        if !prompt.prompt.is_empty() {
            header.push_str(&format!("{}\n", prompt.prompt));
        }
        self.print(&header);
        let hint = match &prompt.default {
            Some(default) => format!("[{}]", default),
            None if !prompt.placeholder.is_empty() => format!("(e.g. {})", prompt.placeholder),
            None => String::new(),
        };

        loop {
            self.print(&format!("{} > ", hint));
            let line = self.read_line().await?;
            let value = match (&prompt.default, line.is_empty()) {
                (Some(default), true) => default.clone(),
                (None, true) => return Some(String::new()),
                (_, false) => line,
            };
            if let Some(message) = prompt.validation.as_ref().and_then(|v| v.check(&value)) {
                self.print(&format!("{}\n", message));
                continue;
            }
            return Some(value);
        }
    }
}
