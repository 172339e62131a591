//! CLI command handlers.

pub mod auth;
pub mod config;
pub mod products;

use std::io::{self, BufRead, Write};

use anyhow::Result;
use catalog_core::views::{Notice, NoticeKind};

/// Prints a view-model notice; errors go to stderr.
pub fn print_notice(notice: Option<Notice>) {
    let Some(notice) = notice else {
        return;
    };
    match notice.kind {
        NoticeKind::Success => println!("✓ {}", notice.text),
        NoticeKind::Info => println!("{}", notice.text),
        NoticeKind::Error => eprintln!("✗ {}", notice.text),
    }
}

/// Reads one line from stdin after printing `label`, without the line ending.
/// Surrounding spaces are kept.
pub fn prompt_line(label: &str) -> Result<String> {
    print!("{label}");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;
    Ok(strip_line_ending(&input).to_string())
}

/// Like [`prompt_line`], trimmed.
pub fn prompt(label: &str) -> Result<String> {
    Ok(prompt_line(label)?.trim().to_string())
}

fn strip_line_ending(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

/// Asks a yes/no question; anything but `y` is a no.
pub fn confirm(question: &str) -> bool {
    match prompt(&format!("{question} [y/N] ")) {
        Ok(answer) => answer.eq_ignore_ascii_case("y"),
        Err(err) => {
            tracing::warn!(error = %err, "could not read confirmation");
            false
        }
    }
}
