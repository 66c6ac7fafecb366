use std::io::IsTerminal;
use std::time::{Duration, Instant};

use anstyle::{AnsiColor, Effects, Style};
use indicatif::{HumanCount, ProgressBar, ProgressStyle};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum OutputStyle {
    Plain,
    Rich,
}

#[derive(Copy, Clone, Debug)]
pub(crate) struct TerminalRenderer {
    style: OutputStyle,
}

pub(crate) struct TerminalProgress {
    style: OutputStyle,
    label: String,
    total: u64,
    current: u64,
    progress_bar: Option<ProgressBar>,
    started_at: Instant,
}

pub(crate) fn current_output_style() -> OutputStyle {
    resolve_output_style(
        std::io::stdout().is_terminal(),
        std::env::var_os("NO_COLOR").is_some_and(|value| !value.is_empty()),
    )
}

pub(crate) fn resolve_output_style(stdout_is_terminal: bool, no_color: bool) -> OutputStyle {
    if stdout_is_terminal && !no_color {
        OutputStyle::Rich
    } else {
        OutputStyle::Plain
    }
}

pub(crate) fn render_status_line(style: OutputStyle, status: &str, message: &str) -> String {
    match style {
        OutputStyle::Plain => message.to_string(),
        OutputStyle::Rich => format!("{} {message}", status_badge(status)),
    }
}

fn status_badge(status: &str) -> &'static str {
    match status {
        "ok" => "[OK]",
        "warn" => "[WARN]",
        "error" => "[ERR]",
        "step" => "[..]",
        _ => "[INFO]",
    }
}

impl TerminalRenderer {
    pub(crate) fn from_style(style: OutputStyle) -> Self {
        Self { style }
    }

    pub(crate) fn print_section(self, title: &str) {
        if let Some(line) = render_section_header(self.style, title) {
            println!();
            println!("{}", colorize(section_style(), &line));
        }
    }

    pub(crate) fn print_lines(self, lines: &[String]) {
        for line in lines {
            println!("{line}");
        }
    }

    pub(crate) fn start_progress(self, label: &str, total: u64) -> TerminalProgress {
        let progress_bar = if self.style == OutputStyle::Rich {
            let progress_bar = ProgressBar::new(total.max(1));
            if let Ok(template) =
                ProgressStyle::with_template("{spinner:.green} {msg} {wide_bar:.green/white} {pos}/{len}")
            {
                progress_bar.set_style(template.progress_chars("#>-"));
            }
            progress_bar.set_message(label.to_string());
            progress_bar.enable_steady_tick(Duration::from_millis(80));
            Some(progress_bar)
        } else {
            None
        };

        TerminalProgress {
            style: self.style,
            label: label.to_string(),
            total,
            current: 0,
            progress_bar,
            started_at: Instant::now(),
        }
    }
}

impl TerminalProgress {
    /// Prints above the bar when one is active so output does not tear it.
    pub(crate) fn println(&self, line: &str) {
        match &self.progress_bar {
            Some(progress_bar) => progress_bar.println(line),
            None => println!("{line}"),
        }
    }

    pub(crate) fn advance(&mut self) {
        self.current = (self.current + 1).min(self.total);
        if let Some(progress_bar) = &self.progress_bar {
            progress_bar.set_position(self.current);
        }
    }

    pub(crate) fn finish(mut self) {
        let Some(progress_bar) = self.progress_bar.take() else {
            return;
        };

        progress_bar.finish_and_clear();
        println!(
            "{}",
            render_progress_summary(
                self.style,
                &self.label,
                self.current,
                self.total,
                self.started_at.elapsed()
            )
        );
    }
}

fn section_style() -> Style {
    Style::new()
        .fg_color(Some(AnsiColor::BrightBlue.into()))
        .effects(Effects::BOLD)
}

fn colorize(style: Style, text: &str) -> String {
    format!("{}{text}{}", style.render(), style.render_reset())
}

pub(crate) fn render_section_header(style: OutputStyle, title: &str) -> Option<String> {
    match style {
        OutputStyle::Plain => None,
        OutputStyle::Rich => Some(format!("== {title} ==")),
    }
}

/// One-line summary printed once a progress bar is cleared, e.g.
/// `[OK] remove: 2/2 packages in 0.041s`.
pub(crate) fn render_progress_summary(
    style: OutputStyle,
    label: &str,
    current: u64,
    total: u64,
    elapsed: Duration,
) -> String {
    let status = if current >= total { "ok" } else { "warn" };
    render_status_line(
        style,
        status,
        &format!(
            "{label}: {}/{} packages in {}.{:03}s",
            HumanCount(current),
            HumanCount(total),
            elapsed.as_secs(),
            elapsed.subsec_millis()
        ),
    )
}
