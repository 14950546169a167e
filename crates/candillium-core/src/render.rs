use std::io::{self, IsTerminal, Write};

use chrono_tz::Tz;
use unicode_width::UnicodeWidthStr;

use crate::config::Config;
use crate::dashboard::{Dashboard, DashboardState};
use crate::datetime::{format_interview_date, resolve_display_timezone};
use crate::todos::TodoApp;

pub const APP_TITLE: &str = "Candillium";
pub const SIGNING_IN: &str = "Signing you in :) ...";
pub const LOADING_CANDIDATES: &str = "Loading candidates...";
pub const NO_CANDIDATES: &str = "No candidates found.";
pub const NO_SELECTION_TITLE: &str = "Select a Candidate";
pub const NO_SELECTION_HINT: &str = "Select a candidate to view session information.";

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
    tz: Tz,
}

impl Renderer {
    pub fn new(cfg: &Config) -> Self {
        Self {
            color: cfg.display.color && io::stdout().is_terminal(),
            tz: resolve_display_timezone(cfg.display.timezone.as_deref()),
        }
    }

    /// Plain renderer for non-terminal sinks.
    pub fn plain(tz: Tz) -> Self {
        Self { color: false, tz }
    }

    pub fn print_signed_out<W: Write>(&self, mut out: W) -> anyhow::Result<()> {
        writeln!(out, "{SIGNING_IN}")?;
        Ok(())
    }

    #[tracing::instrument(skip_all)]
    pub fn print_dashboard<W: Write>(&self, mut out: W, dashboard: &Dashboard) -> anyhow::Result<()> {
        let candidates = match dashboard.state() {
            DashboardState::Loading => {
                writeln!(out, "{LOADING_CANDIDATES}")?;
                return Ok(());
            }
            DashboardState::Error(message) => {
                writeln!(out, "{}", self.paint(message, "31"))?;
                return Ok(());
            }
            DashboardState::Ready(candidates) => candidates,
        };

        let who = dashboard
            .viewer()
            .map(|viewer| viewer.email.as_str())
            .unwrap_or("Loading...");
        writeln!(out, "{}  [user: {who}]", self.paint(APP_TITLE, "1"))?;
        if dashboard.menu_open() {
            writeln!(out, "  [Logout]")?;
        }
        writeln!(out)?;

        writeln!(out, "Search: {}", dashboard.search())?;
        writeln!(out, "[{}]", dashboard.direction().label())?;
        writeln!(out)?;

        let visible = dashboard.visible();
        if visible.is_empty() {
            writeln!(out, "{NO_CANDIDATES}")?;
        } else {
            let headers = vec!["#".to_string(), "Name".to_string(), "Last Interview".to_string()];
            let mut rows = Vec::with_capacity(visible.len());
            for (idx, candidate) in visible.iter().enumerate() {
                let marker = if dashboard.is_selected(candidate) { ">" } else { " " };
                let position = format!("{marker}{}", idx + 1);
                let name = candidate.name.clone().unwrap_or_default();
                let name = if dashboard.is_selected(candidate) {
                    self.paint(&name, "7")
                } else {
                    name
                };
                rows.push(vec![
                    position,
                    name,
                    format_interview_date(candidate.last_interview.as_deref(), &self.tz),
                ]);
            }
            write_table(&mut out, headers, rows)?;
        }
        tracing::debug!(total = candidates.len(), shown = visible.len(), "rendered list");
        writeln!(out)?;

        match dashboard.selected() {
            Some(candidate) => {
                let name = candidate.name.clone().unwrap_or_default();
                writeln!(out, "{}  [+ Start New Session]", self.paint(&name, "1"))?;
                writeln!(
                    out,
                    "Last Interview: {}",
                    format_interview_date(candidate.last_interview.as_deref(), &self.tz)
                )?;
                writeln!(out, "Session Information:")?;
                writeln!(out, "  Interview summary for {name} will go here...")?;
            }
            None => {
                writeln!(out, "{}  [+ Start New Session]", self.paint(NO_SELECTION_TITLE, "1"))?;
                writeln!(out, "{NO_SELECTION_HINT}")?;
            }
        }

        Ok(())
    }

    #[tracing::instrument(skip_all)]
    pub fn print_todos<W: Write>(&self, mut out: W, app: &TodoApp) -> anyhow::Result<()> {
        writeln!(out, "{}", self.paint(&app.heading(), "1"))?;
        writeln!(out, "[+ New Todo]")?;

        let rows = app
            .items()
            .iter()
            .enumerate()
            .map(|(idx, todo)| {
                vec![
                    self.paint(&(idx + 1).to_string(), "33"),
                    todo.id.clone(),
                    todo.content.clone().unwrap_or_default(),
                ]
            })
            .collect();
        write_table(
            &mut out,
            vec!["#".to_string(), "ID".to_string(), "Content".to_string()],
            rows,
        )?;

        writeln!(out, "[Sign Out]")?;
        Ok(())
    }

    pub fn print_error<W: Write>(&self, mut out: W, message: &str) -> anyhow::Result<()> {
        writeln!(out, "{}", self.paint(message, "31"))?;
        Ok(())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for idx in 0..column_count {
        write!(writer, "{:-<width$} ", "", width = widths[idx])?;
    }
    writeln!(writer)?;

    for row in rows {
        for idx in 0..column_count {
            let cell = &row[idx];
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::{strip_ansi, write_table};

    #[test]
    fn table_pads_by_visible_width() {
        let mut out = Vec::new();
        write_table(
            &mut out,
            vec!["#".to_string(), "Name".to_string()],
            vec![vec!["\x1b[33m1\x1b[0m".to_string(), "Zoë".to_string()]],
        )
        .expect("write table");

        let text = String::from_utf8(out).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "# Name ");
        assert_eq!(strip_ansi(lines[2]), "1 Zoë  ");
    }
}
