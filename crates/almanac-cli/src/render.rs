use std::io::{self, IsTerminal, Write};

use almanac_core::datetime::format_iso;
use almanac_core::{Calendar, Task};
use chrono::{Datelike, Weekday};
use unicode_width::UnicodeWidthStr;

use crate::replay::{StepReport, StepResult};

const CELL_WIDTH: usize = 8;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(color: bool) -> Self {
        Self {
            color: color && io::stdout().is_terminal(),
        }
    }

    pub fn print_script(
        &self,
        name: &str,
        reports: &[StepReport],
        calendar: &Calendar,
    ) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        self.write_script(&mut out, name, reports, calendar)
    }

    pub fn print_json(&self, calendar: &Calendar) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        serde_json::to_writer_pretty(&mut out, &calendar.visible_tasks())?;
        writeln!(out)?;
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(script = name))]
    pub fn write_script<W: Write>(
        &self,
        mut writer: W,
        name: &str,
        reports: &[StepReport],
        calendar: &Calendar,
    ) -> anyhow::Result<()> {
        writeln!(writer, "Script: {name}")?;
        writeln!(writer, "  steps: {}", reports.len())?;
        for report in reports {
            if let StepResult::Rejected(err) = &report.result {
                let line = format!("  step {} ({}) rejected: {err}", report.index, report.op);
                writeln!(writer, "{}", self.paint(&line, "31"))?;
            }
        }
        writeln!(writer)?;

        self.write_month(&mut writer, calendar)?;
        writeln!(writer)?;
        self.write_task_table(&mut writer, calendar)
    }

    /// One row per week. A cell shows the day number, the count of visible
    /// tasks covering it, and `*` when it is inside the pending selection.
    pub fn write_month<W: Write>(&self, mut writer: W, calendar: &Calendar) -> anyhow::Result<()> {
        let month = calendar.visible_month();
        let grid = calendar.current_month_grid();
        let pending = calendar.pending_selection_range();

        writeln!(writer, "{}", month.format("%B %Y"))?;
        for day in grid.iter().take(7) {
            write!(writer, "{}", pad(weekday_label(day.weekday()), CELL_WIDTH))?;
        }
        writeln!(writer)?;

        for week in grid.chunks(7) {
            for day in week {
                let selected = pending.is_some_and(|range| range.contains(*day));
                let count = calendar.visible_tasks_on(*day).len();

                let mut cell = String::with_capacity(CELL_WIDTH);
                cell.push(if selected { '*' } else { ' ' });
                cell.push_str(&format!("{:>2}", day.day()));
                if count > 0 {
                    cell.push_str(&format!(" ({count})"));
                }
                let cell = pad(&cell, CELL_WIDTH);

                let cell = if day.month() != month.month() {
                    self.paint(&cell, "2")
                } else if selected {
                    self.paint(&cell, "7")
                } else {
                    cell
                };
                write!(writer, "{cell}")?;
            }
            writeln!(writer)?;
        }

        Ok(())
    }

    pub fn write_task_table<W: Write>(
        &self,
        mut writer: W,
        calendar: &Calendar,
    ) -> anyhow::Result<()> {
        let visible = calendar.visible_tasks();
        let total = calendar.tasks().len();
        if calendar.filter().is_active() {
            writeln!(writer, "{} of {} tasks (filtered)", visible.len(), total)?;
        } else {
            writeln!(writer, "{total} tasks")?;
        }
        if visible.is_empty() {
            return Ok(());
        }

        let headers = vec![
            "Name".to_string(),
            "Category".to_string(),
            "Start".to_string(),
            "End".to_string(),
            "Days".to_string(),
        ];
        let rows = visible.iter().map(|task| self.task_row(task)).collect();
        write_table(&mut writer, headers, rows)
    }

    fn task_row(&self, task: &Task) -> Vec<String> {
        vec![
            task.name.clone(),
            self.paint(task.category.label(), "33"),
            format_iso(task.start),
            format_iso(task.end),
            task.duration_days().to_string(),
        ]
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn weekday_label(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}

fn pad(text: &str, width: usize) -> String {
    let visible_width = UnicodeWidthStr::width(text);
    format!("{text}{}", " ".repeat(width.saturating_sub(visible_width)))
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

    for (header, width) in headers.iter().zip(&widths) {
        write!(writer, "{header:width$} ", width = *width)?;
    }
    writeln!(writer)?;

    for width in &widths {
        write!(writer, "{:-<width$} ", "", width = *width)?;
    }
    writeln!(writer)?;

    for row in rows {
        for (cell, width) in row.iter().zip(&widths) {
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = width.saturating_sub(visible_width);
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
