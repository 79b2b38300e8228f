//! Terminal output helpers for the build report.

use colored::*;
use std::cmp;

/// Minimal left-aligned table with Unicode rules, clamped to the terminal
/// width. Cells may carry ANSI color codes.
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn add_row(&mut self, row: Vec<String>) {
        if row.len() == self.headers.len() {
            self.rows.push(row);
        }
    }

    pub fn print(&self) {
        if self.headers.is_empty() {
            return;
        }

        let (_h, term_width) = console::Term::stdout().size();
        let max_cell = cmp::max(8, term_width as usize / self.headers.len());

        let mut widths: Vec<usize> = self
            .headers
            .iter()
            .map(|h| h.chars().count())
            .collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = cmp::max(widths[i], cmp::min(visible_len(cell), max_cell));
            }
        }

        let rule = |l: &str, m: &str, r: &str| {
            let mut line = String::from(l);
            for (i, w) in widths.iter().enumerate() {
                line.push_str(&"─".repeat(w + 2));
                line.push_str(if i + 1 == widths.len() { r } else { m });
            }
            println!("{}", line.dimmed());
        };

        rule("┌", "┬", "┐");
        let header_cells: Vec<String> = self.headers.iter().map(|h| h.bold().to_string()).collect();
        print_row(&header_cells, &widths);
        rule("├", "┼", "┤");
        for row in &self.rows {
            print_row(row, &widths);
        }
        rule("└", "┴", "┘");
    }
}

fn print_row(row: &[String], widths: &[usize]) {
    let mut line = String::from("│");
    for (cell, width) in row.iter().zip(widths) {
        let pad = width.saturating_sub(visible_len(cell));
        line.push(' ');
        line.push_str(cell);
        line.push_str(&" ".repeat(pad + 1));
        line.push('│');
    }
    println!("{}", line);
}

// Length without ANSI escape sequences, so colored cells pad correctly.
fn visible_len(s: &str) -> usize {
    let mut len = 0;
    let mut in_escape = false;
    for c in s.chars() {
        if in_escape {
            if c == 'm' {
                in_escape = false;
            }
        } else if c == '\u{1b}' {
            in_escape = true;
        } else {
            len += 1;
        }
    }
    len
}
