use owo_colors::OwoColorize;
use serde::Serialize;
use std::fmt::Write as _;

/// A source span representing a range of bytes in the source code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn point(offset: usize) -> Self {
        Self { start: offset, end: offset }
    }
}

/// A label pointing to a specific span in the source
#[derive(Debug, Clone)]
pub struct Label {
    pub span: Span,
    pub message: String,
}

impl Label {
    pub fn primary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
        }
    }
}

/// A complete error report. Every failure in the pipeline converts into one.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub code: Option<String>,
    pub message: String,
    pub labels: Vec<Label>,
    pub notes: Vec<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            labels: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_label(mut self, label: Label) -> Self {
        self.labels.push(label);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.notes.push(format!("help: {}", help.into()));
        self
    }
}

/// Computes line and column from a byte offset
pub fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut col = 1;
    for (i, ch) in source.char_indices() {
        if i >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    (line, col)
}

fn line_content(source: &str, line_num: usize) -> Option<&str> {
    source.split('\n').nth(line_num.saturating_sub(1))
}

/// Diagnostic renderer for Rust-like error output
pub struct DiagnosticRenderer<'a> {
    source: &'a str,
    file_name: &'a str,
    use_color: bool,
}

impl<'a> DiagnosticRenderer<'a> {
    pub fn new(source: &'a str, file_name: &'a str, use_color: bool) -> Self {
        Self {
            source,
            file_name,
            use_color,
        }
    }

    pub fn render(&self, diagnostic: &Diagnostic) -> String {
        let mut output = String::new();

        let header = match &diagnostic.code {
            Some(code) => format!("error[{}]", code),
            None => "error".to_string(),
        };
        let _ = writeln!(
            output,
            "{}: {}",
            self.paint(&header, |s| s.red().bold().to_string()),
            self.paint(&diagnostic.message, |s| s.bold().to_string())
        );

        for label in &diagnostic.labels {
            self.render_label(&mut output, label);
        }

        for note in &diagnostic.notes {
            let _ = writeln!(output, "  {} {}", self.paint("=", |s| s.blue().to_string()), note);
        }

        output
    }

    fn render_label(&self, output: &mut String, label: &Label) {
        let (line, col) = line_col(self.source, label.span.start);
        let width = line.to_string().len();
        let gutter = self.paint("|", |s| s.blue().to_string());

        let _ = writeln!(output, "  {} {}:{}:{}", self.paint("-->", |s| s.blue().to_string()), self.file_name, line, col);
        let _ = writeln!(output, "{} {}", " ".repeat(width + 1), gutter);

        let content = line_content(self.source, line).unwrap_or("");
        let _ = writeln!(
            output,
            "{:>width$} {} {}",
            self.paint(&line.to_string(), |s| s.blue().to_string()),
            gutter,
            content,
            width = width + 1
        );

        let (end_line, end_col) = line_col(self.source, label.span.end.max(label.span.start + 1) - 1);
        let last_col = if end_line == line { end_col } else { content.chars().count().max(col) };
        let underline = "^".repeat(last_col + 1 - col);
        let mut marker = format!("{}{}", " ".repeat(col - 1), self.paint(&underline, |s| s.red().to_string()));
        if !label.message.is_empty() {
            marker.push(' ');
            marker.push_str(&self.paint(&label.message, |s| s.red().to_string()));
        }
        let _ = writeln!(output, "{} {} {}", " ".repeat(width + 1), gutter, marker);
    }

    fn paint(&self, text: &str, style: impl Fn(&str) -> String) -> String {
        if self.use_color {
            style(text)
        } else {
            text.to_string()
        }
    }
}

/// Render multiple diagnostics
pub fn render_diagnostics(source: &str, file_name: &str, diagnostics: &[Diagnostic], use_color: bool) -> String {
    let renderer = DiagnosticRenderer::new(source, file_name, use_color);
    let mut output = String::new();

    for diagnostic in diagnostics {
        output.push_str(&renderer.render(diagnostic));
        output.push('\n');
    }

    if !diagnostics.is_empty() {
        let count = diagnostics.len();
        let _ = writeln!(
            output,
            "error: aborting due to {} error{}",
            count,
            if count == 1 { "" } else { "s" }
        );
    }

    output
}
