//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one line per item.

use std::io::{self, IsTerminal, Write};

use owo_colors::{OwoColorize, Style as Paint};
use tabled::{Table, Tabled, settings::Style};

use crate::cli::{ColorMode, OutputFormat};

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// Palette for streamed lines; every style is a no-op when color is off.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub device: Paint,
    pub attribute: Paint,
    pub value: Paint,
    pub ok: Paint,
    pub warn: Paint,
    pub dim: Paint,
}

impl Palette {
    pub fn new(color: bool) -> Self {
        if !color {
            let plain = Paint::new();
            return Self {
                device: plain,
                attribute: plain,
                value: plain,
                ok: plain,
                warn: plain,
                dim: plain,
            };
        }
        Self {
            device: Paint::new().cyan().bold(),
            attribute: Paint::new().magenta(),
            value: Paint::new().bright_white().bold(),
            ok: Paint::new().green(),
            warn: Paint::new().yellow(),
            dim: Paint::new().dimmed(),
        }
    }

    pub fn paint(style: Paint, text: impl std::fmt::Display) -> String {
        text.style(style).to_string()
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
///
/// - `table`: uses the `Tabled` derive to build a pretty table
/// - `json` / `json-compact`: serializes the original data via serde
/// - `yaml`: serializes via serde_yaml
/// - `plain`: calls `line_fn` on each item to emit one line per item
pub fn render_list<T, R>(
    format: OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    line_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            render_table(&rows)
        }
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => data.iter().map(&line_fn).collect::<Vec<_>>().join("\n"),
    }
}

/// Render a single serde-serializable item in the chosen format.
///
/// Table rendering uses `detail_fn`, since single-item views don't use
/// the `Tabled` derive.
pub fn render_single<T>(
    format: OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    line_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => line_fn(data),
    }
}

/// Render one item of a live stream. Structured formats produce one
/// compact JSON object per line so the stream stays line-delimited.
pub fn render_stream_item<T>(format: OutputFormat, data: &T, line_fn: impl Fn(&T) -> String) -> String
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table | OutputFormat::Plain => line_fn(data),
        OutputFormat::Json | OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => format!("---\n{}", render_yaml(data).trim_end()),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> String {
    let rendered = if compact {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    rendered.unwrap_or_else(|e| format!("{{\"error\":\"serialization failed: {e}\"}}"))
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_yaml::to_string(data).unwrap_or_else(|e| format!("error: serialization failed: {e}"))
}

#[cfg(test)]
mod tests {
    use serde::Serialize;

    use super::*;

    #[derive(Serialize, Tabled)]
    struct Row {
        name: &'static str,
        value: i64,
    }

    fn rows() -> Vec<Row> {
        vec![
            Row {
                name: "MAX_PWM",
                value: 2400,
            },
            Row {
                name: "MIN_PWM",
                value: 500,
            },
        ]
    }

    fn render(format: OutputFormat) -> String {
        render_list(
            format,
            &rows(),
            |r| Row {
                name: r.name,
                value: r.value,
            },
            |r| format!("{}={}", r.name, r.value),
        )
    }

    #[test]
    fn renders_every_list_format() {
        assert!(render(OutputFormat::Table).contains("MAX_PWM"));
        assert_eq!(
            render(OutputFormat::JsonCompact),
            r#"[{"name":"MAX_PWM","value":2400},{"name":"MIN_PWM","value":500}]"#
        );
        assert!(render(OutputFormat::Yaml).contains("name: MIN_PWM"));
        assert_eq!(render(OutputFormat::Plain), "MAX_PWM=2400\nMIN_PWM=500");
    }

    #[test]
    fn stream_items_stay_on_one_line() {
        let row = &rows()[0];
        let line = render_stream_item(OutputFormat::Json, row, |_| String::new());
        assert_eq!(line, r#"{"name":"MAX_PWM","value":2400}"#);
    }

    #[test]
    fn palette_without_color_is_plain() {
        let palette = Palette::new(false);
        assert_eq!(Palette::paint(palette.warn, "careful"), "careful");
    }
}
