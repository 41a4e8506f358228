//! Output formatting for CLI commands
//!
//! Commands print through an [`OutputFormatter`] so that `--json` switches
//! every command to machine-readable output.

use payflow_core::domain::Record;

/// Output format selector
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Human,
    Json,
}

impl OutputFormat {
    pub fn is_json(self) -> bool {
        matches!(self, OutputFormat::Json)
    }
}

/// Sink for everything a command prints
///
/// Status lines go to stdout, problems to stderr. In JSON mode only the
/// machine-readable payload and errors are printed.
pub trait OutputFormatter {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
    fn warn(&self, message: &str);
    /// A write was accepted locally and waits for replay
    fn queued(&self, message: &str);
    fn info(&self, message: &str);
    fn record(&self, record: &Record);
    fn print_json(&self, value: &serde_json::Value);
}

pub struct HumanFormatter;

impl OutputFormatter for HumanFormatter {
    fn success(&self, message: &str) {
        println!("\u{2713} {}", message);
    }
    fn error(&self, message: &str) {
        eprintln!("\u{2717} Error: {}", message);
    }
    fn warn(&self, message: &str) {
        eprintln!("\u{26a0} {}", message);
    }
    fn queued(&self, message: &str) {
        println!("\u{21bb} Queued: {}", message);
    }
    fn info(&self, message: &str) {
        println!("  {}", message);
    }
    fn record(&self, record: &Record) {
        println!("  {}", record_line(record));
    }
    fn print_json(&self, _value: &serde_json::Value) {}
}

pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn success(&self, _message: &str) {}
    fn error(&self, message: &str) {
        eprintln!("{}", serde_json::json!({ "error": message }));
    }
    fn warn(&self, message: &str) {
        eprintln!("{}", serde_json::json!({ "warning": message }));
    }
    fn queued(&self, _message: &str) {}
    fn info(&self, _message: &str) {}
    fn record(&self, _record: &Record) {}
    fn print_json(&self, value: &serde_json::Value) {
        match serde_json::to_string_pretty(value) {
            Ok(text) => println!("{}", text),
            Err(e) => self.error(&format!("Failed to render JSON: {}", e)),
        }
    }
}

pub fn get_formatter(format: OutputFormat) -> Box<dyn OutputFormatter> {
    if format.is_json() {
        Box::new(JsonFormatter)
    } else {
        Box::new(HumanFormatter)
    }
}

/// One-line summary of a debt record for human output
pub fn record_line(record: &Record) -> String {
    let text = |key: &str| -> String {
        match record.field(key) {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Null) | None => "-".to_string(),
            Some(other) => other.to_string(),
        }
    };

    let mut line = format!(
        "{:<28} {:<20} {:<14} {:>10}  {}",
        record.id().as_str(),
        text("name"),
        text("boxName"),
        text("amount"),
        if record.paid() { "paid" } else { "unpaid" }
    );
    if record.is_optimistic() {
        line.push_str("  (pending sync)");
    }
    line
}
