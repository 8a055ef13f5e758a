use std::io::{self, Write};

use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

use crate::domain::fetch_state::FetchSnapshot;

pub(crate) fn render_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Prints each newly completed result once. Raw terminal mode needs explicit
/// carriage returns.
pub(crate) struct ResultPrinter {
    json: bool,
    raw_mode: bool,
    last_printed: Option<DateTime<Utc>>,
}

impl ResultPrinter {
    pub(crate) fn new(json: bool, raw_mode: bool) -> Self {
        Self {
            json,
            raw_mode,
            last_printed: None,
        }
    }

    pub(crate) fn render(&mut self, snapshot: &FetchSnapshot<Value>) -> Result<Option<String>> {
        let (Some(data), Some(updated_at)) = (&snapshot.data, snapshot.updated_at) else {
            return Ok(None);
        };
        if self.last_printed == Some(updated_at) {
            return Ok(None);
        }
        self.last_printed = Some(updated_at);

        let line = if self.json {
            serde_json::to_string(snapshot)?
        } else {
            format!(
                "[{}] {}",
                updated_at.to_rfc3339_opts(SecondsFormat::Secs, true),
                render_value(data)
            )
        };
        Ok(Some(line))
    }

    pub(crate) fn print_snapshot(&mut self, snapshot: &FetchSnapshot<Value>) -> Result<()> {
        if let Some(line) = self.render(snapshot)? {
            self.print_line(&line)?;
        }
        Ok(())
    }

    pub(crate) fn print_status(&self, status: &str) -> Result<()> {
        if self.json {
            return Ok(());
        }
        self.print_line(&format!("-- {status}"))
    }

    fn print_line(&self, line: &str) -> Result<()> {
        let mut out = io::stdout().lock();
        out.write_all(line.as_bytes())?;
        out.write_all(if self.raw_mode { b"\r\n" } else { b"\n" })?;
        out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    use super::{render_value, ResultPrinter};
    use crate::domain::fetch_state::FetchSnapshot;

    #[test]
    fn empty_snapshot_renders_nothing() {
        let mut printer = ResultPrinter::new(false, false);
        let rendered = printer.render(&FetchSnapshot::default()).unwrap();
        assert_eq!(rendered, None);
    }

    #[test]
    fn each_completion_renders_once() {
        let mut printer = ResultPrinter::new(false, false);
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        let mut snapshot = FetchSnapshot {
            data: Some(json!("up")),
            loading: false,
            updated_at: Some(at),
        };

        assert_eq!(
            printer.render(&snapshot).unwrap().as_deref(),
            Some("[2025-01-01T12:00:00Z] up")
        );

        snapshot.loading = true;
        assert_eq!(printer.render(&snapshot).unwrap(), None);
    }

    #[test]
    fn json_mode_renders_whole_snapshot() {
        let mut printer = ResultPrinter::new(true, false);
        let snapshot = FetchSnapshot {
            data: Some(json!({"n": 1})),
            loading: false,
            updated_at: Some(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()),
        };

        let line = printer.render(&snapshot).unwrap().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["data"], json!({"n": 1}));
        assert_eq!(parsed["loading"], json!(false));
    }

    #[test]
    fn render_value_unquotes_strings() {
        assert_eq!(render_value(&json!("hello")), "hello");
        assert_eq!(render_value(&json!([1, 2])), "[1,2]");
    }
}
