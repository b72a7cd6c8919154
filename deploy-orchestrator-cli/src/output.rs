//! Output formatting

use serde::Serialize;

/// How command results are printed on stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable lines
    Text,
    /// Pretty-printed JSON
    Json,
}

impl OutputFormat {
    /// Print `value` as JSON, or as the lines produced by `render`.
    pub fn emit<T, F>(self, value: &T, render: F) -> anyhow::Result<()>
    where
        T: Serialize + ?Sized,
        F: FnOnce(&T) -> Vec<String>,
    {
        match self {
            Self::Json => println!("{}", serde_json::to_string_pretty(value)?),
            Self::Text => {
                for line in render(value) {
                    println!("{line}");
                }
            }
        }
        Ok(())
    }
}

/// `✓`/`✗` marker.
pub fn mark(ok: bool) -> &'static str {
    if ok {
        "✓"
    } else {
        "✗"
    }
}

/// `-` for absent values.
pub fn or_dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}
