//! Lint configuration.

use std::path::Path;

use clap::ValueEnum;

/// Encoding of an input document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Pick by file extension: `.yaml`/`.yml` are YAML, anything else JSON.
    #[default]
    Auto,
    Json,
    Yaml,
}

impl Format {
    /// Resolve `Auto` against the path the document was read from.
    pub fn resolve(self, path: &Path) -> Format {
        match self {
            Format::Auto => match path.extension().and_then(|e| e.to_str()) {
                Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                    Format::Yaml
                }
                _ => Format::Json,
            },
            other => other,
        }
    }
}

/// Lint configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Input encoding.
    pub format: Format,

    /// Pretty-print canonical JSON output.
    pub pretty: bool,

    /// Default log directive, used when `RUST_LOG` does not cover this crate.
    pub log_directive: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            format: Format::Auto,
            pretty: false,
            log_directive: "knit_lint=info".to_string(),
        }
    }
}
