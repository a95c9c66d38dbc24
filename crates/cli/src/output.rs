use clap::ValueEnum;

/// Supported output formats for scan results.
#[derive(Debug, Clone, Copy, PartialEq, ValueEnum)]
pub enum Format {
    Text,
    Json,
    Html,
}

impl From<Format> for reporters::Format {
    fn from(fmt: Format) -> Self {
        match fmt {
            Format::Text => reporters::Format::Text,
            Format::Json => reporters::Format::Json,
            Format::Html => reporters::Format::Html,
        }
    }
}
