use clap::ValueEnum;
use contentops_core::StripMode;

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    Summary,
    Json,
}

impl From<OutputFormat> for contentops_core::OutputFormat {
    fn from(arg: OutputFormat) -> Self {
        match arg {
            OutputFormat::Summary => Self::Summary,
            OutputFormat::Json => Self::Json,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum StripModeArg {
    /// Remove link elements from the parsed document
    Tree,
    /// Regex over the serialized markup
    Flat,
}

impl From<StripModeArg> for StripMode {
    fn from(arg: StripModeArg) -> Self {
        match arg {
            StripModeArg::Tree => Self::Tree,
            StripModeArg::Flat => Self::Flat,
        }
    }
}
