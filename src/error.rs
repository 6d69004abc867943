use derive_more::{Display, Error};

#[derive(Debug, Display, Error)]
pub enum ConfigError {
    #[display("failed to read config file")]
    ReadFile,
    #[display("failed to parse config: {reason}")]
    Parse { reason: String },
    #[display("invalid config: {field}")]
    Validation { field: String },
}

#[derive(Debug, Display, Error)]
pub enum ProviderError {
    #[display("request to {provider} failed")]
    Request { provider: String },
    #[display("failed to parse response from {provider}")]
    ResponseParse { provider: String },
    #[display("no price data available: {reason}")]
    DataUnavailable { reason: String },
    #[display("invalid instrument symbol \"{symbol}\"")]
    InvalidSymbol { symbol: String },
}

#[derive(Debug, Display, Error)]
pub enum AnalysisError {
    #[display("invalid input: {reason}")]
    InvalidInput { reason: String },
    #[display("data unavailable: {reason}")]
    DataUnavailable { reason: String },
    #[display("invalid parameter: {name}")]
    InvalidParameter { name: String },
}

#[derive(Debug, Display, Error)]
pub enum ExportError {
    #[display("failed to write tabular export")]
    Write,
    #[display("failed to read tabular export")]
    Read,
    #[display("malformed tabular export: {reason}")]
    Parse { reason: String },
}
