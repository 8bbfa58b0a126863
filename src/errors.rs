use thiserror::Error;
#[derive(Error, Debug)]
pub enum ConnectMlsError {
    #[error("invalid username/password, double check your credentials")]
    InvalidCredentials,
    #[error("invalid property type: {0}")]
    InvalidPropertyType(String),
    #[error("limit must not be negative, got {0}")]
    NegativeLimit(i64),
    #[error("unsupported export type: {0}")]
    UnsupportedExportType(String),
    #[error("protocol error: {0}")]
    ProtocolError(String),
    #[error("missing field in response: {0}")]
    MissingField(String),
    #[error("Selector error: {0}")]
    SelectorError(String),
    #[error("regex error: {0}")]
    RegexError(String),
    #[error("config error: {0}")]
    ConfigError(String),
    #[error("network error: {0}")]
    NetworkError(#[from] reqwest::Error),
    #[error("url error: {0}")]
    UrlError(#[from] url::ParseError),
    #[error("serde error: {0}")]
    SerdeError(#[from] serde_json::Error),
    #[error("utf-8 error: {0}")]
    Utf8Error(#[from] std::str::Utf8Error),
    #[error("csv error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("xlsx error: {0}")]
    XlsxError(#[from] rust_xlsxwriter::XlsxError),
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("{0}")]
    GenericError(String),
}
