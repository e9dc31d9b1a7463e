use thiserror::Error;

/// Failures while encoding or decoding wire-format messages.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DnsError {
    #[error("message truncated")]
    TruncatedMessage,

    #[error("invalid label control byte {0:#04x}")]
    InvalidLabelEncoding(u8),

    #[error("compression pointer loop")]
    CompressionLoop,

    #[error("label of {0} bytes exceeds 63")]
    LabelTooLong(usize),

    #[error("name of {0} bytes exceeds 255")]
    NameTooLong(usize),

    #[error("invalid label: {0}")]
    InvalidLabel(String),

    #[error("unknown record type {0}")]
    UnknownRecordType(String),

    #[error("record data of {0} bytes exceeds 65535")]
    RecordDataTooLong(usize),

    #[error("section already holds 65535 entries")]
    SectionFull,

    #[error("section length does not match header count")]
    SectionCountMismatch,
}
