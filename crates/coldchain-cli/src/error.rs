use anyhow::Error;
use coldchain_config::ConfigError;
use coldchain_core::time::TimeParseError;
use coldchain_core::CoreError;
use coldchain_notify::{NotifyError, TransportError};
use coldchain_store::{StoreError, StoreErrorKind};
use coldchain_sync::IngestError;
use std::process::ExitCode;
use thiserror::Error as ThisError;

pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_NOT_FOUND: u8 = 2;
pub const EXIT_INVALID_INPUT: u8 = 3;
pub const EXIT_PRECONDITION: u8 = 4;

#[derive(Debug, ThisError)]
pub enum CliError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("{0}")]
    Precondition(String),
}

pub fn invalid_input(message: impl Into<String>) -> Error {
    CliError::InvalidInput(message.into()).into()
}

pub fn not_found(message: impl Into<String>) -> Error {
    CliError::NotFound(message.into()).into()
}

pub fn precondition(message: impl Into<String>) -> Error {
    CliError::Precondition(message.into()).into()
}

pub fn report_error(err: &Error, verbose: bool) {
    if verbose {
        eprintln!("error: {:#}", err);
    } else {
        eprintln!("error: {}", err);
    }
}

pub fn exit_code_for(err: &Error) -> ExitCode {
    ExitCode::from(exit_status_for(err))
}

fn exit_status_for(err: &Error) -> u8 {
    for cause in err.chain() {
        if let Some(cli_err) = cause.downcast_ref::<CliError>() {
            return match cli_err {
                CliError::InvalidInput(_) => EXIT_INVALID_INPUT,
                CliError::NotFound(_) => EXIT_NOT_FOUND,
                CliError::Precondition(_) => EXIT_PRECONDITION,
            };
        }
        if let Some(ingest_err) = cause.downcast_ref::<IngestError>() {
            return ingest_exit_code(ingest_err);
        }
        if let Some(store_err) = cause.downcast_ref::<StoreError>() {
            return store_exit_code(store_err);
        }
        if let Some(config_err) = cause.downcast_ref::<ConfigError>() {
            return config_exit_code(config_err);
        }
        if let Some(notify_err) = cause.downcast_ref::<NotifyError>() {
            return notify_exit_code(notify_err);
        }
        if let Some(transport_err) = cause.downcast_ref::<TransportError>() {
            return transport_exit_code(transport_err);
        }
        if let Some(_core_err) = cause.downcast_ref::<CoreError>() {
            return EXIT_INVALID_INPUT;
        }
        if let Some(_parse_err) = cause.downcast_ref::<TimeParseError>() {
            return EXIT_INVALID_INPUT;
        }
    }
    EXIT_FAILURE
}

fn ingest_exit_code(err: &IngestError) -> u8 {
    match err {
        IngestError::Store(store_err) => store_exit_code(store_err),
        IngestError::Precondition(_) => EXIT_PRECONDITION,
        IngestError::NotFound(_) => EXIT_NOT_FOUND,
        IngestError::Core(_)
        | IngestError::UnsupportedFile(_)
        | IngestError::TooLarge { .. }
        | IngestError::Empty(_)
        | IngestError::Parse(_) => EXIT_INVALID_INPUT,
        IngestError::Io(_) => EXIT_FAILURE,
    }
}

fn store_exit_code(err: &StoreError) -> u8 {
    match err.kind() {
        StoreErrorKind::NotFound => EXIT_NOT_FOUND,
        StoreErrorKind::InvalidId
        | StoreErrorKind::InvalidValue
        | StoreErrorKind::InvalidDataPath
        | StoreErrorKind::DuplicateShipment
        | StoreErrorKind::Core => EXIT_INVALID_INPUT,
        StoreErrorKind::MissingHomeDir
        | StoreErrorKind::Migration
        | StoreErrorKind::Sql
        | StoreErrorKind::Io
        | StoreErrorKind::Unavailable
        | StoreErrorKind::ReplaceFailed => EXIT_FAILURE,
    }
}

fn config_exit_code(err: &ConfigError) -> u8 {
    match err {
        ConfigError::MissingHomeDir => EXIT_FAILURE,
        ConfigError::InvalidConfigPath(_)
        | ConfigError::MissingConfigFile(_)
        | ConfigError::InsecurePermissions(_)
        | ConfigError::InvalidOwner
        | ConfigError::InvalidThresholds { .. }
        | ConfigError::InvalidPhone(_)
        | ConfigError::InvalidBaseUrl(_)
        | ConfigError::InvalidTimeout(_)
        | ConfigError::InvalidPollAttempts(_)
        | ConfigError::InvalidUploadLimit(_)
        | ConfigError::InvalidOffset(_)
        | ConfigError::Read { .. }
        | ConfigError::Parse { .. } => EXIT_INVALID_INPUT,
    }
}

fn notify_exit_code(err: &NotifyError) -> u8 {
    match err {
        NotifyError::Store(store_err) => store_exit_code(store_err),
        NotifyError::Transport(transport_err) => transport_exit_code(transport_err),
        NotifyError::Worker => EXIT_FAILURE,
    }
}

fn transport_exit_code(err: &TransportError) -> u8 {
    match err {
        TransportError::InvalidUrl(_) => EXIT_INVALID_INPUT,
        TransportError::Http(_) | TransportError::Decode(_) => EXIT_FAILURE,
    }
}

#[cfg(test)]
mod tests {
    use super::{exit_status_for, invalid_input, not_found, precondition};
    use anyhow::Context as _;
    use coldchain_store::StoreError;
    use coldchain_sync::IngestError;

    #[test]
    fn exit_codes_follow_the_error_chain() {
        assert_eq!(exit_status_for(&not_found("shipment SH-1")), 2);
        assert_eq!(exit_status_for(&invalid_input("bad id")), 3);
        assert_eq!(exit_status_for(&precondition("no phone")), 4);

        let wrapped = Err::<(), _>(IngestError::Precondition("thresholds missing"))
            .context("import shipments.csv")
            .unwrap_err();
        assert_eq!(exit_status_for(&wrapped), 4);

        let store = anyhow::Error::from(IngestError::Store(StoreError::NotFound("SH-1".into())));
        assert_eq!(exit_status_for(&store), 2);

        let other = anyhow::anyhow!("disk on fire");
        assert_eq!(exit_status_for(&other), 1);
    }
}
