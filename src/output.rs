use std::io::{self, Write};
use std::process::ExitCode;

use secrecy::{ExposeSecret, SecretString};

use crate::keychain::Entry;

/// What standard output receives when the password prompt is cancelled.
pub const INTERRUPTED: &[u8] = b"\n";

const PREFIX: &str = "onepass";

/// The single result of a run.
#[derive(Debug)]
pub enum Outcome {
    Success(SecretString),
    SuccessListing(Vec<Entry>),
    NotFound(String),
    AuthFailed,
    Interrupted,
}

/// Process exit status, following sysexits.h where one applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Failure,
    Usage,
    DataError,
}

impl Status {
    pub fn code(self) -> u8 {
        match self {
            Status::Success => 0,
            Status::Failure => 1,
            Status::Usage => 64,
            Status::DataError => 65,
        }
    }
}

impl From<Status> for ExitCode {
    fn from(status: Status) -> Self {
        ExitCode::from(status.code())
    }
}

/// Write `outcome` to the matching stream and return the exit status for it.
pub fn render(outcome: &Outcome, out: &mut impl Write, err: &mut impl Write) -> io::Result<Status> {
    let status = match outcome {
        Outcome::Success(password) => {
            writeln!(out, "{}", password.expose_secret())?;
            Status::Success
        }
        Outcome::SuccessListing(entries) => {
            for entry in entries {
                writeln!(out, "{}:", entry.name)?;
                for (field, value) in &entry.details {
                    writeln!(out, "  - {}: {}", field, value)?;
                }
            }
            Status::Success
        }
        Outcome::NotFound(query) => {
            writeln!(err, "{}: Could not find an item named '{}'", PREFIX, query)?;
            Status::DataError
        }
        Outcome::AuthFailed => {
            writeln!(err, "{}: Incorrect master password", PREFIX)?;
            Status::DataError
        }
        Outcome::Interrupted => {
            out.write_all(INTERRUPTED)?;
            Status::Success
        }
    };
    out.flush()?;
    err.flush()?;
    Ok(status)
}

/// Report an error that ended the run early.
pub fn error(err: &mut impl Write, message: &str) {
    let _ = writeln!(err, "{}: {}", PREFIX, message);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(outcome: Outcome) -> (String, String, Status) {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let status = render(&outcome, &mut out, &mut err).unwrap();
        (
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
            status,
        )
    }

    #[test]
    fn test_success_prints_password_line() {
        let (out, err, status) = rendered(Outcome::Success(SecretString::new("hunter2".into())));
        assert_eq!(out, "hunter2\n");
        assert!(err.is_empty());
        assert_eq!(status, Status::Success);
    }

    #[test]
    fn test_listing_prints_names_and_details_in_order() {
        let entries = vec![
            Entry::new("Gmail", "x")
                .with_detail("username", "me@gmail.com")
                .with_detail("url", "https://mail.google.com"),
            Entry::new("Fastmail", "y").with_detail("username", "me@fastmail.com"),
        ];
        let (out, err, status) = rendered(Outcome::SuccessListing(entries));
        assert_eq!(
            out,
            "Gmail:\n  - url: https://mail.google.com\n  - username: me@gmail.com\n\
             Fastmail:\n  - username: me@fastmail.com\n"
        );
        assert!(err.is_empty());
        assert_eq!(status, Status::Success);
    }

    #[test]
    fn test_empty_listing_prints_nothing() {
        let (out, err, status) = rendered(Outcome::SuccessListing(Vec::new()));
        assert!(out.is_empty() && err.is_empty());
        assert_eq!(status, Status::Success);
    }

    #[test]
    fn test_not_found_goes_to_stderr() {
        let (out, err, status) = rendered(Outcome::NotFound("github".into()));
        assert!(out.is_empty());
        assert_eq!(err, "onepass: Could not find an item named 'github'\n");
        assert_eq!(status, Status::DataError);
    }

    #[test]
    fn test_auth_failed_goes_to_stderr() {
        let (out, err, status) = rendered(Outcome::AuthFailed);
        assert!(out.is_empty());
        assert_eq!(err, "onepass: Incorrect master password\n");
        assert_eq!(status, Status::DataError);
    }

    #[test]
    fn test_interrupted_prints_single_newline() {
        let (out, err, status) = rendered(Outcome::Interrupted);
        assert_eq!(out, "\n");
        assert!(err.is_empty());
        assert_eq!(status, Status::Success);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(Status::Success.code(), 0);
        assert_eq!(Status::Failure.code(), 1);
        assert_eq!(Status::Usage.code(), 64);
        assert_eq!(Status::DataError.code(), 65);
    }
}
