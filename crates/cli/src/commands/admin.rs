//! Admin account commands.
//!
//! # Usage
//!
//! ```bash
//! # Hash a password for ADMIN_PASSWORD_HASH (reads one line from stdin)
//! echo 'a long passphrase' | blessed admin hash-password
//! ```

use std::io::BufRead;

use blessed_admin::services::hash_password;
use secrecy::{ExposeSecret, SecretString};

use super::CliError;

/// Shortest accepted admin password.
pub const MIN_PASSWORD_LEN: usize = 12;

/// Read the password from the first line of `input`.
///
/// # Errors
///
/// Returns `CliError::Invalid` if the password is shorter than
/// [`MIN_PASSWORD_LEN`] characters.
pub fn read_password(input: impl BufRead) -> Result<SecretString, CliError> {
    let mut line = String::new();
    let mut input = input;
    input.read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']);

    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(CliError::Invalid(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(SecretString::from(password.to_owned()))
}

/// Print the Argon2 PHC hash of a password read from stdin.
///
/// # Errors
///
/// Returns an error if stdin cannot be read, the password is too short, or
/// hashing fails.
#[allow(clippy::print_stdout)]
pub fn hash_password_from_stdin() -> Result<(), CliError> {
    tracing::info!("Reading password from stdin");
    let password = read_password(std::io::stdin().lock())?;
    let hash = hash_password(password.expose_secret())?;
    println!("{hash}");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_read_password_strips_newline_only() {
        let secret = read_password(" blessed panel 2025 \n".as_bytes()).unwrap();
        assert_eq!(secret.expose_secret(), " blessed panel 2025 ");
    }

    #[test]
    fn test_read_password_rejects_short() {
        assert!(matches!(
            read_password("short\n".as_bytes()),
            Err(CliError::Invalid(_))
        ));
    }

    #[test]
    fn test_hash_is_argon2() {
        let secret = read_password("blessed-panel-2025\r\n".as_bytes()).unwrap();
        let hash = hash_password(secret.expose_secret()).unwrap();
        assert!(hash.starts_with("$argon2"));
    }
}
