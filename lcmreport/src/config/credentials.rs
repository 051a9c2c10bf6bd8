//! SSH credentials and interactive prompts.

use std::io::{self, BufRead, Write};

use secrecy::SecretString;

use super::env_value;
use crate::error::ConfigError;

/// Environment variable holding the SSH username.
pub const USERNAME_VAR: &str = "USERNAME_SSH";
/// Environment variable holding the SSH password.
pub const PASSWORD_VAR: &str = "PASSWORD_SSH";

/// Source of interactive answers.
pub trait Prompter {
    /// Ask for the username (echoed).
    fn username(&mut self) -> io::Result<String>;

    /// Ask for the password (not echoed).
    fn password(&mut self) -> io::Result<SecretString>;

    /// Ask a yes/no question.
    fn confirm(&mut self, question: &str) -> io::Result<bool>;
}

/// Prompts on the controlling terminal.
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn username(&mut self) -> io::Result<String> {
        read_answer(&mut io::stdin().lock(), &mut io::stdout(), "Username: ")
    }

    fn password(&mut self) -> io::Result<SecretString> {
        rpassword::prompt_password("Password: ").map(SecretString::from)
    }

    fn confirm(&mut self, question: &str) -> io::Result<bool> {
        ask_yes_no(&mut io::stdin().lock(), &mut io::stdout(), question)
    }
}

/// Print `prompt` and read one trimmed line.
///
/// Closed input is an `UnexpectedEof` error, never an empty answer.
fn read_answer<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    prompt: &str,
) -> io::Result<String> {
    write!(output, "{prompt}")?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "input closed before an answer was given",
        ));
    }
    Ok(line.trim().to_string())
}

/// Ask until the answer is yes or no.
fn ask_yes_no<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    question: &str,
) -> io::Result<bool> {
    let prompt = format!("{question} [y/n]: ");
    loop {
        match read_answer(input, output, &prompt)?.to_ascii_lowercase().as_str() {
            "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            _ => continue,
        }
    }
}

/// SSH login used for every device in the run.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }

    /// Take credentials from the environment, prompting for whatever is unset.
    pub fn resolve<F, P>(lookup: F, prompter: &mut P) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
        P: Prompter + ?Sized,
    {
        let username = match env_value(&lookup, USERNAME_VAR) {
            Some(username) => username,
            None => prompter.username()?,
        };
        let password = match env_value(&lookup, PASSWORD_VAR) {
            Some(password) => SecretString::from(password),
            None => prompter.password()?,
        };
        Ok(Self::new(username, password))
    }
}
