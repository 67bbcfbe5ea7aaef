//! Password hashing command.

use std::io::{self, BufRead};

use anyhow::{bail, Context};
use console::style;

use crate::services::auth::{password_weaknesses, HASH_COST};

/// Print a bcrypt hash suitable for `ADMIN_PASSWORD`.
pub fn cmd_hash_password(password: Option<String>) -> anyhow::Result<()> {
    let password = match password {
        Some(p) => p,
        None => {
            let mut line = String::new();
            io::stdin()
                .lock()
                .read_line(&mut line)
                .context("Failed to read password from stdin")?;
            line.trim_end_matches(['\r', '\n']).to_string()
        }
    };

    if password.is_empty() {
        bail!("Password must not be empty");
    }

    for problem in password_weaknesses(&password) {
        eprintln!("{} {}", style("!").yellow(), problem);
    }

    let hash = bcrypt::hash(password.as_bytes(), HASH_COST)?;
    println!("{}", hash);
    Ok(())
}
