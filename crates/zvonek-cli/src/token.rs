//! # Token Subcommand
//!
//! Mint and verify the HS256 bearer tokens accepted by the lock actuation
//! endpoints. Uses the same [`CapabilityGate`] the server verifies with.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use zvonek_core::{CapabilityGate, Claims, Unauthorized};

use crate::resolve_secret;

/// Arguments for the `zvonek token` subcommand.
#[derive(Args, Debug)]
pub struct TokenArgs {
    /// Shared HS256 secret. Defaults to the development secret.
    #[arg(long, env = "ZVONEK_JWT_SECRET", hide_env_values = true, global = true)]
    pub secret: Option<String>,

    #[command(subcommand)]
    pub command: TokenCommand,
}

/// Token subcommands.
#[derive(Subcommand, Debug)]
pub enum TokenCommand {
    /// Mint a bearer token.
    Issue {
        /// `sub` claim, used for log attribution.
        #[arg(long)]
        subject: Option<String>,
        /// `surname` claim, used for log attribution.
        #[arg(long)]
        surname: Option<String>,
        /// Lifetime in seconds.
        #[arg(long, default_value_t = 7200)]
        ttl_secs: i64,
    },

    /// Verify a bearer token and print its claims.
    Verify {
        /// The token, with or without the `Bearer ` prefix.
        #[arg(value_name = "TOKEN")]
        token: String,
    },
}

/// Execute the token subcommand.
pub fn run_token(args: &TokenArgs) -> Result<u8> {
    let gate = CapabilityGate::new(&resolve_secret(args.secret.as_deref())?);
    match &args.command {
        TokenCommand::Issue {
            subject,
            surname,
            ttl_secs,
        } => {
            let token = issue(&gate, subject.as_deref(), surname.as_deref(), *ttl_secs)?;
            println!("{token}");
            Ok(0)
        }
        TokenCommand::Verify { token } => match verify(&gate, token) {
            Ok(claims) => {
                println!("OK: token valid");
                println!("{}", serde_json::to_string_pretty(&claims)?);
                Ok(0)
            }
            Err(reason) => {
                println!("FAIL: {reason}");
                Ok(1)
            }
        },
    }
}

/// Mint a token valid for `ttl_secs`.
pub fn issue(
    gate: &CapabilityGate,
    subject: Option<&str>,
    surname: Option<&str>,
    ttl_secs: i64,
) -> Result<String> {
    anyhow::ensure!(ttl_secs > 0, "--ttl-secs must be positive, got {ttl_secs}");
    let ttl = chrono::Duration::try_seconds(ttl_secs)
        .with_context(|| format!("--ttl-secs {ttl_secs} is out of range"))?;
    let mut claims = Claims::try_expiring_in(ttl)
        .with_context(|| format!("--ttl-secs {ttl_secs} puts the expiry past the supported date range"))?;
    if let Some(subject) = subject {
        claims = claims.with_subject(subject);
    }
    if let Some(surname) = surname {
        claims = claims.with_surname(surname);
    }
    gate.issue(&claims).context("failed to sign token")
}

/// Verify a token as the server would. Accepts a bare token or a full
/// `Bearer <token>` header value.
pub fn verify(gate: &CapabilityGate, token: &str) -> Result<Claims, Unauthorized> {
    let token = token.trim();
    if token.starts_with("Bearer ") {
        gate.verify(Some(token))
    } else {
        gate.verify_token(token)
    }
}
