//! # Pairing Subcommand
//!
//! Prints the setup URI a pairing QR code encodes, so a QR image can be
//! rendered with any external tool.

use anyhow::Result;
use clap::{Args, Subcommand};

use zvonek_hub::PairingInfo;

/// Arguments for the `zvonek pairing` subcommand.
#[derive(Args, Debug)]
pub struct PairingArgs {
    #[command(subcommand)]
    pub command: PairingCommand,
}

/// Pairing subcommands.
#[derive(Subcommand, Debug)]
pub enum PairingCommand {
    /// Print the `X-HM://` setup URI.
    Uri {
        /// Four-character setup id.
        #[arg(long, env = "ZVONEK_HOMEKIT_SETUP_ID")]
        setup_id: Option<String>,
        /// Setup code, `XXX-XX-XXX`.
        #[arg(long, env = "ZVONEK_HOMEKIT_PINCODE")]
        pincode: String,
    },
}

/// Execute the pairing subcommand.
pub fn run_pairing(args: &PairingArgs) -> Result<u8> {
    match &args.command {
        PairingCommand::Uri { setup_id, pincode } => {
            println!("{}", setup_uri(pincode, setup_id.as_deref())?);
            Ok(0)
        }
    }
}

/// Validate the pincode and build the setup URI.
pub fn setup_uri(pincode: &str, setup_id: Option<&str>) -> Result<String> {
    let digits = pincode.chars().filter(|c| *c != '-').count();
    anyhow::ensure!(
        digits == 8 && pincode.chars().all(|c| c == '-' || c.is_ascii_digit()),
        "pincode must be 8 digits in XXX-XX-XXX form, got {pincode:?}"
    );
    if let Some(id) = setup_id {
        anyhow::ensure!(
            id.len() == 4 && id.chars().all(|c| c.is_ascii_alphanumeric()),
            "setup id must be 4 alphanumeric characters, got {id:?}"
        );
    }

    let info = PairingInfo::new(pincode);
    let info = match setup_id {
        Some(id) => info.with_setup_id(id),
        None => info,
    };
    Ok(info.setup_uri())
}
