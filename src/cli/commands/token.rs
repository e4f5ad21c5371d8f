use clap::Subcommand;
use serde_json::json;

use crate::auth::TokenAuthenticator;
use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::config::AppConfig;

#[derive(Subcommand)]
pub enum TokenCommands {
    #[command(about = "Issue an access token for a user")]
    Issue {
        #[arg(help = "User id")]
        user_id: String,
    },

    #[command(about = "Verify a token and show whose it is")]
    Verify {
        #[arg(help = "Encoded token")]
        token: String,
    },
}

pub async fn handle(cmd: TokenCommands, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    config.validate()?;
    let authenticator = TokenAuthenticator::new(&config.security);

    match cmd {
        TokenCommands::Issue { user_id } => {
            let user_id = parse_user_id(&user_id)?;
            let token = authenticator.issue(user_id)?;

            match output_format {
                OutputFormat::Json => output_success(
                    &output_format,
                    "Token issued",
                    Some(json!({
                        "token": token,
                        "user_id": user_id,
                        "expires_in": authenticator.expiry_secs()
                    })),
                ),
                // Bare token so it can be captured by shell scripts
                OutputFormat::Text => {
                    println!("{}", token);
                    Ok(())
                }
            }
        }
        TokenCommands::Verify { token } => {
            let identity = authenticator.authenticate(Some(&token))?;
            output_success(
                &output_format,
                &format!("Token is valid for user {}", identity.user_id),
                Some(json!({ "user_id": identity.user_id })),
            )
        }
    }
}
