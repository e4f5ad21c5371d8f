use std::sync::Arc;

use clap::Subcommand;
use serde_json::json;

use crate::auth::Identity;
use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::models::User;
use crate::services::AccountService;
use crate::store::{Filter, Repository, ResourceStore};

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "Create a user account")]
    Add {
        #[arg(long, help = "Display name")]
        name: String,

        #[arg(long, help = "Email address (must be unique)")]
        email: String,

        #[arg(long, help = "Password to hash and store, enables login")]
        password: Option<String>,

        #[arg(
            long,
            conflicts_with = "password",
            help = "Pre-computed bcrypt hash to store with the account"
        )]
        credential_hash: Option<String>,
    },

    #[command(about = "List user accounts")]
    List,

    #[command(about = "Delete a user with their posts and profile")]
    Delete {
        #[arg(help = "User id")]
        user_id: String,
    },
}

pub async fn handle(cmd: UserCommands, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let store: Arc<dyn ResourceStore> = Arc::new(connect_store(config).await?);
    let users: Repository<User> = Repository::new(Arc::clone(&store));

    match cmd {
        UserCommands::Add {
            name,
            email,
            password,
            credential_hash,
        } => {
            let email = email.trim().to_lowercase();
            let taken = users
                .find_one(&Filter::FieldEq {
                    field: "email",
                    value: json!(email),
                })
                .await?;
            if taken.is_some() {
                anyhow::bail!("User already exists");
            }

            let credential = match password {
                Some(password) => Some(bcrypt::hash(password, bcrypt::DEFAULT_COST)?),
                None => credential_hash,
            };
            let user = User::new(name.trim(), email, credential);
            users.save(&user).await?;

            output_success(
                &output_format,
                &format!("Created user {} ({})", user.name, user.id),
                Some(json!({ "user": user.public() })),
            )
        }
        UserCommands::List => {
            let mut all = users.find_many(&Filter::All).await?;
            if all.is_empty() {
                return output_empty_collection(&output_format, "users", "No users");
            }
            all.sort_by(|a, b| a.date.cmp(&b.date));

            match output_format {
                OutputFormat::Json => {
                    let public: Vec<_> = all.iter().map(User::public).collect();
                    println!("{}", serde_json::to_string_pretty(&json!({ "users": public }))?);
                }
                OutputFormat::Text => {
                    println!("{:<38} {:<20} {:<30} {}", "ID", "NAME", "EMAIL", "CREATED");
                    println!("{}", "-".repeat(105));
                    for user in &all {
                        println!(
                            "{:<38} {:<20} {:<30} {}",
                            user.id,
                            user.name,
                            user.email,
                            user.date.format("%Y-%m-%d %H:%M")
                        );
                    }
                }
            }
            Ok(())
        }
        UserCommands::Delete { user_id } => {
            let user_id = parse_user_id(&user_id)?;
            let deleted = AccountService::new(store)
                .delete_account(&Identity::new(user_id))
                .await?;

            output_success(
                &output_format,
                &format!(
                    "Deleted user {} ({} posts, {} profiles)",
                    user_id, deleted.posts, deleted.profiles
                ),
                Some(json!({ "posts": deleted.posts, "profiles": deleted.profiles })),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use crate::cli::{Cli, Commands};

    use super::UserCommands;

    #[test]
    fn add_accepts_a_password() {
        let cli = Cli::try_parse_from([
            "devconnector", "user", "add", "--name", "Ada", "--email", "ada@example.com", "--password", "s3cret",
        ])
        .unwrap();
        match cli.command {
            Commands::User {
                cmd: UserCommands::Add { password, credential_hash, .. },
            } => {
                assert_eq!(password.as_deref(), Some("s3cret"));
                assert!(credential_hash.is_none());
            }
            _ => panic!("expected user add"),
        }
    }

    #[test]
    fn password_and_hash_are_exclusive() {
        let result = Cli::try_parse_from([
            "devconnector", "user", "add", "--name", "Ada", "--email", "ada@example.com", "--password", "s3cret",
            "--credential-hash", "$2b$04$abc",
        ]);
        assert!(result.is_err());
    }
}
