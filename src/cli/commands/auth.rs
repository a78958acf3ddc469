use std::io::{self, BufRead, Write};

use clap::Subcommand;
use serde_json::json;

use crate::auth::{authorize, AdminSection};
use crate::cli::context::CliContext;
use crate::cli::utils::{output_empty_collection, output_success};
use crate::cli::OutputFormat;
use crate::models::CrudPermission;
use crate::session::HydrationOutcome;

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Sign in with email and password")]
    Login {
        #[arg(help = "Email address")]
        email: String,
        #[arg(long, help = "Password (will prompt if not provided)")]
        password: Option<String>,
    },

    #[command(about = "Sign out and forget stored credentials")]
    Logout,

    #[command(about = "Show current authentication status")]
    Status,

    #[command(about = "Rotate the stored access and refresh tokens")]
    Refresh,

    #[command(about = "Show current user information")]
    Whoami,

    #[command(about = "List module permissions of the signed-in admin")]
    Permissions,

    #[command(about = "Check whether the current user may open an admin section")]
    Can {
        #[arg(help = "Section name, e.g. orders or home-sections")]
        section: AdminSection,
        #[arg(long, help = "Permission to check: create, read, update or delete")]
        permission: Option<CrudPermission>,
    },
}

pub async fn handle(
    cmd: AuthCommands,
    ctx: &CliContext,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    match cmd {
        AuthCommands::Login { email, password } => {
            let password = match password {
                Some(password) => password,
                None => prompt_password()?,
            };

            let session = ctx.session.login_with_credentials(&email, &password).await?;
            let Some(user) = &session.user else {
                anyhow::bail!("Login did not return a user");
            };

            output_success(
                &output_format,
                &format!("Signed in as {} ({})", user.email, user.role),
                Some(json!({ "user": user, "permissions": session.permissions })),
            )
        }
        AuthCommands::Logout => {
            ctx.session.logout().await;
            output_success(&output_format, "Signed out", None)
        }
        AuthCommands::Status => {
            let outcome = ctx.session.hydrate().await;
            let session = ctx.session.session();

            let message = match (&session.user, outcome) {
                (Some(user), _) => format!("Signed in as {} ({})", user.email, user.role),
                (None, HydrationOutcome::Invalidated) => {
                    "Stored session was rejected; signed out".to_string()
                }
                (None, _) => "Not signed in".to_string(),
            };
            output_success(
                &output_format,
                &message,
                Some(json!({ "authenticated": session.is_authenticated(), "user": session.user })),
            )
        }
        AuthCommands::Refresh => {
            ctx.client.refresh_tokens().await?;
            output_success(&output_format, "Tokens refreshed", None)
        }
        AuthCommands::Whoami => {
            ctx.session.hydrate().await;
            let session = ctx.session.session();
            let Some(user) = session.user else {
                anyhow::bail!("Not signed in");
            };

            match output_format {
                OutputFormat::Json => {
                    output_success(&output_format, "Current user", Some(json!({ "user": user })))
                }
                OutputFormat::Text => {
                    println!("{} <{}>", user.full_name(), user.email);
                    println!("ID:     {}", user.id);
                    println!("Role:   {}", user.role);
                    println!("Active: {}", user.is_active);
                    Ok(())
                }
            }
        }
        AuthCommands::Permissions => {
            ctx.session.hydrate().await;
            let session = ctx.session.session();
            let Some(user) = &session.user else {
                anyhow::bail!("Not signed in");
            };
            if !user.needs_permissions() {
                return output_success(
                    &output_format,
                    &format!("{} does not use module permissions", user.role),
                    None,
                );
            }

            let permissions = session.permissions.unwrap_or_default();
            if permissions.is_empty() {
                return output_empty_collection(
                    &output_format,
                    "permissions",
                    "No permissions granted",
                );
            }

            match output_format {
                OutputFormat::Json => {
                    let body = json!({ "permissions": permissions });
                    println!("{}", serde_json::to_string_pretty(&body)?);
                }
                OutputFormat::Text => {
                    println!(
                        "{:<16} {:^6} {:^6} {:^6} {:^6}",
                        "MODULE", "CREATE", "READ", "UPDATE", "DELETE"
                    );
                    for p in &permissions {
                        println!(
                            "{:<16} {:^6} {:^6} {:^6} {:^6}",
                            p.module,
                            flag(p.can_create),
                            flag(p.can_read),
                            flag(p.can_update),
                            flag(p.can_delete)
                        );
                    }
                }
            }
            Ok(())
        }
        AuthCommands::Can { section, permission } => {
            ctx.session.hydrate().await;
            let session = ctx.session.session();
            let decision = authorize(&session, &section.requirement(permission));

            output_success(
                &output_format,
                &format!("{}: {}", section, decision),
                Some(json!({
                    "section": section,
                    "decision": decision,
                    "allowed": decision.is_allowed()
                })),
            )
        }
    }
}

fn flag(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "-"
    }
}

fn prompt_password() -> anyhow::Result<String> {
    eprint!("Password: ");
    io::stderr().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        anyhow::bail!("Password is required");
    }
    Ok(password)
}
