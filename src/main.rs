use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::Path;

use verigate::{
    config, init_telemetry, ApiClient, ConfirmDelete, DeletionOutcome, DeletionWorkflow,
    EntryContext, Notifier, SessionService, TokenField, VerificationWorkflow, VerigateConfig,
    WorkflowState,
};

#[derive(Parser)]
#[command(name = "verigate")]
#[command(about = "Email verification and organization settings for multi-tenant deployments")]
#[command(long_about = "Verigate drives the account flows of a multi-tenant application backend: \
                       verifying an email address with a one-time token, inspecting the current \
                       session, and deleting an organization behind a confirmation guard. Get \
                       started with 'verigate verify --link <verification link>'.")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify an email address with a one-time token (primary command)
    Verify {
        /// Emailed verification link carrying id and token query parameters
        #[arg(long, conflicts_with_all = ["id", "token"], help = "Verification link to parse id and token from")]
        link: Option<String>,
        /// Identifier of the email record being verified
        #[arg(long, help = "Identifier of the email record being verified")]
        id: Option<String>,
        /// One-time verification token
        #[arg(long, help = "One-time verification token from the email")]
        token: Option<String>,
        /// Fail instead of prompting when a token is required
        #[arg(long, help = "Fail instead of prompting when a token is required")]
        non_interactive: bool,
    },
    /// Organization settings operations
    Org {
        #[command(subcommand)]
        command: OrgCommands,
    },
    /// Show the signed-in user for the configured session
    Whoami,
    /// Write a default verigate.toml configuration file
    Init {
        /// Overwrite an existing configuration file
        #[arg(long, help = "Overwrite an existing verigate.toml")]
        force: bool,
    },
}

#[derive(Subcommand)]
enum OrgCommands {
    /// Delete an organization. This action cannot be undone
    Delete {
        /// Slug of the organization to delete
        #[arg(long, help = "Slug of the organization to delete")]
        slug: String,
        /// Skip the confirmation prompt
        #[arg(long, help = "Skip the confirmation prompt")]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    VerigateConfig::load_env_file()?;
    init_telemetry()?;

    match cli.command {
        None => {
            print_usage();
            Ok(())
        }
        Some(Commands::Verify {
            link,
            id,
            token,
            non_interactive,
        }) => run_verify(link, id, token, non_interactive).await,
        Some(Commands::Org {
            command: OrgCommands::Delete { slug, yes },
        }) => run_org_delete(&slug, yes).await,
        Some(Commands::Whoami) => run_whoami().await,
        Some(Commands::Init { force }) => run_init(force),
    }
}

fn print_usage() {
    println!("🔐 VERIGATE - Verify Your Email Address");
    println!();
    println!("📊 Quick start:");
    println!("   verigate verify --link '<emailed verification link>'");
    println!("   verigate verify --id <email-id> --token <code>");
    println!("   verigate whoami");
    println!();
    println!("🏢 Organization settings:");
    println!("   verigate org delete --slug <slug>");
    println!();
    println!("EXAMPLE WORKFLOW:");
    println!("   1. Open the verification email and copy the link");
    println!("   2. Run: verigate verify --link '<link>'");
    println!("   3. If the code was mistyped, correct it at the prompt and resubmit");
    println!();
    println!("⚙️  Configuration: run 'verigate init' to write a default verigate.toml");
}

async fn run_verify(
    link: Option<String>,
    id: Option<String>,
    token: Option<String>,
    non_interactive: bool,
) -> Result<()> {
    let entry = match link {
        Some(link) => EntryContext::from_link(&link)?,
        None => EntryContext::new(id.unwrap_or_default(), token.unwrap_or_default()),
    };

    let config = config()?;
    let client = ApiClient::new(&config.api)?;
    let mut workflow = VerificationWorkflow::new(client, entry);

    // Auto-submit path: a followed link resolves its implied attempt first.
    if workflow.state() == WorkflowState::Submitting {
        println!("Submitting...");
        workflow.drive().await;
    }

    loop {
        match workflow.state() {
            WorkflowState::Success => {
                println!("✅ Email verified. Thank you for verifying your email address.");
                return Ok(());
            }
            WorkflowState::Pending => {
                if non_interactive {
                    match workflow.error() {
                        Some(error) => bail!("verification failed: {error}"),
                        None => bail!(
                            "a verification token is required; pass --token or --link, \
                             or drop --non-interactive to be prompted"
                        ),
                    }
                }
                if let Some(error) = workflow.error() {
                    eprintln!("{error}");
                }

                let mut field = TokenField::new(workflow.token());
                let Some(input) = prompt_line("Please enter your email verification code: ")?
                else {
                    bail!("no verification token provided (end of input)");
                };
                field.set(input);
                if !field.can_submit() {
                    eprintln!("A verification code is required.");
                    continue;
                }

                workflow.update_token(field.value())?;
                println!("Submitting...");
                workflow.submit().await;
            }
            WorkflowState::Submitting => {
                workflow.drive().await;
            }
        }
    }
}

async fn run_org_delete(slug: &str, yes: bool) -> Result<()> {
    let config = config()?;
    let client = ApiClient::new(&config.api)?;

    let confirm = if yes {
        CliConfirm::Auto
    } else {
        CliConfirm::Prompt
    };

    let mut workflow = DeletionWorkflow::new(client, confirm, CliNotifier);
    match workflow.delete_by_slug(slug).await {
        DeletionOutcome::Deleted { .. } => {
            println!("Returning to home.");
            Ok(())
        }
        DeletionOutcome::Cancelled => {
            println!("Deletion aborted.");
            Ok(())
        }
        DeletionOutcome::NotPermitted { .. } => {
            bail!(
                "Only the owner may delete the organization. If you cannot reach the owner, \
                 please get in touch with support."
            )
        }
        DeletionOutcome::NotFound { slug } => {
            bail!("no organization found for slug '{slug}'")
        }
        DeletionOutcome::Failed { error } => {
            bail!("organization deletion failed: {error}")
        }
    }
}

async fn run_whoami() -> Result<()> {
    let config = config()?;
    let client = ApiClient::new(&config.api)?;

    match client.current_user().await? {
        Some(user) => {
            let display_name = user.name.as_deref().unwrap_or(&user.username);
            let verified = if user.is_verified {
                "verified"
            } else {
                "unverified"
            };
            println!("{display_name} (@{}) - {verified}", user.username);
            Ok(())
        }
        None => {
            println!("Not signed in.");
            Ok(())
        }
    }
}

fn run_init(force: bool) -> Result<()> {
    let path = Path::new("verigate.toml");
    if path.exists() && !force {
        bail!("verigate.toml already exists (use --force to overwrite)");
    }

    VerigateConfig::default().save_to_file(path)?;
    println!("📝 Wrote default configuration to verigate.toml");
    Ok(())
}

fn prompt_line(prompt: &str) -> Result<Option<String>> {
    print!("{prompt}");
    io::stdout().flush()?;

    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

enum CliConfirm {
    Auto,
    Prompt,
}

impl ConfirmDelete for CliConfirm {
    fn confirm(&mut self, prompt: &str) -> bool {
        match self {
            CliConfirm::Auto => true,
            CliConfirm::Prompt => match prompt_line(&format!("{prompt} [y/N]: ")) {
                Ok(Some(answer)) => matches!(answer.to_lowercase().as_str(), "y" | "yes"),
                _ => false,
            },
        }
    }
}

struct CliNotifier;

impl Notifier for CliNotifier {
    fn notify(&mut self, message: &str) {
        println!("{message}");
    }
}
