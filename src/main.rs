//! CLI entry point for wecom — a WeCom server API client.
//!
//! Loads credentials from an optional TOML config file, lets environment
//! variables or flags override the secrets, then runs one subcommand
//! against the API.
//!
//! Exit codes:
//! - 0: success
//! - 1: runtime error (auth failure, API error, missing config, etc.)
//! - 2: argument validation error (clap handles this automatically)

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use wecom_api::agent::get_agent;
use wecom_api::auth::CredentialDomain;
use wecom_api::billing::{BillListRequest, get_bill_list};
use wecom_api::client::WecomClient;
use wecom_api::config::{AppConfig, Config, ProviderConfig, SuiteConfig};
use wecom_api::error::{Result, WecomError};
use wecom_api::external_contact::{get_external_contact, list_external_contacts};
use wecom_api::license::{OrderFilter, list_order};

#[derive(Parser)]
#[command(name = "wecom", version, about, long_about = None)]
struct Cli {
    /// TOML config file with [app], [suite] and [provider] sections.
    #[arg(long, global = true, env = "WECOM_CONFIG")]
    config: Option<PathBuf>,

    /// API host, overriding the config file.
    #[arg(long, global = true, env = "WECOM_BASE_URL")]
    base_url: Option<String>,

    #[command(flatten)]
    credentials: Credentials,

    #[command(subcommand)]
    command: Commands,
}

/// Credential overrides. Prefer the environment variables to keep secrets
/// out of process listings and shell history.
#[derive(clap::Args, Default)]
struct Credentials {
    #[arg(long, global = true, env = "WECOM_CORP_ID")]
    corp_id: Option<String>,

    #[arg(long, global = true, env = "WECOM_CORP_SECRET", hide_env_values = true)]
    corp_secret: Option<String>,

    #[arg(long, global = true, env = "WECOM_SUITE_ID")]
    suite_id: Option<String>,

    #[arg(long, global = true, env = "WECOM_SUITE_SECRET", hide_env_values = true)]
    suite_secret: Option<String>,

    #[arg(long, global = true, env = "WECOM_SUITE_TICKET", hide_env_values = true)]
    suite_ticket: Option<String>,

    #[arg(long, global = true, env = "WECOM_PROVIDER_CORP_ID")]
    provider_corp_id: Option<String>,

    #[arg(
        long,
        global = true,
        env = "WECOM_PROVIDER_SECRET",
        hide_env_values = true
    )]
    provider_secret: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a token for one credential domain and print it.
    Token {
        #[arg(long, value_enum, default_value_t = Domain::App)]
        domain: Domain,
    },

    /// Customer (external contact) lookups.
    #[command(subcommand)]
    Contact(ContactCommand),

    /// List external payment bills in a time window.
    Bills {
        /// Window start, unix seconds.
        #[arg(long)]
        begin: i64,
        /// Window end, unix seconds.
        #[arg(long)]
        end: i64,
        /// Only bills collected by this member.
        #[arg(long)]
        payee: Option<String>,
    },

    /// Interface licensing.
    #[command(subcommand)]
    License(LicenseCommand),

    /// Show an application's settings and visibility scope.
    Agent {
        #[arg(long)]
        agentid: String,
    },
}

#[derive(Subcommand)]
enum ContactCommand {
    /// Show one customer and the members following them.
    Get { external_userid: String },
    /// List the customers of one member.
    List {
        #[arg(long)]
        userid: String,
    },
}

#[derive(Subcommand)]
enum LicenseCommand {
    /// List license purchase orders.
    Orders {
        /// Only orders placed for this corp.
        #[arg(long)]
        corpid: Option<String>,
        #[arg(long)]
        start_time: Option<i64>,
        #[arg(long)]
        end_time: Option<i64>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Domain {
    App,
    Suite,
    Provider,
}

impl From<Domain> for CredentialDomain {
    fn from(domain: Domain) -> Self {
        match domain {
            Domain::App => CredentialDomain::App,
            Domain::Suite => CredentialDomain::Suite,
            Domain::Provider => CredentialDomain::Provider,
        }
    }
}

impl Credentials {
    /// Merges flag and environment values into `config`. A section is
    /// created when both of its required values are given; otherwise the
    /// values only replace fields of an existing section.
    fn apply(self, config: &mut Config) {
        if let Some(app) = config.app.as_mut() {
            if let Some(v) = self.corp_id {
                app.corp_id = v;
            }
            if let Some(v) = self.corp_secret {
                app.corp_secret = v;
            }
        } else if let (Some(corp_id), Some(corp_secret)) = (self.corp_id, self.corp_secret) {
            config.app = Some(AppConfig {
                corp_id,
                corp_secret,
            });
        }

        if let Some(suite) = config.suite.as_mut() {
            if let Some(v) = self.suite_id {
                suite.suite_id = v;
            }
            if let Some(v) = self.suite_secret {
                suite.suite_secret = v;
            }
        } else if let (Some(suite_id), Some(suite_secret)) = (self.suite_id, self.suite_secret) {
            config.suite = Some(SuiteConfig {
                suite_id,
                suite_secret,
                suite_ticket: None,
            });
        }
        if let (Some(suite), Some(ticket)) = (config.suite.as_mut(), self.suite_ticket) {
            suite.suite_ticket = Some(ticket);
        }

        if let Some(provider) = config.provider.as_mut() {
            if let Some(v) = self.provider_corp_id {
                provider.corp_id = v;
            }
            if let Some(v) = self.provider_secret {
                provider.provider_secret = v;
            }
        } else if let (Some(corp_id), Some(provider_secret)) =
            (self.provider_corp_id, self.provider_secret)
        {
            config.provider = Some(ProviderConfig {
                corp_id,
                provider_secret,
            });
        }
    }
}

fn load_config(
    path: Option<&PathBuf>,
    base_url: Option<String>,
    creds: Credentials,
) -> Result<Config> {
    let mut config = match path {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(base_url) = base_url {
        config.base_url = base_url;
    }
    creds.apply(&mut config);
    Ok(config)
}

fn client_for(config: &Config, domain: CredentialDomain) -> Result<WecomClient> {
    match domain {
        CredentialDomain::App => config.app_client(),
        CredentialDomain::Suite => config.suite_client().map(|(client, _)| client),
        CredentialDomain::Provider => config.provider_client(),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Token { domain } => {
            let client = client_for(config, domain.into())?;
            println!("{}", client.tokens().token().await?);
        }
        Commands::Contact(ContactCommand::Get { external_userid }) => {
            let client = config.app_client()?;
            let detail = get_external_contact(&client, &external_userid).await?;
            print_json(&detail.external_contact)?;
            for follow in &detail.follow_user {
                println!(
                    "followed by {} (remark: {:?}, since {})",
                    follow.userid, follow.remark, follow.createtime
                );
            }
        }
        Commands::Contact(ContactCommand::List { userid }) => {
            let client = config.app_client()?;
            for id in list_external_contacts(&client, &userid).await? {
                println!("{id}");
            }
        }
        Commands::Bills { begin, end, payee } => {
            if end < begin {
                return Err(WecomError::Config {
                    message: "--end must not be before --begin".to_string(),
                });
            }
            let client = config.app_client()?;
            let mut request = BillListRequest {
                begin_time: begin,
                end_time: end,
                payee_userid: payee.unwrap_or_default(),
                ..Default::default()
            };
            loop {
                let page = get_bill_list(&client, &request).await?;
                for bill in &page.bill_list {
                    println!(
                        "{}\t{}\t{}\t{}",
                        bill.transaction_id, bill.bill_type, bill.total_fee, bill.payee_userid
                    );
                }
                if page.next_cursor.is_empty() {
                    break;
                }
                request.cursor = page.next_cursor;
            }
        }
        Commands::License(LicenseCommand::Orders {
            corpid,
            start_time,
            end_time,
        }) => {
            let client = config.provider_client()?;
            let mut filter = OrderFilter {
                corpid: corpid.unwrap_or_default(),
                start_time,
                end_time,
                ..Default::default()
            };
            loop {
                let page = list_order(&client, &filter).await?;
                for order in &page.order_list {
                    println!("{}\t{}", order.order_id, order.order_type);
                }
                if !page.has_more() || page.next_cursor.is_empty() {
                    break;
                }
                filter.cursor = page.next_cursor;
            }
        }
        Commands::Agent { agentid } => {
            let client = config.app_client()?;
            print_json(&get_agent(&client, &agentid).await?)?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("wecom_api=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match load_config(cli.config.as_ref(), cli.base_url, cli.credentials) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    match run(cli.command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
