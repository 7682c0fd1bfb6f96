use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Arc;
use tessera_client::backend::AppwriteClient;
use tessera_client::registration::user_directory::DEFAULT_LIST_LIMIT;
use tessera_client::registration::{
    BackendConfig, DocumentStore, NewRegistration, Provisioner, RequestDesk, SessionManager,
    UserDirectory,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "tessera", about = "Membership backend client")]
struct Args {
    #[clap(long, default_value = "tessera.toml")]
    config: String,

    /// Sign in with these credentials before running the command.
    #[clap(long, global = true)]
    email: Option<String>,

    #[clap(long, global = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create account, profile and membership card
    Register {
        #[clap(long)]
        nome: String,
        #[clap(long)]
        cognome: Option<String>,
        #[clap(long)]
        telefono: Option<String>,
        #[clap(long)]
        data_nascita: Option<String>,
        #[clap(long)]
        luogo_nascita: Option<String>,
    },
    /// Show the signed-in account
    Whoami,
    /// Check whether a user holds an administrative role
    IsAdmin { user_id: String },
    /// List the most recent profiles
    Profiles {
        #[clap(long, default_value_t = DEFAULT_LIST_LIMIT)]
        limit: u32,
    },
    /// List the most recent membership cards
    Cards {
        #[clap(long, default_value_t = DEFAULT_LIST_LIMIT)]
        limit: u32,
    },
    /// Submit a request; fields are given as key=value
    Request {
        #[clap(long = "field", value_parser = parse_field)]
        fields: Vec<(String, String)>,
    },
    /// Check that the endpoint is reachable
    Health,
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))
}

fn load_config(path: &str) -> anyhow::Result<BackendConfig> {
    if Path::new(path).exists() {
        info!("Loading backend config from: {}", path);
        BackendConfig::from_file(path).with_context(|| format!("load config {}", path))
    } else {
        warn!("Config file {} not found. Using built-in backend settings.", path);
        Ok(BackendConfig::default())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = load_config(&args.config)?;

    let client = Arc::new(AppwriteClient::new(&config).context("init backend client")?);
    let store = Arc::new(DocumentStore::new(client.clone(), config.database_id.clone()));
    let directory = UserDirectory::new(store.clone(), config.collections.clone());
    let desk = RequestDesk::new(store.clone(), config.collections.richieste.clone());
    let provisioner = Provisioner::new(SessionManager::new(client.clone()), directory);

    if !matches!(args.command, Command::Register { .. }) {
        if let (Some(email), Some(password)) = (&args.email, &args.password) {
            provisioner
                .sessions()
                .login(email, password)
                .await
                .context("sign in")?;
        }
    }

    let outcome = run(args, &client, &provisioner, &desk).await;

    if client.has_session().await {
        if let Err(e) = provisioner.sessions().logout().await {
            warn!("Session left open: {}", e);
        }
    }

    outcome
}

async fn run(
    args: Args,
    client: &AppwriteClient,
    provisioner: &Provisioner,
    desk: &RequestDesk,
) -> anyhow::Result<()> {
    match args.command {
        Command::Register {
            nome,
            cognome,
            telefono,
            data_nascita,
            luogo_nascita,
        } => {
            let email = args.email.context("--email is required to register")?;
            let password = args.password.context("--password is required to register")?;

            let mut registration = NewRegistration::new(email, password, nome);
            registration.cognome = cognome;
            registration.telefono = telefono;
            registration.data_nascita = data_nascita;
            registration.luogo_nascita = luogo_nascita;

            let result = provisioner.register(&registration).await?;
            println!("Account:  {}", result.account.id);
            println!("Profile:  {} ({})", result.profile.id, result.profile.full_name);
            println!(
                "Card:     {} valid until {}",
                result.card.numero_tessera,
                result.card.data_scadenza.format("%Y-%m-%d")
            );
        }
        Command::Whoami => {
            let account = provisioner.sessions().current_user().await?;
            println!("{} <{}> ({})", account.name, account.email, account.id);
        }
        Command::IsAdmin { user_id } => {
            let admin = provisioner.directory().is_admin(&user_id).await;
            println!("{}", admin);
        }
        Command::Profiles { limit } => {
            for profile in provisioner.directory().list_profiles(limit).await? {
                println!(
                    "{}  {:<3} {:<30} {:<30} {}",
                    profile.user_id,
                    profile.initials(),
                    profile.full_name,
                    profile.email,
                    profile.role
                );
            }
        }
        Command::Cards { limit } => {
            for card in provisioner.directory().list_cards(limit).await? {
                println!(
                    "{}  {:<30} {:<8} {}",
                    card.numero_tessera,
                    card.nome_completo,
                    card.stato,
                    card.data_scadenza.format("%Y-%m-%d")
                );
            }
        }
        Command::Request { fields } => {
            let fields: Map<String, Value> = fields
                .into_iter()
                .map(|(k, v)| (k, Value::String(v)))
                .collect();
            let request = desk.create_request(fields).await?;
            println!("Request {} is {}", request.id, request.status);
        }
        Command::Health => {
            let reachable = client.check_connection().await;
            println!(
                "{} is {}",
                client.endpoint(),
                if reachable { "reachable" } else { "unreachable" }
            );
            if !reachable {
                anyhow::bail!("{} is unreachable", client.endpoint());
            }
        }
    }

    Ok(())
}
