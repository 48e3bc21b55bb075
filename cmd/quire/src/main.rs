//! # Quire Binary
//!
//! Operator CLI for the blog CMS and forum moderation data layer. Wires the
//! configured adapters into the services and runs one command.

mod render;
mod seed;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use auth_adapters::{MemoryAuth, PasswordAuth};
use clap::{Parser, Subcommand};
use configs::{LogFormat, Settings};
use domains::{AuthProvider, Envelope, MediaStore, RowStore, Session, SystemClock, UploadFile};
use secrecy::{ExposeSecret, SecretString};
use services::{
    BlogPages, BlogService, PaginatedList, ProfileService, ReportAggregationView, ReportService, UploadController,
};
use storage_adapters::{GatewaySettings, HttpGateway, MemoryGateway};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "quire", version, about = "Blog and moderation admin for the hosted backend")]
struct Cli {
    /// Use a seeded in-memory backend instead of the configured one.
    #[arg(long, global = true)]
    offline: bool,

    /// Settings file; defaults to ./quire.toml when present.
    #[arg(long, global = true, env = "QUIRE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List blogs, newest first.
    Blogs {
        /// Author whose blogs to list; defaults to the signed-in user.
        #[arg(long)]
        author: Option<String>,
        #[arg(long)]
        category: Option<String>,
        /// How many pages to load.
        #[arg(long, default_value_t = 1)]
        pages: usize,
    },
    /// Show one blog.
    Blog { id: String },
    DeleteBlog { id: String },
    /// Show the combined report table.
    Reports,
    /// Flip the active flag of the item in row DISPLAY_ID of the report table.
    Toggle { display_id: usize },
    /// Upload an image and print its public URL.
    Upload { file: PathBuf },
    /// Show the signed-in user's profile.
    Whoami,
}

struct Backend {
    rows: Arc<dyn RowStore>,
    media: Arc<dyn MediaStore>,
    session: Option<Arc<Session>>,
}

impl Backend {
    fn user_id(&self) -> anyhow::Result<&str> {
        self.session
            .as_deref()
            .map(|s| s.user_id.as_str())
            .ok_or_else(|| anyhow!("not signed in; set auth.email and auth.password"))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref()).context("loading settings")?;
    init_tracing(&settings);
    if let Some(path) = &settings.env_file {
        debug!(path = %path.display(), "loaded .env");
    }

    let backend = if cli.offline { offline(&settings).await? } else { online(&settings).await? };
    run(cli.command, &settings, backend).await
}

fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log.filter));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    match settings.log.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

async fn offline(settings: &Settings) -> anyhow::Result<Backend> {
    let gateway = Arc::new(MemoryGateway::default());
    seed::populate(&gateway);
    let auth = MemoryAuth::new().with_account(seed::DEMO_EMAIL, seed::DEMO_PASSWORD, seed::DEMO_USER_ID);

    let email = settings.auth.email.as_deref().unwrap_or(seed::DEMO_EMAIL);
    let password = settings
        .auth
        .password
        .as_ref()
        .map_or(seed::DEMO_PASSWORD, |p| p.expose_secret());
    let session = auth.sign_in(email, password).await.map_err(|e| anyhow!(e.user_message()))?;
    info!(user_id = %session.user_id, "using offline backend");

    Ok(Backend { rows: gateway.clone(), media: gateway, session: Some(Arc::new(session)) })
}

async fn online(settings: &Settings) -> anyhow::Result<Backend> {
    let gw = &settings.gateway;
    if !gw.is_configured() {
        bail!("no backend configured; set gateway.url and gateway.anon_key, or pass --offline");
    }
    let anon_key = || SecretString::from(gw.anon_key.expose_secret().to_string());

    let session = match (&settings.auth.email, &settings.auth.password) {
        (Some(email), Some(password)) => {
            let auth = PasswordAuth::new(&gw.url, anon_key(), gw.request_timeout)?;
            let session = auth
                .sign_in(email, password.expose_secret())
                .await
                .map_err(|e| anyhow!(e.user_message()))
                .context("signing in")?;
            Some(Arc::new(session))
        }
        _ => {
            debug!("no credentials configured; requests use the anon key");
            None
        }
    };

    let mut gateway = HttpGateway::new(GatewaySettings {
        base_url: gw.url.clone(),
        anon_key: anon_key(),
        request_timeout: gw.request_timeout,
        connect_timeout: gw.connect_timeout,
    })?;
    if let Some(session) = &session {
        gateway = gateway.with_session(session.clone());
    }
    let gateway = Arc::new(gateway);
    Ok(Backend { rows: gateway.clone(), media: gateway, session })
}

async fn run(command: Command, settings: &Settings, backend: Backend) -> anyhow::Result<()> {
    let clock = Arc::new(SystemClock);
    let blogs = BlogService::new(backend.rows.clone(), clock.clone());

    match command {
        Command::Blogs { author, category, pages } => {
            let author = match author {
                Some(author) => author,
                None => backend.user_id()?.to_string(),
            };
            let mut source = BlogPages::new(blogs);
            if let Some(category) = category {
                source = source.with_category(category);
            }
            let list = PaginatedList::new(source, settings.pagination.page_size)?;
            let mut state = list.reset_and_fetch(&author).await;
            for _ in 1..pages.max(1) {
                if !state.has_more || state.error.is_some() {
                    break;
                }
                state = list.load_more().await;
            }
            if let Some(error) = &state.error {
                bail!("{error}");
            }
            print!("{}", render::blog_list(&state.items, state.has_more));
        }
        Command::Blog { id } => {
            let blog = data(blogs.get_blog_by_id(&id).await)?;
            print!("{}", render::blog(&blog));
        }
        Command::DeleteBlog { id } => {
            let env = blogs.delete_blog(&id).await;
            let message = env.message.clone();
            data(env)?;
            println!("{}", message.unwrap_or_else(|| format!("deleted {id}")));
        }
        Command::Reports => {
            let view = ReportAggregationView::new(ReportService::new(backend.rows.clone()));
            print!("{}", render::report_table(&view.fetch_all().await));
        }
        Command::Toggle { display_id } => {
            let view = ReportAggregationView::new(ReportService::new(backend.rows.clone()));
            view.fetch_all().await;
            let row = view
                .row(display_id)
                .await
                .ok_or_else(|| anyhow!("no report row {display_id}"))?;
            let table = view.toggle_status(&row).await;
            print!("{}", render::report_table(&table));
        }
        Command::Upload { file } => {
            let bytes = tokio::fs::read(&file).await.with_context(|| format!("reading {}", file.display()))?;
            let name = file.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
            let content_type = mime_guess::from_path(&file).first_or_octet_stream().essence_str().to_string();

            let mut uploads = UploadController::new(backend.media.clone(), clock, settings.storage.bucket.clone());
            if let Some(folder) = &settings.storage.folder {
                uploads = uploads.with_folder(folder.clone());
            }
            let url = uploads
                .upload(&UploadFile::new(name, content_type, bytes::Bytes::from(bytes)))
                .await
                .map_err(|e| anyhow!(e.user_message()))?;
            println!("{url}");
        }
        Command::Whoami => {
            let user_id = backend.user_id()?;
            let profile = data(ProfileService::new(backend.rows.clone()).get_profile(user_id).await)?;
            print!("{}", render::profile(&profile));
        }
    }
    Ok(())
}

fn data<T>(env: Envelope<T>) -> anyhow::Result<T> {
    if !env.success {
        bail!("{}", env.failure_message());
    }
    env.data.ok_or_else(|| anyhow!("empty response"))
}
