use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use contract::{
    AuthClient, LoginRequest, Session, SignUpRequest, UserInfo, client::DEFAULT_BASE_URL,
};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser, Debug)]
#[command(author, version, about = "Talks to a running board backend")]
struct Args {
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    #[arg(long, default_value = "session.json")]
    session: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Signup {
        email: String,
        password: String,
        nickname: String,
    },
    Login {
        email: String,
        password: String,
    },
    Me,
    Logout,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let args = Args::parse();
    let client = AuthClient::new(&args.base_url);

    match args.command {
        Command::Signup {
            email,
            password,
            nickname,
        } => {
            let request = SignUpRequest {
                email,
                password,
                nickname,
            };
            if let Some(violation) = request.validate().first() {
                bail!("Sign up failed: {}", violation.message);
            }

            let created = client
                .sign_up(&request)
                .await
                .context("Sign up failed")?;
            println!(
                "Signed up {} as {} (id {}), please log in",
                created.email, created.nickname, created.id
            );
        }
        Command::Login { email, password } => {
            let request = LoginRequest { email, password };
            if let Some(violation) = request.validate().first() {
                bail!("Login failed: {}", violation.message);
            }

            let response = client.login(&request).await.context("Login failed")?;
            let mut session = Session::default();
            session.login(UserInfo::from(&response), response.access_token.clone());
            session.save(&args.session)?;

            info!("Session written to {}", args.session.display());
            println!("Logged in as {} ({})", response.nickname, response.role);
        }
        Command::Me => {
            let session = Session::load(&args.session)
                .with_context(|| format!("reading session {}", args.session.display()))?;
            let Some(token) = session.access_token.as_deref() else {
                bail!("Not logged in");
            };

            let me = client.me(token).await.context("Profile lookup failed")?;
            println!("{} <{}> id {} role {}", me.nickname, me.email, me.id, me.role);
        }
        Command::Logout => {
            Session::clear(&args.session)?;
            println!("Logged out");
        }
    }

    Ok(())
}
