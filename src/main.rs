use clap::{Parser, Subcommand};
use idoctor_client::application::services::payment::PaymentService;
use idoctor_client::domain::payment::{CreatePaymentRequest, PaymentMethod, PaymentStatus};
use idoctor_client::domain::ports::SharedSessionStore;
use idoctor_client::domain::user::LoginRequest;
use idoctor_client::infrastructure::file::FileSessionStore;
use idoctor_client::interfaces::csv::payment_writer::PaymentStatusWriter;
use idoctor_client::interfaces::csv::plan_writer::PlanWriter;
use idoctor_client::interfaces::csv::quota_writer::QuotaWriter;
use idoctor_client::{ApiClients, ClientConfig, ClientError, PollOptions, PollOutcome};
use miette::{Result, miette};
use rust_decimal::Decimal;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(clap::ValueEnum, Clone, Debug, Default)]
enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum MethodArg {
    Alipay,
    Wechat,
}

impl From<MethodArg> for PaymentMethod {
    fn from(method: MethodArg) -> Self {
        match method {
            MethodArg::Alipay => PaymentMethod::Alipay,
            MethodArg::Wechat => PaymentMethod::Wechat,
        }
    }
}

#[derive(Parser)]
#[command(author, version, about = "Command-line client for the iDoctor services", long_about = None)]
struct Cli {
    /// JSON file holding the session tokens
    #[arg(long, env = "IDOCTOR_SESSION_FILE", default_value = ".idoctor-session.json")]
    session_file: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Log output format (logs go to stderr)
    #[arg(long, default_value = "pretty")]
    log_format: LogFormat,

    #[arg(long, env = "IDOCTOR_AUTH_API_URL")]
    auth_url: Option<String>,

    #[arg(long, env = "IDOCTOR_PAYMENT_API_URL")]
    payment_url: Option<String>,

    #[arg(long, env = "IDOCTOR_API_URL")]
    idoctor_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and store the session
    Login {
        /// Username or email
        #[arg(long)]
        user: String,
        #[arg(long, env = "IDOCTOR_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Print quota usage as CSV
    Quota,
    /// Print subscription plans as CSV
    Plans {
        /// Include inactive plans
        #[arg(long)]
        all: bool,
    },
    /// Create a payment order
    Pay {
        #[arg(long)]
        amount: Decimal,
        #[arg(long, value_enum)]
        method: MethodArg,
        #[arg(long, default_value = "CNY")]
        currency: String,
        #[arg(long)]
        subscription_id: Option<String>,
        /// Poll the new payment until it settles
        #[arg(long)]
        wait: bool,
    },
    /// Poll a payment until it settles, printing every status as CSV
    Poll {
        payment_id: String,
        #[arg(long, default_value_t = 2000)]
        interval_ms: u64,
        #[arg(long, default_value_t = 60)]
        max_attempts: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_format);

    let mut config = ClientConfig::from_env().map_err(diagnose)?;
    if let Some(url) = &cli.auth_url {
        config = config.with_auth_base_url(url);
    }
    if let Some(url) = &cli.payment_url {
        config = config.with_payment_base_url(url);
    }
    if let Some(url) = &cli.idoctor_url {
        config = config.with_idoctor_base_url(url);
    }

    let session = open_session_store(&cli)?;
    let clients = ApiClients::new(config, session);

    match cli.command {
        Command::Login { user, password } => {
            let request = LoginRequest {
                username_or_email: user.clone(),
                password,
            };
            clients.auth().login(&request).await.map_err(diagnose)?;
            println!("logged in as {user}");
        }
        Command::Logout => {
            clients.auth().logout().await.map_err(diagnose)?;
            println!("logged out");
        }
        Command::Whoami => {
            let user = clients.auth().current_user().await.map_err(diagnose)?;
            println!("{} <{}>", user.username, user.email);
        }
        Command::Quota => {
            let summaries = clients.quota().summary().await.map_err(diagnose)?;
            QuotaWriter::new(io::stdout())
                .write_summaries(&summaries)
                .map_err(diagnose)?;
        }
        Command::Plans { all } => {
            let plans = clients.subscriptions().plans(!all).await.map_err(diagnose)?;
            PlanWriter::new(io::stdout())
                .write_plans(&plans)
                .map_err(diagnose)?;
        }
        Command::Pay {
            amount,
            method,
            currency,
            subscription_id,
            wait,
        } => {
            let request = CreatePaymentRequest {
                amount,
                currency,
                payment_method: method.into(),
                subscription_id,
            };
            let payments = clients.payments();
            let payment = payments.create_payment(&request).await.map_err(diagnose)?;
            println!("payment {} {}", payment.id, payment.status.as_str());
            if let Some(url) = &payment.payment_url {
                println!("pay at {url}");
            }
            if wait {
                watch_payment(&payments, &payment.id, PollOptions::default()).await?;
            }
        }
        Command::Poll {
            payment_id,
            interval_ms,
            max_attempts,
        } => {
            let options = PollOptions::default()
                .with_interval(Duration::from_millis(interval_ms))
                .with_max_attempts(max_attempts);
            watch_payment(&clients.payments(), &payment_id, options).await?;
        }
    }

    Ok(())
}

fn init_logging(format: &LogFormat) {
    let builder = tracing_subscriber::fmt().with_writer(io::stderr);
    match format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
        LogFormat::Compact => builder.compact().init(),
    }
}

fn open_session_store(cli: &Cli) -> Result<SharedSessionStore> {
    if let Some(db_path) = &cli.db_path {
        #[cfg(feature = "storage-rocksdb")]
        {
            use idoctor_client::infrastructure::rocksdb::RocksDBSessionStore;
            let store = RocksDBSessionStore::open(db_path).map_err(diagnose)?;
            return Ok(Arc::new(store));
        }

        #[cfg(not(feature = "storage-rocksdb"))]
        eprintln!(
            "WARNING: Persistent storage requested via --db-path ({}), but 'storage-rocksdb' feature is not enabled. Falling back to session file {}.",
            db_path.display(),
            cli.session_file.display()
        );
    }
    Ok(Arc::new(FileSessionStore::new(&cli.session_file)))
}

async fn watch_payment(
    payments: &PaymentService,
    payment_id: &str,
    options: PollOptions,
) -> Result<()> {
    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_ctrl_c.cancel();
        }
    });

    let mut writer = PaymentStatusWriter::new(io::stdout()).map_err(diagnose)?;
    let mut write_error = None;
    let outcome = payments
        .poll_payment_status(payment_id, options, &cancel, |attempt, payment| {
            if write_error.is_none()
                && let Err(e) = writer.write_status(attempt, payment)
            {
                write_error = Some(e);
            }
        })
        .await
        .map_err(diagnose)?;
    if let Some(e) = write_error {
        return Err(diagnose(e));
    }

    match outcome {
        PollOutcome::Terminal(payment) if payment.status == PaymentStatus::Failed => {
            Err(miette!("payment {} failed", payment.id))
        }
        PollOutcome::Terminal(_) => Ok(()),
        PollOutcome::Exhausted { attempts, last } => {
            let status = last.map_or("unknown", |p| p.status.as_str());
            Err(miette!(
                "payment {payment_id} still {status} after {attempts} attempts"
            ))
        }
        PollOutcome::Cancelled { attempts } => Err(miette!(
            "polling of payment {payment_id} cancelled after {attempts} attempts"
        )),
    }
}

fn diagnose(e: ClientError) -> miette::Report {
    match e {
        ClientError::AuthExpired => miette!(
            help = "run `idoctor-client login` to start a new session",
            "session expired, please log in again"
        ),
        other => miette!("{other}"),
    }
}
