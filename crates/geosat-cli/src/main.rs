//! geosat: GeoSearch Satellite from the terminal
//!
//! Usage:
//!   geosat login --email you@example.com --password ...
//!   geosat request --lat 12.97 --lon 77.59 --plan monthly
//!   geosat status --watch
//!   geosat pay-final
//!   geosat convert 2.5 acre sqft

mod terminal;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use geosat_client::{ApiClient, FilePreferences, Session};
use geosat_core::forms::{FeedbackForm, LoginForm, SignupForm};
use geosat_core::land::{parse_input, LandConverter};
use geosat_core::{ClientConfig, ImageRequestForm, LandUnit, PlanType, Presenter, Resolution};
use geosat_payments::{
    CheckoutLoader, LegOutcome, PaymentService, PollState, SandboxCheckout, SandboxHost, ScriptHost,
    StatusPoller,
};

use crate::terminal::{TerminalHost, TerminalPresenter};

/// GeoSearch Satellite command line client
#[derive(Parser)]
#[command(name = "geosat", version, about = "Request and pay for satellite imagery")]
struct Cli {
    /// Where tokens and preferences are kept
    #[arg(long, global = true, default_value = ".geosat/preferences.json")]
    state: PathBuf,

    /// Pay with the in-process sandbox checkout (needs GEOSAT_SANDBOX_SECRET)
    #[arg(long, global = true)]
    sandbox: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the session tokens
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Forget the stored session
    Logout,

    /// Create an account
    Signup {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Show the signed-in user
    Whoami,

    /// Request an image and pay the advance
    Request {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        /// payasyougo, monthly or yearly
        #[arg(long, default_value = "payasyougo")]
        plan: String,
        /// high, medium or low
        #[arg(long, default_value = "high")]
        resolution: String,
        #[arg(long, default_value = "5km")]
        coverage: String,
    },

    /// Show the active request's status
    Status {
        /// Keep polling until interrupted
        #[arg(long)]
        watch: bool,
    },

    /// Pay the remaining amount once the image is ready
    PayFinal {
        /// Defaults to the active request's payment
        #[arg(long)]
        payment_id: Option<String>,
    },

    /// List past payments
    History,

    /// Rate the service
    Feedback {
        #[arg(long)]
        rating: u8,
        #[arg(long, default_value = "")]
        comment: String,
    },

    /// Convert a land area between units
    Convert {
        value: String,
        from: String,
        to: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn,geosat=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = ClientConfig::from_env().context("invalid configuration")?;
    let presenter: Arc<dyn Presenter> = Arc::new(TerminalPresenter);
    let session = Arc::new(Session::new(Arc::new(FilePreferences::new(&cli.state))));
    let client = Arc::new(ApiClient::new(&config, session, Arc::clone(&presenter))?);

    if client.session().is_first_launch().await? {
        client.session().mark_launched().await?;
        tracing::info!(state = %cli.state.display(), "First run, created preference store");
    }

    match cli.command {
        Commands::Login { email, password } => {
            client.login(&LoginForm::new(email, password)).await?;
            println!("Logged in.");
        }
        Commands::Logout => {
            client.logout().await?;
            println!("Logged out.");
        }
        Commands::Signup {
            first_name,
            last_name,
            email,
            password,
        } => {
            let form = SignupForm {
                fname: first_name,
                lname: last_name,
                email,
                confirm_password: password.clone(),
                password,
            };
            client.signup(&form).await?;
            println!("Registration successful! Please login to continue.");
        }
        Commands::Whoami => cmd_whoami(&client).await?,
        Commands::Request {
            lat,
            lon,
            plan,
            resolution,
            coverage,
        } => {
            let form = ImageRequestForm::new(lat, lon)
                .with_plan(plan.parse::<PlanType>()?)
                .with_resolution(resolution.parse::<Resolution>()?)
                .with_coverage_area(coverage);
            let payments = payment_service(&client, &config, cli.sandbox)?;
            cmd_request(&client, &payments, &form).await?;
        }
        Commands::Status { watch } => {
            if watch {
                cmd_watch(&client, presenter, &config).await?;
            } else {
                cmd_status(&client).await?;
            }
        }
        Commands::PayFinal { payment_id } => {
            let payments = payment_service(&client, &config, cli.sandbox)?;
            cmd_pay_final(&client, &payments, payment_id).await?;
        }
        Commands::History => cmd_history(&client).await?,
        Commands::Feedback { rating, comment } => {
            client.submit_feedback(&FeedbackForm::new(rating, &comment)).await?;
            println!("Thank you for your feedback!");
        }
        Commands::Convert { value, from, to } => cmd_convert(&value, &from, &to)?,
    }

    Ok(())
}

fn payment_service(client: &Arc<ApiClient>, config: &ClientConfig, sandbox: bool) -> Result<PaymentService> {
    let host: Arc<dyn ScriptHost> = if sandbox {
        let secret = std::env::var("GEOSAT_SANDBOX_SECRET")
            .context("--sandbox needs GEOSAT_SANDBOX_SECRET")?;
        Arc::new(SandboxHost::new(Arc::new(SandboxCheckout::new(secret.into_bytes()))))
    } else {
        Arc::new(TerminalHost)
    };
    let loader = Arc::new(CheckoutLoader::from_config(host, config));
    Ok(PaymentService::new(Arc::clone(client), loader, config.clone()))
}

async fn cmd_whoami(client: &ApiClient) -> Result<()> {
    let user = client.get_user().await?;
    println!("{} {} <{}>", user.first_name, user.last_name, user.email);
    if let Some(phone) = user.phone.filter(|p| !p.is_empty()) {
        println!("Phone: {}", phone);
    }
    Ok(())
}

async fn cmd_request(client: &ApiClient, payments: &PaymentService, form: &ImageRequestForm) -> Result<()> {
    let pricing = form.plan_type.pricing();
    println!(
        "{}: ₹{} {} (₹{} due now)",
        pricing.name, pricing.price, pricing.period, pricing.advance
    );

    let request = client.request_satellite_image(form).await?;
    println!("Request {} created.", request.request_id);

    match payments.initiate_advance_payment(&request.request_id).await? {
        LegOutcome::Verified => {}
        LegOutcome::Dismissed => println!("Payment cancelled. The request stays unpaid."),
    }
    Ok(())
}

async fn cmd_status(client: &ApiClient) -> Result<()> {
    let status = client.payment_status().await?;
    print_state(&geosat_payments::derive_state(status.as_ref()));
    if let Some(status) = status {
        if let (Some(lat), Some(lon)) = (status.latitude, status.longitude) {
            println!("  location {:.6}, {:.6}  coverage {}", lat, lon, status.coverage_area.as_deref().unwrap_or("-"));
        }
        if status.payment_status.is_completed() {
            let image = client.satellite_images().await?;
            match image.viewable_kml() {
                Some(url) => println!("  KML overlay: {}", url),
                None => println!("  Image status: {}", image.image_status),
            }
        }
    }
    Ok(())
}

async fn cmd_watch(client: &Arc<ApiClient>, presenter: Arc<dyn Presenter>, config: &ClientConfig) -> Result<()> {
    let poller = StatusPoller::spawn(client.clone(), presenter, config.poll_interval);
    let mut updates = poller.subscribe();
    println!("Polling every {}s, Ctrl-C to stop.", config.poll_interval.as_secs());

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = updates.borrow_and_update().state.clone();
                print_state(&state);
            }
        }
    }

    poller.shutdown().await;
    Ok(())
}

async fn cmd_pay_final(client: &ApiClient, payments: &PaymentService, payment_id: Option<String>) -> Result<()> {
    let payment_id = match payment_id {
        Some(id) => id,
        None => match geosat_payments::derive_state(client.payment_status().await?.as_ref()) {
            PollState::ReadyForPayment { payment_id, pending_amount } => {
                if let Some(amount) = pending_amount {
                    println!("Pending amount: ₹{}", amount);
                }
                payment_id
            }
            PollState::Processing => bail!("Your image is still being processed"),
            PollState::NoActiveRequest | PollState::Loading => bail!("No payment is due"),
        },
    };

    match payments.initiate_final_payment(&payment_id).await? {
        LegOutcome::Verified => {}
        LegOutcome::Dismissed => println!("Payment cancelled."),
    }
    Ok(())
}

async fn cmd_history(client: &ApiClient) -> Result<()> {
    let payments = client.payment_history().await?;
    if payments.is_empty() {
        println!("No payment history found.");
        return Ok(());
    }

    println!(
        "{:<12}  {:<18}  {:<13}  {:<11}  {:>10}  {}",
        "PAYMENT", "PLAN", "PAYMENT", "IMAGE", "TOTAL", "LOCATION"
    );
    println!("{}", "-".repeat(90));
    for entry in &payments {
        println!(
            "{:<12}  {:<18}  {:<13}  {:<11}  {:>10}  {:.4}, {:.4}",
            entry.payment_id,
            entry.plan_label(),
            entry.payment_status.as_str(),
            entry.image_status.as_str(),
            entry.total_amount,
            entry.coordinates.latitude,
            entry.coordinates.longitude
        );
    }
    Ok(())
}

fn cmd_convert(value: &str, from: &str, to: &str) -> Result<()> {
    if parse_input(value).is_none() {
        bail!("'{}' is not a number", value);
    }
    let mut converter = LandConverter::new(from.parse::<LandUnit>()?, to.parse::<LandUnit>()?);
    let result = converter.calculate(value);
    println!("{} {} = {} {}", value, converter.from.label(), result, converter.to.label());
    Ok(())
}

fn print_state(state: &PollState) {
    match state {
        PollState::Loading => println!("Loading..."),
        PollState::NoActiveRequest => println!("No active request."),
        PollState::Processing => println!("Your image is being processed."),
        PollState::ReadyForPayment {
            payment_id,
            pending_amount,
        } => {
            println!("Your image is ready (payment {}).", payment_id);
            if let Some(amount) = pending_amount {
                println!("  Pending amount: ₹{}  run `geosat pay-final`", amount);
            }
        }
    }
}
