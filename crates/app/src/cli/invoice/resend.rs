use std::sync::Arc;

use clap::Args;
use storefront_app::{
    database::{self, Db},
    domain::{
        notifications::{FulfillmentNotifier, NotificationOutcome, SmtpConfig, SmtpMailer},
        orders::{OrdersService, PgOrdersService, models::OrderNumber},
    },
};

#[derive(Debug, Args)]
pub(crate) struct ResendArgs {
    /// Order number, e.g. ORD-20260115-0123456789
    #[arg(long)]
    order_number: String,

    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    /// SMTP relay host
    #[arg(long, env = "SMTP_HOST")]
    smtp_host: String,

    /// SMTP relay port
    #[arg(long, env = "SMTP_PORT", default_value_t = 587)]
    smtp_port: u16,

    /// SMTP username
    #[arg(long, env = "SMTP_USERNAME")]
    smtp_username: Option<String>,

    /// SMTP password
    #[arg(long, env = "SMTP_PASSWORD", hide_env_values = true)]
    smtp_password: Option<String>,

    /// Connect without STARTTLS (local relays only)
    #[arg(long, env = "SMTP_INSECURE", default_value_t = false)]
    smtp_insecure: bool,

    /// Sender mailbox
    #[arg(long, env = "MAIL_FROM")]
    mail_from: String,
}

pub(crate) async fn run(args: ResendArgs) -> Result<(), String> {
    let pool = database::connect(&args.database_url)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    let orders = PgOrdersService::new(Db::new(pool));
    let number = OrderNumber::new(args.order_number);

    let placed = orders
        .find_by_number(&number)
        .await
        .map_err(|error| format!("failed to load order: {error}"))?
        .ok_or_else(|| format!("order {number} not found"))?;

    let mailer = SmtpMailer::new(&SmtpConfig {
        host: args.smtp_host,
        port: args.smtp_port,
        username: args.smtp_username,
        password: args.smtp_password,
        starttls: !args.smtp_insecure,
        from: args.mail_from,
    })
    .map_err(|error| format!("failed to build mailer: {error}"))?;

    match FulfillmentNotifier::new(Arc::new(mailer))
        .notify(&placed)
        .await
    {
        NotificationOutcome::Delivered => {
            println!("invoice for {number} sent");

            Ok(())
        }
        NotificationOutcome::Failed(error) => {
            Err(format!("failed to send invoice for {number}: {error}"))
        }
    }
}
