use clap::{Args, Subcommand};

mod resend;

#[derive(Debug, Args)]
pub(crate) struct InvoiceCommand {
    #[command(subcommand)]
    command: InvoiceSubcommand,
}

#[derive(Debug, Subcommand)]
enum InvoiceSubcommand {
    /// Send the invoice for an order again, e.g. after a failed notification
    Resend(resend::ResendArgs),
}

pub(crate) async fn run(command: InvoiceCommand) -> Result<(), String> {
    match command.command {
        InvoiceSubcommand::Resend(args) => resend::run(args).await,
    }
}
