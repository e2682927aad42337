//! App Context

use std::{path::PathBuf, sync::Arc};

use jiff::SignedDuration;
use sqlx::migrate::MigrateError;
use thiserror::Error;

use crate::{
    database::{self, Db},
    domain::{
        checkout::{CheckoutServices, CheckoutSettings, CheckoutWorkflow},
        continuations::FileContinuationStore,
        coupons::PgCouponsService,
        notifications::{MailerError, SmtpConfig, SmtpMailer},
        orders::PgOrdersService,
        payments::{GatewayError, StripeConfig, StripeGateway},
    },
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),

    #[error("failed to apply database migrations")]
    Migrations(#[source] MigrateError),

    #[error("failed to build payment gateway client")]
    Gateway(#[source] GatewayError),

    #[error("failed to build mailer")]
    Mailer(#[source] MailerError),

    #[error("failed to compile address validation patterns")]
    Patterns(#[source] regex::Error),
}

/// Everything needed to build an [`AppContext`].
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,

    /// Apply pending migrations on start-up
    pub migrate: bool,
    pub payments: StripeConfig,
    pub mail: SmtpConfig,
    pub checkout: CheckoutSettings,
    pub continuations_dir: PathBuf,
    pub continuation_max_age: SignedDuration,
}

#[derive(Debug, Clone)]
pub struct AppContext {
    pub checkout: Arc<CheckoutWorkflow>,
}

impl AppContext {
    /// Build application context from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when the database is unreachable, migrations fail, or a client cannot be
    /// constructed.
    pub async fn from_config(config: AppConfig) -> Result<Self, AppInitError> {
        let pool = database::connect(&config.database_url)
            .await
            .map_err(AppInitError::Database)?;

        if config.migrate {
            database::migrate(&pool)
                .await
                .map_err(AppInitError::Migrations)?;
        }

        let db = Db::new(pool);

        let gateway = StripeGateway::new(config.payments).map_err(AppInitError::Gateway)?;
        let mailer = SmtpMailer::new(&config.mail).map_err(AppInitError::Mailer)?;

        let continuations =
            FileContinuationStore::new(config.continuations_dir, config.continuation_max_age);

        Self::from_services(
            config.checkout,
            CheckoutServices {
                coupons: Arc::new(PgCouponsService::new(db.clone())),
                gateway: Arc::new(gateway),
                continuations: Arc::new(continuations),
                orders: Arc::new(PgOrdersService::new(db)),
                mailer: Arc::new(mailer),
            },
        )
    }

    /// Build application context around existing services.
    ///
    /// # Errors
    ///
    /// Returns an error if the address validation patterns fail to compile.
    pub fn from_services(
        settings: CheckoutSettings,
        services: CheckoutServices,
    ) -> Result<Self, AppInitError> {
        let checkout = CheckoutWorkflow::new(settings, services).map_err(AppInitError::Patterns)?;

        Ok(Self {
            checkout: Arc::new(checkout),
        })
    }
}

