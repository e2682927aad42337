use clap::Args;
use rust_decimal::Decimal;
use storefront_app::{
    database::{self, Db},
    domain::coupons::{
        CouponsService, PgCouponsService,
        models::{CouponUuid, NewCoupon},
    },
};

#[derive(Debug, Args)]
pub(crate) struct CreateCouponArgs {
    /// Code customers enter at checkout; matched case-insensitively
    #[arg(long)]
    code: String,

    /// Percentage points off the tax-inclusive total, e.g. 10
    #[arg(long, conflicts_with = "amount_off", required_unless_present = "amount_off")]
    percent_off: Option<Decimal>,

    /// Fixed amount off in minor units
    #[arg(long)]
    amount_off: Option<i64>,

    /// Create the coupon disabled
    #[arg(long, default_value_t = false)]
    inactive: bool,

    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,
}

pub(crate) async fn run(args: CreateCouponArgs) -> Result<(), String> {
    if args.code.trim().is_empty() {
        return Err("code cannot be empty".to_string());
    }

    let pool = database::connect(&args.database_url)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    let coupon = PgCouponsService::new(Db::new(pool))
        .create_coupon(NewCoupon {
            uuid: CouponUuid::new(),
            code: args.code.trim().to_string(),
            percent_off: args.percent_off,
            amount_off: args.amount_off,
            active: !args.inactive,
        })
        .await
        .map_err(|error| format!("failed to create coupon: {error}"))?;

    println!("coupon_uuid: {}", coupon.uuid);
    println!("coupon_code: {}", coupon.code);
    println!("active: {}", coupon.active);

    Ok(())
}
