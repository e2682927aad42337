//! App Router

use salvo::Router;

use crate::{checkout, healthcheck, observability::metrics_handler};

pub fn app_router() -> Router {
    Router::new()
        .push(Router::with_path("healthcheck").get(healthcheck::handler))
        .push(Router::with_path("metrics").get(metrics_handler))
        .push(
            Router::with_path("checkout")
                .push(Router::with_path("quote").post(checkout::quote::handler))
                .push(
                    Router::with_path("{key}")
                        .delete(checkout::abandon::handler)
                        .push(Router::with_path("session").post(checkout::session::handler))
                        .push(Router::with_path("confirm").post(checkout::confirm::handler))
                        .push(Router::with_path("return").get(checkout::resume::handler)),
                ),
        )
}
