pub mod authoring;
pub mod capacity;
pub mod cascade;
pub mod error;
pub mod ledger;
pub mod lifecycle;
pub mod roster;
pub mod routes;
pub mod sync;
#[cfg(test)]
pub(crate) mod testing;

use axum::handler::Handler;
use axum::http::Method;
use axum::Router;
use event_roster_config::Config;
use event_roster_database::Store;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

pub use crate::error::{ErrorKind, RosterError, ServerError};
pub use crate::roster::Roster;

#[derive(Default)]
struct RosterRouter {
    router: Router<Roster>,
}

impl RosterRouter {
    #[must_use]
    fn route<T: 'static, H: Handler<T, Roster>>(
        self,
        method: &Method,
        path: &'static str,
        handler: H,
    ) -> Self {
        let method_router = match *method {
            Method::GET => axum::routing::get(handler),
            Method::POST => axum::routing::post(handler),
            Method::PUT => axum::routing::put(handler),
            Method::DELETE => axum::routing::delete(handler),
            _ => axum::routing::any(handler),
        };
        Self {
            router: self.router.route(path, method_router),
        }
    }

    fn finish(self) -> Router<Roster> {
        self.router
    }
}

/// Builds the HTTP surface of the engine.
#[must_use]
pub fn router(roster: Roster) -> Router {
    RosterRouter::default()
        .route(&Method::POST, "/events", routes::authoring::create_event)
        .route(&Method::POST, "/teachers", routes::authoring::create_teacher)
        .route(&Method::POST, "/roles/:eventid", routes::authoring::create_role)
        .route(&Method::POST, "/assignments", routes::assignments::assign)
        .route(
            &Method::DELETE,
            "/delete-role-assignment",
            routes::assignments::unassign,
        )
        .route(&Method::PUT, "/events/:id", routes::events::update_event)
        .route(&Method::DELETE, "/event", routes::events::delete_event)
        .route(
            &Method::GET,
            "/teacher-assignments/:id",
            routes::reads::teacher_assignments,
        )
        .route(
            &Method::GET,
            "/role-assignments/:id",
            routes::reads::role_assignments,
        )
        .route(
            &Method::GET,
            "/events/assigned-teachers/:eventid",
            routes::reads::assigned_teachers,
        )
        .route(
            &Method::GET,
            "/teacher/:teacherid/event/:eventid/roles",
            routes::reads::teacher_roles_in_event,
        )
        .finish()
        .with_state(roster)
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::new())
}

pub async fn run_server(config: &Config, store: Store) -> Result<(), ServerError> {
    let listener = TcpListener::bind(&config.listen_address).await?;
    info!(address = %listener.local_addr()?, "listening");

    axum::serve(listener, router(Roster::new(store)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            error!(%error, "could not listen for ctrl-c");
            core::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                error!(%error, "could not listen for SIGTERM");
                core::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = core::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("shutting down");
}
