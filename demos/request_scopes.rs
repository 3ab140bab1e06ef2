//! Demonstrates a container hierarchy serving simulated requests.
//!
//! The root container holds application-wide services; every request gets a
//! subcontainer so request-scoped state never leaks between requests.
//!
//! Run with: RUST_LOG=sovran_container=trace cargo run --example request_scopes

use sovran_container::{Container, Lifetime};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let app = Container::new();
    configure(&app);

    for user in ["alice", "bob", "alice"] {
        let request = app.spawn_subcontainer();
        handle_request(&request, user);
    }

    let db = app
        .resolve::<Arc<Database>>()
        .expect("database is registered");
    println!(
        "\nDatabase {} served {} queries",
        db.url,
        db.queries.load(Ordering::SeqCst)
    );
}

// ============================================================================
// Registrations
// ============================================================================

fn configure(app: &Container) {
    app.register(Lifetime::Shared, |_| AppConfig {
        name: "MyApp".to_string(),
        database_url: "postgres://localhost:5432/myapp".to_string(),
    });

    app.register(Lifetime::Shared, |c| {
        let config = c.resolve::<AppConfig>().unwrap_or_default();
        Arc::new(Database {
            url: config.database_url,
            queries: AtomicU64::new(0),
        })
    });

    let next_request = Arc::new(AtomicU64::new(1));
    app.register(Lifetime::Scoped, move |c| {
        Arc::new(RequestContext {
            request_id: next_request.fetch_add(1, Ordering::SeqCst),
            container: c.id().to_string(),
        })
    });

    app.register_with_arg(Lifetime::Transient, |c, username: String| {
        UserRepository {
            username,
            db: c.resolve::<Arc<Database>>(),
            context: c.resolve::<Arc<RequestContext>>(),
        }
    });

    app.register_with_args(Lifetime::Transient, |c, user: String, item: String| {
        let app_name = c.resolve::<AppConfig>().map(|cfg| cfg.name).unwrap_or_default();
        Receipt(format!("[{}] {} ordered {}", app_name, user, item))
    });
}

// ============================================================================
// Request handling
// ============================================================================

fn handle_request(request: &Container, user: &str) {
    let Some(repo) = request.resolve_with_arg::<UserRepository, _>(user.to_string()) else {
        println!("UserRepository is not registered");
        return;
    };
    repo.load();

    // A second repository in the same request shares the request context
    if let Some(again) = request.resolve_with_arg::<UserRepository, _>(user.to_string()) {
        let same = match (&repo.context, &again.context) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        };
        println!("  -> same request context within request: {}", same);
    }

    if let Some(receipt) =
        request.resolve_with_args::<Receipt, _, _>(user.to_string(), "Widget".to_string())
    {
        println!("  -> {}", receipt.0);
    }

    // Wrong argument list: not found rather than a panic
    if let Err(e) = request.try_resolve::<Receipt>() {
        println!("  -> {}", e);
    }
}

// ============================================================================
// Types served by the container
// ============================================================================

#[derive(Clone, Debug, Default)]
struct AppConfig {
    name: String,
    database_url: String,
}

#[derive(Debug)]
struct Database {
    url: String,
    queries: AtomicU64,
}

#[derive(Debug)]
struct RequestContext {
    request_id: u64,
    container: String,
}

#[derive(Clone, Debug)]
struct UserRepository {
    username: String,
    db: Option<Arc<Database>>,
    context: Option<Arc<RequestContext>>,
}

impl UserRepository {
    fn load(&self) {
        if let Some(db) = &self.db {
            db.queries.fetch_add(1, Ordering::SeqCst);
        }
        match &self.context {
            Some(ctx) => println!(
                "Request {} on {}: loading user {}",
                ctx.request_id, ctx.container, self.username
            ),
            None => println!("Loading user {} outside a request", self.username),
        }
    }
}

#[derive(Clone, Debug)]
struct Receipt(String);
