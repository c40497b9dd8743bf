//! Session demo binary
//!
//! Runs an authentication session against the in-memory identity provider
//! and prints the state after each step.

use authstate::mocks::{MockFlagStore, MockIdentityProvider};
use authstate::{AuthConfig, AuthSession, AuthState, AuthUser};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn describe(state: &AuthState) -> String {
    let user = state
        .user
        .as_ref()
        .map_or_else(|| "-".to_string(), |user| user.username.clone());
    format!(
        "status={} authenticated={} loading={} user={user}",
        state.status().as_str(),
        state.is_authenticated,
        state.is_loading
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "session_demo=info,authstate=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("=== Session Demo ===\n");

    let returning = AuthUser::new("ada@example.com")
        .with_attribute("email", "ada@example.com")
        .with_attribute("name", "Ada");

    let provider = MockIdentityProvider::new()
        .with_account(returning, "correct horse")
        .with_probe_delay(Duration::from_millis(50));
    let flags = MockFlagStore::new();

    let session = AuthSession::with_config(
        provider.clone(),
        flags.clone(),
        AuthConfig::default().with_operation_timeout(Duration::from_secs(5)),
    );

    // Print every state change as it is published
    let mut changes = session.subscribe();
    let watcher = tokio::spawn(async move {
        while changes.changed().await.is_ok() {
            let state = changes.borrow_and_update().clone();
            println!("    [state] {}", describe(&state));
        }
    });

    println!("Initial: {}", describe(&session.state().await));

    // Several screens asking at once; only one check runs
    println!("\n>>> Startup (three concurrent callers)");
    let (a, b, c) = tokio::join!(
        session.ensure_initialized(),
        session.ensure_initialized(),
        session.ensure_initialized()
    );
    println!("Claimed by: {a} / {b} / {c}");
    println!("Session checks made: {}", provider.probe_calls());

    println!("\n>>> Sign in with the wrong password");
    if let Err(error) = session.sign_in("ada@example.com", "battery staple").await {
        println!("Error shown to user: {error}");
    }

    println!("\n>>> Sign in with the right password");
    session.sign_in("ada@example.com", "correct horse").await?;

    println!("\n>>> Sign out while the provider is unreachable");
    provider.set_fail_sign_out(true);
    session.sign_out().await;
    provider.set_fail_sign_out(false);

    println!("\n>>> Sign up a new account");
    session
        .sign_up("grace@example.com", "Grace", "hopper1906")
        .await?;

    println!("\n>>> Sign up the same account again");
    if let Err(error) = session.sign_up("grace@example.com", "Grace", "hopper1906").await {
        println!("Error shown to user: {error}");
    }

    println!("\nFinal: {}", describe(&session.state().await));

    tracing::info!(
        sign_in_calls = provider.sign_in_calls(),
        sign_up_calls = provider.sign_up_calls(),
        "Shutting down session"
    );
    session.close().await?;
    // Flag writes run in the background; close waited for them
    println!("Flags written: {:?}", flags.attempts());
    drop(session);
    watcher.abort();

    println!("\n=== Demo Complete ===");
    Ok(())
}
