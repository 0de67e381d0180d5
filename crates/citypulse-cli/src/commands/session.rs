use anyhow::Result;
use serde::Serialize;

use citypulse_core::session::{Profile, Session, SessionStatus, SignUpOutcome, SignUpProfile};

use super::App;

#[derive(Serialize)]
struct SessionView<'a> {
    status: SessionStatus,
    identity_id: Option<&'a str>,
    email: Option<&'a str>,
    profile: Option<&'a Profile>,
    warning: Option<&'a str>,
}

impl<'a> SessionView<'a> {
    fn of(session: &'a Session) -> Self {
        Self {
            status: session.status,
            identity_id: session.identity_id(),
            email: session
                .identity
                .as_ref()
                .and_then(|identity| identity.email.as_deref()),
            profile: session.profile.as_ref(),
            warning: session.warning.as_deref(),
        }
    }
}

fn print_session(view: &SessionView<'_>) {
    match (view.status, view.email.or(view.identity_id)) {
        (SessionStatus::Authenticated, Some(who)) => {
            println!("Signed in as {who}");
            if let Some(profile) = view.profile {
                if let Some(name) = profile.display_name() {
                    println!("  name:    {name}");
                }
                println!("  city:    {}", profile.city.as_deref().unwrap_or("(not set)"));
                if let Some(picture) = &profile.profile_picture {
                    println!("  picture: {picture}");
                }
            } else {
                println!("  (no profile)");
            }
        }
        _ => println!("Not signed in"),
    }
    if let Some(warning) = view.warning {
        println!("warning: {warning}");
    }
}

pub async fn login(app: &App, email: &str, password: &str) -> Result<()> {
    let backend = app.backend()?;
    let store = app.session(&backend).await?;
    let session = store.sign_in(email, password).await?;
    app.emit(&SessionView::of(&session), print_session)
}

pub async fn signup(
    app: &App,
    email: &str,
    password: &str,
    first_name: Option<String>,
    last_name: Option<String>,
) -> Result<()> {
    let backend = app.backend()?;
    let store = app.session(&backend).await?;
    let details = SignUpProfile {
        first_name,
        last_name,
    };

    match store.sign_up_with_profile(email, password, details).await? {
        SignUpOutcome::SignedIn(session) => app.emit(&SessionView::of(&session), print_session),
        SignUpOutcome::ConfirmationPending { email } => {
            println!("Account created. Confirm the email sent to {email}, then log in.");
            Ok(())
        }
    }
}

pub async fn logout(app: &App) -> Result<()> {
    let backend = app.backend()?;
    let store = app.session(&backend).await?;
    let report = store.sign_out().await;
    if report.is_clean() {
        println!("Signed out");
    } else {
        let session = store.snapshot();
        println!(
            "Signed out locally ({})",
            session.warning.as_deref().unwrap_or("remote sign-out not confirmed")
        );
    }
    Ok(())
}

pub async fn forgot_password(app: &App, email: &str, redirect_to: Option<&str>) -> Result<()> {
    let backend = app.backend()?;
    let store = app.session(&backend).await?;
    store.request_password_reset(email, redirect_to).await?;
    println!("If an account exists for {email}, a reset link is on its way.");
    println!("Check the spam folder too.");
    Ok(())
}

pub async fn set_password(app: &App, password: &str) -> Result<()> {
    let backend = app.backend()?;
    let (store, _) = app.signed_in(&backend).await?;
    store.update_password(password).await?;
    println!("Password updated");
    Ok(())
}

pub async fn whoami(app: &App) -> Result<()> {
    let backend = app.backend()?;
    let store = app.session(&backend).await?;
    let session = store.snapshot();
    app.emit(&SessionView::of(&session), print_session)
}

pub async fn set_city(app: &App, city: &str) -> Result<()> {
    let backend = app.backend()?;
    let (store, _) = app.signed_in(&backend).await?;
    let profile = store.set_location(city).await?;
    app.emit(&profile, |profile| {
        println!("City set to {}", profile.city.as_deref().unwrap_or(city));
    })
}
