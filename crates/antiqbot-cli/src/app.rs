//! Application state and command handlers.
//!
//! `App` owns the configuration and the session manager. Each handler makes
//! the API calls for one command, passing their results through
//! `SessionManager::guard` so a rejected credential logs the user out.

use std::io::{self, BufRead, Write};

use anyhow::{bail, Context, Result};
use antiqbot_core::api::{ApiClient, ImageUpload};
use antiqbot_core::auth::{SessionManager, SessionStore};
use antiqbot_core::models::RegisterRequest;
use antiqbot_core::Config;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::cli::Command;
use crate::format::{analysis_lines, history_lines, profile_lines};

pub struct App {
    pub config: Config,
    pub session: SessionManager,
}

impl App {
    /// Load config, build the client and restore the saved session.
    /// `api_url` (from `--api-url`) takes precedence over the config.
    pub fn new(api_url: Option<String>) -> Result<Self> {
        let config = match Config::load() {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "Failed to load config, using defaults");
                Config::default()
            }
        };

        let api_url = api_url
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| config.api_url());
        debug!(%api_url, backend = ?config.session_backend, "Config loaded");

        let client = ApiClient::new(api_url)?;
        let store = SessionStore::from_boxed(config.session_storage()?);
        Ok(Self::from_parts(config, SessionManager::new(client, store)))
    }

    pub fn from_parts(config: Config, mut session: SessionManager) -> Self {
        session.restore();
        Self { config, session }
    }

    pub async fn run(&mut self, command: Command) -> Result<()> {
        if command.requires_session() && !self.session.is_authenticated() {
            bail!("Not logged in. Run `antiqbot login` first.");
        }

        match command {
            Command::Login { email } => self.login(email).await?,
            Command::Register {
                email,
                first_name,
                last_name,
            } => self.register(email, first_name, last_name).await?,
            Command::Logout => {
                self.session.logout()?;
                println!("Logged out.");
            }
            Command::WhoAmI => self.whoami().await?,
            Command::ForgotPassword { email } => {
                let response = self.session.client().request_password_reset(&email).await?;
                print_message(&response, "If the address is known, a reset mail is on its way.");
            }
            Command::ResetPassword { token } => {
                let password = prompt_new_password()?;
                let response = self.session.client().reset_password(&token, &password).await?;
                print_message(&response, "Password changed.");
            }
            Command::VerifyEmail { token: None } => {
                let result = self.session.client().request_email_verification().await;
                let response = self.session.guard(result)?;
                print_message(&response, "Verification mail sent.");
            }
            Command::VerifyEmail { token: Some(token) } => {
                let response = self.session.client().verify_email(&token).await?;
                print_message(&response, "Email verified.");
            }
            Command::Credits => self.print_credits().await?,
            Command::Packages => {
                let packages = self.session.client().get_available_packages().await?;
                print_json(&packages)?;
            }
            Command::Buy { package_id } => {
                let result = self.session.client().purchase_credits(package_id).await;
                let response = self.session.guard(result)?;
                print_message(&response, "Purchase complete.");
                self.print_credits_after_change().await;
            }
            Command::Analyze { image, comment } => self.analyze(&image, &comment.join(" ")).await?,
            Command::History => {
                let result = self.session.client().get_analysis_history().await;
                let history = self.session.guard(result)?;
                match history_lines(&history) {
                    Some(lines) if lines.is_empty() => println!("No appraisals yet."),
                    Some(lines) => lines.iter().for_each(|l| println!("{}", l)),
                    None => print_json(&history)?,
                }
            }
            Command::Show { id } => {
                let result = self.session.client().get_analysis_by_id(&id).await;
                let analysis = self.session.guard(result)?;
                analysis_lines(&analysis).iter().for_each(|l| println!("{}", l));
            }
            Command::Delete { id } => {
                let result = self.session.client().delete_analysis(&id).await;
                let response = self.session.guard(result)?;
                print_message(&response, "Appraisal deleted.");
            }
            Command::Feedback { message } => {
                let response = self
                    .session
                    .client()
                    .submit_feedback(&self.contact_payload(None, &message.join(" ")))
                    .await?;
                print_message(&response, "Thanks for the feedback.");
            }
            Command::Support { subject, message } => {
                let response = self
                    .session
                    .client()
                    .contact_support(&self.contact_payload(Some(&subject), &message.join(" ")))
                    .await?;
                print_message(&response, "Support request sent.");
            }
            Command::Stats => {
                let result = self.session.client().get_user_statistics().await;
                let users = self.session.guard(result)?;
                let result = self.session.client().get_analysis_statistics().await;
                let analyses = self.session.guard(result)?;
                print_json(&json!({ "users": users, "analyses": analyses }))?;
            }
        }

        Ok(())
    }

    async fn login(&mut self, email: Option<String>) -> Result<()> {
        let email = match email.or_else(|| self.config.last_email.clone()) {
            Some(email) => email,
            None => prompt("Email: ")?,
        };
        let password = rpassword::prompt_password(format!("Password for {}: ", email))
            .context("Failed to read password")?;

        let response = self.session.login(&email, &password).await?;
        self.remember_email(email);

        match response.user.as_ref() {
            Some(user) => println!(
                "Logged in as {}. Credits: {}",
                user.display_name(),
                user.credit_balance()
            ),
            None => print_message(&serde_json::to_value(&response)?, "Login accepted."),
        }
        Ok(())
    }

    async fn register(&mut self, email: String, first_name: String, last_name: String) -> Result<()> {
        let password = prompt_new_password()?;
        let request = RegisterRequest {
            email: email.clone(),
            password,
            first_name,
            last_name,
        };

        let response = self.session.register(&request).await?;
        self.remember_email(email);

        match response.user.as_ref() {
            Some(user) => println!(
                "Welcome, {}. Credits: {}",
                user.display_name(),
                user.credit_balance()
            ),
            None => print_message(&serde_json::to_value(&response)?, "Account created."),
        }
        Ok(())
    }

    async fn whoami(&mut self) -> Result<()> {
        match self.session.refresh().await {
            Ok(Some(snapshot)) => {
                if let Err(e) = self.session.update_profile(snapshot.profile.clone()) {
                    warn!(error = %e, "Failed to cache refreshed profile");
                }
                profile_lines(&snapshot.profile).iter().for_each(|l| println!("{}", l));
                println!("Credits: {}", snapshot.credits.balance());
            }
            Ok(None) => bail!("Not logged in."),
            Err(e) if e.is_unauthorized() => {
                bail!("Session expired ({}). Run `antiqbot login` again.", e)
            }
            Err(e) => {
                warn!(error = %e, "Couldn't refresh user data, using cached data");
                eprintln!("Offline: showing cached profile ({})", e);
                if let Some(profile) = self.session.profile() {
                    profile_lines(profile).iter().for_each(|l| println!("{}", l));
                    println!("Credits: {} (cached)", profile.credit_balance());
                }
            }
        }
        Ok(())
    }

    async fn print_credits(&mut self) -> Result<()> {
        let result = self.session.client().get_credits().await;
        let credits = self.session.guard(result)?;
        println!("Credits: {}", credits.balance());
        Ok(())
    }

    /// Re-read the balance after spending or buying. The backend is the
    /// source of truth; a failure here does not fail the command.
    async fn print_credits_after_change(&mut self) {
        let result = self.session.client().get_credits().await;
        match self.session.guard(result) {
            Ok(credits) => println!("Credits left: {}", credits.balance()),
            Err(e) => warn!(error = %e, "Couldn't refresh credits"),
        }
    }

    async fn analyze(&mut self, path: &str, comment: &str) -> Result<()> {
        let image = ImageUpload::from_path(path).await?;

        let result = self.session.client().get_credits().await;
        let credits = self.session.guard(result)?;
        if !credits.can_analyze() {
            bail!("Not enough credits. Buy credits to analyze images (see `antiqbot packages`).");
        }

        let result = self.session.client().analyze_image(image, comment).await;
        let analysis = self.session.guard(result)?;

        analysis_lines(&analysis).iter().for_each(|l| println!("{}", l));
        self.print_credits_after_change().await;
        Ok(())
    }

    fn contact_payload(&self, subject: Option<&str>, message: &str) -> ContactPayload {
        ContactPayload {
            email: self
                .session
                .profile()
                .and_then(|p| p.email())
                .or_else(|| self.config.last_email.clone()),
            subject: subject.map(str::to_string),
            message: message.to_string(),
        }
    }

    fn remember_email(&mut self, email: String) {
        if self.config.last_email.as_deref() == Some(email.as_str()) {
            return;
        }
        self.config.last_email = Some(email);
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }
    }
}

#[derive(Debug, Serialize)]
struct ContactPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    subject: Option<String>,
    message: String,
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let value = line.trim().to_string();
    if value.is_empty() {
        bail!("No input given");
    }
    Ok(value)
}

fn prompt_new_password() -> Result<String> {
    let password = rpassword::prompt_password("New password: ").context("Failed to read password")?;
    let confirm = rpassword::prompt_password("Repeat password: ").context("Failed to read password")?;
    if password != confirm {
        bail!("Passwords do not match");
    }
    Ok(password)
}

/// Print the backend's `message` field, or `fallback` when there is none
fn print_message(response: &serde_json::Value, fallback: &str) {
    match response.get("message").and_then(|m| m.as_str()) {
        Some(message) => println!("{}", message),
        None => println!("{}", fallback),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
