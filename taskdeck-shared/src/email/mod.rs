/// Outbound email notifier
///
/// All email in TaskDeck is a side effect: verification links, password
/// resets, welcome notes, invitations, and organization-deletion notices.
/// The [`Notifier`] trait keeps callers decoupled from SMTP so tests can
/// substitute a recording fake; [`SmtpNotifier`] is the production
/// implementation built on lettre.
///
/// Callers that treat email as strictly best-effort should go through
/// [`spawn_detached`], which runs the send on a detached task and routes
/// failures to the log instead of the caller's control flow.

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    Message, SmtpTransport, Transport,
};
use std::future::Future;
use std::time::Duration;
use tracing::{error, info};

/// Error type for email operations
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// Invalid sender or recipient address
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Message construction failed
    #[error("Failed to build message: {0}")]
    BuildError(String),

    /// SMTP transport failure
    #[error("Failed to send email: {0}")]
    SendError(String),
}

/// SMTP configuration for the production notifier
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    /// SMTP relay hostname
    pub host: String,

    /// SMTP port (587 for STARTTLS)
    pub port: u16,

    /// SMTP username
    pub username: String,

    /// SMTP password
    pub password: String,

    /// From header, e.g. `"TaskDeck Support" <no-reply@taskdeck.io>`
    pub from: String,

    /// Base URL for links embedded in emails
    pub frontend_url: String,
}

/// Outbound notification interface
///
/// Every method is fire-and-forget from the caller's perspective except the
/// registration verification email, which callers are required to *attempt*
/// (but a failure still never fails the registration - the account exists
/// and "resend verification" covers recovery).
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends the email-verification link for a pending registration
    async fn send_verification_email(&self, email: &str, token: &str) -> Result<(), EmailError>;

    /// Sends a password-reset link
    async fn send_password_reset_email(&self, email: &str, token: &str) -> Result<(), EmailError>;

    /// Sends the post-verification (or OAuth signup) welcome note
    async fn send_welcome_email(&self, email: &str, name: &str) -> Result<(), EmailError>;

    /// Notifies a former member that their organization was deleted
    async fn send_organization_deleted_email(
        &self,
        email: &str,
        org_name: &str,
    ) -> Result<(), EmailError>;

    /// Invites a newly created account into an organization; the reset token
    /// lets the invitee choose their own password
    async fn send_account_invite_email(
        &self,
        email: &str,
        reset_token: &str,
        org_name: &str,
        role: &str,
    ) -> Result<(), EmailError>;
}

/// Production notifier backed by an SMTP relay
#[derive(Clone)]
pub struct SmtpNotifier {
    mailer: SmtpTransport,
    from: String,
    frontend_url: String,
}

impl SmtpNotifier {
    /// Builds the notifier and its SMTP transport
    ///
    /// # Errors
    ///
    /// Returns `EmailError::SendError` if the relay configuration is invalid
    pub fn new(config: &SmtpConfig) -> Result<Self, EmailError> {
        let creds = Credentials::new(config.username.clone(), config.password.clone());

        let mailer = SmtpTransport::starttls_relay(&config.host)
            .map_err(|e| EmailError::SendError(e.to_string()))?
            .credentials(creds)
            .port(config.port)
            .timeout(Some(Duration::from_secs(10)))
            .build();

        info!(host = %config.host, port = config.port, "Email notifier initialized");

        Ok(Self {
            mailer,
            from: config.from.clone(),
            frontend_url: config.frontend_url.clone(),
        })
    }

    async fn send(
        &self,
        to_email: &str,
        subject: &str,
        plain_body: String,
        html_body: String,
    ) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|e: lettre::address::AddressError| {
                        EmailError::InvalidAddress(e.to_string())
                    })?,
            )
            .to(to_email
                .parse()
                .map_err(|e: lettre::address::AddressError| {
                    EmailError::InvalidAddress(e.to_string())
                })?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(plain_body),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body),
                    ),
            )
            .map_err(|e| EmailError::BuildError(e.to_string()))?;

        // lettre's SmtpTransport is blocking; keep it off the async runtime
        let mailer = self.mailer.clone();
        let result = tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| EmailError::SendError(e.to_string()))?;

        match result {
            Ok(_) => {
                info!(to = %to_email, subject = %subject, "Email sent");
                Ok(())
            }
            Err(e) => {
                error!(to = %to_email, error = %e, "Failed to send email");
                Err(EmailError::SendError(e.to_string()))
            }
        }
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send_verification_email(&self, email: &str, token: &str) -> Result<(), EmailError> {
        let url = format!(
            "{}/auth/verify?email={}&token={}",
            self.frontend_url, email, token
        );

        let html = format!(
            "<h1>Welcome to TaskDeck!</h1>\
             <p>Please click the link below to verify your email address:</p>\
             <a href=\"{url}\">Verify Email</a>\
             <p>This link will expire in 10 minutes.</p>"
        );
        let plain = format!(
            "Welcome to TaskDeck!\n\nVerify your email address: {url}\n\nThis link will expire in 10 minutes."
        );

        self.send(email, "Verify your email", plain, html).await
    }

    async fn send_password_reset_email(&self, email: &str, token: &str) -> Result<(), EmailError> {
        let url = format!("{}/auth/reset-password?token={}", self.frontend_url, token);

        let html = format!(
            "<h1>Reset Password</h1>\
             <p>You requested a password reset. Click the link below to choose a new password:</p>\
             <a href=\"{url}\">Reset Password</a>\
             <p>This link will expire in 10 minutes. If you did not request this, please ignore this email.</p>"
        );
        let plain = format!(
            "You requested a password reset: {url}\n\nThis link will expire in 10 minutes. If you did not request this, please ignore this email."
        );

        self.send(email, "Reset your password", plain, html).await
    }

    async fn send_welcome_email(&self, email: &str, name: &str) -> Result<(), EmailError> {
        let login_url = format!("{}/auth/login", self.frontend_url);

        let html = format!(
            "<h1>Welcome, {name}!</h1>\
             <p>Your account is now active. You can log in and start managing your tasks.</p>\
             <a href=\"{login_url}\">Log in to TaskDeck</a>"
        );
        let plain =
            format!("Welcome, {name}!\n\nYour account is now active. Log in at {login_url}");

        self.send(email, "Welcome to TaskDeck!", plain, html).await
    }

    async fn send_organization_deleted_email(
        &self,
        email: &str,
        org_name: &str,
    ) -> Result<(), EmailError> {
        let html = format!(
            "<h1>Organization Deleted</h1>\
             <p>The organization \"<strong>{org_name}</strong>\" you were part of has been deleted by an administrator.</p>\
             <p>You have been removed from the organization. You can now create a new organization or join another one.</p>"
        );
        let plain = format!(
            "The organization \"{org_name}\" you were part of has been deleted by an administrator.\n\nYou have been removed from the organization."
        );

        self.send(email, "Organization Deleted", plain, html).await
    }

    async fn send_account_invite_email(
        &self,
        email: &str,
        reset_token: &str,
        org_name: &str,
        role: &str,
    ) -> Result<(), EmailError> {
        let url = format!(
            "{}/auth/reset-password?token={}",
            self.frontend_url, reset_token
        );

        let html = format!(
            "<h1>You've been invited to {org_name}</h1>\
             <p>An administrator added you to \"{org_name}\" as {role}.</p>\
             <p>Set your password to activate your account:</p>\
             <a href=\"{url}\">Set Password</a>\
             <p>This link will expire in 10 minutes.</p>"
        );
        let plain = format!(
            "You've been invited to {org_name} as {role}.\n\nSet your password at {url} (expires in 10 minutes)."
        );

        self.send(email, &format!("You've been invited to {org_name}"), plain, html)
            .await
    }
}

/// Runs an email send as a detached, best-effort operation
///
/// The initiating request does not await the result; a failure is logged and
/// never re-enters the caller's control flow.
pub fn spawn_detached<F>(context: &'static str, fut: F)
where
    F: Future<Output = Result<(), EmailError>> + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = fut.await {
            error!(context = context, error = %e, "Detached email send failed");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Records sends instead of talking SMTP
    struct RecordingNotifier {
        sent: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send_verification_email(&self, email: &str, _: &str) -> Result<(), EmailError> {
            if self.fail {
                return Err(EmailError::SendError("smtp down".into()));
            }
            self.sent.lock().unwrap().push(format!("verify:{email}"));
            Ok(())
        }

        async fn send_password_reset_email(&self, email: &str, _: &str) -> Result<(), EmailError> {
            self.sent.lock().unwrap().push(format!("reset:{email}"));
            Ok(())
        }

        async fn send_welcome_email(&self, email: &str, _: &str) -> Result<(), EmailError> {
            self.sent.lock().unwrap().push(format!("welcome:{email}"));
            Ok(())
        }

        async fn send_organization_deleted_email(
            &self,
            email: &str,
            _: &str,
        ) -> Result<(), EmailError> {
            self.sent.lock().unwrap().push(format!("org-deleted:{email}"));
            Ok(())
        }

        async fn send_account_invite_email(
            &self,
            email: &str,
            _: &str,
            _: &str,
            _: &str,
        ) -> Result<(), EmailError> {
            self.sent.lock().unwrap().push(format!("invite:{email}"));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_spawn_detached_swallows_failures() {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let notifier = Arc::new(RecordingNotifier {
            sent: sent.clone(),
            fail: true,
        });

        let n = notifier.clone();
        spawn_detached("test", async move {
            n.send_verification_email("a@x.com", "tok").await
        });

        // Give the detached task a moment; the failure must not panic or
        // propagate anywhere.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_spawn_detached_delivers() {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let notifier = Arc::new(RecordingNotifier {
            sent: sent.clone(),
            fail: false,
        });

        let n = notifier.clone();
        spawn_detached("test", async move {
            n.send_welcome_email("a@x.com", "Alice").await
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(sent.lock().unwrap().as_slice(), &["welcome:a@x.com"]);
    }
}
