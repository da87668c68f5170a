//! Outbound email over SMTP.
//!
//! Invitation notices and the test email are sent through a [`Mailer`], so
//! the services can run without SMTP configured.

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart, SinglePart, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::str::FromStr;
use validator::Validate;

use crate::auth::models::Caller;
use crate::config::EmailConfig;
use crate::database::models::TestEmailRequest;
use crate::errors::{MISSING_CREDENTIALS, ServiceError, ServiceResult};
use crate::services::context::AppContext;
use crate::utils::escape_html;

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_email(
        &self,
        to_email: &str,
        subject: &str,
        html_content: &str,
        text_content: &str,
    ) -> ServiceResult<()>;

    /// Link shown in notices, e.g. the teams page of the web app.
    fn teams_url(&self) -> String;
}

pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    config: EmailConfig,
}

impl EmailService {
    /// Creates a new EmailService instance
    pub fn new(config: EmailConfig) -> ServiceResult<Self> {
        let creds = Credentials::new(config.smtp_username.clone(), config.smtp_password.clone());

        // Port 465 is implicit TLS; anything else upgrades with STARTTLS.
        let relay = if config.smtp_port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
        };
        let builder =
            relay.map_err(|e| ServiceError::validation(format!("Invalid SMTP host: {e}")))?;

        let mailer = builder.port(config.smtp_port).credentials(creds).build();

        Ok(Self { mailer, config })
    }
}

#[async_trait]
impl Mailer for EmailService {
    async fn send_email(
        &self,
        to_email: &str,
        subject: &str,
        html_content: &str,
        text_content: &str,
    ) -> ServiceResult<()> {
        let from_mailbox = Mailbox::from_str(&format!(
            "{} <{}>",
            self.config.from_name, self.config.from_email
        ))
        .map_err(|e| ServiceError::validation(format!("Invalid from email: {e}")))?;

        let to_mailbox = Mailbox::from_str(to_email)
            .map_err(|e| ServiceError::validation(format!("Invalid recipient email: {e}")))?;

        let email = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_content.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_content.to_string()),
                    ),
            )
            .map_err(|e| ServiceError::validation(format!("Failed to build email: {e}")))?;

        self.mailer
            .send(email)
            .await
            .map_err(|e| ServiceError::external_service(format!("Failed to send email: {e}")))?;

        Ok(())
    }

    fn teams_url(&self) -> String {
        format!("{}/teams", self.config.base_url.trim_end_matches('/'))
    }
}

/// Rendered invitation notice.
pub struct InviteEmail {
    pub subject: String,
    pub html: String,
    pub text: String,
}

impl InviteEmail {
    pub fn new(team_name: &str, inviter: &str, teams_url: &str) -> Self {
        Self {
            subject: format!("You've been invited to join {team_name} on CollabMate"),
            html: build_invite_html(team_name, inviter, teams_url),
            text: build_invite_text(team_name, inviter, teams_url),
        }
    }
}

fn build_invite_html(team_name: &str, inviter: &str, teams_url: &str) -> String {
    let team_name = escape_html(team_name);
    let inviter = escape_html(inviter);
    let teams_url = escape_html(teams_url);
    format!(
        r#"
            <!DOCTYPE html>
            <html>
            <head>
                <meta charset="UTF-8">
                <title>Invitation to join {team_name}</title>
            </head>
            <body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
                <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
                    <h2 style="color: #2c3e50;">You've been invited!</h2>

                    <p>Hi there,</p>

                    <p><strong>{inviter}</strong> has invited you to join the team <strong>{team_name}</strong> on CollabMate.</p>

                    <p>Sign in and open your teams page to accept or decline:</p>

                    <div style="text-align: center; margin: 30px 0;">
                        <a href="{teams_url}"
                           style="background-color: #3498db; color: white; padding: 12px 30px;
                                  text-decoration: none; border-radius: 5px; display: inline-block;">
                            View Invitation
                        </a>
                    </div>

                    <p>Or copy and paste this link into your browser:</p>
                    <p style="word-break: break-all; color: #7f8c8d;">{teams_url}</p>

                    <hr style="border: none; border-top: 1px solid #ecf0f1; margin: 30px 0;">

                    <p style="font-size: 12px; color: #7f8c8d;">
                        If you didn't expect this invitation, you can safely ignore this email.
                    </p>
                </div>
            </body>
            </html>
            "#
    )
}

fn build_invite_text(team_name: &str, inviter: &str, teams_url: &str) -> String {
    format!(
        r#"You've been invited!

Hi there,

{inviter} has invited you to join the team {team_name} on CollabMate.

Sign in and open your teams page to accept or decline:
{teams_url}

If you didn't expect this invitation, you can safely ignore this email.
"#
    )
}

/// Sends a fixed message so operators can check SMTP settings.
pub async fn send_test_email(
    ctx: &AppContext,
    request: TestEmailRequest,
    caller: Option<Caller>,
) -> ServiceResult<()> {
    request
        .validate()
        .map_err(|e| ServiceError::from_validation_errors(&e))?;
    let to_email = request
        .to_email
        .ok_or_else(|| ServiceError::validation("A recipient email address is required"))?;

    let caller = caller.ok_or_else(|| ServiceError::authentication(MISSING_CREDENTIALS))?;

    let mailer = ctx
        .mailer
        .as_ref()
        .ok_or_else(|| ServiceError::external_service("Email service is not configured"))?;

    mailer
        .send_email(
            &to_email,
            "CollabMate test email",
            "<p>This is a test email from <strong>CollabMate</strong>. Your email settings work.</p>",
            "This is a test email from CollabMate. Your email settings work.",
        )
        .await?;

    tracing::info!("Test email sent to {} by user {}", to_email, caller.user_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{TestApp, caller};

    #[test]
    fn test_invite_email_mentions_team_and_inviter() {
        let email = InviteEmail::new("Rustaceans", "ann@x.com", "https://app.example/teams");
        assert!(email.subject.contains("Rustaceans"));
        assert!(email.html.contains("<strong>ann@x.com</strong>"));
        assert!(email.text.contains("https://app.example/teams"));
    }

    #[test]
    fn test_invite_html_escapes_user_supplied_names() {
        let email = InviteEmail::new(
            "<script>alert(1)</script>",
            "Tom & Jerry <tj@x.com>",
            "https://app.example/teams",
        );
        assert!(!email.html.contains("<script>"));
        assert!(email.html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(email.html.contains("<strong>Tom &amp; Jerry &lt;tj@x.com&gt;</strong>"));
        assert!(email.text.contains("<script>alert(1)</script>"));
    }

    #[tokio::test]
    async fn test_send_test_email_validates_before_auth() {
        let app = TestApp::new();
        let err = send_test_email(
            &app.ctx,
            TestEmailRequest {
                to_email: Some("nope".to_string()),
            },
            None,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Validation { .. }));

        let err = send_test_email(
            &app.ctx,
            TestEmailRequest {
                to_email: Some("dev@x.com".to_string()),
            },
            None,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Authentication { .. }));
    }

    #[tokio::test]
    async fn test_send_test_email_records_message() {
        let app = TestApp::new();
        send_test_email(
            &app.ctx,
            TestEmailRequest {
                to_email: Some("dev@x.com".to_string()),
            },
            Some(caller("user-1", None)),
        )
        .await
        .unwrap();

        let sent = app.mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "dev@x.com");
    }

    #[tokio::test]
    async fn test_send_test_email_without_mailer() {
        let mut app = TestApp::new();
        app.ctx.mailer = None;
        let err = send_test_email(
            &app.ctx,
            TestEmailRequest {
                to_email: Some("dev@x.com".to_string()),
            },
            Some(caller("user-1", None)),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::ExternalService { .. }));
    }
}
