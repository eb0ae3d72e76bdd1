//! AWS SES adapter
//!
//! Support notifications are plain text, so only the text body is sent.
//! Setting `AWS_ENDPOINT_URL` points the client at LocalStack with static
//! test credentials.

use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::Credentials;
use aws_sdk_ses::config::SharedCredentialsProvider;
use aws_sdk_ses::error::DisplayErrorContext;
use aws_sdk_ses::types::{Body, Content, Destination, Message};
use aws_sdk_ses::Client as SesClient;
use chrono::Utc;

use crate::{EmailConfig, EmailError, EmailMessage, EmailReceipt, EmailService};

const DEFAULT_REGION: &str = "us-east-1";
const PROVIDER: &str = "aws-ses";

async fn load_sdk_config(config: &EmailConfig) -> SdkConfig {
    let region = Region::new(
        config
            .aws_region
            .clone()
            .unwrap_or_else(|| DEFAULT_REGION.to_string()),
    );
    let loader = aws_config::defaults(BehaviorVersion::latest()).region(region);

    match config.aws_endpoint_url.as_deref() {
        Some(endpoint) => {
            tracing::info!(endpoint = %endpoint, "Using SES endpoint override");
            let credentials = Credentials::new("test", "test", None, None, "snipr-localstack");
            loader
                .endpoint_url(endpoint)
                .credentials_provider(SharedCredentialsProvider::new(credentials))
                .load()
                .await
        }
        None => loader.load().await,
    }
}

/// Loose sanity check; SES does the real validation
fn check_address(field: &str, address: &str) -> Result<(), EmailError> {
    match address.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(EmailError::Validation(format!(
            "Invalid {} address: {:?}",
            field, address
        ))),
    }
}

fn utf8(field: &str, data: &str) -> Result<Content, EmailError> {
    Content::builder()
        .data(data)
        .charset("UTF-8")
        .build()
        .map_err(|e| EmailError::AwsSes(format!("Failed to build {}: {}", field, e)))
}

fn build_message(message: &EmailMessage) -> Result<Message, EmailError> {
    Ok(Message::builder()
        .subject(utf8("subject", &message.subject)?)
        .body(Body::builder().text(utf8("body", &message.body_text)?).build())
        .build())
}

pub struct SesEmailService {
    client: SesClient,
}

impl SesEmailService {
    pub async fn new(config: EmailConfig) -> Result<Self, EmailError> {
        let sdk_config = load_sdk_config(&config).await;
        tracing::info!(region = ?sdk_config.region(), "SES client ready");

        Ok(Self {
            client: SesClient::new(&sdk_config),
        })
    }
}

#[async_trait::async_trait]
impl EmailService for SesEmailService {
    async fn send_email(&self, message: EmailMessage) -> Result<EmailReceipt, EmailError> {
        check_address("recipient", &message.to)?;
        check_address("sender", &message.from)?;

        let output = self
            .client
            .send_email()
            .source(&message.from)
            .destination(Destination::builder().to_addresses(&message.to).build())
            .message(build_message(&message)?)
            .set_reply_to_addresses(message.reply_to.clone().map(|r| vec![r]))
            .send()
            .await
            .map_err(|e| EmailError::AwsSes(DisplayErrorContext(&e).to_string()))?;

        let message_id = output.message_id().to_string();
        tracing::info!(to = %message.to, message_id = %message_id, "Email sent via SES");

        Ok(EmailReceipt {
            message_id,
            sent_at: Utc::now(),
            provider: PROVIDER.to_string(),
            metadata: message.metadata,
        })
    }

    fn service_name(&self) -> &'static str {
        PROVIDER
    }
}
