//! Feature-request escalation email

use std::sync::Arc;

use snipr_email::{EmailService, FeatureRequestNotice};

/// Emails support when the assistant reports a missing feature
#[derive(Clone)]
pub struct FeatureRequestNotifier {
    email: Arc<dyn EmailService>,
    from: Option<String>,
    to: Option<String>,
}

impl FeatureRequestNotifier {
    pub fn new(email: Arc<dyn EmailService>, from: Option<String>, to: Option<String>) -> Self {
        Self { email, from, to }
    }

    /// Send the notice; returns whether an email went out.
    ///
    /// Missing sender/recipient addresses skip the send; failures are logged.
    pub async fn notify(&self, notice: &FeatureRequestNotice) -> bool {
        let (Some(from), Some(to)) = (self.from.as_deref(), self.to.as_deref()) else {
            tracing::warn!(
                conversation_id = %notice.conversation_id,
                "Feature request notifier not configured (SUPPORT_NOTIFY_EMAIL_TO/FROM missing), skipping email"
            );
            return false;
        };

        match self.email.send_feature_request(from, to, notice).await {
            Ok(receipt) => {
                tracing::info!(
                    conversation_id = %notice.conversation_id,
                    message_id = %receipt.message_id,
                    provider = self.email.service_name(),
                    "Feature request email sent"
                );
                true
            }
            Err(e) => {
                tracing::error!(
                    conversation_id = %notice.conversation_id,
                    error = %e,
                    "Failed to send feature request email"
                );
                false
            }
        }
    }

    /// Fire-and-forget variant of [`notify`](Self::notify)
    pub fn notify_in_background(&self, notice: FeatureRequestNotice) -> tokio::task::JoinHandle<bool> {
        let notifier = self.clone();
        tokio::spawn(async move { notifier.notify(&notice).await })
    }
}
