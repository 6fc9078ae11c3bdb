//! Dispatch coordination shell — validate, quota, adapt, route, record.
//!
//! Consumes one fanned-out notification per call. Rate-limit denial is an
//! expected outcome, not an error; channel failures are recorded in the
//! delivery log and handled locally so the host's retry machinery doesn't
//! double-send.

use chrono::Utc;
use tracing::Instrument;

use chime_channels::SenderRegistry;
use chime_core::error::Result;
use chime_core::types::{NotificationRequest, NotificationType};
use chime_store::{DeliveryLogEntry, DeliveryLogStore, DeliveryResult};

use crate::content::ContentClient;
use crate::rate_limit::RateLimiter;

pub struct Processor {
    limiter: RateLimiter,
    logs: DeliveryLogStore,
    senders: SenderRegistry,
    content: ContentClient,
}

/// What a process call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Dispatched and the channel accepted it.
    Sent,
    /// Dispatched but the channel failed; recorded as a failure.
    Failed,
    /// Quota denied; nothing dispatched.
    RateLimited,
    /// Nothing to dispatch (cancel request reached the processor).
    Skipped,
}

impl Processor {
    pub fn new(
        limiter: RateLimiter,
        logs: DeliveryLogStore,
        senders: SenderRegistry,
        content: ContentClient,
    ) -> Self {
        Self {
            limiter,
            logs,
            senders,
            content,
        }
    }

    /// Re-validate, rate-limit, adapt, dispatch, and record one request.
    pub async fn process(
        &self,
        correlation_id: &str,
        request: &NotificationRequest,
    ) -> Result<ProcessOutcome> {
        let span = tracing::info_span!("process", correlation = %correlation_id);
        self.process_inner(request).instrument(span).await
    }

    async fn process_inner(&self, request: &NotificationRequest) -> Result<ProcessOutcome> {
        // Re-validate: a persisted request may have outlived the contract it
        // was written under.
        request.validate()?;

        if request.notification_type == NotificationType::None {
            tracing::warn!("cancel request reached the processor, nothing to dispatch");
            return Ok(ProcessOutcome::Skipped);
        }

        let user_id = request.user_id().to_owned();
        let now = Utc::now();
        if !self.limiter.try_consume(&user_id, now)? {
            tracing::info!("skipping dispatch for user {user_id}: rate limit reached");
            return Ok(ProcessOutcome::RateLimited);
        }

        // Quota is consumed and persisted; side effects may begin.
        let mut request = request.clone();
        if let Some(url) = request.message.content_callback_url.clone() {
            match self.content.fetch_content(&url).await {
                Ok(body) => {
                    tracing::debug!("content callback replaced the message body");
                    request.message.body = body;
                }
                Err(e) => {
                    tracing::warn!("content callback failed, keeping original body: {e}");
                }
            }
        }

        let result = match self.senders.send(&request).await {
            Ok(()) => DeliveryResult::Success,
            Err(e) => {
                tracing::error!(
                    "delivery of '{}' via channel {} failed: {e}",
                    request.uid(),
                    request.notification_type
                );
                DeliveryResult::Failure
            }
        };

        self.logs.append(
            &user_id,
            DeliveryLogEntry {
                message_id: request.unique_properties.message_id.clone(),
                message: request.message.clone(),
                send_time_utc: request.send_time_utc.clone(),
                actual_send_time_utc: now,
                notification_type: request.notification_type,
                result,
            },
        )?;

        Ok(match result {
            DeliveryResult::Success => ProcessOutcome::Sent,
            DeliveryResult::Failure => ProcessOutcome::Failed,
        })
    }
}
