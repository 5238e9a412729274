//! Ordered, best-effort notification dispatch.
//!
//! A dispatch runs every [`DeliveryRoute`] independently. Within a route the
//! channels are tried in order until one succeeds. Failures are logged and
//! recorded in the report, never returned as errors.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{info, warn};

use super::{ChannelOutcome, DeliveryChannel, DeliveryStatus, DispatchReport, Notification};
use crate::onboarding::OnboardingRecord;

/// Channels tried in order until one delivers.
#[derive(Clone)]
pub struct DeliveryRoute {
    channels: Vec<Arc<dyn DeliveryChannel>>,
}

impl DeliveryRoute {
    pub fn new(channels: Vec<Arc<dyn DeliveryChannel>>) -> Self {
        Self { channels }
    }

    /// Route with a single channel and no fallback.
    pub fn single(channel: Arc<dyn DeliveryChannel>) -> Self {
        Self::new(vec![channel])
    }

    async fn run(&self, notification: &Notification) -> Vec<ChannelOutcome> {
        let mut outcomes = Vec::with_capacity(self.channels.len());
        let mut delivered = false;

        for channel in &self.channels {
            let kind = channel.kind();
            if delivered {
                outcomes.push(ChannelOutcome {
                    channel: kind,
                    status: DeliveryStatus::Skipped,
                });
                continue;
            }

            let status = match channel.deliver(notification).await {
                Ok(receipt) => {
                    info!(channel = %kind, reference = %receipt.reference, "Activation link delivered");
                    delivered = true;
                    DeliveryStatus::Delivered {
                        reference: receipt.reference,
                    }
                }
                Err(e) => {
                    warn!(channel = %kind, error = %e, "Activation link delivery failed");
                    DeliveryStatus::Failed {
                        reason: e.to_string(),
                    }
                }
            };
            outcomes.push(ChannelOutcome {
                channel: kind,
                status,
            });
        }

        outcomes
    }
}

/// Sends the activation link over every configured route.
#[derive(Clone, Default)]
pub struct NotificationDispatcher {
    routes: Vec<DeliveryRoute>,
}

impl NotificationDispatcher {
    pub fn new(routes: Vec<DeliveryRoute>) -> Self {
        Self { routes }
    }

    /// WhatsApp with SMS fallback, plus email on its own route.
    pub fn standard(
        whatsapp: Arc<dyn DeliveryChannel>,
        sms: Arc<dyn DeliveryChannel>,
        email: Arc<dyn DeliveryChannel>,
    ) -> Self {
        Self::new(vec![
            DeliveryRoute::new(vec![whatsapp, sms]),
            DeliveryRoute::single(email),
        ])
    }

    pub async fn notify(&self, record: &OnboardingRecord) -> DispatchReport {
        let report = self.dispatch(&Notification::for_record(record)).await;
        if !report.any_delivered() {
            warn!(token = %record.token, "No channel delivered the activation link");
        }
        report
    }

    pub async fn dispatch(&self, notification: &Notification) -> DispatchReport {
        let outcomes = join_all(self.routes.iter().map(|route| route.run(notification))).await;
        DispatchReport {
            outcomes: outcomes.into_iter().flatten().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::channels::{ChannelKind, Receipt};
    use crate::error::ChannelError;

    struct StubChannel {
        kind: ChannelKind,
        succeed: bool,
        calls: AtomicUsize,
    }

    impl StubChannel {
        fn new(kind: ChannelKind, succeed: bool) -> Arc<Self> {
            Arc::new(Self {
                kind,
                succeed,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl DeliveryChannel for StubChannel {
        fn kind(&self) -> ChannelKind {
            self.kind
        }

        async fn deliver(&self, notification: &Notification) -> Result<Receipt, ChannelError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.succeed {
                Ok(Receipt {
                    reference: format!("{}:{}", self.kind, notification.phone),
                })
            } else {
                Err(ChannelError::SendFailed {
                    name: self.kind.to_string(),
                    reason: "stub failure".into(),
                })
            }
        }
    }

    fn notification() -> Notification {
        Notification {
            owner_name: "Maria".into(),
            business_name: "Acme".into(),
            phone: "+5511999999999".into(),
            email: "maria@acme.com".into(),
            link: "http://localhost/connect?token=t".into(),
        }
    }

    #[tokio::test]
    async fn whatsapp_success_skips_sms() {
        let whatsapp = StubChannel::new(ChannelKind::WhatsApp, true);
        let sms = StubChannel::new(ChannelKind::Sms, true);
        let email = StubChannel::new(ChannelKind::Email, true);
        let dispatcher = NotificationDispatcher::standard(whatsapp.clone(), sms.clone(), email.clone());

        let report = dispatcher.dispatch(&notification()).await;

        assert_eq!(sms.calls(), 0);
        assert_eq!(email.calls(), 1);
        assert_eq!(report.status_of(ChannelKind::Sms), Some(&DeliveryStatus::Skipped));
        assert_eq!(
            report.delivered(),
            vec![ChannelKind::WhatsApp, ChannelKind::Email]
        );
    }

    #[tokio::test]
    async fn whatsapp_failure_falls_back_to_sms() {
        let whatsapp = StubChannel::new(ChannelKind::WhatsApp, false);
        let sms = StubChannel::new(ChannelKind::Sms, true);
        let email = StubChannel::new(ChannelKind::Email, true);
        let dispatcher = NotificationDispatcher::standard(whatsapp.clone(), sms.clone(), email);

        let report = dispatcher.dispatch(&notification()).await;

        assert_eq!(whatsapp.calls(), 1);
        assert_eq!(sms.calls(), 1);
        assert!(matches!(
            report.status_of(ChannelKind::WhatsApp),
            Some(DeliveryStatus::Failed { .. })
        ));
        assert_eq!(
            report.status_of(ChannelKind::Sms),
            Some(&DeliveryStatus::Delivered {
                reference: "sms:+5511999999999".into()
            })
        );
    }

    #[tokio::test]
    async fn email_runs_even_when_phone_route_fails() {
        let whatsapp = StubChannel::new(ChannelKind::WhatsApp, false);
        let sms = StubChannel::new(ChannelKind::Sms, false);
        let email = StubChannel::new(ChannelKind::Email, true);
        let dispatcher = NotificationDispatcher::standard(whatsapp, sms, email.clone());

        let report = dispatcher.dispatch(&notification()).await;

        assert_eq!(email.calls(), 1);
        assert_eq!(report.delivered(), vec![ChannelKind::Email]);
        assert_eq!(report.outcomes.len(), 3);
    }

    #[tokio::test]
    async fn all_failures_are_reported_not_raised() {
        let dispatcher = NotificationDispatcher::standard(
            StubChannel::new(ChannelKind::WhatsApp, false),
            StubChannel::new(ChannelKind::Sms, false),
            StubChannel::new(ChannelKind::Email, false),
        );

        let report = dispatcher.dispatch(&notification()).await;

        assert!(!report.any_delivered());
        assert!(report
            .outcomes
            .iter()
            .all(|o| matches!(o.status, DeliveryStatus::Failed { .. })));
    }

    #[tokio::test]
    async fn empty_dispatcher_reports_nothing() {
        let report = NotificationDispatcher::default()
            .dispatch(&notification())
            .await;
        assert!(report.outcomes.is_empty());
    }

    #[test]
    fn report_serializes_flat_status() {
        let report = DispatchReport {
            outcomes: vec![ChannelOutcome {
                channel: ChannelKind::WhatsApp,
                status: DeliveryStatus::Failed {
                    reason: "boom".into(),
                },
            }],
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["outcomes"][0]["channel"], "whatsapp");
        assert_eq!(json["outcomes"][0]["status"], "failed");
        assert_eq!(json["outcomes"][0]["reason"], "boom");
    }
}
