use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use crossbeam_channel::Receiver;
use log::{debug, info};

use crate::config::CheckerConfig;
use crate::descriptor::parse_descriptor;
use crate::error::{CheckError, NavigationError, RecordStoreError};
use crate::evaluate::evaluate;
use crate::navigate::{self, Navigator};
use crate::outcome::{Message, Outcome, Update};
use crate::properties::CurrentProperties;
use crate::records::{DisplayRecord, RecordStore};
use crate::transport::{DescriptorRequest, HttpMethod, ReqwestTransport, Transport};

/// Runs update checks for one application.
///
/// At most one check is in flight per checker (clones share the flag); a
/// check started while another is pending is rejected with
/// [`CheckError::InProgress`].
#[derive(Clone)]
pub struct UpdateChecker {
    config: CheckerConfig,
    properties: CurrentProperties,
    transport: Arc<dyn Transport>,
    records: Arc<dyn RecordStore>,
    in_flight: Arc<AtomicBool>,
}

struct InFlightGuard {
    flag: Arc<AtomicBool>,
}

impl InFlightGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self {
                flag: Arc::clone(flag),
            })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

impl UpdateChecker {
    pub fn new(
        config: CheckerConfig,
        properties: CurrentProperties,
        transport: Arc<dyn Transport>,
        records: Arc<dyn RecordStore>,
    ) -> Self {
        Self {
            config,
            properties,
            transport,
            records,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Checker backed by a `reqwest` client honouring the configured timeout.
    ///
    /// # Errors
    /// Returns an error when the HTTP client cannot be constructed.
    pub fn with_reqwest(
        config: CheckerConfig,
        properties: CurrentProperties,
        records: Arc<dyn RecordStore>,
    ) -> Result<Self, CheckError> {
        let transport = ReqwestTransport::with_timeout(config.request_timeout())?;
        Ok(Self::new(config, properties, Arc::new(transport), records))
    }

    #[must_use]
    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    #[must_use]
    pub fn properties(&self) -> &CurrentProperties {
        &self.properties
    }

    #[must_use]
    pub fn is_checking(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// The request a check would send.
    ///
    /// # Errors
    /// Returns an error when the properties cannot be encoded for POST.
    pub fn request(&self) -> Result<DescriptorRequest, CheckError> {
        let (method, body) = if self.config.post_properties {
            let body = self
                .properties
                .to_json()
                .map_err(|error| CheckError::encode_from(&error))?;
            (HttpMethod::Post, Some(body))
        } else {
            (HttpMethod::Get, None)
        };

        Ok(DescriptorRequest {
            url: self.config.endpoint.clone(),
            method,
            body,
            user_agent: self.config.user_agent.clone(),
        })
    }

    /// Runs one check on the current task and returns its outcome.
    pub async fn check(&self) -> Outcome {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            return Outcome::Failed(CheckError::InProgress);
        };
        self.run_check().await
    }

    /// Starts a check on `runtime` and returns the channel its single outcome
    /// arrives on. The receiving thread (typically the UI thread) decides where
    /// the outcome is handled.
    ///
    /// # Errors
    /// Returns [`CheckError::InProgress`] when a check is already pending.
    pub fn spawn_check(
        &self,
        runtime: &tokio::runtime::Handle,
    ) -> Result<Receiver<Outcome>, CheckError> {
        let guard = InFlightGuard::acquire(&self.in_flight).ok_or(CheckError::InProgress)?;
        let (sender, receiver) = crossbeam_channel::bounded(1);
        let checker = self.clone();

        runtime.spawn(async move {
            let outcome = checker.run_check().await;
            drop(guard);
            if sender.send(outcome).is_err() {
                debug!("Update check outcome dropped: receiver is gone");
            }
        });

        Ok(receiver)
    }

    async fn run_check(&self) -> Outcome {
        match self.try_check().await {
            Ok(outcome) => {
                info!("{outcome}");
                outcome
            }
            Err(error) => {
                debug!("Couldn't process version descriptor: {error}");
                Outcome::Failed(error)
            }
        }
    }

    async fn try_check(&self) -> Result<Outcome, CheckError> {
        let request = self.request()?;
        let body = self.transport.fetch(&request).await?;
        let descriptor = parse_descriptor(&body, &self.properties.app_package_name)?;
        evaluate(
            &descriptor,
            &self.properties,
            self.records.as_ref(),
            Utc::now(),
        )
    }

    /// Marks a message as shown so display-once messages are not surfaced
    /// again.
    ///
    /// # Errors
    /// Returns an error when the record cannot be persisted.
    pub fn record_message_displayed(&self, message: &Message) -> Result<(), RecordStoreError> {
        self.records
            .record(DisplayRecord::new(message.id.clone(), Utc::now()))
    }

    /// Marks an optional update as shown so later checks do not offer the
    /// same version again. Returns `false` for forced updates, which are
    /// never recorded.
    ///
    /// # Errors
    /// Returns an error when the record cannot be persisted.
    pub fn record_update_displayed(&self, update: &Update) -> Result<bool, RecordStoreError> {
        let Some(identifier) = update.record_identifier() else {
            return Ok(false);
        };
        self.records
            .record(DisplayRecord::new(identifier, Utc::now()))?;
        Ok(true)
    }

    /// # Errors
    /// Returns an error when the display records cannot be read.
    pub fn display_records(&self) -> Result<Vec<DisplayRecord>, RecordStoreError> {
        self.records.records()
    }

    /// See [`navigate::apply_update`].
    ///
    /// # Errors
    /// Returns an error when the update target cannot be opened.
    pub fn apply_update(
        &self,
        update: &Update,
        navigator: &dyn Navigator,
    ) -> Result<String, NavigationError> {
        navigate::apply_update(navigator, update, &self.config)
    }
}
