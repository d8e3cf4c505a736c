use super::receivers::recv_ticket_cred;
use crate::communication::{KdcLocator, KrbChannel, TransportProtocol};
use crate::core::forge::build_kdc_req;
use crate::core::request::{KdcRequest, RequestStamp};
use crate::core::sequence::SequenceGenerator;
use crate::core::TicketCred;
use crate::error::{Error, Result};
use log::{debug, info, warn};

/// Attempts to deliver a request before giving up
pub const DEFAULT_MAX_ATTEMPTS: usize = 3;

#[derive(Debug, Clone)]
pub struct ExchangeConfig {
    pub max_attempts: usize,
    pub initial_protocol: TransportProtocol,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        return Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_protocol: TransportProtocol::UDP,
        };
    }
}

/// Message already sent, kept to be resent as it is
struct SentMessage {
    stamp: RequestStamp,
    raw: Vec<u8>,
}

/// State carried from one attempt to the next. The sent message is kept
/// while it is being resent, and the channel while it is usable.
struct AttemptState {
    protocol: TransportProtocol,
    channel: Option<Box<dyn KrbChannel>>,
    pending: Option<SentMessage>,
}

impl AttemptState {
    fn new(protocol: TransportProtocol) -> Self {
        return Self {
            protocol,
            channel: None,
            pending: None,
        };
    }

    /// The message does not fit in UDP, so the request starts again over
    /// TCP with a new stamp. The UDP channel is closed.
    fn escalate_transport(channel: Box<dyn KrbChannel>) -> Self {
        drop(channel);
        return Self::new(TransportProtocol::TCP);
    }

    fn resend(
        protocol: TransportProtocol,
        channel: Box<dyn KrbChannel>,
        message: SentMessage,
    ) -> Self {
        return Self {
            protocol,
            channel: Some(channel),
            pending: Some(message),
        };
    }
}

/// Result of one attempt
enum Step {
    Done(TicketCred),
    Retry(AttemptState, Error),
    Abort(Error),
}

/// Delivers requests to the KDC of the service realm, resending them over
/// UDP when the response is lost, and switching to TCP when the messages
/// are too big for UDP.
pub struct KdcExchange<'a> {
    locator: &'a dyn KdcLocator,
    sequence: &'a SequenceGenerator,
    config: ExchangeConfig,
}

impl<'a> KdcExchange<'a> {
    pub fn new(
        locator: &'a dyn KdcLocator,
        sequence: &'a SequenceGenerator,
    ) -> Self {
        return Self {
            locator,
            sequence,
            config: ExchangeConfig::default(),
        };
    }

    pub fn with_initial_protocol(mut self, protocol: TransportProtocol) -> Self {
        self.config.initial_protocol = protocol;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.config.max_attempts = max_attempts;
        self
    }

    /// Sends the request and returns the ticket of the response. The error
    /// returned is the one of the last attempt.
    pub fn request(&self, request: &KdcRequest) -> Result<TicketCred> {
        let mut state = AttemptState::new(self.config.initial_protocol);
        let mut last_error = None;

        for attempt in 1..=self.config.max_attempts {
            debug!(
                "Attempt {} of {} to reach KDC of {} over {}",
                attempt,
                self.config.max_attempts,
                request.service_realm,
                state.protocol
            );

            match self.attempt(request, state) {
                Step::Done(ticket_cred) => {
                    check_granted_options(request, &ticket_cred);
                    return Ok(ticket_cred);
                }
                Step::Retry(next_state, error) => {
                    debug!("Attempt {} failed: {}", attempt, error);
                    state = next_state;
                    last_error = Some(error);
                }
                Step::Abort(error) => {
                    last_error = Some(error);
                    break;
                }
            }
        }

        return Err(last_error.unwrap_or_else(|| {
            Error::String(format!("No attempts to reach the KDC were made"))
        }));
    }

    fn attempt(&self, request: &KdcRequest, state: AttemptState) -> Step {
        let AttemptState {
            protocol,
            channel,
            pending,
        } = state;

        let mut channel = match channel {
            Some(channel) => channel,
            None => match self.locator.locate(&request.service_realm, protocol)
            {
                Ok(channel) => {
                    debug!("Connected to {} over {}", channel.peer(), protocol);
                    channel
                }
                Err(error) => return Step::Abort(error),
            },
        };

        let message = match pending {
            Some(message) => {
                debug!("Resending request with nonce {}", message.stamp.nonce);
                message
            }
            None => {
                let stamp = RequestStamp::generate(self.sequence);
                match build_kdc_req(request, &stamp) {
                    Ok(raw) => SentMessage { stamp, raw },
                    Err(error) => return Step::Abort(error),
                }
            }
        };

        if let Err(error) = channel.send(&message.raw) {
            if let Error::SizeExceeded { .. } = error {
                if protocol == TransportProtocol::UDP {
                    info!("Request too big for UDP, switching to TCP");
                    let state = AttemptState::escalate_transport(channel);
                    return Step::Retry(state, error);
                }
            }
            return Step::Abort(error);
        }

        match recv_ticket_cred(&mut *channel, request, &message.stamp) {
            Ok(ticket_cred) => return Step::Done(ticket_cred),
            Err(error) => {
                if protocol != TransportProtocol::UDP {
                    return Step::Abort(error);
                }

                if error.is_response_too_big() {
                    info!("Response too big for UDP, switching to TCP");
                    let state = AttemptState::escalate_transport(channel);
                    return Step::Retry(state, error);
                }

                if let Error::Timeout(_) = error {
                    let state =
                        AttemptState::resend(protocol, channel, message);
                    return Step::Retry(state, error);
                }

                return Step::Abort(error);
            }
        }
    }
}

fn check_granted_options(request: &KdcRequest, ticket_cred: &TicketCred) {
    let refused = ticket_cred.refused_options(request.kdc_options);
    if refused != 0 {
        warn!(
            "KDC did not grant the options {:#010x} for {}",
            refused,
            ticket_cred.principal()
        );
    }
}
