use heapless::String;

use crate::config::{
    CREDENTIAL_MAX, DEFAULT_MESSAGING_PORT, HOST_MAX, PASSPHRASE_MAX, SSID_MAX, TOPIC_MAX,
    WILL_MESSAGE_MAX,
};
use crate::error::{ConfigError, Field};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum QoS {
    AtMostOnce,
    #[default]
    AtLeastOnce,
    ExactlyOnce,
}

impl QoS {
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::AtMostOnce => 0,
            Self::AtLeastOnce => 1,
            Self::ExactlyOnce => 2,
        }
    }

    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::AtMostOnce),
            1 => Some(Self::AtLeastOnce),
            2 => Some(Self::ExactlyOnce),
            _ => None,
        }
    }
}

/// Message the broker publishes on our behalf after an unclean disconnect.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LastWill {
    topic: String<TOPIC_MAX>,
    message: String<WILL_MESSAGE_MAX>,
    qos: QoS,
    retain: bool,
}

impl LastWill {
    pub fn new(topic: &str, message: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            topic: bounded(topic, Field::WillTopic)?,
            message: bounded_or_empty(message, Field::WillMessage)?,
            qos: QoS::AtMostOnce,
            retain: false,
        })
    }

    pub fn with_qos(mut self, qos: QoS) -> Self {
        self.qos = qos;
        self
    }

    pub fn with_retain(mut self, retain: bool) -> Self {
        self.retain = retain;
        self
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn qos(&self) -> QoS {
        self.qos
    }

    pub fn retain(&self) -> bool {
        self.retain
    }
}

/// One set of link credentials plus the messaging endpoint reachable through it.
///
/// Length limits are enforced by the setters, so a profile never holds an
/// over-long value. Whether the required fields are present is checked by
/// [`NetworkProfile::validate`], which the manager runs on every poll.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NetworkProfile {
    ssid: Option<String<SSID_MAX>>,
    passphrase: String<PASSPHRASE_MAX>,
    messaging_host: Option<String<HOST_MAX>>,
    messaging_port: u16,
    messaging_user: Option<String<CREDENTIAL_MAX>>,
    messaging_password: Option<String<CREDENTIAL_MAX>>,
    will: Option<LastWill>,
}

impl Default for NetworkProfile {
    fn default() -> Self {
        Self {
            ssid: None,
            passphrase: String::new(),
            messaging_host: None,
            messaging_port: DEFAULT_MESSAGING_PORT,
            messaging_user: None,
            messaging_password: None,
            will: None,
        }
    }
}

impl NetworkProfile {
    /// Link-only profile. An empty passphrase selects an open network.
    pub fn new(ssid: &str, passphrase: &str) -> Result<Self, ConfigError> {
        let mut profile = Self::default();
        profile.set_ssid(ssid)?;
        profile.set_passphrase(passphrase)?;
        Ok(profile)
    }

    pub fn with_messaging(mut self, host: &str, port: u16) -> Result<Self, ConfigError> {
        self.set_messaging_host(host, port)?;
        Ok(self)
    }

    pub fn with_credentials(mut self, user: &str, password: &str) -> Result<Self, ConfigError> {
        self.set_messaging_credentials(user, password)?;
        Ok(self)
    }

    pub fn with_will(mut self, will: LastWill) -> Self {
        self.will = Some(will);
        self
    }

    pub fn set_ssid(&mut self, ssid: &str) -> Result<(), ConfigError> {
        self.ssid = Some(bounded(ssid, Field::Ssid)?);
        Ok(())
    }

    pub fn set_passphrase(&mut self, passphrase: &str) -> Result<(), ConfigError> {
        self.passphrase = bounded_or_empty(passphrase, Field::Passphrase)?;
        Ok(())
    }

    pub fn set_messaging_host(&mut self, host: &str, port: u16) -> Result<(), ConfigError> {
        if port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        self.messaging_host = Some(bounded(host, Field::MessagingHost)?);
        self.messaging_port = port;
        Ok(())
    }

    pub fn clear_messaging(&mut self) {
        self.messaging_host = None;
        self.messaging_user = None;
        self.messaging_password = None;
    }

    pub fn set_messaging_credentials(
        &mut self,
        user: &str,
        password: &str,
    ) -> Result<(), ConfigError> {
        let user = bounded(user, Field::MessagingUser)?;
        let password = bounded_or_empty(password, Field::MessagingPassword)?;
        self.messaging_user = Some(user);
        self.messaging_password = Some(password);
        Ok(())
    }

    pub fn set_will(&mut self, will: LastWill) {
        self.will = Some(will);
    }

    pub fn clear_will(&mut self) {
        self.will = None;
    }

    pub fn ssid(&self) -> Option<&str> {
        self.ssid.as_deref()
    }

    pub fn passphrase(&self) -> &str {
        &self.passphrase
    }

    pub fn messaging_host(&self) -> Option<&str> {
        self.messaging_host.as_deref()
    }

    pub fn messaging_port(&self) -> u16 {
        self.messaging_port
    }

    pub fn messaging_user(&self) -> Option<&str> {
        self.messaging_user.as_deref()
    }

    pub fn messaging_password(&self) -> Option<&str> {
        self.messaging_password.as_deref()
    }

    pub fn will(&self) -> Option<&LastWill> {
        self.will.as_ref()
    }

    /// A profile without a messaging endpoint only brings the link up.
    pub fn messaging_configured(&self) -> bool {
        self.messaging_host.is_some()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.ssid.as_deref() {
            None => return Err(ConfigError::Missing(Field::Ssid)),
            Some("") => return Err(ConfigError::Empty(Field::Ssid)),
            Some(_) => {}
        }
        if self.messaging_host.is_some() && self.messaging_port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        Ok(())
    }
}

pub(crate) fn bounded<const N: usize>(value: &str, field: Field) -> Result<String<N>, ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Empty(field));
    }
    bounded_or_empty(value, field)
}

pub(crate) fn bounded_or_empty<const N: usize>(
    value: &str,
    field: Field,
) -> Result<String<N>, ConfigError> {
    let mut out = String::new();
    out.push_str(value)
        .map_err(|_| ConfigError::TooLong(field))?;
    Ok(out)
}
