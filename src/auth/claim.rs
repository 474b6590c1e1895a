//! Identity claims carried by trusted proxy headers.

use http::{HeaderMap, HeaderName};

use crate::auth::resolver::IdentifyError;
use crate::config::SsoConfig;
use crate::types::{AccountId, AccountName, EmailAddress};

/// Identity asserted by the upstream gateway for a single request.
///
/// All values are lower-cased on extraction. Nothing here is verified: the
/// headers are trusted as sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityClaim {
    pub subject_id: AccountId,
    pub username: AccountName,
    pub email: EmailAddress,
}

impl IdentityClaim {
    /// Extract the claim from request headers.
    ///
    /// Returns `Ok(None)` when the subject id header is absent. Once it is
    /// present, the username and email headers are required.
    pub fn from_headers(
        headers: &HeaderMap,
        config: &SsoConfig,
    ) -> Result<Option<Self>, IdentifyError> {
        if !headers.contains_key(&config.header_parameter) {
            return Ok(None);
        }

        let subject_id = required(headers, &config.header_parameter)?;
        let username = required(headers, &config.header_username)?;
        let email = required(headers, &config.header_email)?;

        Ok(Some(Self {
            subject_id: AccountId::new(subject_id),
            username: AccountName::new(username),
            email: EmailAddress::new(email),
        }))
    }
}

fn required(headers: &HeaderMap, name: &HeaderName) -> Result<String, IdentifyError> {
    let value = headers
        .get(name)
        .ok_or_else(|| IdentifyError::MissingHeader(name.to_string()))?;

    let value = value
        .to_str()
        .map_err(|_| IdentifyError::InvalidHeader(name.to_string()))?
        .trim();

    if value.is_empty() {
        return Err(IdentifyError::InvalidHeader(name.to_string()));
    }

    Ok(value.to_lowercase())
}
