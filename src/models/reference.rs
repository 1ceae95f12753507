use std::fmt::Display;

use uuid::Uuid;

use super::{CatalogShow, ExternalId};

/// Prefix of the temporary ids handed out for shows that were never persisted
pub const EXTERNAL_TOKEN_PREFIX: &str = "trakt-";

/// Any way a caller can point at a show
///
/// Every variant is matched exactly once, in [`ShowReference::external_id`],
/// to get at the catalog identity.
#[derive(Debug, Clone, PartialEq)]
pub enum ShowReference {
    /// Canonical id string, expected to be a UUID
    CanonicalId(String),
    /// Temporary id of the form `trakt-<external id>`
    ExternalToken(String),
    /// External id, optionally with the full catalog record already in hand
    ExternalRef {
        external_id: ExternalId,
        full_record: Option<Box<CatalogShow>>,
    },
    /// Bare external id
    ExternalId(ExternalId),
}

impl ShowReference {
    /// Classifies a raw string coming from a caller
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();

        if Uuid::parse_str(raw).is_ok() {
            return ShowReference::CanonicalId(raw.to_string());
        }

        if let Ok(id) = raw.parse::<ExternalId>() {
            return ShowReference::ExternalId(id);
        }

        ShowReference::ExternalToken(raw.to_string())
    }

    /// The canonical id, if this reference is syntactically canonical-shaped
    pub fn canonical_id(&self) -> Option<Uuid> {
        match self {
            ShowReference::CanonicalId(raw) => Uuid::parse_str(raw).ok(),
            _ => None,
        }
    }

    /// Extracts the catalog identity the reference carries
    pub fn external_id(&self) -> Option<ExternalId> {
        match self {
            ShowReference::CanonicalId(_) => None,
            ShowReference::ExternalToken(token) => token
                .strip_prefix(EXTERNAL_TOKEN_PREFIX)
                .and_then(|id| id.parse().ok()),
            ShowReference::ExternalRef { external_id, .. } => Some(*external_id),
            ShowReference::ExternalId(id) => Some(*id),
        }
    }

    /// The catalog record attached to the reference, if the caller already had one
    pub fn full_record(&self) -> Option<&CatalogShow> {
        match self {
            ShowReference::ExternalRef {
                full_record: Some(record),
                ..
            } => Some(record),
            _ => None,
        }
    }
}

impl From<CatalogShow> for ShowReference {
    fn from(show: CatalogShow) -> Self {
        ShowReference::ExternalRef {
            external_id: show.external_id(),
            full_record: Some(Box::new(show)),
        }
    }
}

impl From<ExternalId> for ShowReference {
    fn from(id: ExternalId) -> Self {
        ShowReference::ExternalId(id)
    }
}

impl From<Uuid> for ShowReference {
    fn from(id: Uuid) -> Self {
        ShowReference::CanonicalId(id.to_string())
    }
}

impl Display for ShowReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShowReference::CanonicalId(id) => write!(f, "{}", id),
            ShowReference::ExternalToken(token) => write!(f, "{}", token),
            ShowReference::ExternalRef { external_id, .. } => {
                write!(f, "{}{}", EXTERNAL_TOKEN_PREFIX, external_id)
            }
            ShowReference::ExternalId(id) => write!(f, "{}", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CatalogIds;

    #[test]
    fn test_parse_uuid_is_canonical() {
        let id = Uuid::new_v4();
        let reference = ShowReference::parse(&id.to_string());
        assert_eq!(reference, ShowReference::CanonicalId(id.to_string()));
        assert_eq!(reference.canonical_id(), Some(id));
        assert_eq!(reference.external_id(), None);
    }

    #[test]
    fn test_parse_token_and_digits() {
        assert_eq!(
            ShowReference::parse("trakt-1388").external_id(),
            Some(1388)
        );
        assert_eq!(
            ShowReference::parse(" 1388 "),
            ShowReference::ExternalId(1388)
        );
    }

    #[test]
    fn test_malformed_token_has_no_identity() {
        let reference = ShowReference::parse("trakt-abc");
        assert_eq!(reference.external_id(), None);
        assert_eq!(reference.canonical_id(), None);
    }

    #[test]
    fn test_canonical_variant_with_garbage_is_not_canonical_shaped() {
        let reference = ShowReference::CanonicalId("not-a-uuid".to_string());
        assert_eq!(reference.canonical_id(), None);
        assert_eq!(reference.external_id(), None);
    }

    #[test]
    fn test_from_catalog_show_keeps_record() {
        let show = CatalogShow {
            title: "Dark".to_string(),
            ids: CatalogIds {
                trakt: 99,
                ..Default::default()
            },
            ..Default::default()
        };

        let reference = ShowReference::from(show.clone());
        assert_eq!(reference.external_id(), Some(99));
        assert_eq!(reference.full_record(), Some(&show));
        assert_eq!(reference.to_string(), "trakt-99");
    }
}
