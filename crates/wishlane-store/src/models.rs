//! Document models persisted in the per-owner collections.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can be handed
//! directly to a UI layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use wishlane_shared::{EventId, GiftId, OwnerId};

// ---------------------------------------------------------------------------
// Gift
// ---------------------------------------------------------------------------

/// A wished-for gift in an owner's `gifts` collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Gift {
    pub id: GiftId,
    pub owner_id: OwnerId,
    /// Never empty.
    pub name: String,
    pub description: String,
    pub image_url: Option<String>,
    /// Free-form price text (e.g. "70€"), empty when unknown.
    pub price: String,
    /// Where the gift can be bought.
    pub source: Option<GiftSource>,
    /// Assigned by the store at write time.
    pub created_at: DateTime<Utc>,
    /// The event this gift is assigned to; `None` means unassigned.
    pub event_id: Option<EventId>,
}

/// "Where to buy" details of a gift.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GiftSource {
    Online {
        link: String,
    },
    Brand {
        brand: String,
    },
    Location {
        #[serde(default)]
        country: String,
        #[serde(default)]
        city: String,
        #[serde(default)]
        place: String,
    },
}

impl GiftSource {
    /// One-line description for list rows; `None` when there is nothing to show.
    pub fn summary(&self) -> Option<String> {
        match self {
            GiftSource::Online { link } if !link.is_empty() => Some(format!("online: {link}")),
            GiftSource::Brand { brand } if !brand.is_empty() => Some(format!("brand: {brand}")),
            GiftSource::Location {
                country,
                city,
                place,
            } => {
                let parts: Vec<&str> = [place, city, country]
                    .into_iter()
                    .map(String::as_str)
                    .filter(|s| !s.is_empty())
                    .collect();
                if parts.is_empty() {
                    None
                } else {
                    Some(format!("location: {}", parts.join(", ")))
                }
            }
            _ => None,
        }
    }
}

/// Input for creating a gift.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGift {
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub price: Option<String>,
    pub source: Option<GiftSource>,
}

impl NewGift {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Partial update of a gift.  `None` fields are left untouched; an empty
/// `image_url` clears the image.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GiftPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub price: Option<String>,
    pub source: Option<GiftSource>,
}

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

/// An occasion gifts can be assigned to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EventItem {
    pub id: EventId,
    pub owner_id: OwnerId,
    pub name: String,
    pub description: String,
    pub image_url: Option<String>,
    /// Display only, nothing expires automatically.
    pub expiration_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating an event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub name: String,
    pub description: Option<String>,
    pub expiration_date: Option<DateTime<Utc>>,
    pub image_url: Option<String>,
}

impl NewEvent {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Partial update of an event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub expiration_date: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Event deletion
// ---------------------------------------------------------------------------

/// What happens to gifts assigned to an event when that event is deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventDeletePolicy {
    /// Un-assign every gift that referenced the event, in the same transaction.
    #[default]
    ClearReferences,
    /// Leave `event_id` dangling on assigned gifts.
    KeepReferences,
}

impl std::str::FromStr for EventDeletePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "clear" | "clear_references" => Ok(Self::ClearReferences),
            "keep" | "keep_references" => Ok(Self::KeepReferences),
            other => Err(format!("unknown event delete policy: {other}")),
        }
    }
}

/// Result of deleting an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDeletion {
    /// Whether the event existed.
    pub deleted: bool,
    /// Number of gifts whose `event_id` was cleared.
    pub cleared_gifts: usize,
}

// ---------------------------------------------------------------------------
// User profile
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[default]
    #[serde(rename = "")]
    Unspecified,
    Female,
    Male,
    Other,
}

/// Preference profile, one document per owner.  Absent fields deserialize
/// to empty values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserProfile {
    pub display_name: String,
    #[serde(rename = "photoURL")]
    pub photo_url: String,
    pub description: String,
    pub gender: Gender,
    pub interests: Vec<String>,
    /// Ways to relax.
    pub relax: Vec<String>,
    pub what_makes_you_happy: String,
    /// e.g. "$", "$$", "$$$".
    pub price_range: String,
    pub favorite_colors: Vec<String>,
    pub allergies: Vec<String>,
    pub favorite_brands: Vec<String>,
    pub preferred_gift_types: Vec<String>,
    pub clothing_size: String,
    pub shoe_size: String,
    pub preferred_stores: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Fields to merge into a stored profile.  `None` keeps the stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
    pub description: Option<String>,
    pub gender: Option<Gender>,
    pub interests: Option<Vec<String>>,
    pub relax: Option<Vec<String>>,
    pub what_makes_you_happy: Option<String>,
    pub price_range: Option<String>,
    pub favorite_colors: Option<Vec<String>>,
    pub allergies: Option<Vec<String>>,
    pub favorite_brands: Option<Vec<String>>,
    pub preferred_gift_types: Option<Vec<String>>,
    pub clothing_size: Option<String>,
    pub shoe_size: Option<String>,
    pub preferred_stores: Option<Vec<String>>,
}

impl ProfileUpdate {
    /// Merge the provided fields into `profile`.
    pub fn apply_to(self, profile: &mut UserProfile) {
        macro_rules! merge {
            ($($field:ident),* $(,)?) => {
                $(if let Some(value) = self.$field {
                    profile.$field = value;
                })*
            };
        }
        merge!(
            display_name,
            photo_url,
            description,
            gender,
            interests,
            relax,
            what_makes_you_happy,
            price_range,
            favorite_colors,
            allergies,
            favorite_brands,
            preferred_gift_types,
            clothing_size,
            shoe_size,
            preferred_stores,
        );
    }
}
