use chrono::{DateTime, Utc};
use poolie_shared::Masked;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserPreferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chattiness: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub music: Option<String>,
    #[serde(default)]
    pub smoking: bool,
    #[serde(default)]
    pub pets: bool,
}

/// A marketplace member. Any user may publish rides and book seats.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: Masked<String>,
    pub phone: Option<Masked<String>>,
    pub age: Option<i32>,
    pub experience_level: String,
    pub rating: f64,
    pub rating_count: i32,
    pub driving_rating: Option<String>,
    pub profile_picture_url: Option<String>,
    pub is_verified: bool,
    pub verified_id: bool,
    pub confirmed_email: bool,
    pub confirmed_phone: bool,
    pub bio: Option<String>,
    pub preferences: Option<UserPreferences>,
    pub membership_type: String,
    pub published_rides: i32,
    pub completed_rides: i32,
    pub never_cancels: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// A fresh account with the column defaults of the `users` table.
    pub fn new(id: impl Into<String>, name: impl Into<String>, email: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            email: Masked(email.into()),
            phone: None,
            age: None,
            experience_level: "beginner".to_string(),
            rating: 0.0,
            rating_count: 0,
            driving_rating: None,
            profile_picture_url: None,
            is_verified: false,
            verified_id: false,
            confirmed_email: false,
            confirmed_phone: false,
            bio: None,
            preferences: None,
            membership_type: "non_professional".to_string(),
            published_rides: 0,
            completed_rides: 0,
            never_cancels: true,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Vehicle {
    pub id: String,
    pub user_id: String,
    pub make: String,
    pub model: String,
    pub color: String,
    pub license_plate: Option<String>,
    pub year: Option<i32>,
}
