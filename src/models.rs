use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered person. `id` is supplied by the caller and is not unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub id: String,
    pub name: String,
    #[serde(rename = "dateofbirth")]
    pub date_of_birth: String,
    #[serde(rename = "phonenumber")]
    pub phone_number: String,
    #[serde(rename = "emailaddress")]
    pub email_address: String,
    #[serde(rename = "creationtimestamp")]
    pub creation_timestamp: DateTime<Utc>,
}

impl Default for User {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            date_of_birth: String::new(),
            phone_number: String::new(),
            email_address: String::new(),
            creation_timestamp: DateTime::<Utc>::UNIX_EPOCH,
        }
    }
}

/// An undirected proximity edge between two users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Contact {
    #[serde(rename = "useridone")]
    pub user_id_one: String,
    #[serde(rename = "useridtwo")]
    pub user_id_two: String,
    #[serde(rename = "timeofcontact")]
    pub time_of_contact: DateTime<Utc>,
}

impl Default for Contact {
    fn default() -> Self {
        Self {
            user_id_one: String::new(),
            user_id_two: String::new(),
            time_of_contact: DateTime::<Utc>::UNIX_EPOCH,
        }
    }
}

impl Contact {
    /// The endpoint of this edge that is not `user_id`.
    pub fn other_party(&self, user_id: &str) -> &str {
        if self.user_id_two == user_id {
            &self.user_id_one
        } else {
            &self.user_id_two
        }
    }
}

/// Store-generated key of a freshly inserted record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertResult {
    #[serde(rename = "InsertedID")]
    pub inserted_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct ContactsQuery {
    pub user: Option<String>,
    pub infection_timestamp: Option<String>,
}
