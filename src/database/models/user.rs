use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

pub const USER_COLLECTION: &str = "users";

/// Account allowed to sign in through Google
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub email: String,
    #[serde(default)]
    pub name: String,
}

impl User {
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: ObjectId::new(),
            email: email.into(),
            name: name.into(),
        }
    }
}
