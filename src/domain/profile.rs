use serde::{Deserialize, Serialize};

/// The single profile row. `profile` holds the portrait image URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(default)]
    pub profile: String,
}

impl Profile {
    pub fn image_url(&self) -> Option<&str> {
        let url = self.profile.trim();
        (!url.is_empty()).then_some(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_url() {
        let row = serde_json::json!({"$id": "p", "profile": "https://img/p.png", "$sequence": 1});
        let profile: Profile = serde_json::from_value(row).unwrap();
        assert_eq!(profile.image_url(), Some("https://img/p.png"));

        let empty = Profile { id: "p".into(), profile: " ".into() };
        assert_eq!(empty.image_url(), None);
    }
}
