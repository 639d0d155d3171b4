use serde::Serialize;
use uuid::Uuid;

const DEFAULT_IMAGE_PATH: &str = "/static/profile_pics/default.jpg";

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    /// Always stored lower-cased.
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Bare file name; where it is served from is decided by `image_path`.
    pub image_file: Option<String>,
}

impl User {
    pub fn image_path(&self) -> String {
        match &self.image_file {
            Some(file) => format!("/media/profile_pics/{file}"),
            None => DEFAULT_IMAGE_PATH.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(image_file: Option<&str>) -> User {
        User {
            id: Uuid::new_v4(),
            username: "corey".into(),
            email: "corey@example.com".into(),
            password_hash: "$2b$04$hash".into(),
            image_file: image_file.map(String::from),
        }
    }

    #[test]
    fn image_path_falls_back_to_default() {
        assert_eq!(user(None).image_path(), "/static/profile_pics/default.jpg");
        assert_eq!(
            user(Some("me.png")).image_path(),
            "/media/profile_pics/me.png"
        );
    }

    #[test]
    fn password_hash_is_never_serialized() {
        let json = serde_json::to_value(user(None)).unwrap();
        assert!(json.get("password_hash").is_none());
    }
}
