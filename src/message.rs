//! Message content blocks shared by several endpoint families.
//!
//! Welcome messages, mass-send templates, moment tasks, "contact me"
//! conclusions and customer-service replies all carry the same text and
//! attachment shapes.

use serde::{Deserialize, Serialize};

/// Plain text content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Text {
    pub content: String,
}

impl Text {
    pub fn new(content: impl Into<String>) -> Self {
        Text {
            content: content.into(),
        }
    }
}

/// A reference to previously uploaded media.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    pub media_id: String,
}

/// An image, either uploaded (`media_id`) or hosted (`pic_url`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub media_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pic_url: String,
}

/// A link card.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub picurl: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub desc: String,
    pub url: String,
}

/// A mini program card.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Miniprogram {
    pub title: String,
    pub pic_media_id: String,
    pub appid: String,
    pub page: String,
}

/// One attachment of a message. Exactly one payload field should be set,
/// matching `msgtype`; use the constructors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub msgtype: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<Image>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<Link>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub miniprogram: Option<Miniprogram>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<MediaRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<MediaRef>,
}

impl Attachment {
    pub fn image(image: Image) -> Self {
        Attachment {
            msgtype: "image".to_string(),
            image: Some(image),
            ..Default::default()
        }
    }

    pub fn link(link: Link) -> Self {
        Attachment {
            msgtype: "link".to_string(),
            link: Some(link),
            ..Default::default()
        }
    }

    pub fn miniprogram(miniprogram: Miniprogram) -> Self {
        Attachment {
            msgtype: "miniprogram".to_string(),
            miniprogram: Some(miniprogram),
            ..Default::default()
        }
    }

    pub fn video(media_id: impl Into<String>) -> Self {
        Attachment {
            msgtype: "video".to_string(),
            video: Some(MediaRef {
                media_id: media_id.into(),
            }),
            ..Default::default()
        }
    }

    pub fn file(media_id: impl Into<String>) -> Self {
        Attachment {
            msgtype: "file".to_string(),
            file: Some(MediaRef {
                media_id: media_id.into(),
            }),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attachment_serializes_only_its_payload() {
        let json = serde_json::to_value(Attachment::file("MEDIA_ID")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"msgtype": "file", "file": {"media_id": "MEDIA_ID"}})
        );
    }

    #[test]
    fn hosted_image_omits_empty_media_id() {
        let json = serde_json::to_value(Attachment::image(Image {
            pic_url: "https://example.com/a.png".to_string(),
            ..Default::default()
        }))
        .unwrap();
        assert_eq!(json["image"], serde_json::json!({"pic_url": "https://example.com/a.png"}));
    }

    #[test]
    fn link_attachment_deserializes_without_optional_fields() {
        let a: Attachment = serde_json::from_str(
            r#"{"msgtype":"link","link":{"title":"News","url":"https://example.com"}}"#,
        )
        .unwrap();
        let link = a.link.unwrap();
        assert_eq!(link.title, "News");
        assert!(link.picurl.is_empty());
    }
}
