//! Media objects accepted by `share_media`.

use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;
use crate::kinds::ProgramType;

/// Image payloads up to 25 MiB.
pub const MAX_IMAGE_BYTES: usize = 25 * 1024 * 1024;
/// File payloads up to 10 MiB.
pub const MAX_FILE_BYTES: usize = 10 * 1024 * 1024;
/// Webpage, music and video links.
pub const MAX_URL_BYTES: usize = 10 * 1024;
/// High resolution cover of a mini-program card.
pub const MAX_HD_IMAGE_BYTES: usize = 128 * 1024;

/// Tag of a [`Media`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaType {
    Image,
    Webpage,
    Music,
    Video,
    File,
    MiniProgram,
}

impl MediaType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Webpage => "webpage",
            Self::Music => "music",
            Self::Video => "video",
            Self::File => "file",
            Self::MiniProgram => "miniprogram",
        }
    }

    pub(crate) fn wire_code(self) -> usize {
        match self {
            Self::Image => 0,
            Self::Webpage => 1,
            Self::Music => 2,
            Self::Video => 3,
            Self::File => 4,
            Self::MiniProgram => 5,
        }
    }
}

/// A multimedia object to share.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Media {
    Image {
        data: Vec<u8>,
    },
    Webpage {
        url: String,
    },
    Music {
        url: String,
        data_url: Option<String>,
    },
    Video {
        url: String,
    },
    File {
        data: Vec<u8>,
        extension: String,
    },
    MiniProgram {
        webpage_url: String,
        user_name: String,
        path: Option<String>,
        hd_image: Option<Vec<u8>>,
        program_type: ProgramType,
    },
}

impl Media {
    pub fn media_type(&self) -> MediaType {
        match self {
            Self::Image { .. } => MediaType::Image,
            Self::Webpage { .. } => MediaType::Webpage,
            Self::Music { .. } => MediaType::Music,
            Self::Video { .. } => MediaType::Video,
            Self::File { .. } => MediaType::File,
            Self::MiniProgram { .. } => MediaType::MiniProgram,
        }
    }

    /// Enforce the peer's per-type byte limits.
    pub fn check_budget(&self) -> Result<(), ValidationError> {
        match self {
            Self::Image { data } => {
                non_empty("image_data", data.len())?;
                at_most("image_data", data.len(), MAX_IMAGE_BYTES)
            }
            Self::Webpage { url } => link("webpage_url", url),
            Self::Music { url, data_url } => {
                link("music_url", url)?;
                match data_url {
                    Some(data_url) => at_most("music_data_url", data_url.len(), MAX_URL_BYTES),
                    None => Ok(()),
                }
            }
            Self::Video { url } => link("video_url", url),
            Self::File { data, extension } => {
                non_empty("file_data", data.len())?;
                at_most("file_data", data.len(), MAX_FILE_BYTES)?;
                non_empty("file_extension", extension.len())
            }
            Self::MiniProgram {
                webpage_url,
                user_name,
                hd_image,
                ..
            } => {
                link("webpage_url", webpage_url)?;
                non_empty("user_name", user_name.len())?;
                match hd_image {
                    Some(image) => at_most("hd_image", image.len(), MAX_HD_IMAGE_BYTES),
                    None => Ok(()),
                }
            }
        }
    }

    /// Wire fields of this object. Binary data is hex encoded.
    pub fn encode(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![("media_type", self.media_type().as_str().to_string())];
        match self {
            Self::Image { data } => fields.push(("image_data", hex::encode(data))),
            Self::Webpage { url } => fields.push(("webpage_url", url.clone())),
            Self::Music { url, data_url } => {
                fields.push(("music_url", url.clone()));
                if let Some(data_url) = data_url {
                    fields.push(("music_data_url", data_url.clone()));
                }
            }
            Self::Video { url } => fields.push(("video_url", url.clone())),
            Self::File { data, extension } => {
                fields.push(("file_data", hex::encode(data)));
                fields.push(("file_extension", extension.clone()));
            }
            Self::MiniProgram {
                webpage_url,
                user_name,
                path,
                hd_image,
                program_type,
            } => {
                fields.push(("webpage_url", webpage_url.clone()));
                fields.push(("user_name", user_name.clone()));
                if let Some(path) = path {
                    fields.push(("path", path.clone()));
                }
                if let Some(image) = hd_image {
                    fields.push(("hd_image", hex::encode(image)));
                }
                fields.push(("program_type", program_type.wire_code().to_string()));
            }
        }
        fields
    }
}

fn at_most(field: &'static str, actual: usize, limit: usize) -> Result<(), ValidationError> {
    if actual > limit {
        return Err(ValidationError::too_large(field, limit, actual));
    }
    Ok(())
}

fn non_empty(field: &'static str, actual: usize) -> Result<(), ValidationError> {
    if actual == 0 {
        return Err(ValidationError::too_small(field, 1, 0));
    }
    Ok(())
}

fn link(field: &'static str, url: &str) -> Result<(), ValidationError> {
    non_empty(field, url.len())?;
    at_most(field, url.len(), MAX_URL_BYTES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_budget() {
        let ok = Media::Webpage {
            url: "a".repeat(MAX_URL_BYTES),
        };
        assert!(ok.check_budget().is_ok());

        let too_long = Media::Video {
            url: "a".repeat(MAX_URL_BYTES + 1),
        };
        let err = too_long.check_budget().unwrap_err();
        assert_eq!(err.field, "video_url");
        assert_eq!(err.actual, MAX_URL_BYTES + 1);

        assert!(Media::Webpage { url: String::new() }.check_budget().is_err());
    }

    #[test]
    fn test_mini_program_hd_image_budget() {
        let media = |len: usize| Media::MiniProgram {
            webpage_url: "https://a.example/fallback".into(),
            user_name: "gh_d43f693ca31f".into(),
            path: None,
            hd_image: Some(vec![0u8; len]),
            program_type: ProgramType::Release,
        };
        assert!(media(MAX_HD_IMAGE_BYTES).check_budget().is_ok());
        assert_eq!(
            media(MAX_HD_IMAGE_BYTES + 1).check_budget().unwrap_err().field,
            "hd_image"
        );
    }

    #[test]
    fn test_file_needs_extension() {
        let media = Media::File {
            data: vec![1, 2, 3],
            extension: String::new(),
        };
        assert_eq!(media.check_budget().unwrap_err().field, "file_extension");
    }

    #[test]
    fn test_encode_hex_encodes_binary() {
        let media = Media::Image {
            data: vec![0xde, 0xad],
        };
        assert_eq!(
            media.encode(),
            vec![
                ("media_type", "image".to_string()),
                ("image_data", "dead".to_string())
            ]
        );
    }
}
