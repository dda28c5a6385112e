use std::path::Path;

use image::ImageReader;
use tracing::{debug, warn};
use winit::window::{BadIcon, Icon};

/// Icon sizes looked up under `logos/`, largest first.
const ICON_SIZES: [u32; 9] = [1024, 512, 256, 128, 64, 48, 32, 24, 16];
const BUILTIN_ICON_SIZE: u32 = 32;

struct IconImage {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

/// Window icon for a quest: the largest `logos/icon_<n>.png` that decodes,
/// otherwise a builtin one.
pub fn load_window_icon(quest_dir: &Path) -> Result<Icon, BadIcon> {
    let image = ICON_SIZES
        .iter()
        .find_map(|size| {
            let path = quest_dir.join("logos").join(format!("icon_{size}.png"));
            if !path.is_file() {
                return None;
            }
            match load_icon_rgba(&path) {
                Ok(image) => Some(image),
                Err(reason) => {
                    warn!(path = %path.display(), reason = reason.as_str(), "icon_load_failed");
                    None
                }
            }
        })
        .unwrap_or_else(|| {
            debug!("using builtin window icon");
            builtin_icon()
        });
    Icon::from_rgba(image.rgba, image.width, image.height)
}

fn load_icon_rgba(path: &Path) -> Result<IconImage, String> {
    let reader = ImageReader::open(path).map_err(|error| format!("file_open_failed:{error}"))?;
    let decoded = reader
        .decode()
        .map_err(|error| format!("decode_failed:{error}"))?;
    let image = decoded.to_rgba8();
    Ok(IconImage {
        width: image.width(),
        height: image.height(),
        rgba: image.into_raw(),
    })
}

/// Green diamond on a transparent background.
fn builtin_icon() -> IconImage {
    let size = BUILTIN_ICON_SIZE;
    let center = size as i32 / 2;
    let mut rgba = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size as i32 {
        for x in 0..size as i32 {
            let distance = (x - center).abs() + (y - center).abs();
            let pixel = if distance < center - 2 {
                [72, 168, 96, 255]
            } else if distance < center {
                [24, 64, 40, 255]
            } else {
                [0, 0, 0, 0]
            };
            rgba.extend_from_slice(&pixel);
        }
    }
    IconImage {
        width: size,
        height: size,
        rgba,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_icon_has_square_rgba_data() {
        let icon = builtin_icon();
        assert_eq!(icon.width, BUILTIN_ICON_SIZE);
        assert_eq!(icon.rgba.len(), (icon.width * icon.height * 4) as usize);
        assert_eq!(&icon.rgba[0..4], &[0, 0, 0, 0]);
    }

    #[test]
    fn missing_logos_fall_back_to_builtin_icon() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(load_window_icon(dir.path()).is_ok());
    }

    #[test]
    fn undecodable_logo_is_skipped() {
        let dir = tempfile::tempdir().expect("tempdir");
        let logos = dir.path().join("logos");
        std::fs::create_dir(&logos).expect("create logos");
        std::fs::write(logos.join("icon_64.png"), b"not a png").expect("write icon");

        assert!(load_icon_rgba(&logos.join("icon_64.png")).is_err());
        assert!(load_window_icon(dir.path()).is_ok());
    }
}
