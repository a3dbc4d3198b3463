//! Texture placeholders that the loader back-fills in place.

use std::{cell::RefCell, fmt, rc::Rc};

use crate::error::{LoadError, LoadErrorKind};

/// Decoded RGBA8 image.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA8 rows, top row first.
    pub pixels: Vec<u8>,
}

impl fmt::Debug for ImageData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageData")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

impl ImageData {
    /// Decodes any format the `image` crate was built with into RGBA8.
    pub fn decode(bytes: &[u8]) -> Result<Self, LoadErrorKind> {
        let image = image::load_from_memory(bytes)
            .map_err(|err| LoadErrorKind::Decode(err.to_string()))?
            .to_rgba8();
        Ok(Self {
            width: image.width(),
            height: image.height(),
            pixels: image.into_raw(),
        })
    }

    /// The 1x1 white image sinks should draw while a map is still pending.
    pub fn placeholder() -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: vec![255; 4],
        }
    }
}

/// Lifecycle of a single load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    Pending,
    Loaded,
    Failed,
}

#[derive(Debug)]
enum Payload {
    Pending,
    Loaded(Rc<ImageData>),
    Failed(LoadError),
}

#[derive(Debug)]
struct TextureInner {
    url: String,
    payload: Payload,
    version: u32,
}

/// Shared handle to a texture that may still be loading.
///
/// Clones share state: when the loader fills the image, every holder sees it.
#[derive(Clone)]
pub struct Texture {
    inner: Rc<RefCell<TextureInner>>,
}

impl fmt::Debug for Texture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Texture")
            .field("url", &inner.url)
            .field("status", &self.status())
            .field("version", &inner.version)
            .finish()
    }
}

impl Texture {
    pub(crate) fn pending(url: &str) -> Self {
        Self {
            inner: Rc::new(RefCell::new(TextureInner {
                url: url.to_string(),
                payload: Payload::Pending,
                version: 0,
            })),
        }
    }

    pub fn url(&self) -> String {
        self.inner.borrow().url.clone()
    }

    pub fn status(&self) -> LoadStatus {
        match self.inner.borrow().payload {
            Payload::Pending => LoadStatus::Pending,
            Payload::Loaded(_) => LoadStatus::Loaded,
            Payload::Failed(_) => LoadStatus::Failed,
        }
    }

    /// Decoded image, present only once loaded.
    pub fn image(&self) -> Option<Rc<ImageData>> {
        match &self.inner.borrow().payload {
            Payload::Loaded(image) => Some(image.clone()),
            _ => None,
        }
    }

    /// Failure detail, present only once failed.
    pub fn error(&self) -> Option<LoadError> {
        match &self.inner.borrow().payload {
            Payload::Failed(err) => Some(err.clone()),
            _ => None,
        }
    }

    /// Bumped whenever the payload changes; sinks re-upload when it moves.
    pub fn version(&self) -> u32 {
        self.inner.borrow().version
    }

    /// Dimensions of the image a sink should draw right now.
    pub fn size(&self) -> (u32, u32) {
        self.image().map_or((1, 1), |image| (image.width, image.height))
    }

    /// True when both handles refer to the same shared texture.
    pub fn ptr_eq(&self, other: &Texture) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn fill(&self, image: Rc<ImageData>) {
        self.replace(Payload::Loaded(image));
    }

    pub(crate) fn fail(&self, err: LoadError) {
        self.replace(Payload::Failed(err));
    }

    pub(crate) fn reset(&self) {
        self.replace(Payload::Pending);
    }

    fn replace(&self, payload: Payload) {
        let mut inner = self.inner.borrow_mut();
        inner.payload = payload;
        inner.version = inner.version.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_observe_back_fill() {
        let texture = Texture::pending("door.jpg");
        let held_by_material = texture.clone();
        assert_eq!(held_by_material.status(), LoadStatus::Pending);
        assert_eq!(held_by_material.size(), (1, 1));

        texture.fill(Rc::new(ImageData {
            width: 2,
            height: 1,
            pixels: vec![0; 8],
        }));

        assert_eq!(held_by_material.status(), LoadStatus::Loaded);
        assert_eq!(held_by_material.size(), (2, 1));
        assert_eq!(held_by_material.version(), 1);
        assert!(held_by_material.ptr_eq(&texture));
        assert!(held_by_material.error().is_none());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = ImageData::decode(b"definitely not a png").unwrap_err();
        assert!(matches!(err, LoadErrorKind::Decode(_)));
    }

    #[test]
    fn test_placeholder_is_single_white_pixel() {
        let placeholder = ImageData::placeholder();
        assert_eq!((placeholder.width, placeholder.height), (1, 1));
        assert_eq!(placeholder.pixels, vec![255, 255, 255, 255]);
    }
}
