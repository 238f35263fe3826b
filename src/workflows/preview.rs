//! Photo previews with an explicit lifecycle.
//!
//! A preview is created when a photo is accepted and must be revoked when the
//! photo is replaced, submitted, or its form is torn down. [`PreviewHandle`]
//! is deliberately not `Clone`: revoking consumes it.

use crate::domain::ImageFile;
use std::collections::BTreeMap;

/// Owning reference to one live preview.
#[derive(Debug, PartialEq, Eq)]
pub struct PreviewHandle(u64);

/// Textual stand-in for the image, shown in the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub file_name: String,
    pub mime_type: String,
    pub size: usize,
}

impl Preview {
    /// One-line summary such as `firulais.png · image/png · 1.2 MB`.
    #[must_use]
    pub fn summary(&self) -> String {
        format!("{} · {} · {}", self.file_name, self.mime_type, human_size(self.size))
    }
}

#[allow(clippy::cast_precision_loss)]
fn human_size(bytes: usize) -> String {
    const KB: f64 = 1024.0;
    let bytes = bytes as f64;
    if bytes >= KB * KB {
        format!("{:.1} MB", bytes / (KB * KB))
    } else if bytes >= KB {
        format!("{:.1} KB", bytes / KB)
    } else {
        format!("{bytes} B")
    }
}

#[derive(Debug, Default)]
pub struct PreviewRegistry {
    next_id: u64,
    active: BTreeMap<u64, Preview>,
}

impl PreviewRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, image: &ImageFile) -> PreviewHandle {
        self.next_id += 1;
        self.active.insert(
            self.next_id,
            Preview {
                file_name: image.file_name.clone(),
                mime_type: image.mime_type.clone(),
                size: image.size(),
            },
        );
        tracing::debug!(preview = self.next_id, "preview created");
        PreviewHandle(self.next_id)
    }

    /// Releases a preview. Returns `false` if it was already gone.
    pub fn revoke(&mut self, handle: PreviewHandle) -> bool {
        let removed = self.active.remove(&handle.0).is_some();
        tracing::debug!(preview = handle.0, removed, "preview revoked");
        removed
    }

    #[must_use]
    pub fn get(&self, handle: &PreviewHandle) -> Option<&Preview> {
        self.active.get(&handle.0)
    }

    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_and_revoke() {
        let mut registry = PreviewRegistry::new();
        let handle = registry.create(&ImageFile::from_name("a.png", vec![0; 2048]));
        assert_eq!(registry.active_count(), 1);
        assert_eq!(
            registry.get(&handle).map(Preview::summary).as_deref(),
            Some("a.png · image/png · 2.0 KB")
        );

        assert!(registry.revoke(handle));
        assert_eq!(registry.active_count(), 0);
    }
}
