use crate::{
    error::{GenerationError, Result},
    models::{compose_prompt, GeneratedImage, GenerationRequest, Style},
};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

pub type SessionId = Uuid;

/// What one user has picked so far. Lives outside the client, which stays stateless.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub style: Style,
    pub subject: String,
    pub last_image: Option<GeneratedImage>,
}

impl SessionState {
    pub fn prompt(&self) -> String {
        compose_prompt(&self.style, &self.subject)
    }

    /// Blank subjects are rejected before any request is built.
    pub fn request(&self) -> Result<GenerationRequest> {
        if self.subject.trim().is_empty() {
            return Err(GenerationError::InvalidPrompt);
        }
        GenerationRequest::new(self.prompt())
    }
}

#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<SessionId, SessionState>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self) -> SessionId {
        let id = Uuid::new_v4();
        self.lock().insert(id, SessionState::default());
        log::debug!("Created session {}", id);
        id
    }

    pub fn get(&self, id: SessionId) -> Option<SessionState> {
        self.lock().get(&id).cloned()
    }

    pub fn update<F>(&self, id: SessionId, f: F) -> Result<()>
    where
        F: FnOnce(&mut SessionState),
    {
        let mut sessions = self.lock();
        let state = sessions
            .get_mut(&id)
            .ok_or(GenerationError::SessionNotFound(id))?;
        f(state);
        Ok(())
    }

    /// Replaces the previous image, if any.
    pub fn set_image(&self, id: SessionId, image: GeneratedImage) -> Result<()> {
        self.update(id, |state| state.last_image = Some(image))
    }

    pub fn remove(&self, id: SessionId) -> Option<SessionState> {
        self.lock().remove(&id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<SessionId, SessionState>> {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{decode_image, image::png_fixture, ImageBytes};

    #[test]
    fn test_create_and_update() {
        let store = SessionStore::new();
        let id = store.create();
        assert_eq!(store.len(), 1);

        store
            .update(id, |state| {
                state.style = Style::PixelArt;
                state.subject = "a castle".into();
            })
            .unwrap();

        let state = store.get(id).unwrap();
        assert_eq!(state.style, Style::PixelArt);
        assert_eq!(
            state.request().unwrap().prompt(),
            "retro 16-bit pixel art with a limited color palette a castle"
        );
    }

    #[test]
    fn test_blank_subject_is_invalid() {
        let state = SessionState::default();
        assert!(matches!(state.request(), Err(GenerationError::InvalidPrompt)));
    }

    #[test]
    fn test_unknown_session() {
        let store = SessionStore::new();
        let missing = Uuid::new_v4();
        assert!(store.get(missing).is_none());
        assert!(matches!(
            store.update(missing, |_| {}),
            Err(GenerationError::SessionNotFound(id)) if id == missing
        ));
    }

    #[test]
    fn test_image_replaced_and_session_removed() {
        let store = SessionStore::new();
        let id = store.create();

        let first = decode_image(&ImageBytes::new(png_fixture(2, 2))).unwrap();
        let second = decode_image(&ImageBytes::new(png_fixture(4, 1))).unwrap();
        store.set_image(id, first).unwrap();
        store.set_image(id, second).unwrap();

        let image = store.get(id).unwrap().last_image.unwrap();
        assert_eq!((image.width(), image.height()), (4, 1));

        assert!(store.remove(id).is_some());
        assert!(store.is_empty());
    }

    #[test]
    fn test_sessions_are_independent() {
        let store = SessionStore::new();
        let a = store.create();
        let b = store.create();
        store.update(a, |s| s.subject = "a fox".into()).unwrap();

        assert_eq!(store.get(a).unwrap().subject, "a fox");
        assert_eq!(store.get(b).unwrap().subject, "");
    }
}
