//! Decides whether a static document model is good enough to skip rendering.

use crate::types::DocumentModel;

/// Minimum total section text, in characters, for a static pass to suffice.
pub const SUFFICIENT_TEXT_CHARS: usize = 500;

/// `true` when the model has sections and enough text across them.
pub fn is_sufficient(model: &DocumentModel) -> bool {
    !model.sections.is_empty() && model.text_len() >= SUFFICIENT_TEXT_CHARS
}
