pub mod edit;
pub mod renderer;

pub use edit::{DocumentEdit, NamedStyle, doc_len, inserted_text};
pub use renderer::{BODY_START, DEFAULT_TITLE, DocumentRenderer, RenderStrategy};
