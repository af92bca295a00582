//! GLSL text generation.

pub mod document;
pub mod visitor;

pub use document::GlslDocument;
pub use visitor::Visitor;
