//! Core entry point for the learning_assistant crate.
//!
//! A question and a learning level become a prompt ([`prompt`]), the prompt
//! goes to a chat-completion endpoint ([`completion`]), and the answer is shown
//! and exported as a PDF after [`sanitize`] has reduced it to plain Latin-1
//! text ([`builder`]).  [`session`] ties the steps together behind the two
//! form actions.

pub mod builder;
pub mod completion;
pub mod config;
pub mod fonts;
pub mod layout;
pub mod prompt;
pub mod sanitize;
pub mod session;

pub use builder::{render, EncodingError, PdfBuildError, PdfBuilder, RenderedPdf};
pub use completion::{Completer, CompletionClient, RequestError};
pub use config::CompletionConfig;
pub use layout::PageLayout;
pub use prompt::LearningLevel;
pub use sanitize::sanitize;
pub use session::{ActionOutcome, Assistant, Download, FormSurface, HelpAction, ValidationError};
