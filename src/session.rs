//! The question/answer flow behind the "Get Help" and "I need more help"
//! actions.
//!
//! [`Assistant`] validates the query, asks its [`Completer`] for an answer,
//! shows the raw answer and offers the sanitized PDF export.  Everything the
//! user sees goes through a [`FormSurface`], so the flow runs the same behind
//! a terminal, a web form or a test double.

use std::fmt;

use log::{info, warn};

use crate::builder::{PdfBuildError, PdfBuilder};
use crate::completion::Completer;
use crate::layout::PageLayout;
use crate::prompt::{detailed_help_prompt, help_prompt, LearningLevel};
use crate::sanitize::sanitize;

/// MIME type of exported answers.
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// The two actions offered next to the query field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HelpAction {
    /// "Get Help": the first answer to the question.
    Initial,
    /// "I need more help": a more detailed answer to the same question.
    Detailed,
}

impl HelpAction {
    /// Builds the prompt for this action.
    pub fn prompt(self, level: LearningLevel, query: &str) -> String {
        match self {
            HelpAction::Initial => help_prompt(level, query),
            HelpAction::Detailed => detailed_help_prompt(level, query),
        }
    }

    /// Heading displayed above the answer.
    pub fn heading(self) -> &'static str {
        match self {
            HelpAction::Initial => "AI's Response:",
            HelpAction::Detailed => "Detailed Response:",
        }
    }

    /// Message displayed while waiting for the endpoint.
    pub fn progress_message(self) -> &'static str {
        match self {
            HelpAction::Initial => "Generating response...",
            HelpAction::Detailed => "Generating more detailed response...",
        }
    }

    /// Warning displayed when the action is triggered without a question.
    pub fn empty_query_warning(self) -> &'static str {
        match self {
            HelpAction::Initial => "Please enter your question before asking for help.",
            HelpAction::Detailed => "Please enter your question before asking for more help.",
        }
    }

    /// File name the exported answer is offered under.
    pub fn file_name(self) -> &'static str {
        match self {
            HelpAction::Initial => "O1A1_Learning_Assistant_Response.pdf",
            HelpAction::Detailed => "O1A1_Learning_Assistant_Detailed_Response.pdf",
        }
    }

    /// Label of the download action.
    pub fn download_label(self) -> &'static str {
        match self {
            HelpAction::Initial => "Download AI's Response as PDF",
            HelpAction::Detailed => "Download Detailed Response as PDF",
        }
    }
}

/// Input rejected before any request is made.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// The question field was empty.
    EmptyQuery,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyQuery => write!(f, "the question is empty"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Accepts any question that is not the empty string.
pub fn validate_query(query: &str) -> Result<&str, ValidationError> {
    if query.is_empty() {
        Err(ValidationError::EmptyQuery)
    } else {
        Ok(query)
    }
}

/// A file offered to the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Download {
    /// Label of the download action.
    pub label: &'static str,
    /// Suggested file name.
    pub file_name: &'static str,
    /// MIME type of `bytes`.
    pub mime_type: &'static str,
    /// File contents.
    pub bytes: Vec<u8>,
}

/// Output side of the question form.
pub trait FormSurface {
    /// Shows a transient message while a request is in flight.
    fn show_progress(&mut self, message: &str);
    /// Shows a warning about the user's input.
    fn show_warning(&mut self, message: &str);
    /// Shows an error that ended the current action.
    fn show_error(&mut self, message: &str);
    /// Shows an answer under the given heading.
    fn show_response(&mut self, heading: &str, text: &str);
    /// Offers a file for download.
    fn offer_download(&mut self, download: Download);
}

/// How an action ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The query was rejected; nothing was requested.
    Rejected,
    /// The completion request failed; no answer is shown.
    RequestFailed,
    /// The answer is shown but could not be exported.
    AnsweredWithoutExport,
    /// The answer is shown and its PDF is offered.
    Answered,
}

/// Runs help actions against a [`Completer`].
#[derive(Debug)]
pub struct Assistant<C> {
    completer: C,
    layout: PageLayout,
    export_pdf: bool,
}

impl<C: Completer> Assistant<C> {
    /// Creates an assistant exporting answers with the default layout.
    pub fn new(completer: C) -> Self {
        Self {
            completer,
            layout: PageLayout::default(),
            export_pdf: true,
        }
    }

    /// Replaces the export layout and returns the updated assistant.
    pub fn with_layout(mut self, layout: PageLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Enables or disables the PDF export and returns the updated assistant.
    pub fn with_pdf_export(mut self, export_pdf: bool) -> Self {
        self.export_pdf = export_pdf;
        self
    }

    /// Runs one action for the given level and question.
    pub fn handle(
        &self,
        surface: &mut dyn FormSurface,
        action: HelpAction,
        level: LearningLevel,
        query: &str,
    ) -> ActionOutcome {
        let query = match validate_query(query) {
            Ok(query) => query,
            Err(err) => {
                info!("Rejected {:?} action: {}", action, err);
                surface.show_warning(action.empty_query_warning());
                return ActionOutcome::Rejected;
            }
        };

        surface.show_progress(action.progress_message());
        let prompt = action.prompt(level, query);
        let response = match self.completer.complete(&prompt) {
            Ok(response) => response,
            Err(err) => {
                warn!("Completion failed: {}", err);
                surface.show_error(&format!("Error occurred: {err}"));
                return ActionOutcome::RequestFailed;
            }
        };

        surface.show_response(action.heading(), &response);

        if !self.export_pdf {
            return ActionOutcome::Answered;
        }

        match self.export(action, &response) {
            Ok(download) => {
                surface.offer_download(download);
                ActionOutcome::Answered
            }
            Err(err) => {
                warn!("PDF export failed: {}", err);
                surface.show_error(&format!("Could not create the PDF: {err}"));
                ActionOutcome::AnsweredWithoutExport
            }
        }
    }

    /// Sanitizes and renders an answer into the download for `action`.
    pub fn export(&self, action: HelpAction, response: &str) -> Result<Download, PdfBuildError> {
        let pdf = PdfBuilder::new(sanitize(response))
            .with_layout(self.layout.clone())
            .render()?;
        Ok(Download {
            label: action.download_label(),
            file_name: action.file_name(),
            mime_type: PDF_MIME_TYPE,
            bytes: pdf.bytes,
        })
    }
}
