use std::error::Error;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use learning_assistant::config::{
    CompletionConfig, API_KEY_ENV, BASE_URL_ENV, MAX_TOKENS_ENV, MODEL_ENV,
};
use learning_assistant::layout::{PageLayout, DEFAULT_HEADER_TEXT};
use learning_assistant::prompt::LearningLevel;
use learning_assistant::{
    sanitize, ActionOutcome, Assistant, CompletionClient, Download, FormSurface, HelpAction,
    PdfBuilder,
};
use log::{info, warn};

/// Asks a chat-completion model for explanations tuned to a learning level
/// and saves the answers as PDF files.
///
/// The endpoint credential is read from `AIML_API_KEY`.  Fonts are looked up
/// under `LEARNING_ASSISTANT_FONTS_DIR`, `assets/fonts` and the system font
/// directories.
#[derive(Parser)]
#[command(author, version, about = "Learning assistant with PDF export")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask for a step-by-step explanation ("Get Help").
    Ask(QuestionArgs),

    /// Ask for a more detailed explanation of the same question ("I need more help").
    #[command(aliases = ["more-help", "detailed"])]
    More(QuestionArgs),

    /// Print the prompt that would be sent, without contacting the endpoint.
    Prompt {
        /// Learning level: child, teenager or adult-novice.
        #[arg(short, long, default_value = "child")]
        level: LearningLevel,

        /// Print the "more detail" variant of the prompt.
        #[arg(long)]
        detailed: bool,

        /// The question.
        #[arg(required = true)]
        query: Vec<String>,
    },

    /// Render a text file into a PDF answer document.
    Render {
        /// Text file to render.
        input: PathBuf,

        /// Output path of the PDF.
        #[arg(short, long, default_value = "answer.pdf")]
        output: PathBuf,

        /// Header title printed on every page.
        #[arg(long, default_value = DEFAULT_HEADER_TEXT)]
        title: String,

        /// Skip sanitizing; the text must already be plain Latin-1.
        #[arg(long)]
        raw: bool,
    },
}

#[derive(Args)]
struct QuestionArgs {
    /// Learning level: child, teenager or adult-novice.
    #[arg(short, long, default_value = "child")]
    level: LearningLevel,

    /// Directory the PDF answer is written to.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Print the answer without creating a PDF.
    #[arg(long)]
    no_pdf: bool,

    /// Header title printed on every page of the PDF.
    #[arg(long, default_value = DEFAULT_HEADER_TEXT)]
    title: String,

    /// Model identifier.
    #[arg(long, env = MODEL_ENV)]
    model: Option<String>,

    /// Base URL of the OpenAI-compatible API.
    #[arg(long, env = BASE_URL_ENV)]
    base_url: Option<String>,

    /// Upper bound on the number of generated tokens.
    #[arg(long, env = MAX_TOKENS_ENV)]
    max_tokens: Option<u32>,

    /// The question.
    query: Vec<String>,
}

impl QuestionArgs {
    fn completion_config(&self) -> CompletionConfig {
        let mut config = CompletionConfig::from_env();
        if let Some(model) = &self.model {
            config = config.with_model(model.clone());
        }
        if let Some(base_url) = &self.base_url {
            config = config.with_base_url(base_url.clone());
        }
        if let Some(max_tokens) = self.max_tokens {
            config = config.with_max_tokens(max_tokens);
        }
        config
    }
}

/// Prints answers to stdout and saves downloads into a directory.
struct TerminalSurface {
    out_dir: PathBuf,
    saved: Vec<PathBuf>,
    save_error: Option<SaveError>,
}

impl TerminalSurface {
    fn new(out_dir: PathBuf) -> Self {
        Self {
            out_dir,
            saved: Vec::new(),
            save_error: None,
        }
    }
}

impl FormSurface for TerminalSurface {
    fn show_progress(&mut self, message: &str) {
        eprintln!("{message}");
    }

    fn show_warning(&mut self, message: &str) {
        eprintln!("Warning: {message}");
    }

    fn show_error(&mut self, message: &str) {
        eprintln!("{message}");
    }

    fn show_response(&mut self, heading: &str, text: &str) {
        println!("{heading}");
        println!();
        println!("{text}");
    }

    fn offer_download(&mut self, download: Download) {
        let path = self.out_dir.join(download.file_name);
        match write_file(&path, &download.bytes) {
            Ok(()) => {
                eprintln!("{}: saved to {}", download.label, path.display());
                self.saved.push(path);
            }
            Err(source) => self.save_error = Some(SaveError { path, source }),
        }
    }
}

/// A download that could not be written to disk.
#[derive(Debug)]
struct SaveError {
    path: PathBuf,
    source: io::Error,
}

impl fmt::Display for SaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "could not save {}", self.path.display())
    }
}

impl Error for SaveError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

/// An action that ended without a saved answer.
#[derive(Debug)]
struct ActionFailed {
    action: HelpAction,
    outcome: ActionOutcome,
}

impl fmt::Display for ActionFailed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self.outcome {
            ActionOutcome::Rejected => "no question was given",
            ActionOutcome::RequestFailed => "the completion request failed",
            ActionOutcome::AnsweredWithoutExport => "the answer could not be exported",
            ActionOutcome::Answered => "unexpected success",
        };
        write!(f, "{:?} action failed: {}", self.action, reason)
    }
}

impl Error for ActionFailed {}

fn write_file(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, bytes)
}

fn join_query(words: &[String]) -> String {
    words.join(" ")
}

fn run_question(action: HelpAction, args: QuestionArgs) -> Result<(), Box<dyn Error>> {
    let client = CompletionClient::new(args.completion_config())?;
    if client.config().api_key.is_none() {
        warn!("{} is not set; the endpoint will likely reject the request", API_KEY_ENV);
    }

    let assistant = Assistant::new(client)
        .with_layout(PageLayout::default().with_header_text(args.title.clone()))
        .with_pdf_export(!args.no_pdf);
    let mut surface = TerminalSurface::new(args.out_dir.clone());

    let query = join_query(&args.query);
    let outcome = assistant.handle(&mut surface, action, args.level, &query);
    info!(
        "{:?} action finished: {:?} ({} file(s) saved)",
        action,
        outcome,
        surface.saved.len()
    );

    if let Some(err) = surface.save_error {
        return Err(err.into());
    }
    if outcome != ActionOutcome::Answered {
        return Err(ActionFailed { action, outcome }.into());
    }
    Ok(())
}

fn run_render(input: &Path, output: &Path, title: String, raw: bool) -> Result<(), Box<dyn Error>> {
    let text = fs::read_to_string(input)?;
    let text = if raw { text } else { sanitize(&text) };

    let pdf = PdfBuilder::new(text)
        .with_layout(PageLayout::default().with_header_text(title))
        .render()?;
    write_file(output, &pdf.bytes)?;

    println!(
        "Wrote {} ({} page(s), {} bytes)",
        output.display(),
        pdf.page_count,
        pdf.bytes.len()
    );
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Ask(args) => run_question(HelpAction::Initial, args),
        Commands::More(args) => run_question(HelpAction::Detailed, args),
        Commands::Prompt {
            level,
            detailed,
            query,
        } => {
            let action = if detailed {
                HelpAction::Detailed
            } else {
                HelpAction::Initial
            };
            println!("{}", action.prompt(level, &join_query(&query)));
            Ok(())
        }
        Commands::Render {
            input,
            output,
            title,
            raw,
        } => run_render(&input, &output, title, raw),
    };

    if let Err(err) = result {
        eprintln!("Error: {}", err);
        print_error_sources(err.as_ref());
        std::process::exit(1);
    }
}

fn print_error_sources(mut error: &(dyn Error + 'static)) {
    while let Some(source) = error.source() {
        eprintln!("  caused by: {}", source);
        error = source;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ask_accepts_level_title_and_query() {
        let cli = Cli::try_parse_from([
            "learning-assistant",
            "ask",
            "--level",
            "teenager",
            "--title",
            "Homework help",
            "What",
            "is",
            "2+2?",
        ])
        .unwrap();

        let Commands::Ask(args) = cli.command else {
            panic!("expected the ask command");
        };
        assert_eq!(args.level, LearningLevel::Teenager);
        assert_eq!(args.title, "Homework help");
        assert_eq!(join_query(&args.query), "What is 2+2?");
    }

    #[test]
    fn unsuccessful_action_is_an_error() {
        let err = ActionFailed {
            action: HelpAction::Detailed,
            outcome: ActionOutcome::RequestFailed,
        };
        assert_eq!(err.to_string(), "Detailed action failed: the completion request failed");
    }

    #[test]
    fn failed_save_keeps_io_cause() {
        let blocker = std::env::temp_dir().join(format!(
            "learning-assistant-out-{}",
            std::process::id()
        ));
        fs::write(&blocker, b"not a directory").unwrap();

        let mut surface = TerminalSurface::new(blocker.join("nested"));
        surface.offer_download(Download {
            label: HelpAction::Initial.download_label(),
            file_name: HelpAction::Initial.file_name(),
            mime_type: "application/pdf",
            bytes: b"%PDF-1.3".to_vec(),
        });
        fs::remove_file(&blocker).unwrap();

        let err = surface.save_error.expect("save should fail");
        assert!(surface.saved.is_empty());
        assert!(err.source().is_some());
    }
}
