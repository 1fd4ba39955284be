use anyhow::{Context, Result, bail};
use polish_ai_client::{HttpTransformer, polish_field_selection, polish_page_selection};
use polish_ai_config::Config;
use polish_ai_engine::{Document, FieldKind, NodeId, ProcessResult};
use std::sync::{Mutex, PoisonError};
use std::{env, fs, path::PathBuf, process};

/// What to polish, taken from the command line.
#[derive(Debug, PartialEq, Eq)]
enum Command {
    /// Find `selected_text` in the file's paragraphs, as the context menu does.
    Page { file: PathBuf, selected_text: String },
    /// Treat the file as one textarea with `start..end` selected.
    Field {
        file: PathBuf,
        start: usize,
        end: usize,
    },
}

impl Command {
    fn parse(args: &[String]) -> Result<Self> {
        match args {
            [_, flag, file, start, end] if flag == "--field" => Ok(Command::Field {
                file: PathBuf::from(file),
                start: start
                    .parse()
                    .with_context(|| format!("Invalid start offset '{start}'"))?,
                end: end
                    .parse()
                    .with_context(|| format!("Invalid end offset '{end}'"))?,
            }),
            [_, file, selected_text] if !file.starts_with("--") => Ok(Command::Page {
                file: PathBuf::from(file),
                selected_text: selected_text.clone(),
            }),
            _ => bail!("Unrecognised arguments"),
        }
    }

    fn file(&self) -> &PathBuf {
        match self {
            Command::Page { file, .. } | Command::Field { file, .. } => file,
        }
    }
}

fn usage(program: &str) {
    eprintln!("Usage: {program} <file> <selected-text>");
    eprintln!("       {program} --field <file> <start> <end>");
}

/// A document holding `content` in a single focused textarea with
/// `start..end` selected.
fn field_document(content: &str, start: usize, end: usize) -> Result<(Document, NodeId)> {
    let mut doc = Document::new();
    let body = doc.body();
    let field = doc.append_field(body, FieldKind::TextArea, content)?;
    doc.focus(field)?;
    doc.set_field_selection(field, start..end)?;
    Ok((doc, field))
}

async fn run(command: &Command, transformer: &HttpTransformer) -> Result<(String, ProcessResult)> {
    let content = fs::read_to_string(command.file())
        .with_context(|| format!("Failed to read '{}'", command.file().display()))?;

    match command {
        Command::Page { selected_text, .. } => {
            let doc = Mutex::new(Document::from_paragraphs(&content));
            let result = polish_page_selection(&doc, transformer, selected_text).await;
            let doc = doc.into_inner().unwrap_or_else(PoisonError::into_inner);
            Ok((doc.text_content(doc.body()), result))
        }
        Command::Field { start, end, .. } => {
            let (doc, field) = field_document(&content, *start, *end)?;
            let doc = Mutex::new(doc);
            let result = polish_field_selection(&doc, transformer).await;
            let doc = doc.into_inner().unwrap_or_else(PoisonError::into_inner);
            Ok((doc.field_value(field)?, result))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args: Vec<String> = env::args().collect();
    let program = args.first().map_or("polish-ai-cli", String::as_str);

    let command = match Command::parse(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("Error: {e:#}");
            usage(program);
            process::exit(1);
        }
    };

    let config = match Config::load_or_default() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            process::exit(1);
        }
    };
    log::info!("Using service endpoint {}", config.endpoint);

    let transformer = HttpTransformer::from_config(&config)?;
    let (content, result) = run(&command, &transformer).await?;

    println!("{content}");
    println!("{}", serde_json::to_string(&result)?);

    if !result.success {
        process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_page_command() {
        let command = Command::parse(&args(&["polish-ai-cli", "notes.txt", "some words"])).unwrap();
        assert_eq!(
            command,
            Command::Page {
                file: PathBuf::from("notes.txt"),
                selected_text: "some words".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_field_command() {
        let command =
            Command::parse(&args(&["polish-ai-cli", "--field", "draft.txt", "3", "6"])).unwrap();
        assert_eq!(
            command,
            Command::Field {
                file: PathBuf::from("draft.txt"),
                start: 3,
                end: 6,
            }
        );
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(Command::parse(&args(&["polish-ai-cli"])).is_err());
        assert!(Command::parse(&args(&["polish-ai-cli", "--field", "a.txt", "x", "2"])).is_err());
        assert!(Command::parse(&args(&["polish-ai-cli", "--field", "a.txt"])).is_err());
    }

    #[test]
    fn test_field_document_selects_range() {
        let (doc, field) = field_document("abcXYZdef", 3, 6).unwrap();
        assert_eq!(doc.active_element(), Some(field));
        assert_eq!(doc.field_selection(field).unwrap(), 3..6);
    }
}
