//! citespan CLI - PDF span indexing and citation tool

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use citespan::{
    render, sniff_path, CitationEngine, CoordinateOrigin, DocumentEntry, ExtractOptions,
    JsonFormat, Projection, RenderOptions, Resolution, Segment, SledSpanStore, SpanExtractor,
    SpanLocation, SpanRef, SpanStore,
};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "citespan")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Index PDF word spans and resolve citations in generated text", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract word spans from a PDF as JSON
    Extract {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Document id (defaults to the file stem)
        #[arg(long)]
        id: Option<String>,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,

        #[command(flatten)]
        extract: ExtractArgs,
    },

    /// Index one or more PDFs into a span store
    Index {
        /// Input PDF files
        #[arg(value_name = "FILE", required = true)]
        inputs: Vec<PathBuf>,

        /// Span store directory
        #[arg(short, long, env = "CITESPAN_STORE", value_name = "DIR")]
        store: PathBuf,

        #[command(flatten)]
        extract: ExtractArgs,
    },

    /// List indexed documents, or dump the spans of one
    Spans {
        /// Document id (lists documents if not specified)
        #[arg(value_name = "ID")]
        id: Option<String>,

        /// Span store directory
        #[arg(short, long, env = "CITESPAN_STORE", value_name = "DIR")]
        store: PathBuf,

        /// Only this page
        #[arg(long)]
        page: Option<u32>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Parse citations in generated text
    Parse {
        /// Text file (stdin if not specified)
        #[arg(value_name = "FILE")]
        input: Option<PathBuf>,

        /// JSON array of span references backing numbered markers
        #[arg(long, value_name = "FILE")]
        spans: Option<PathBuf>,

        /// JSON array of {id, display_name} documents in scope
        #[arg(short, long, value_name = "FILE")]
        documents: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "markdown")]
        format: OutputFormat,

        /// Link prefix for clickable citations
        #[arg(long, default_value = "#cite/")]
        link_prefix: String,
    },

    /// Resolve a document reference against known documents
    Resolve {
        /// Reference as written in a citation
        #[arg(value_name = "REFERENCE")]
        reference: String,

        /// JSON array of {id, display_name} documents in scope
        #[arg(short, long, value_name = "FILE")]
        documents: PathBuf,
    },

    /// Project a character range onto its page rectangle
    Highlight {
        /// Document id
        #[arg(value_name = "ID")]
        id: String,

        /// 1-indexed page
        page: u32,

        /// Inclusive start offset
        start: usize,

        /// Exclusive end offset
        end: usize,

        /// Span store directory
        #[arg(short, long, env = "CITESPAN_STORE", value_name = "DIR")]
        store: PathBuf,
    },

    /// Show document information
    Info {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Show version information
    Version,
}

#[derive(clap::Args)]
struct ExtractArgs {
    /// Report rectangles with a top-left origin
    #[arg(long)]
    top_left: bool,

    /// Drop whitespace-only runs
    #[arg(long)]
    skip_blank: bool,

    /// Process pages one at a time
    #[arg(long)]
    sequential: bool,
}

impl ExtractArgs {
    fn options(&self) -> ExtractOptions {
        let mut options = ExtractOptions::new().with_skip_blank_runs(self.skip_blank);
        if self.top_left {
            options = options.with_origin(CoordinateOrigin::TopLeft);
        }
        if self.sequential {
            options = options.sequential();
        }
        options
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Markdown with citation links
    Markdown,
    /// Plain text
    Text,
    /// JSON segments
    Json,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Extract {
            input,
            id,
            output,
            compact,
            extract,
        } => cmd_extract(&input, id, output.as_deref(), compact, &extract),
        Commands::Index {
            inputs,
            store,
            extract,
        } => cmd_index(&inputs, &store, &extract),
        Commands::Spans {
            id,
            store,
            page,
            compact,
        } => cmd_spans(id.as_deref(), &store, page, compact),
        Commands::Parse {
            input,
            spans,
            documents,
            format,
            link_prefix,
        } => cmd_parse(
            input.as_deref(),
            spans.as_deref(),
            documents.as_deref(),
            format,
            link_prefix,
        ),
        Commands::Resolve {
            reference,
            documents,
        } => cmd_resolve(&reference, &documents),
        Commands::Highlight {
            id,
            page,
            start,
            end,
            store,
        } => cmd_highlight(&id, SpanLocation::new(page, start, end), &store),
        Commands::Info { input } => cmd_info(&input),
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

/// Document id for a file: its stem.
fn document_id_for(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn json_format(compact: bool) -> JsonFormat {
    if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    }
}

fn write_output(output: Option<&Path>, content: &str) -> CliResult<()> {
    if let Some(path) = output {
        fs::write(path, content)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", content);
    }
    Ok(())
}

fn load_documents(path: &Path) -> CliResult<Vec<DocumentEntry>> {
    let data = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

fn load_span_list(path: &Path) -> CliResult<Vec<SpanRef>> {
    let data = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

fn open_store(path: &Path) -> CliResult<Arc<SledSpanStore>> {
    Ok(Arc::new(SledSpanStore::open(path)?))
}

fn cmd_extract(
    input: &Path,
    id: Option<String>,
    output: Option<&Path>,
    compact: bool,
    args: &ExtractArgs,
) -> CliResult<()> {
    let id = id.unwrap_or_else(|| document_id_for(input));
    let document = SpanExtractor::with_options(args.options()).extract_file(&id, input)?;

    let json = render::value_to_json(&document, json_format(compact))?;
    write_output(output, &json)
}

fn cmd_index(inputs: &[PathBuf], store: &Path, args: &ExtractArgs) -> CliResult<()> {
    let store = open_store(store)?;
    let engine = CitationEngine::with_store(store.clone()).with_extract_options(args.options());

    let pb = ProgressBar::new(inputs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let mut failed = 0;
    for input in inputs {
        let id = document_id_for(input);
        pb.set_message(id.clone());
        match engine.ingest_file(&id, input) {
            Ok(manifest) => pb.println(format!(
                "{} {} ({} pages, {} spans)",
                "Indexed".green(),
                id,
                manifest.page_count,
                manifest.span_count
            )),
            Err(e) => {
                failed += 1;
                pb.println(format!("{} {}: {}", "Failed".red(), id, e));
            }
        }
        pb.inc(1);
    }
    store.flush()?;
    pb.finish_with_message("Done!");

    if failed > 0 {
        return Err(format!("{} of {} documents failed", failed, inputs.len()).into());
    }
    Ok(())
}

fn cmd_spans(id: Option<&str>, store: &Path, page: Option<u32>, compact: bool) -> CliResult<()> {
    let store = open_store(store)?;

    let Some(id) = id else {
        println!("{}", "Indexed Documents".cyan().bold());
        println!("{}", "─".repeat(40).dimmed());
        for document_id in store.documents()? {
            if let Some(manifest) = store.manifest(&document_id)? {
                println!(
                    "{}: {} pages, {} spans, {}",
                    document_id.bold(),
                    manifest.page_count,
                    manifest.span_count,
                    manifest.indexed_at.format("%Y-%m-%d %H:%M:%S")
                );
            }
        }
        return Ok(());
    };

    if !store.contains(id)? {
        return Err(format!("document '{}' is not indexed", id).into());
    }
    let spans = match page {
        Some(page) => store.query_page(id, page)?,
        None => store.query(id)?,
    };
    println!("{}", render::value_to_json(&spans, json_format(compact))?);
    Ok(())
}

fn cmd_parse(
    input: Option<&Path>,
    spans: Option<&Path>,
    documents: Option<&Path>,
    format: OutputFormat,
    link_prefix: String,
) -> CliResult<()> {
    let text = match input {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };
    let span_list = spans.map(load_span_list).transpose()?;
    let documents = documents.map(load_documents).transpose()?.unwrap_or_default();

    let options = RenderOptions::new().with_link_prefix(link_prefix);
    let segments = CitationEngine::new().parse(&text, span_list.as_deref(), &documents);

    let rendered = match format {
        OutputFormat::Markdown => render::to_markdown(&segments, &options)?,
        OutputFormat::Text => render::to_text(&segments)?,
        OutputFormat::Json => render::to_json(&segments, JsonFormat::Pretty)?,
    };
    println!("{}", rendered);

    let citations = segments.iter().filter_map(Segment::as_citation);
    let (total, clickable) = citations.fold((0, 0), |(total, clickable), c| {
        (total + 1, clickable + usize::from(c.is_clickable()))
    });
    log::info!("{} citations, {} clickable", total, clickable);
    Ok(())
}

fn cmd_resolve(reference: &str, documents: &Path) -> CliResult<()> {
    let documents = load_documents(documents)?;

    match citespan::resolve_reference(reference, &documents) {
        Resolution::Exact(id) => println!("{} {}", "Exact".green().bold(), id),
        Resolution::Fuzzy(id) => println!("{} {}", "Fuzzy".yellow().bold(), id),
        Resolution::Unresolved => println!("{}", "Unresolved".red()),
    }
    Ok(())
}

fn cmd_highlight(id: &str, location: SpanLocation, store: &Path) -> CliResult<()> {
    let engine = CitationEngine::with_store(open_store(store)?);

    match engine.projector().project(id, location) {
        Projection::Highlight(region) => {
            println!("{}", "Highlight".cyan().bold());
            println!("{}", "─".repeat(40).dimmed());
            println!("{}: {}", "Page".bold(), region.page);
            println!(
                "{}: x={:.2} y={:.2} w={:.2} h={:.2}",
                "Box".bold(),
                region.bbox.x,
                region.bbox.y,
                region.bbox.width,
                region.bbox.height
            );
            println!("{}: {}", "Spans".bold(), region.spans.len());
            println!("{}: {:?}", "Text".bold(), region.text());
        }
        Projection::NoHighlight => println!("{}", "No highlight available".yellow()),
    }
    Ok(())
}

fn cmd_info(input: &Path) -> CliResult<()> {
    let header = sniff_path(input)?;
    let document = SpanExtractor::new().extract_file(&document_id_for(input), input)?;

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Format".bold(), header);
    println!("{}: {}", "Pages".bold(), document.page_count());
    println!("{}: {}", "Spans".bold(), document.span_count());

    println!();
    println!("{}", "Pages".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    for page in &document.pages {
        println!(
            "{} {}: {} spans, {} chars",
            "Page".bold(),
            page.page_number,
            page.spans.len(),
            page.text_len()
        );
    }

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "citespan".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("PDF span index and citation tool");
    println!();
    println!("Repository: {}", "https://github.com/iyulab/citespan".dimmed());
    println!("License: MIT");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_document_id_from_stem() {
        assert_eq!(document_id_for(Path::new("/tmp/annual-report.pdf")), "annual-report");
    }

    #[test]
    fn test_load_documents_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("docs.json");
        fs::write(&path, r#"[{"id": "x", "display_name": "Acme"}]"#).unwrap();

        let documents = load_documents(&path).unwrap();
        assert_eq!(documents, vec![DocumentEntry::new("x", "Acme")]);
    }

    #[test]
    fn test_load_span_list_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("spans.json");
        fs::write(&path, r#"[{"document": "x", "page": 2, "start": 0, "end": 5}]"#).unwrap();

        assert_eq!(load_span_list(&path).unwrap(), vec![SpanRef::new("x", 2, 0, 5)]);
    }

    #[test]
    fn test_extract_args_options() {
        let args = ExtractArgs {
            top_left: true,
            skip_blank: true,
            sequential: true,
        };
        let options = args.options();
        assert_eq!(options.origin, CoordinateOrigin::TopLeft);
        assert!(options.skip_blank_runs);
        assert!(!options.parallel);
    }
}
