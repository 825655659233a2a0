// ABOUTME: Main entry point for the slidewise program.
// ABOUTME: Provides CLI interface for generating, serving and presenting decks.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use url::Url;

use slidewise::config::{AppConfig, DeckConfig, Language, RevealOverrides};
use slidewise::errors::SlideError;
use slidewise::session::PresentationSession;
use slidewise::{browser, html, lang, serve, utils};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the deck skeleton HTML page
    GenerateHtml(GenerateHtmlArgs),

    /// Serve the deck directory and watch for content changes
    Serve(ServeArgs),

    /// Serve the deck and present it in a browser with adaptive layout
    Present(PresentArgs),
}

#[derive(Args)]
struct DeckArgs {
    /// Deck display title
    #[arg(short, long)]
    title: Option<String>,

    /// Chapter identifiers in presentation order
    #[arg(short, long = "chapter", value_delimiter = ',', required = true)]
    chapters: Vec<String>,

    /// Deck languages as code=Label pairs, in toggle cycle order
    #[arg(long = "lang", value_delimiter = ',')]
    langs: Vec<String>,

    /// Override the renderer's slide width
    #[arg(long)]
    width: Option<u32>,

    /// Override the renderer's slide height
    #[arg(long)]
    height: Option<u32>,

    /// Override the renderer's margin
    #[arg(long)]
    margin: Option<f64>,

    /// Override the renderer's global vertical centering
    #[arg(long)]
    center: Option<bool>,

    /// Override whether slide numbers are shown
    #[arg(long)]
    slide_number: Option<bool>,
}

impl DeckArgs {
    fn to_deck_config(&self) -> Result<DeckConfig, SlideError> {
        let mut langs = Vec::new();
        for entry in &self.langs {
            match entry.split_once('=') {
                Some((code, label)) if !code.is_empty() && !label.is_empty() => {
                    langs.push(Language::new(code, label));
                }
                _ => {
                    return Err(SlideError::ConfigError(format!(
                        "Invalid language entry {:?}; expected code=Label",
                        entry
                    )));
                }
            }
        }

        let config = DeckConfig {
            title: self.title.clone(),
            langs,
            chapters: self.chapters.clone(),
            reveal: RevealOverrides {
                width: self.width,
                height: self.height,
                margin: self.margin,
                center: self.center,
                slide_number: self.slide_number,
                ..Default::default()
            },
        };
        config.validate()?;
        Ok(config)
    }
}

#[derive(Args)]
struct GenerateHtmlArgs {
    #[command(flatten)]
    deck: DeckArgs,

    /// Path to output HTML file
    #[arg(short, long)]
    output: PathBuf,

    /// Language to generate the page for (defaults to the first configured)
    #[arg(long)]
    active_lang: Option<String>,
}

#[derive(Args)]
struct ServeArgs {
    #[command(flatten)]
    deck: DeckArgs,

    /// Deck directory containing the content sources
    #[arg(short, long, default_value = ".")]
    dir: PathBuf,

    /// Port for the local web server
    #[arg(short, long, default_value_t = 8080)]
    port: u16,
}

#[derive(Args)]
struct PresentArgs {
    #[command(flatten)]
    deck: DeckArgs,

    /// Deck directory containing the content sources
    #[arg(short, long, default_value = ".")]
    dir: PathBuf,

    /// Port for the local web server (0 picks a free one)
    #[arg(short, long, default_value_t = 0)]
    port: u16,

    /// Language to open the deck in
    #[arg(long)]
    active_lang: Option<String>,

    /// Run the browser headless (for CI smoke runs)
    #[arg(long)]
    headless: bool,
}

fn generate_html(args: &GenerateHtmlArgs) -> Result<(), SlideError> {
    let deck = args.deck.to_deck_config()?;

    // The page is generated as one request for it would be: a URL carrying
    // the language selection in the query.
    let page_url = match &args.active_lang {
        Some(code) => format!("http://localhost/?lang={}", code),
        None => "http://localhost/".to_string(),
    };
    let page_url = Url::parse(&page_url)
        .map_err(|e| SlideError::ConfigError(format!("Invalid language code: {}", e)))?;

    let active = lang::resolve_language(&deck, &page_url);
    let toggle = lang::build_toggle(&deck, &active, &page_url);
    let page = html::generate_deck_html(&deck, &active, toggle.as_ref())?;

    utils::ensure_parent_directory_exists(&args.output)?;
    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() {
            utils::validate_directory_writable(parent)?;
        }
    }
    html::write_html_to_file(&page, &args.output)?;

    println!("Deck page generated: {:?}", args.output);
    Ok(())
}

fn serve(args: &ServeArgs) -> Result<(), SlideError> {
    let deck = args.deck.to_deck_config()?;
    let serve_config = serve::ServeConfig {
        deck_dir: args.dir.clone(),
        port: args.port,
        ..Default::default()
    };
    serve::start_server(deck, &serve_config)?;
    serve::watch_deck(&serve_config)
}

fn present(args: &PresentArgs) -> Result<(), SlideError> {
    let deck = args.deck.to_deck_config()?;
    let app = AppConfig::from_env();

    let serve_config = serve::ServeConfig {
        deck_dir: args.dir.clone(),
        port: args.port,
        ..Default::default()
    };
    let port = serve::start_server(deck.clone(), &serve_config)?;

    let page_url = match &args.active_lang {
        Some(code) => format!("http://localhost:{}/?lang={}", port, code),
        None => format!("http://localhost:{}/", port),
    };

    let options = deck.reveal.merge();
    let renderer = browser::BrowserRenderer::launch(
        &app,
        &page_url,
        options.width,
        options.height,
        args.headless,
    )?;

    let mut session = PresentationSession::new(renderer, deck, app);
    session.run()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let result = match &cli.command {
        Some(Commands::GenerateHtml(args)) => {
            println!("Executing generate-html command...");
            generate_html(args)
        }
        Some(Commands::Serve(args)) => {
            println!("Executing serve command...");
            serve(args)
        }
        Some(Commands::Present(args)) => {
            println!("Executing present command...");
            present(args)
        }
        None => {
            println!("No command specified. Use --help for usage information.");
            Ok(())
        }
    };

    match result {
        Ok(()) => Ok(()),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
