//! CLI module
//!
//! `krishi` command definitions. Without a subcommand the interactive
//! menu starts; every section is also reachable as a one-shot command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use crate::app::{self, render, Session};
use crate::assistant::AssistantKind;
use crate::config::AppConfig;
use crate::embedding::{EmbeddingProvider, GeminiEmbedding};
use crate::i18n::Language;
use crate::knowledge::{
    collect_sources, default_chunker, IndexBuilder, LanceIndex, SourceKind, VectorIndex,
    DEFAULT_TABLE,
};
use crate::news::{self, FilterMode, PAGE_SIZE};

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Parser)]
#[command(name = "krishi")]
#[command(version, about = "Bilingual agricultural assistant", long_about = None)]
pub struct Cli {
    /// Display and answer language (en, mr)
    #[arg(long, global = true, default_value = "en")]
    pub lang: Language,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Interactive menu (default)
    App,

    /// Ask the agriculture chatbot one question
    Chat {
        /// Question text
        #[arg(required = true)]
        message: Vec<String>,
    },

    /// Ask the government schemes assistant one question
    Schemes {
        /// Question text
        #[arg(required = true)]
        message: Vec<String>,
    },

    /// Detect crop disease in an image (jpg, jpeg, png)
    Detect {
        image: PathBuf,

        /// Print the prediction as JSON
        #[arg(long)]
        json: bool,
    },

    /// Agriculture news feed
    News {
        #[command(subcommand)]
        action: NewsAction,
    },

    /// Build the vector index from PDF / text documents
    Index {
        /// Folder to index (recursive)
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Single file to index
        #[arg(long)]
        file: Option<PathBuf>,

        /// Drop the existing index first
        #[arg(long)]
        rebuild: bool,
    },

    /// Show configuration and data status
    Status,
}

#[derive(Subcommand)]
pub enum NewsAction {
    /// Scrape the seed sites and overwrite the feed
    Fetch {
        /// Exclude every link on a seed domain, not only seed pages
        #[arg(long)]
        domain_filter: bool,
    },

    /// Print one page of the saved feed
    Show {
        #[arg(short, long, default_value = "1")]
        page: usize,
    },
}

// ============================================================================
// CLI Runner
// ============================================================================

pub async fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::from_env()?;
    let language = cli.lang;

    match cli.command.unwrap_or(Commands::App) {
        Commands::App => cmd_app(config, language).await,
        Commands::Chat { message } => {
            cmd_ask(config, language, AssistantKind::General, &message.join(" ")).await
        }
        Commands::Schemes { message } => {
            cmd_ask(config, language, AssistantKind::Schemes, &message.join(" ")).await
        }
        Commands::Detect { image, json } => cmd_detect(config, language, image, json).await,
        Commands::News { action } => match action {
            NewsAction::Fetch { domain_filter } => {
                let mode = if domain_filter {
                    FilterMode::SeedDomain
                } else {
                    FilterMode::SeedUrl
                };
                cmd_news_fetch(config, language, mode).await
            }
            NewsAction::Show { page } => cmd_news_show(&config, language, page),
        },
        Commands::Index { dir, file, rebuild } => cmd_index(&config, dir, file, rebuild).await,
        Commands::Status => cmd_status(&config).await,
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

async fn cmd_app(config: AppConfig, language: Language) -> Result<()> {
    let mut session = Session::new(config, language);
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    app::run_interactive(&mut session, stdin).await
}

async fn cmd_ask(
    config: AppConfig,
    language: Language,
    kind: AssistantKind,
    message: &str,
) -> Result<()> {
    config.require_gemini_key()?;
    config.require_groq_key()?;

    let mut session = Session::new(config, language);
    match session.ask(kind, message).await? {
        Some(answer) => println!("{}", answer),
        None => println!("[!] Empty question"),
    }

    Ok(())
}

async fn cmd_detect(
    config: AppConfig,
    language: Language,
    image: PathBuf,
    json: bool,
) -> Result<()> {
    if !image.exists() {
        bail!("Image not found: {}", image.display());
    }

    let strings = language.strings();
    let mut session = Session::new(config, language);

    if !json {
        println!("[*] {}", strings.analyzing);
    }

    let prediction = session
        .detect(&image)
        .await
        .with_context(|| format!("Detection failed for {}", image.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&prediction)?);
    } else {
        println!("{}", render::prediction_block(&prediction, strings));
    }

    Ok(())
}

async fn cmd_news_fetch(config: AppConfig, language: Language, mode: FilterMode) -> Result<()> {
    let strings = language.strings();
    println!("[*] {} ({} sites)", strings.fetch_latest, news::SEED_SITES.len());

    let out_path = config.news_csv.clone();
    let mut session = Session::new(config, language);
    let report = session.fetch_news(mode).await?;

    println!(
        "[OK] {} {} articles -> {}",
        strings.success_news,
        report.articles_saved,
        out_path.display()
    );
    println!(
        "     sites: {} ({} failed), links: {} ({} filtered)",
        report.sites_visited, report.sites_failed, report.links_found, report.links_filtered
    );

    Ok(())
}

fn cmd_news_show(config: &AppConfig, language: Language, page: usize) -> Result<()> {
    let articles = news::read_articles(&config.news_csv)?;
    let page = news::paginate(&articles, page, PAGE_SIZE);
    let updated = news::last_updated(&config.news_csv);

    println!("{}", render::news_page(&page, language.strings(), updated));
    Ok(())
}

/// Index command
///
/// Extracts PDF pages and text files, chunks and embeds them, and stores
/// the chunks in the LanceDB table the assistants read from.
async fn cmd_index(
    config: &AppConfig,
    dir: Option<PathBuf>,
    file: Option<PathBuf>,
    rebuild: bool,
) -> Result<()> {
    let files = match (dir, file) {
        (Some(dir), None) => {
            if !dir.is_dir() {
                bail!("Not a directory: {}", dir.display());
            }
            collect_sources(&dir)?
        }
        (None, Some(file)) => {
            if !file.is_file() {
                bail!("File not found: {}", file.display());
            }
            if SourceKind::from_path(&file).is_none() {
                bail!("Unsupported file type: {} (pdf, txt, md)", file.display());
            }
            vec![file]
        }
        _ => bail!("Specify exactly one of --dir or --file"),
    };

    if files.is_empty() {
        println!("[!] No documents to index.");
        return Ok(());
    }

    let api_key = config.require_gemini_key()?.to_string();

    let index: Arc<dyn VectorIndex> = Arc::new(
        LanceIndex::open(&config.index_dir, DEFAULT_TABLE)
            .await
            .context("Failed to open vector index")?,
    );
    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(GeminiEmbedding::new(api_key)?);
    let builder = IndexBuilder::new(index.clone(), embedder, default_chunker());

    if rebuild {
        println!("[*] Dropping existing index...");
        builder.reset().await?;
    }

    println!("[*] Indexing {} files...", files.len());
    let stats = builder.build(&files).await?;

    println!(
        "[OK] {} files indexed ({} pages, {} chunks)",
        stats.files_indexed, stats.pages, stats.chunks
    );
    if stats.files_failed > 0 {
        println!("[!] {} files failed (see log)", stats.files_failed);
    }
    println!("     Total chunks in index: {}", index.count().await?);

    Ok(())
}

/// Status command
async fn cmd_status(config: &AppConfig) -> Result<()> {
    println!("krishi-sahayak v{}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("[*] Data directory: {}", config.data_dir.display());

    if config.gemini_api_key.is_some() {
        println!("[OK] Embedding API key: set");
    } else {
        println!("[!] Embedding API key: not set");
        println!("    Setup: export GEMINI_API_KEY=your-key");
    }

    if config.groq_api_key.is_some() {
        println!("[OK] LLM API key: set (model: {})", config.groq_model);
    } else {
        println!("[!] LLM API key: not set");
        println!("    Setup: export GROQ_API_KEY=your-key");
    }

    // Vector index
    if config.index_dir.exists() {
        match LanceIndex::open_existing(&config.index_dir, DEFAULT_TABLE).await {
            Ok(index) => match index.count().await {
                Ok(n) => println!("[OK] Vector index: {} chunks", n),
                Err(e) => println!("[!] Vector index unreadable: {}", e),
            },
            Err(e) => println!("[!] {}", e),
        }
    } else {
        println!("[!] Vector index: not built ({})", config.index_dir.display());
    }

    // Disease model
    if config.labels_path.exists() {
        println!("[OK] Labels: {}", config.labels_path.display());
    } else {
        println!("[!] Labels: missing ({})", config.labels_path.display());
    }
    println!("[*] Model endpoint: {}", config.model_url);

    // News feed
    match news::read_articles(&config.news_csv) {
        Ok(articles) if !articles.is_empty() => {
            let updated = news::last_updated(&config.news_csv)
                .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "unknown".to_string());
            println!("[OK] News feed: {} articles (updated {})", articles.len(), updated);
        }
        Ok(_) => println!("[!] News feed: empty (run `krishi news fetch`)"),
        Err(e) => println!("[!] News feed unreadable: {}", e),
    }

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_default_is_app() {
        let cli = Cli::try_parse_from(["krishi"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.lang, Language::English);
    }

    #[test]
    fn test_global_lang_flag() {
        let cli = Cli::try_parse_from(["krishi", "news", "show", "--page", "2", "--lang", "mr"]).unwrap();
        assert_eq!(cli.lang, Language::Marathi);
        match cli.command {
            Some(Commands::News {
                action: NewsAction::Show { page },
            }) => assert_eq!(page, 2),
            _ => panic!("expected news show"),
        }
    }

    #[test]
    fn test_chat_joins_words() {
        let cli = Cli::try_parse_from(["krishi", "chat", "best", "fertilizer", "for", "wheat"]).unwrap();
        match cli.command {
            Some(Commands::Chat { message }) => assert_eq!(message.join(" "), "best fertilizer for wheat"),
            _ => panic!("expected chat"),
        }
    }

    #[test]
    fn test_rejects_unknown_language() {
        assert!(Cli::try_parse_from(["krishi", "--lang", "fr", "status"]).is_err());
    }

    fn keyless_config(dir: &tempfile::TempDir) -> AppConfig {
        AppConfig {
            data_dir: dir.path().to_path_buf(),
            news_csv: dir.path().join("news.csv"),
            index_dir: dir.path().join("index.lance"),
            labels_path: dir.path().join("labels.txt"),
            model_url: crate::config::DEFAULT_MODEL_URL.to_string(),
            infected_indices: None,
            groq_model: crate::config::DEFAULT_GROQ_MODEL.to_string(),
            gemini_api_key: None,
            groq_api_key: None,
        }
    }

    #[tokio::test]
    async fn test_ask_without_keys_gives_setup_hint() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = cmd_ask(keyless_config(&dir), Language::English, AssistantKind::General, "hi")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("GEMINI_API_KEY"));

        let config = AppConfig {
            gemini_api_key: Some("test-key".to_string()),
            ..keyless_config(&dir)
        };
        let err = cmd_ask(config, Language::English, AssistantKind::General, "hi")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("GROQ_API_KEY"));
    }

    #[tokio::test]
    async fn test_index_requires_one_source() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = keyless_config(&dir);

        assert!(cmd_index(&config, None, None, false).await.is_err());
        // an empty folder is not an error
        assert!(cmd_index(&config, Some(dir.path().to_path_buf()), None, false)
            .await
            .is_ok());
    }
}
