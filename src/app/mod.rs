//! UI shell - section navigation, language toggle, per-session state
//!
//! `Session` owns everything that lives for one user session: the display
//! language, the selected section, both chat histories and the loaded
//! detector. Adapters are created on first use and reused afterwards.

pub mod render;

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tracing::Instrument;
use uuid::Uuid;

use crate::assistant::{AssistantKind, AssistantSession};
use crate::config::AppConfig;
use crate::disease::{DiseaseDetector, Prediction};
use crate::embedding::GeminiEmbedding;
use crate::i18n::{Language, Strings};
use crate::knowledge::{ContextSource, LanceIndex, Retriever, DEFAULT_TABLE};
use crate::llm::{ChatModel, GroqChat};
use crate::news::{self, FilterMode, NewsArticle, NewsScraper, ScrapeReport, PAGE_SIZE};

// ============================================================================
// Section
// ============================================================================

/// Sidebar entries, in menu order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Section {
    #[default]
    Chatbot,
    DiseaseDetection,
    Schemes,
    News,
}

impl Section {
    pub const ALL: [Section; 4] = [
        Section::Chatbot,
        Section::DiseaseDetection,
        Section::Schemes,
        Section::News,
    ];

    pub fn label(self, strings: &Strings) -> &'static str {
        match self {
            Section::Chatbot => strings.ai_chatbot,
            Section::DiseaseDetection => strings.crop_detection,
            Section::Schemes => strings.govt_schemes,
            Section::News => strings.agri_news,
        }
    }

    /// Menu choice `1..=4`
    pub fn from_choice(choice: &str) -> Option<Self> {
        let n: usize = choice.trim().parse().ok()?;
        n.checked_sub(1).and_then(|i| Self::ALL.get(i).copied())
    }
}

// ============================================================================
// Session
// ============================================================================

pub struct Session {
    id: Uuid,
    language: Language,
    section: Section,
    config: AppConfig,
    news_page: usize,
    context: Option<Arc<dyn ContextSource>>,
    model: Option<Arc<dyn ChatModel>>,
    chatbot: Option<AssistantSession>,
    schemes: Option<AssistantSession>,
    detector: Option<DiseaseDetector>,
}

impl Session {
    pub fn new(config: AppConfig, language: Language) -> Self {
        Self {
            id: Uuid::new_v4(),
            language,
            section: Section::default(),
            config,
            news_page: 1,
            context: None,
            model: None,
            chatbot: None,
            schemes: None,
            detector: None,
        }
    }

    /// Use this context source instead of opening the on-disk index
    pub fn with_context(mut self, context: Arc<dyn ContextSource>) -> Self {
        self.context = Some(context);
        self
    }

    pub fn with_chat_model(mut self, model: Arc<dyn ChatModel>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn with_detector(mut self, detector: DiseaseDetector) -> Self {
        self.detector = Some(detector);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn strings(&self) -> &'static Strings {
        self.language.strings()
    }

    pub fn toggle_language(&mut self) -> Language {
        self.language = self.language.toggle();
        tracing::debug!("Language switched to {}", self.language);
        self.language
    }

    pub fn section(&self) -> Section {
        self.section
    }

    pub fn set_section(&mut self, section: Section) {
        self.section = section;
    }

    // ------------------------------------------------------------------------
    // Assistants
    // ------------------------------------------------------------------------

    async fn context_source(&mut self) -> Result<Arc<dyn ContextSource>> {
        if let Some(context) = &self.context {
            return Ok(context.clone());
        }

        let api_key = self.config.require_gemini_key()?.to_string();
        let index = LanceIndex::open_existing(&self.config.index_dir, DEFAULT_TABLE).await?;
        let embedder = GeminiEmbedding::new(api_key)?;
        let context: Arc<dyn ContextSource> =
            Arc::new(Retriever::new(Arc::new(index), Arc::new(embedder)));

        self.context = Some(context.clone());
        Ok(context)
    }

    fn chat_model(&mut self) -> Result<Arc<dyn ChatModel>> {
        if let Some(model) = &self.model {
            return Ok(model.clone());
        }

        let api_key = self.config.require_groq_key()?.to_string();
        let model: Arc<dyn ChatModel> =
            Arc::new(GroqChat::new(api_key, self.config.groq_model.clone())?);
        self.model = Some(model.clone());
        Ok(model)
    }

    fn slot(&mut self, kind: AssistantKind) -> &mut Option<AssistantSession> {
        match kind {
            AssistantKind::General => &mut self.chatbot,
            AssistantKind::Schemes => &mut self.schemes,
        }
    }

    /// The session's assistant of this kind, created on first use
    pub async fn assistant(&mut self, kind: AssistantKind) -> Result<&mut AssistantSession> {
        if self.slot(kind).is_none() {
            let context = self.context_source().await?;
            let model = self.chat_model()?;
            tracing::info!("Starting {:?} assistant (model: {})", kind, model.name());
            *self.slot(kind) = Some(AssistantSession::new(kind, context, model));
        }

        self.slot(kind)
            .as_mut()
            .ok_or_else(|| anyhow!("{:?} assistant unavailable", kind))
    }

    pub async fn ask(&mut self, kind: AssistantKind, input: &str) -> Result<Option<String>> {
        let language = self.language;
        self.assistant(kind).await?.ask(input, language).await
    }

    /// Drop one assistant's history; a no-op before its first turn
    pub fn clear_conversation(&mut self, kind: AssistantKind) {
        if let Some(assistant) = self.slot(kind) {
            assistant.clear_history();
        }
    }

    // ------------------------------------------------------------------------
    // Detection
    // ------------------------------------------------------------------------

    /// The crop disease detector, loaded on first use
    pub fn detector(&mut self) -> Result<&DiseaseDetector> {
        if self.detector.is_none() {
            self.detector = Some(DiseaseDetector::from_config(&self.config)?);
        }

        self.detector
            .as_ref()
            .ok_or_else(|| anyhow!("disease detector unavailable"))
    }

    pub async fn detect(&mut self, image: &Path) -> Result<Prediction> {
        let detector = self.detector()?;
        Ok(detector.predict_path(image).await?)
    }

    // ------------------------------------------------------------------------
    // News
    // ------------------------------------------------------------------------

    pub fn news(&self) -> Result<Vec<NewsArticle>> {
        news::read_articles(&self.config.news_csv)
    }

    pub async fn fetch_news(&mut self, mode: FilterMode) -> Result<ScrapeReport> {
        let scraper = NewsScraper::new()?.with_filter_mode(mode);
        let report = scraper.run(self.language, &self.config.news_csv).await?;
        self.news_page = 1;
        Ok(report)
    }

    pub fn news_page(&self) -> usize {
        self.news_page
    }

    /// Move `delta` pages, clamped to the current feed
    pub fn turn_news_page(&mut self, delta: isize, total_pages: usize) -> usize {
        let target = self.news_page as isize + delta;
        self.news_page = target.clamp(1, total_pages.max(1) as isize) as usize;
        self.news_page
    }
}

// ============================================================================
// Interactive Loop
// ============================================================================

enum Flow {
    Back,
    Quit,
}

fn prompt(label: &str) {
    print!("{} ", label);
    let _ = std::io::stdout().flush();
}

/// Menu-driven session over line input (stdin in the binary)
pub async fn run_interactive<R>(session: &mut Session, input: R) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let span = tracing::info_span!("session", id = %session.id());
    interactive_loop(session, input).instrument(span).await
}

async fn interactive_loop<R>(session: &mut Session, input: R) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    tracing::info!("Session started ({})", session.language());
    println!("{}", render::banner(session.language()));

    loop {
        println!("\n{}", render::menu(session.language(), session.section()));
        prompt(">");

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match line.trim() {
            "" => continue,
            "q" | "quit" => break,
            "l" => {
                session.toggle_language();
                println!("\n{}", render::banner(session.language()));
            }
            choice => match Section::from_choice(choice) {
                Some(section) => {
                    session.set_section(section);
                    if let Flow::Quit = enter_section(session, &mut lines).await? {
                        break;
                    }
                }
                None => println!("[!] Unknown choice: {}", choice),
            },
        }
    }

    println!("{}", render::footer());
    tracing::info!("Session ended");
    Ok(())
}

async fn enter_section<R>(session: &mut Session, lines: &mut Lines<R>) -> Result<Flow>
where
    R: AsyncBufRead + Unpin,
{
    let section = session.section();
    println!("{}", render::section_header(section, session.strings()));

    match section {
        Section::Chatbot => chat_section(session, AssistantKind::General, lines).await,
        Section::Schemes => chat_section(session, AssistantKind::Schemes, lines).await,
        Section::DiseaseDetection => detection_section(session, lines).await,
        Section::News => news_section(session, lines).await,
    }
}

async fn chat_section<R>(
    session: &mut Session,
    kind: AssistantKind,
    lines: &mut Lines<R>,
) -> Result<Flow>
where
    R: AsyncBufRead + Unpin,
{
    println!("(:back  :clear)");

    loop {
        prompt(&format!("{} >", session.strings().chat_prompt));
        let Some(line) = lines.next_line().await? else {
            return Ok(Flow::Quit);
        };
        match line.trim() {
            ":back" => return Ok(Flow::Back),
            ":clear" => {
                session.clear_conversation(kind);
                println!("[OK] History cleared");
                continue;
            }
            _ => {}
        }

        match session.ask(kind, &line).await {
            Ok(Some(answer)) => println!("AI: {}\n", answer),
            Ok(None) => {}
            Err(e) => {
                tracing::warn!("Chat turn failed: {:#}", e);
                println!("[!] {}", session.strings().chat_error);
            }
        }
    }
}

async fn detection_section<R>(session: &mut Session, lines: &mut Lines<R>) -> Result<Flow>
where
    R: AsyncBufRead + Unpin,
{
    println!("(:back)");

    loop {
        prompt(&format!("{} >", session.strings().crop_upload));
        let Some(line) = lines.next_line().await? else {
            return Ok(Flow::Quit);
        };
        let path = line.trim();
        if path == ":back" {
            return Ok(Flow::Back);
        }
        if path.is_empty() {
            continue;
        }

        let strings = session.strings();
        println!("{}: {}", strings.uploaded_caption, path);
        println!("[*] {}", strings.analyzing);

        match session.detect(Path::new(path)).await {
            Ok(prediction) => println!("{}", render::prediction_block(&prediction, strings)),
            Err(e) => {
                tracing::warn!("Detection failed: {:#}", e);
                println!("[!] {}", strings.detection_error);
            }
        }
    }
}

async fn news_section<R>(session: &mut Session, lines: &mut Lines<R>) -> Result<Flow>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let strings = session.strings();
        let articles = match session.news() {
            Ok(articles) => articles,
            Err(e) => {
                tracing::warn!("Failed to read news feed: {:#}", e);
                Vec::new()
            }
        };

        let page = news::paginate(&articles, session.news_page(), PAGE_SIZE);
        let updated = news::last_updated(&session.config().news_csv);
        println!("\n{}", render::news_page(&page, strings, updated));
        let total_pages = page.total_pages;

        println!("\nf. {}  n/p. {}  :back", strings.fetch_latest, strings.page_label);
        prompt(">");

        let Some(line) = lines.next_line().await? else {
            return Ok(Flow::Quit);
        };

        match line.trim() {
            ":back" => return Ok(Flow::Back),
            "f" => {
                println!("[*] {}...", strings.fetch_latest);
                match session.fetch_news(FilterMode::default()).await {
                    Ok(report) => {
                        println!("[OK] {} ({})", strings.success_news, report.articles_saved)
                    }
                    Err(e) => {
                        tracing::warn!("News fetch failed: {:#}", e);
                        println!("[!] {}", strings.no_news);
                    }
                }
            }
            "n" => {
                session.turn_news_page(1, total_pages);
            }
            "p" => {
                session.turn_news_page(-1, total_pages);
            }
            _ => {}
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disease::{InferenceBackend, Labels, RemedyPolicy};
    use anyhow::bail;
    use crate::knowledge::RetrievedChunk;
    use async_trait::async_trait;
    use ndarray::Array4;
    use tempfile::TempDir;

    struct StaticContext;

    #[async_trait]
    impl ContextSource for StaticContext {
        async fn retrieve(&self, _query: &str) -> Result<Vec<RetrievedChunk>> {
            Ok(vec![RetrievedChunk {
                source: "pm-kisan.pdf".to_string(),
                page: 1,
                chunk_text: "PM-KISAN pays 6000 per year".to_string(),
                score: 1.0,
            }])
        }
    }

    struct FailingContext;

    #[async_trait]
    impl ContextSource for FailingContext {
        async fn retrieve(&self, _query: &str) -> Result<Vec<RetrievedChunk>> {
            bail!("index unavailable")
        }
    }

    struct EchoModel;

    #[async_trait]
    impl ChatModel for EchoModel {
        async fn complete(&self, prompt: &str) -> Result<String> {
            Ok(format!("{} chars", prompt.len()))
        }

        fn name(&self) -> &str {
            "echo"
        }
    }

    struct FixedBackend(Vec<f32>);

    #[async_trait]
    impl InferenceBackend for FixedBackend {
        async fn predict(&self, _input: &Array4<f32>) -> Result<Vec<f32>> {
            Ok(self.0.clone())
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    fn test_config(dir: &TempDir) -> AppConfig {
        AppConfig {
            data_dir: dir.path().to_path_buf(),
            news_csv: dir.path().join("agriculture_news.csv"),
            index_dir: dir.path().join("faiss_index.lance"),
            labels_path: dir.path().join("labels.txt"),
            model_url: "http://127.0.0.1:9/v1/models/crop_disease:predict".to_string(),
            infected_indices: None,
            groq_model: "test-model".to_string(),
            gemini_api_key: None,
            groq_api_key: None,
        }
    }

    fn chat_session(dir: &TempDir) -> Session {
        Session::new(test_config(dir), Language::English)
            .with_context(Arc::new(StaticContext))
            .with_chat_model(Arc::new(EchoModel))
    }

    #[test]
    fn test_section_from_choice() {
        assert_eq!(Section::from_choice("1"), Some(Section::Chatbot));
        assert_eq!(Section::from_choice(" 4 "), Some(Section::News));
        assert_eq!(Section::from_choice("0"), None);
        assert_eq!(Section::from_choice("5"), None);
        assert_eq!(Section::from_choice("x"), None);
    }

    #[tokio::test]
    async fn test_assistants_are_separate_and_reused() {
        let dir = TempDir::new().unwrap();
        let mut session = chat_session(&dir);

        session.ask(AssistantKind::General, "soil pH?").await.unwrap();
        session.ask(AssistantKind::General, "and loam?").await.unwrap();
        session.ask(AssistantKind::Schemes, "PM-KISAN?").await.unwrap();

        let general = session.assistant(AssistantKind::General).await.unwrap();
        assert_eq!(general.conversation().len(), 4);
        let schemes = session.assistant(AssistantKind::Schemes).await.unwrap();
        assert_eq!(schemes.conversation().len(), 2);
    }

    #[tokio::test]
    async fn test_interactive_toggle_and_quit() {
        let dir = TempDir::new().unwrap();
        let mut session = chat_session(&dir);

        run_interactive(&mut session, &b"l\nq\n"[..]).await.unwrap();
        assert_eq!(session.language(), Language::Marathi);
    }

    #[tokio::test]
    async fn test_interactive_chat_then_back() {
        let dir = TempDir::new().unwrap();
        let mut session = chat_session(&dir);

        let input = b"3\nWhat is PM-KISAN?\n:back\n1\nhello\n";
        run_interactive(&mut session, &input[..]).await.unwrap();

        assert_eq!(session.section(), Section::Chatbot);
        let schemes = session.assistant(AssistantKind::Schemes).await.unwrap();
        assert_eq!(schemes.conversation().len(), 2);
        let general = session.assistant(AssistantKind::General).await.unwrap();
        assert_eq!(general.conversation().len(), 2);
    }

    #[tokio::test]
    async fn test_interactive_clear_resets_one_assistant() {
        let dir = TempDir::new().unwrap();
        let mut session = chat_session(&dir);

        let input = b"3
PM-KISAN?
:back
1
soil pH?
loam?
:clear
clay?
";
        run_interactive(&mut session, &input[..]).await.unwrap();

        let general = session.assistant(AssistantKind::General).await.unwrap();
        assert_eq!(general.conversation().len(), 2);
        assert!(general.conversation().history().starts_with("User: clay?\nAI: "));
        let schemes = session.assistant(AssistantKind::Schemes).await.unwrap();
        assert_eq!(schemes.conversation().len(), 2);
    }

    #[tokio::test]
    async fn test_chat_error_does_not_end_session() {
        let dir = TempDir::new().unwrap();
        let mut session = Session::new(test_config(&dir), Language::English)
            .with_context(Arc::new(FailingContext))
            .with_chat_model(Arc::new(EchoModel));

        let input = b"1\nfirst\nsecond\n:back\nl\nq\n";
        run_interactive(&mut session, &input[..]).await.unwrap();

        // loop kept going after both failures
        assert_eq!(session.language(), Language::Marathi);
    }

    #[tokio::test]
    async fn test_missing_keys_fail_only_the_adapter() {
        let dir = TempDir::new().unwrap();
        let mut session = Session::new(test_config(&dir), Language::English)
            .with_context(Arc::new(StaticContext));

        let err = session.ask(AssistantKind::General, "hi").await.unwrap_err();
        assert!(err.to_string().contains("GROQ_API_KEY"));

        // no context source injected, no embedding key configured
        let mut session = Session::new(test_config(&dir), Language::English)
            .with_chat_model(Arc::new(EchoModel));
        let err = session.ask(AssistantKind::Schemes, "hi").await.unwrap_err();
        assert!(err.to_string().contains("GEMINI_API_KEY"));

        // other sections still work
        assert!(session.news().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_detect_with_injected_detector() {
        let dir = TempDir::new().unwrap();
        let image_path = dir.path().join("leaf.png");
        image::RgbImage::from_pixel(32, 32, image::Rgb([40, 160, 40]))
            .save(&image_path)
            .unwrap();

        let labels = Labels::from_names(["Tomato___healthy", "Tomato___Late_blight"]);
        let policy = RemedyPolicy::from_labels(&labels);
        let detector = DiseaseDetector::new(Box::new(FixedBackend(vec![0.05, 0.95])), labels, policy);

        let mut session = Session::new(test_config(&dir), Language::English).with_detector(detector);
        let prediction = session.detect(&image_path).await.unwrap();

        assert_eq!(prediction.disease, "Tomato___Late_blight");
        assert!(prediction.remedy.is_some());
    }

    #[tokio::test]
    async fn test_detector_load_failure_is_an_error() {
        let dir = TempDir::new().unwrap();
        let mut session = Session::new(test_config(&dir), Language::English);
        // no label file in the temp dir
        assert!(session.detect(&dir.path().join("leaf.png")).await.is_err());
    }

    #[tokio::test]
    async fn test_news_paging() {
        let dir = TempDir::new().unwrap();
        let mut session = Session::new(test_config(&dir), Language::English);

        let articles: Vec<_> = (0..7)
            .map(|i| NewsArticle {
                link: format!("https://example.com/{}", i),
                title: format!("Story {}", i),
                description: String::new(),
            })
            .collect();
        news::write_articles(&session.config().news_csv, &articles).unwrap();
        assert_eq!(session.news().unwrap().len(), 7);

        assert_eq!(session.turn_news_page(1, 2), 2);
        assert_eq!(session.turn_news_page(1, 2), 2);
        assert_eq!(session.turn_news_page(-5, 2), 1);

        run_interactive(&mut session, &b"4\nn\n:back\nq\n"[..])
            .await
            .unwrap();
        assert_eq!(session.news_page(), 2);
    }
}
