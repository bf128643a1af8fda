mod view;

use async_trait::async_trait;
use chrono::Utc;
use clap::{Parser, Subcommand};
use inner_search_core::display::INITIALIZE_ERROR_MESSAGE;
use inner_search_core::{
    build_error_message, format_keyword_hits, initialize_documents, mask_secret, ChatController,
    ChatError, ChatSettings, Document, FallbackListing, FolderDocumentStore, MemoryVectorIndex,
    Mode, OpenAiChatClient, QdrantRetriever, RetrievalPipeline, RetrieverError, Session,
    VectorRetriever, DEFAULT_API_BASE,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use view::TerminalView;

#[derive(Parser)]
#[command(name = "inner-search", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Folder holding the internal documents (.txt, .md, .csv).
    #[arg(long, env = "INNER_SEARCH_DATA_DIR", default_value = "./data")]
    data_dir: String,

    /// API key for the chat completion endpoint.
    #[arg(long, env = "OPENAI_API_KEY", default_value = "", hide_env_values = true)]
    api_key: String,

    /// Base URL of an OpenAI-compatible API.
    #[arg(long, env = "OPENAI_API_BASE", default_value = DEFAULT_API_BASE)]
    api_base: String,

    /// Chat model name.
    #[arg(long, default_value = "gpt-4o-mini")]
    model: String,

    /// Sampling temperature.
    #[arg(long, default_value = "0.5")]
    temperature: f32,

    /// Documents retrieved per question.
    #[arg(long, default_value = "5")]
    top_k: usize,

    /// Maximum keyword hits shown per question.
    #[arg(long, default_value = "10")]
    keyword_limit: usize,

    /// Initial answer mode: document-search or inquiry.
    #[arg(long, default_value = "document-search")]
    mode: Mode,

    /// Qdrant base URL; the in-memory index is used when omitted.
    #[arg(long)]
    qdrant_url: Option<String>,

    /// Qdrant collection.
    #[arg(long, default_value = "inner_documents")]
    qdrant_collection: String,

    /// Upload the loaded documents to Qdrant before answering.
    #[arg(long, default_value_t = false)]
    qdrant_reindex: bool,

    /// Filter text for the listing shown when a turn fails.
    #[arg(long)]
    fallback_filter: Option<String>,

    /// Heading for the fallback listing.
    #[arg(long, default_value = "Related records")]
    fallback_label: String,

    /// Show error details and a masked API key to the user.
    #[arg(
        long,
        env = "APP_DEBUG",
        action = clap::ArgAction::SetTrue,
        value_parser = clap::builder::BoolishValueParser::new()
    )]
    debug: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive chat. Commands: /mode <document-search|inquiry>, /history, /quit.
    Chat,
    /// Ask a single question and exit.
    Ask {
        /// Question text.
        #[arg(long)]
        question: String,
    },
    /// Keyword search only, no model calls.
    Keyword {
        /// Literal, case-sensitive search text.
        #[arg(long)]
        query: String,
    },
}

impl Cli {
    fn settings(&self) -> ChatSettings {
        ChatSettings {
            model: self.model.clone(),
            temperature: self.temperature,
            retriever_top_k: self.top_k,
            keyword_limit: self.keyword_limit,
            debug: self.debug,
        }
    }
}

enum Retriever {
    Memory(MemoryVectorIndex),
    Qdrant(QdrantRetriever),
}

#[async_trait]
impl VectorRetriever for Retriever {
    async fn retrieve(&self, query: &str) -> Result<Vec<Document>, RetrieverError> {
        match self {
            Retriever::Memory(index) => index.retrieve(query).await,
            Retriever::Qdrant(index) => index.retrieve(query).await,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();
    let settings = cli.settings();

    let documents = match initialize_documents(&FolderDocumentStore::new(&cli.data_dir)).await {
        Ok(documents) => documents,
        Err(error) => return Err(startup_failure(&cli, error)),
    };

    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        document_count = documents.len(),
        "inner-search boot"
    );

    if let Command::Keyword { query } = &cli.command {
        let hits = inner_search_core::search_documents_by_keyword(
            query,
            &documents,
            settings.keyword_limit,
        );
        if hits.is_empty() {
            println!("no documents contain '{query}'");
        } else {
            println!("{}", format_keyword_hits(&hits));
        }
        return Ok(());
    }

    let controller = match build_controller(&cli, &settings, documents).await {
        Ok(controller) => controller,
        Err(error) => return Err(startup_failure(&cli, error)),
    };

    let mut session = Session::with_mode(cli.mode);
    let mut view = TerminalView::stdout();

    match cli.command {
        Command::Ask { question } => {
            controller
                .submit(&mut session, &mut view, &question)
                .await
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;
        }
        Command::Chat => run_chat_loop(&controller, &mut session, &mut view).await?,
        Command::Keyword { .. } => {}
    }

    Ok(())
}

async fn build_controller(
    cli: &Cli,
    settings: &ChatSettings,
    documents: Vec<Document>,
) -> Result<ChatController<Retriever, OpenAiChatClient>, ChatError> {
    let llm = OpenAiChatClient::new(&cli.api_base, cli.api_key.clone(), settings)
        .map_err(|error| ChatError::Initialization(error.to_string()))?;

    let retriever = match &cli.qdrant_url {
        Some(url) => {
            let qdrant =
                QdrantRetriever::new(url, &cli.qdrant_collection, settings.retriever_top_k)
                    .map_err(|error| ChatError::Initialization(error.to_string()))?;
            qdrant
                .ensure_collection()
                .await
                .map_err(|error| ChatError::Initialization(error.to_string()))?;
            if cli.qdrant_reindex {
                qdrant
                    .index_documents(&documents)
                    .await
                    .map_err(|error| ChatError::Initialization(error.to_string()))?;
                info!(collection = %cli.qdrant_collection, "documents indexed in qdrant");
            }
            Retriever::Qdrant(qdrant)
        }
        None => Retriever::Memory(MemoryVectorIndex::new(
            documents.clone(),
            settings.retriever_top_k,
        )),
    };

    let mut controller = ChatController::new(
        RetrievalPipeline::new(retriever, llm),
        documents,
        settings.clone(),
    )
    .with_credential_hint(mask_secret(&cli.api_key));

    if let Some(filter) = &cli.fallback_filter {
        controller = controller.with_fallback(FallbackListing {
            label: cli.fallback_label.clone(),
            filter: filter.clone(),
        });
    }

    Ok(controller)
}

fn startup_failure(cli: &Cli, error: ChatError) -> anyhow::Error {
    tracing::error!(error = %error, "initialization failed");

    let mut message = build_error_message(INITIALIZE_ERROR_MESSAGE);
    if cli.debug {
        message.push_str(&format!(
            "\n\nDetails: {error}\nAPI key: {}",
            mask_secret(&cli.api_key)
        ));
    }
    eprintln!("{message}");
    anyhow::anyhow!(error.to_string())
}

async fn run_chat_loop(
    controller: &ChatController<Retriever, OpenAiChatClient>,
    session: &mut Session,
    view: &mut TerminalView<std::io::Stdout>,
) -> anyhow::Result<()> {
    view.print_banner(session.mode())?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let input = line.trim();

        if input == "/quit" || input == "/exit" {
            break;
        }
        if input == "/history" {
            view.print_history(session.history())?;
            continue;
        }
        if let Some(mode) = input.strip_prefix("/mode") {
            match mode.parse::<Mode>() {
                Ok(mode) => {
                    session.set_mode(mode);
                    info!(session = %session.id(), %mode, "mode changed");
                    view.print_notice(&format!("mode: {mode}"))?;
                }
                Err(reason) => view.print_notice(&reason)?,
            }
            continue;
        }

        // Failures are already rendered and end only this turn.
        let _ = controller.submit(session, view, input).await;
    }

    Ok(())
}
