//! Language server backend
//!
//! Keeps one [`Document`] snapshot per open URI and answers folding and
//! outline requests through a shared [`Scanner`].

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use talscan_core::{Document, Scanner, Settings};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::{
    DidChangeTextDocumentParams, DidCloseTextDocumentParams, DidOpenTextDocumentParams,
    DocumentSymbolParams, DocumentSymbolResponse, FoldingRange, FoldingRangeParams,
    FoldingRangeProviderCapability, InitializeParams, InitializeResult, InitializedParams,
    MessageType, OneOf, ServerCapabilities, ServerInfo, TextDocumentSyncCapability,
    TextDocumentSyncKind, Url,
};
use tower_lsp::{Client, LanguageServer, LspService, Server};
use tracing::{debug, info, warn};

use crate::convert;

/// LSP Backend state
pub struct Backend {
    /// LSP client for sending notifications
    client: Client,
    /// Effective settings, fixed at `initialize`
    settings: RwLock<Settings>,
    /// Scanner and its result caches
    scanner: RwLock<Arc<Scanner>>,
    /// Latest snapshot of every open document
    documents: RwLock<HashMap<Url, Arc<Document>>>,
}

impl Backend {
    /// Create a new backend instance
    pub fn new(client: Client) -> Self {
        Self {
            client,
            settings: RwLock::new(Settings::default()),
            scanner: RwLock::new(Arc::new(Scanner::new())),
            documents: RwLock::new(HashMap::new()),
        }
    }

    pub async fn settings(&self) -> Settings {
        self.settings.read().await.clone()
    }

    async fn scanner(&self) -> Arc<Scanner> {
        Arc::clone(&*self.scanner.read().await)
    }

    async fn get_document(&self, uri: &Url) -> Option<Arc<Document>> {
        self.documents.read().await.get(uri).cloned()
    }

    async fn store_document(&self, uri: Url, version: i32, text: &str) {
        let doc = Document::new(uri.as_str(), version, text);
        self.documents.write().await.insert(uri, Arc::new(doc));
    }

    async fn remove_document(&self, uri: &Url) {
        self.documents.write().await.remove(uri);
        self.scanner().await.forget(uri.as_str());
    }
}

/// Settings for a session: the client's `initializationOptions` when valid,
/// else `talscan.toml` in the workspace root, else defaults
pub fn settings_from_params(params: &InitializeParams) -> Settings {
    if let Some(options) = &params.initialization_options {
        match serde_json::from_value::<Settings>(options.clone()) {
            Ok(settings) => return settings,
            Err(e) => warn!("Ignoring invalid initializationOptions: {}", e),
        }
    }

    let Some(root) = workspace_root(params) else {
        return Settings::default();
    };
    match Settings::discover(&root) {
        Ok(settings) => settings,
        Err(e) => {
            warn!("Using default settings: {}", e);
            Settings::default()
        }
    }
}

fn workspace_root(params: &InitializeParams) -> Option<PathBuf> {
    if let Some(folder) = params.workspace_folders.as_ref().and_then(|f| f.first()) {
        return folder.uri.to_file_path().ok();
    }
    #[allow(deprecated)]
    let root_uri = params.root_uri.as_ref();
    root_uri?.to_file_path().ok()
}

/// Run a scan on the blocking pool. Dropping the returned future, which
/// tower-lsp does when the client cancels the request, cancels the scan.
async fn run_scan<T, F>(scan: F) -> Option<T>
where
    F: FnOnce(&CancellationToken) -> talscan_core::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    match tokio::task::spawn_blocking(move || scan(&cancel)).await {
        Ok(Ok(value)) => Some(value),
        Ok(Err(e)) => {
            debug!("Scan stopped ({}): {}", e.code(), e);
            None
        }
        Err(e) => {
            warn!("Scan task failed: {}", e);
            None
        }
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        info!("talscan LSP server initializing");

        let settings = settings_from_params(&params);
        debug!("Effective settings: {:?}", settings);
        *self.scanner.write().await = Arc::new(Scanner::with_settings(settings.clone()));

        let capabilities = ServerCapabilities {
            text_document_sync: Some(TextDocumentSyncCapability::Kind(
                TextDocumentSyncKind::FULL,
            )),
            folding_range_provider: settings
                .folding
                .enabled
                .then_some(FoldingRangeProviderCapability::Simple(true)),
            document_symbol_provider: settings.symbols.enabled.then_some(OneOf::Left(true)),
            ..Default::default()
        };
        *self.settings.write().await = settings;

        Ok(InitializeResult {
            capabilities,
            server_info: Some(ServerInfo {
                name: "talscan-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        info!("talscan LSP server initialized");
        self.client
            .log_message(MessageType::INFO, "talscan language server ready")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        info!("talscan LSP server shutting down");
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        debug!("Document opened: {}", params.text_document.uri);
        let doc = params.text_document;
        self.store_document(doc.uri, doc.version, &doc.text).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        debug!("Document changed: {}", params.text_document.uri);
        // Since we use FULL sync, the entire content is in the last change
        if let Some(change) = params.content_changes.into_iter().last() {
            let doc = params.text_document;
            self.store_document(doc.uri, doc.version, &change.text).await;
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        debug!("Document closed: {}", params.text_document.uri);
        self.remove_document(&params.text_document.uri).await;
    }

    async fn folding_range(
        &self,
        params: FoldingRangeParams,
    ) -> Result<Option<Vec<FoldingRange>>> {
        let uri = params.text_document.uri;
        debug!("Folding range request for: {}", uri);

        if !self.settings.read().await.folding.enabled {
            return Ok(None);
        }
        let Some(doc) = self.get_document(&uri).await else {
            warn!("Document not found for folding: {}", uri);
            return Ok(None);
        };

        let scanner = self.scanner().await;
        let folds = run_scan(move |cancel| scanner.folding_ranges(&doc, cancel)).await;
        Ok(folds.map(|folds| {
            debug!("Generated {} folding ranges for {}", folds.len(), uri);
            convert::folding_ranges(&folds)
        }))
    }

    async fn document_symbol(
        &self,
        params: DocumentSymbolParams,
    ) -> Result<Option<DocumentSymbolResponse>> {
        let uri = params.text_document.uri;
        debug!("Document symbol request for: {}", uri);

        if !self.settings.read().await.symbols.enabled {
            return Ok(None);
        }
        let Some(doc) = self.get_document(&uri).await else {
            warn!("Document not found for symbols: {}", uri);
            return Ok(None);
        };

        let scanner = self.scanner().await;
        let symbols = run_scan(move |cancel| scanner.document_symbols(&doc, cancel)).await;
        Ok(symbols.map(|symbols| {
            debug!("Generated {} document symbols for {}", symbols.len(), uri);
            DocumentSymbolResponse::Nested(convert::document_symbols(&symbols))
        }))
    }
}

/// Start the language server on stdin/stdout
pub async fn run_server() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    info!(
        "Starting talscan Language Server v{}",
        env!("CARGO_PKG_VERSION")
    );

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(Backend::new);
    Server::new(stdin, stdout, socket).serve(service).await;
}
