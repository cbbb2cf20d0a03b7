//! Library integration tests for talscan-lsp
//!
//! Requests go straight to the backend held by an `LspService`; no transport
//! is involved.

use serde_json::json;
use talscan_lsp::Backend;
use tower_lsp::lsp_types::{
    DidChangeTextDocumentParams, DidCloseTextDocumentParams, DidOpenTextDocumentParams,
    DocumentSymbolParams, DocumentSymbolResponse, FoldingRangeKind, FoldingRangeParams,
    InitializeParams, PartialResultParams, SymbolKind, TextDocumentContentChangeEvent,
    TextDocumentIdentifier, TextDocumentItem, Url, VersionedTextDocumentIdentifier,
    WorkDoneProgressParams,
};
use tower_lsp::{LanguageServer, LspService};

const SOURCE: &str = "\
-- Entry points
-- for the batch job
proc startup main;
begin
  subproc init;
  begin
    call setup;
  end;
  call init;
end;
";

fn uri() -> Url {
    Url::parse("file:///work/batch.tal").unwrap()
}

async fn open(backend: &Backend, version: i32, text: &str) {
    backend
        .did_open(DidOpenTextDocumentParams {
            text_document: TextDocumentItem {
                uri: uri(),
                language_id: "tal".to_string(),
                version,
                text: text.to_string(),
            },
        })
        .await;
}

async fn folds(backend: &Backend) -> Option<Vec<tower_lsp::lsp_types::FoldingRange>> {
    backend
        .folding_range(FoldingRangeParams {
            text_document: TextDocumentIdentifier { uri: uri() },
            work_done_progress_params: WorkDoneProgressParams::default(),
            partial_result_params: PartialResultParams::default(),
        })
        .await
        .unwrap()
}

async fn symbols(backend: &Backend) -> Option<DocumentSymbolResponse> {
    backend
        .document_symbol(DocumentSymbolParams {
            text_document: TextDocumentIdentifier { uri: uri() },
            work_done_progress_params: WorkDoneProgressParams::default(),
            partial_result_params: PartialResultParams::default(),
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn test_initialize_advertises_structure_providers() {
    let (service, _socket) = LspService::new(Backend::new);
    let result = service
        .inner()
        .initialize(InitializeParams::default())
        .await
        .unwrap();

    assert!(result.capabilities.folding_range_provider.is_some());
    assert!(result.capabilities.document_symbol_provider.is_some());
    assert_eq!(result.server_info.unwrap().name, "talscan-lsp");
}

#[tokio::test]
async fn test_symbols_disabled_by_initialization_options() {
    let (service, _socket) = LspService::new(Backend::new);
    let backend = service.inner();

    let result = backend
        .initialize(InitializeParams {
            initialization_options: Some(json!({ "symbols": { "enabled": false } })),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(result.capabilities.document_symbol_provider.is_none());

    open(backend, 1, SOURCE).await;
    assert!(symbols(backend).await.is_none());
    assert!(folds(backend).await.is_some());
}

#[tokio::test]
async fn test_folding_request() {
    let (service, _socket) = LspService::new(Backend::new);
    let backend = service.inner();
    backend.initialize(InitializeParams::default()).await.unwrap();
    open(backend, 1, SOURCE).await;

    let ranges = folds(backend).await.unwrap();
    let spans: Vec<(u32, u32, Option<FoldingRangeKind>)> = ranges
        .iter()
        .map(|r| (r.start_line, r.end_line, r.kind.clone()))
        .collect();

    assert_eq!(
        spans,
        vec![
            (0, 1, Some(FoldingRangeKind::Comment)),
            (5, 6, Some(FoldingRangeKind::Region)),
            (3, 8, Some(FoldingRangeKind::Region)),
        ]
    );
}

#[tokio::test]
async fn test_document_symbol_request() {
    let (service, _socket) = LspService::new(Backend::new);
    let backend = service.inner();
    backend.initialize(InitializeParams::default()).await.unwrap();
    open(backend, 1, SOURCE).await;

    let Some(DocumentSymbolResponse::Nested(symbols)) = symbols(backend).await else {
        panic!("expected nested document symbols");
    };

    assert_eq!(symbols.len(), 1);
    assert_eq!(symbols[0].name, "startup");
    assert_eq!(symbols[0].kind, SymbolKind::CLASS);
    assert_eq!(symbols[0].range.start.line, 2);
    assert_eq!(symbols[0].range.end.line, 9);

    let children = symbols[0].children.as_ref().unwrap();
    assert_eq!(children[0].name, "init");
    assert_eq!(children[0].kind, SymbolKind::METHOD);
    assert_eq!(children[1].name, "main: startup");
    assert_eq!(children[1].kind, SymbolKind::FUNCTION);
}

#[tokio::test]
async fn test_change_rescans_new_version() {
    let (service, _socket) = LspService::new(Backend::new);
    let backend = service.inner();
    backend.initialize(InitializeParams::default()).await.unwrap();
    open(backend, 1, SOURCE).await;
    assert!(folds(backend).await.is_some());

    backend
        .did_change(DidChangeTextDocumentParams {
            text_document: VersionedTextDocumentIdentifier {
                uri: uri(),
                version: 2,
            },
            content_changes: vec![TextDocumentContentChangeEvent {
                range: None,
                range_length: None,
                text: "proc only; external;".to_string(),
            }],
        })
        .await;

    assert_eq!(folds(backend).await.unwrap().len(), 0);
    let Some(DocumentSymbolResponse::Nested(symbols)) = symbols(backend).await else {
        panic!("expected nested document symbols");
    };
    assert_eq!(symbols[0].kind, SymbolKind::INTERFACE);
}

#[tokio::test]
async fn test_closed_document_has_no_views() {
    let (service, _socket) = LspService::new(Backend::new);
    let backend = service.inner();
    backend.initialize(InitializeParams::default()).await.unwrap();
    open(backend, 1, SOURCE).await;

    backend
        .did_close(DidCloseTextDocumentParams {
            text_document: TextDocumentIdentifier { uri: uri() },
        })
        .await;

    assert!(folds(backend).await.is_none());
    assert!(symbols(backend).await.is_none());
}
