use std::collections::HashMap;
use std::sync::Arc;

use jsonls::parsing::extract_schema_reference;
use jsonls::validate_liberally;
use tokio::sync::RwLock;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer, LspService, Server};
use tracing::{info, warn};

/// LSP server for JSON documents validated against a JSON Schema.
///
/// Validation errors give `{instance_path, schema_path, message}`; those are
/// mapped onto an LSP `Range` via the parsed document's own node offsets
/// rather than by re-walking a JSON pointer path, so ranges stay accurate
/// even across edits with unrelated syntax errors nearby.
type Schema = Arc<serde_json::Value>;
type JsonSchemas = Arc<RwLock<HashMap<String, Schema>>>;

#[derive(Debug)]
struct Backend {
    client: Client,
    // Frequent reads, infrequent writes once a schema is cached; the Arc lets
    // readers clone the value cheaply instead of cloning the JSON document.
    json_schemas: JsonSchemas,
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, _: InitializeParams) -> Result<InitializeResult> {
        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                completion_provider: Some(CompletionOptions::default()),
                text_document_sync: Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::FULL)),
                ..Default::default()
            },
            ..Default::default()
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        self.client.log_message(MessageType::INFO, "server initialized!").await;
    }

    // did_open and did_change are handled identically: the client always
    // sends the whole document, since sync is negotiated as FULL above.
    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        self.on_change(OnChangeTextDocumentParams {
            uri: params.text_document.uri,
            text: &params.text_document.text,
            version: Some(params.text_document.version),
        })
        .await
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        self.on_change(OnChangeTextDocumentParams {
            uri: params.text_document.uri,
            text: &params.content_changes[0].text,
            version: Some(params.text_document.version),
        })
        .await
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn completion(&self, _: CompletionParams) -> Result<Option<CompletionResponse>> {
        Ok(Some(CompletionResponse::Array(Vec::new())))
    }

    async fn hover(&self, _: HoverParams) -> Result<Option<Hover>> {
        Ok(None)
    }
}

struct OnChangeTextDocumentParams<'document_text> {
    uri: Url,
    text: &'document_text str,
    version: Option<i32>,
}

impl Backend {
    /// Entry point for validating content: called on document open and on
    /// every full-text change.
    async fn on_change<'document_text>(&self, params: OnChangeTextDocumentParams<'document_text>) {
        let schema = self.resolve_schema(params.text).await;

        let diagnostics = match validate_liberally(&schema, params.text) {
            Ok(d) => d,
            Err(e) => {
                warn!(uri = %params.uri, error = %e, "schema validation failed");
                return;
            }
        };

        self.client.publish_diagnostics(params.uri, diagnostics, params.version).await;
    }

    /// Looks up the schema declared by the document's `$schema` field (or
    /// shebang pragma), falling back to a permissive always-valid schema so
    /// a document with no declared schema still gets syntax diagnostics.
    async fn resolve_schema(&self, text: &str) -> Schema {
        let declared: Option<String> = serde_json::from_str::<serde_json::Value>(text)
            .ok()
            .and_then(|value| extract_schema_reference(&value, text));

        let Some(key) = declared else {
            return Arc::new(serde_json::Value::Bool(true));
        };

        {
            let schemas = self.json_schemas.read().await;
            if let Some(schema) = schemas.get(&key) {
                return schema.clone();
            }
        }

        info!(schema = %key, "no cached schema registered for this document, validating permissively");
        Arc::new(serde_json::Value::Bool(true))
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(|client| Backend {
        client,
        json_schemas: JsonSchemas::default(),
    });

    Server::new(stdin, stdout, socket).serve(service).await;
}
