use clap::Parser;
use pagechat::{api, config, logging, session::SessionService};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(name = "pagechat", version, about = "Chat with a PDF in your browser")]
struct Cli {
    /// PDF to index before the server starts accepting questions.
    pdf: Option<PathBuf>,

    /// Port to listen on (overrides SERVER_PORT; otherwise scans 8400-8499).
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    config::init_config();
    logging::init_tracing();

    let service =
        Arc::new(SessionService::new().expect("Failed to initialize the session service"));

    if let Some(path) = cli.pdf.as_deref() {
        let bytes = tokio::fs::read(path)
            .await
            .unwrap_or_else(|error| panic!("Failed to read {}: {error}", path.display()));
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.pdf".to_string());
        let outcome = service
            .load_document(bytes, name)
            .await
            .expect("Failed to index the PDF");
        tracing::info!(
            document = %outcome.document_id,
            pages = outcome.page_count,
            passages = outcome.passages_indexed,
            "Preloaded document"
        );
    }

    let app = api::create_router(service);

    let (listener, port) = bind_listener(cli.port)
        .await
        .expect("Failed to bind listener");
    tracing::info!("Listening on http://0.0.0.0:{port}");
    axum::serve(listener, app).await.unwrap();
}

async fn bind_listener(flag_port: Option<u16>) -> Result<(TcpListener, u16), std::io::Error> {
    use std::net::Ipv4Addr;

    if let Some(port) = flag_port.or(config::get_config().server_port) {
        return TcpListener::bind((Ipv4Addr::UNSPECIFIED, port))
            .await
            .map(|listener| (listener, port));
    }

    const PORT_RANGE: std::ops::RangeInclusive<u16> = 8400..=8499;
    for port in PORT_RANGE {
        match TcpListener::bind((Ipv4Addr::UNSPECIFIED, port)).await {
            Ok(listener) => {
                tracing::debug!(port, "Bound server port");
                return Ok((listener, port));
            }
            Err(err) if err.kind() == std::io::ErrorKind::AddrInUse => {
                tracing::debug!(port, "Port already in use; trying next");
                continue;
            }
            Err(err) => return Err(err),
        }
    }

    Err(std::io::Error::new(
        std::io::ErrorKind::AddrNotAvailable,
        "No available port found in range 8400-8499",
    ))
}
