use news_sources::client::{ClientConfig, NewsApiClient};
use news_sources::data::{DefaultGetNewsSourcesUseCase, DefaultNewsSourcesRepository};
use news_sources::ui::{NewsSourcesViewModel, SocketConnectivityProbe, UiState};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("news_sources=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let refresh = std::env::args().skip(1).any(|arg| arg == "--refresh");

    let config = ClientConfig::from_env()?;
    let probe = SocketConnectivityProbe::for_base_url(&config.base_url)?;
    let client = NewsApiClient::new(config).await?;
    let repository = DefaultNewsSourcesRepository::new(Arc::new(client));
    let use_case = DefaultGetNewsSourcesUseCase::new(Arc::new(repository));
    let view_model = Arc::new(NewsSourcesViewModel::new(
        Arc::new(use_case),
        Arc::new(probe),
        Handle::current(),
    ));

    let mut events = view_model.subscribe_events();
    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => eprintln!("[{}] {}", event.label(), event.text()),
                Err(RecvError::Lagged(skipped)) => tracing::warn!(skipped, "missed events"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    view_model.load_initial().await?;
    if refresh {
        // The connectivity probe blocks; keep it off the runtime threads.
        let vm = Arc::clone(&view_model);
        if let Some(fetch) = tokio::task::spawn_blocking(move || vm.refresh()).await? {
            fetch.await?;
        }
    }
    render(&view_model.state());

    // Closing the event channel ends the printer.
    drop(view_model);
    printer.await?;
    Ok(())
}

fn render(state: &UiState) {
    match state {
        UiState::Success(sources) => {
            for source in sources {
                println!("{:<28} {}", source.id, source.name);
                if !source.url.is_empty() {
                    println!("{:<28} {}", "", source.url);
                }
            }
            println!("\n{} sources", sources.len());
        }
        UiState::Loading => println!("Loading..."),
        UiState::Empty => println!("No sources."),
    }
}
