use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use wiseup_feed::api::{ApiImpressions, FeedClient};
use wiseup_feed::config::Settings;
use wiseup_feed::controller::{Command, FeedController};
use wiseup_feed::notify::LogNotifier;

const IMPRESSION_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("wiseup_feed=info,wiseup=info")),
        )
        .init();

    let settings = Settings::load()?;
    let client = Arc::new(FeedClient::from_settings(&settings)?);

    let items = client.load_feed(&settings).await;
    tracing::info!("Feed ready with {} items", items.len());

    let impressions = ApiImpressions::new(client);
    let controller = FeedController::new(LogNotifier, impressions.clone());
    run(&settings, controller, items).await?;

    let sent = impressions.flush(IMPRESSION_FLUSH_TIMEOUT).await;
    tracing::debug!("Flushed {} impression posts", sent);
    Ok(())
}

/// Commands applying the user's stored playback preferences after load.
fn preference_commands(settings: &Settings) -> Vec<Command> {
    let mut commands = Vec::new();
    if settings.autoplay {
        commands.push(Command::TogglePlay);
    }
    if settings.start_muted {
        commands.push(Command::ToggleMute);
    }
    commands
}

#[cfg(not(feature = "player"))]
async fn run(
    settings: &Settings,
    mut controller: FeedController,
    items: Vec<wiseup_feed::FeedItem>,
) -> Result<()> {
    use wiseup_feed::panes::{DetailsPane, MediaPane};

    controller.load(items);
    for command in preference_commands(settings) {
        controller.dispatch(command);
    }

    loop {
        let state = controller.state();
        println!("{}", DetailsPane::new(state));
        println!("{}", MediaPane::new(state, None));
        if controller.is_next_disabled() {
            break;
        }
        controller.next();
    }
    // Walking past the last item surfaces the end-of-content notice.
    controller.next();
    Ok(())
}

#[cfg(feature = "player")]
async fn run(
    settings: &Settings,
    controller: FeedController,
    items: Vec<wiseup_feed::FeedItem>,
) -> Result<()> {
    use wiseup_feed::gst_element::GstElement;
    use wiseup_feed::renderer::{EventResult, Renderer};
    use wiseup_feed::{FeedView, KeyboardHub};

    GstElement::init()?;
    let hub = KeyboardHub::new();
    let mut renderer = Renderer::new("WiseUp", 1280, 720)?;

    let mut view = FeedView::mount(&hub, controller, GstElement::new()?);
    view.on_error(|e| tracing::warn!("Playback error: {}", e));
    view.load(items);
    for command in preference_commands(settings) {
        view.dispatch(command);
    }

    let mut shown = None;
    loop {
        if let EventResult::Quit = renderer.process_events(&hub) {
            break;
        }
        view.pump();

        let position = view.state().current_item().map(|item| item.id().clone());
        if position != shown {
            tracing::info!("\n{}", view.details());
            shown = position;
        }

        let frame = view.surface().element().current_frame();
        renderer.render(frame.as_ref(), &view.media_pane())?;
        tokio::time::sleep(Duration::from_millis(16)).await;
    }

    Ok(())
}
