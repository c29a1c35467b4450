mod audio;
mod auth;
mod config;
mod controller;
mod error;
mod logging;
mod model;
mod view;

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use rspotify::{clients::OAuthClient, AuthCodeSpotify, Token};
use tokio::sync::{mpsc, Mutex};

use audio::AudioBackend;
use config::Config;
use controller::{AppController, EventPublisher, PlayerSdk, Reconciler, SdkEvent, UiUpdate};
use model::snapshot::FileStore;
use model::{AppModel, SpotifyClient};
use view::AppView;

const TOKEN_CHECK_INTERVAL: Duration = Duration::from_secs(60);
const INPUT_POLL: Duration = Duration::from_millis(50);

#[tokio::main]
async fn main() -> Result<()> {
    let _log_guard = match logging::init_logging() {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: Failed to initialize logging: {}", e);
            None
        }
    };

    tracing::info!("=== Melodffy Starting ===");

    let config = Arc::new(Config::load());

    let auth_result = auth::perform_oauth_flow().await?;
    let rspotify_client = setup_rspotify(auth_result.rspotify_token.clone()).await?;

    let user = rspotify_client.me().await.context("rspotify authentication failed")?;
    tracing::info!(user_id = %user.id, "rspotify authorized successfully");

    let spotify_client = SpotifyClient::new(
        rspotify_client,
        config.device_name.clone(),
        auth_result.refresh_token.clone(),
        auth_result.rspotify_token.expires_at,
    );

    let mut app_model = AppModel::new(&config.default_album_art);
    app_model.set_spotify_client(spotify_client.clone());
    let model = Arc::new(Mutex::new(app_model));
    model.lock().await.update_device_name(config.device_name.clone()).await;

    init_liked_songs(&spotify_client, &model).await;

    let audio_backend = Arc::new(AudioBackend::new(&auth_result, &config.device_name).await?);
    tracing::info!(user = %audio_backend.username(), device = %audio_backend.device_name(), "Player registered");

    let (publisher, session_rx) = EventPublisher::channel();
    let (ui_tx, ui_rx) = mpsc::unbounded_channel::<UiUpdate>();

    let bridge = controller::start_player_event_bridge(
        audio_backend.get_player_event_channel(),
        audio_backend.timing(),
        publisher.clone(),
    );

    let (store, store_writer) = FileStore::open(&config.store_path).await;
    let sdk: Arc<dyn PlayerSdk> = audio_backend.clone();
    let reconciler = Reconciler::new(
        &config,
        spotify_client,
        sdk,
        Arc::new(ui_tx),
        Box::new(store),
    );
    let reconciler_task = tokio::spawn(reconciler.run(session_rx));

    let controller = AppController::new(model.clone(), publisher.clone(), config.clone());
    let listener = controller.start_ui_update_listener(ui_rx);

    publisher.sdk(SdkEvent::Ready {
        device_name: config.device_name.clone(),
    });

    tracing::info!("Starting TUI...");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let res = run_app(&mut terminal, model.clone(), controller.clone()).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = ?err, "Application error");
    }

    controller.shutdown();
    if let Err(e) = reconciler_task.await {
        tracing::warn!(error = %e, "Reconciler task failed");
    }
    if let Err(e) = store_writer.await {
        tracing::warn!(error = %e, "Session store writer failed");
    }
    bridge.abort();
    listener.abort();
    audio_backend.shutdown();

    tracing::info!("Melodffy shutting down");
    Ok(())
}

async fn setup_rspotify(access_token: Token) -> Result<AuthCodeSpotify> {
    let spotify = AuthCodeSpotify::with_config(
        Default::default(),
        Default::default(),
        rspotify::Config {
            token_cached: false,
            token_refreshing: false,
            ..Default::default()
        },
    );

    *spotify
        .token
        .lock()
        .await
        .map_err(|_| anyhow::anyhow!("rspotify token lock poisoned"))? = Some(access_token);
    tracing::debug!("rspotify client initialized");
    Ok(spotify)
}

/// Load liked songs from disk when cached and refresh them from the API in the
/// background; on a first run fetch them before the UI starts.
async fn init_liked_songs(spotify: &SpotifyClient, model: &Arc<Mutex<AppModel>>) {
    if spotify.init_liked_songs_cache().await {
        model.lock().await.set_liked_ids(spotify.liked_ids().await).await;

        tracing::debug!("Liked songs cache found, refreshing in background");
        let spotify = spotify.clone();
        let model = model.clone();
        tokio::spawn(async move {
            match spotify.refresh_liked_songs_cache().await {
                Ok(()) => model.lock().await.set_liked_ids(spotify.liked_ids().await).await,
                Err(e) => tracing::warn!(error = %e, "Background liked songs refresh failed"),
            }
        });
        return;
    }

    tracing::info!("Loading liked songs from API (first run or cache miss)...");
    match spotify.refresh_liked_songs_cache().await {
        Ok(()) => model.lock().await.set_liked_ids(spotify.liked_ids().await).await,
        Err(e) => tracing::warn!(error = %e, "Could not load liked songs"),
    }
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    model: Arc<Mutex<AppModel>>,
    controller: AppController,
) -> io::Result<()> {
    let mut last_token_check = Instant::now();

    loop {
        if last_token_check.elapsed() >= TOKEN_CHECK_INTERVAL {
            last_token_check = Instant::now();

            let spotify = model.lock().await.get_spotify_client().await;
            if let Some(spotify) = spotify {
                tokio::spawn(async move {
                    if let Err(e) = spotify.refresh_token_if_needed().await {
                        tracing::warn!(error = %e, "Token refresh check failed");
                    }
                });
            }
        }

        let (playback, ui_state, content_state, should_quit) = {
            let model_guard = model.lock().await;
            model_guard.auto_clear_old_errors().await;
            (
                model_guard.get_playback_info().await,
                model_guard.get_ui_state().await,
                model_guard.get_content_state().await,
                model_guard.should_quit().await,
            )
        };

        terminal.draw(|f| {
            AppView::render(f, &playback, &ui_state, &content_state);
        })?;

        if should_quit {
            break;
        }

        if event::poll(INPUT_POLL)? {
            if let Event::Key(key) = event::read()? {
                if let Err(e) = controller.handle_key_event(key).await {
                    tracing::warn!(error = %e, "Key handling failed");
                }
            }
        }
    }

    Ok(())
}
