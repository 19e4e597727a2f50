use clap::Parser;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use csvpeek::{App, AppConfig, AppEvent, Args, CacheManager, ConfigManager, CsvModel, Theme};
use ratatui::DefaultTerminal;
use std::path::Path;
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;
use tracing::info;

fn render(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
    terminal.draw(|frame| frame.render_widget(app, frame.area()))?;
    Ok(())
}

fn run(
    mut terminal: DefaultTerminal,
    mut app: App,
    tx: Sender<AppEvent>,
    rx: Receiver<AppEvent>,
    poll_interval: Duration,
) -> Result<()> {
    render(&mut terminal, &mut app)?;

    loop {
        if crossterm::event::poll(poll_interval)? {
            match crossterm::event::read()? {
                crossterm::event::Event::Key(key) => tx.send(AppEvent::Key(key))?,
                crossterm::event::Event::Resize(cols, rows) => {
                    tx.send(AppEvent::Resize(cols, rows))?
                }
                _ => {}
            }
        }

        let mut updated = false;
        loop {
            match rx.recv_timeout(Duration::from_millis(0)) {
                Ok(AppEvent::Exit) => return Ok(()),
                Ok(event) => {
                    if let Some(event) = app.event(&event) {
                        tx.send(event)?;
                    }
                    updated = true;
                }
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => return Ok(()),
            }
        }

        if updated {
            render(&mut terminal, &mut app)?;
        }
    }
}

fn handle_early_exit_flags(args: &Args) -> Result<Option<()>> {
    if args.clear_cache {
        let cache = CacheManager::new(csvpeek::APP_NAME)?;
        if cache.clear_all()? {
            println!("Cache cleared successfully");
        } else {
            println!("No cache to clear");
        }
        return Ok(Some(()));
    }

    if args.generate_config {
        let config_manager = ConfigManager::new(csvpeek::APP_NAME)?;
        let path = config_manager.write_default_config(args.force)?;
        println!("Wrote default configuration to {}", path.display());
        return Ok(Some(()));
    }

    Ok(None)
}

fn open_model(path: &Path, config: &AppConfig, tx: &Sender<AppEvent>) -> Result<CsvModel> {
    let hook_tx = tx.clone();
    let mut model = CsvModel::new(config.engine_options()?).with_data_ready_hook(move || {
        // the receiver is gone only while shutting down
        let _ = hook_tx.send(AppEvent::DataReady);
    });
    model
        .open(path)
        .wrap_err_with(|| format!("Failed to open {}", path.display()))?;
    Ok(model)
}

fn main() -> Result<()> {
    let args = Args::parse();

    color_eyre::install()?;

    if let Some(()) = handle_early_exit_flags(&args)? {
        return Ok(());
    }

    let mut config = AppConfig::load(csvpeek::APP_NAME)?;
    config.apply_args(&args);
    config.validate()?;

    let cache = CacheManager::new(csvpeek::APP_NAME)?;
    let _log_guard = match csvpeek::logging::init(&cache, &config.debug.log_level) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: Could not initialize file logging: {}", e);
            None
        }
    };

    let Some(path) = args.path.as_deref() else {
        return Err(color_eyre::eyre::eyre!("No file given"));
    };

    let (tx, rx) = channel::<AppEvent>();
    // open before taking over the terminal so errors print normally
    let model = open_model(path, &config, &tx)?;
    let theme = Theme::from_config(&config.theme)?;
    info!(path = %path.display(), "starting viewer");

    let terminal = ratatui::init();
    let height = terminal.size().map(|size| size.height).unwrap_or(24);
    let app = App::new(model, config.display.clone(), theme, height);
    let poll_interval = Duration::from_millis(config.performance.event_poll_interval_ms);
    let result = run(terminal, app, tx, rx, poll_interval);
    ratatui::restore();
    result
}
