use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent,
    MouseEventKind,
};
use crossterm::execute;
use ratatui::DefaultTerminal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tui_geoedit::app::{App, DrawMode};
use tui_geoedit::config::MapConfig;
use tui_geoedit::persist::{GeoJsonBackend, MemoryBackend, ShapeBackend};
use tui_geoedit::shapes::ShapeKind;
use tui_geoedit::ui;

#[derive(Parser, Debug)]
#[command(author, version, about = "Draw and edit georeferenced shapes over a tile map")]
struct Args {
    /// Map configuration (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// GeoJSON file shapes are loaded from and saved to; in-memory when absent
    #[arg(long)]
    shapes: Option<PathBuf>,

    /// Layer to open
    #[arg(long)]
    layer: Option<String>,

    /// Initial zoom, overriding the config file
    #[arg(long)]
    zoom: Option<u8>,

    /// Browse only; no drawing or editing
    #[arg(long)]
    read_only: bool,

    /// Write logs here (the terminal belongs to the UI)
    #[arg(long, env = "TUI_GEOEDIT_LOG")]
    log_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(path) = &args.log_file {
        let file = File::create(path).with_context(|| format!("creating log file {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .init();
    }

    let mut config = match &args.config {
        Some(path) => MapConfig::load(path)?,
        None => MapConfig::default(),
    };
    if let Some(layer) = &args.layer {
        config.layer_id = layer.clone();
    }
    if let Some(zoom) = args.zoom {
        config.initial_zoom = zoom;
    }
    let config = config.normalized();

    let (backend, layers): (Box<dyn ShapeBackend>, Vec<String>) = match &args.shapes {
        Some(path) => {
            let backend = GeoJsonBackend::open(path, config.layer_id.clone())
                .with_context(|| format!("opening shape file {}", path.display()))?;
            let layers = backend.layers();
            (Box::new(backend), layers)
        }
        None => (Box::new(MemoryBackend::new(config.layer_id.clone())), Vec::new()),
    };
    info!(layer = %config.layer_id, read_only = args.read_only, "starting");

    let mut app = App::new(&config, backend, layers, !args.read_only);

    // Initialize terminal
    let mut terminal = ratatui::init();
    terminal.clear()?;
    execute!(std::io::stdout(), EnableMouseCapture)?;

    let result = run(&mut terminal, &mut app);

    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    result
}

/// Route mouse events: clicks draw or select, drags pan
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    app.set_mouse_pos(mouse.column, mouse.row);

    match mouse.kind {
        MouseEventKind::ScrollUp => app.on_wheel(1.0),
        MouseEventKind::ScrollDown => app.on_wheel(-1.0),
        // The border and side panel are not map
        MouseEventKind::Down(_) if !app.cell_on_map(mouse.column, mouse.row) => {}
        MouseEventKind::Down(MouseButton::Left) => {
            let screen = app.cell_to_px(mouse.column, mouse.row);
            if matches!(app.draw, DrawMode::Drawing { .. }) {
                app.add_vertex(screen);
            } else if let Some(id) = app.shape_at(screen) {
                app.on_shape_click(id);
            } else {
                app.last_mouse = Some((mouse.column, mouse.row));
                app.on_mouse_down();
            }
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            app.handle_drag(mouse.column, mouse.row);
        }
        MouseEventKind::Up(MouseButton::Left) => {
            app.end_drag();
        }
        // Right click moves the selected point
        MouseEventKind::Down(MouseButton::Right) => {
            let screen = app.cell_to_px(mouse.column, mouse.row);
            app.move_selected_to(screen);
        }
        _ => {}
    }
}

/// Keys while the attribute input line is open
fn handle_input_key(app: &mut App, key: KeyEvent) {
    let Some(input) = app.input.as_mut() else {
        return;
    };
    match key.code {
        KeyCode::Enter => {
            let line = std::mem::take(input);
            app.input = None;
            app.stage_attribute(&line);
        }
        KeyCode::Esc => app.input = None,
        KeyCode::Backspace => {
            input.pop();
        }
        KeyCode::Char(c) => input.push(c),
        _ => {}
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if app.input.is_some() {
        handle_input_key(app, key);
        return;
    }
    let drawing = matches!(app.draw, DrawMode::Drawing { .. });
    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Esc if drawing => app.abort_draw(),
        KeyCode::Esc => app.cancel_panel(),
        KeyCode::Enter if drawing => app.finish_draw(),

        KeyCode::Char('+') | KeyCode::Char('=') => app.on_zoom_in(),
        KeyCode::Char('-') | KeyCode::Char('_') => app.on_zoom_out(),

        KeyCode::Char('p') => app.begin_draw(ShapeKind::Point),
        KeyCode::Char('l') => app.begin_draw(ShapeKind::Line),
        KeyCode::Char('g') => app.begin_draw(ShapeKind::Polygon),

        KeyCode::Char('n') => app.next_layer(),
        KeyCode::Char('x') | KeyCode::Delete => app.delete_selected(),
        KeyCode::Char('m') => {
            if let Some((col, row)) = app.mouse_pos.filter(|&(c, r)| app.cell_on_map(c, r)) {
                let screen = app.cell_to_px(col, row);
                app.move_selected_to(screen);
            }
        }
        KeyCode::Char('a') if app.panel_open() && app.selection.can_write() => app.input = Some(String::new()),
        KeyCode::Char('s') if app.panel_open() => app.save_panel(),
        KeyCode::Char('c') if app.panel_open() => app.cancel_panel(),
        _ => {}
    }
}

fn run(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
    loop {
        // Measure the host every frame; resizes arrive between events too
        let size = terminal.size()?;
        app.resize(size.width, size.height);

        terminal.draw(|frame| ui::render(frame, app))?;

        // Handle events with ~60fps target
        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(app, key),
                Event::Mouse(mouse) => handle_mouse(app, mouse),
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
