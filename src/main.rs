mod app;
mod clipboard;
mod config;
mod notify;
mod theme;
mod ui;
mod utm;

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use app::App;
use clipboard::SystemClipboard;
use config::AppConfig;
use utm::presets::Preset;
use utm::{ParameterSet, UtmParam};

/// Exit status for a base URL that does not parse
const EXIT_INVALID_URL: i32 = 2;

/// How long `--copy` keeps serving the selection for a clipboard manager or a paste
const CLI_CLIPBOARD_HOLD: Duration = Duration::from_secs(15);

#[derive(Parser, Debug)]
#[command(name = "utmkit")]
#[command(version)]
#[command(about = "Build UTM-tagged campaign links from the terminal")]
struct Args {
    /// Base URL; composes once and prints instead of opening the form
    #[arg(short = 'u', long = "url")]
    url: Option<String>,

    /// utm_source, e.g. google
    #[arg(short, long)]
    source: Option<String>,

    /// utm_medium, e.g. cpc
    #[arg(short, long)]
    medium: Option<String>,

    /// utm_campaign, e.g. spring_sale
    #[arg(short, long)]
    campaign: Option<String>,

    /// utm_term (keyword)
    #[arg(short, long)]
    term: Option<String>,

    /// utm_content (ad variant)
    #[arg(long)]
    content: Option<String>,

    /// Any parameter as KEY=VALUE (`source=google` or `utm_source=google`);
    /// the named flags above take precedence
    #[arg(short = 'p', long = "param", value_name = "KEY=VALUE", value_parser = parse_param)]
    params: Vec<(UtmParam, String)>,

    /// Also copy the composed link to the clipboard
    #[arg(long)]
    copy: bool,

    /// Print the link and its parameters as JSON
    #[arg(long)]
    json: bool,

    /// List suggested sources, mediums and campaigns
    #[arg(long)]
    presets: bool,
}

fn parse_param(s: &str) -> Result<(UtmParam, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{}`", s))?;
    let param = key.parse::<UtmParam>().map_err(|e| e.to_string())?;
    Ok((param, value.to_string()))
}

impl Args {
    fn parameter_set(&self) -> ParameterSet {
        let mut params: ParameterSet = self.params.iter().cloned().collect();

        let named = [
            (UtmParam::Source, &self.source),
            (UtmParam::Medium, &self.medium),
            (UtmParam::Campaign, &self.campaign),
            (UtmParam::Term, &self.term),
            (UtmParam::Content, &self.content),
        ];
        for (param, value) in named {
            if let Some(value) = value {
                params.set(param, value.as_str());
            }
        }
        params
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let interactive = args.url.is_none() && !args.presets;

    init_logging(interactive);

    let config = AppConfig::load().unwrap_or_default();

    if args.presets {
        print_presets(&config, args.json)?;
        return Ok(());
    }

    if let Some(ref base_url) = args.url {
        let code = compose_once(base_url, &args).await?;
        if code != 0 {
            std::process::exit(code);
        }
        return Ok(());
    }

    // Run TUI
    run_tui(config).await
}

/// Logs go to stderr for one-shot commands, and to a file while the form
/// owns the terminal.
fn init_logging(interactive: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    let log_file = if interactive {
        AppConfig::config_dir()
            .ok()
            .and_then(|dir| std::fs::File::create(dir.join("utmkit.log")).ok())
    } else {
        None
    };

    match log_file {
        Some(file) => tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(Arc::new(file))
                    .with_ansi(false),
            )
            .with(filter)
            .init(),
        None => tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .with(filter)
            .init(),
    }
}

async fn compose_once(base_url: &str, args: &Args) -> Result<i32> {
    let params = args.parameter_set();

    let url = match utm::compose(base_url, &params) {
        Ok(url) => url,
        Err(e) => {
            eprintln!("error: {}", e);
            return Ok(EXIT_INVALID_URL);
        }
    };

    if args.json {
        println!("{}", serde_json::to_string(&compose_json(&url, &params))?);
    } else {
        println!("{}", url);
    }

    if args.copy {
        let sink = Arc::new(SystemClipboard::for_cli(CLI_CLIPBOARD_HOLD));
        if cfg!(target_os = "linux") {
            eprintln!(
                "Serving the link on the clipboard (up to {}s, until it is taken over)...",
                CLI_CLIPBOARD_HOLD.as_secs()
            );
        }
        // The link is already printed, so a clipboard failure is only a warning
        if let Err(e) = clipboard::copy(sink, url).await {
            eprintln!("warning: {}", e);
        }
    }

    Ok(0)
}

/// `{ "url": ..., "params": [{ "key": "utm_source", "value": ... }, ...] }`
fn compose_json(url: &str, params: &ParameterSet) -> serde_json::Value {
    serde_json::json!({
        "url": url,
        "params": params
            .populated()
            .map(|(p, v)| serde_json::json!({ "key": p.key(), "value": v }))
            .collect::<Vec<_>>(),
    })
}

fn preset_groups(config: &AppConfig) -> Vec<(UtmParam, Vec<Preset>)> {
    [UtmParam::Source, UtmParam::Medium, UtmParam::Campaign]
        .into_iter()
        .map(|p| (p, utm::presets::presets_for(p, config.extra_presets(p))))
        .collect()
}

/// Suggestion lists keyed by `utm_*` name
fn presets_json(config: &AppConfig) -> Result<serde_json::Value> {
    let output = preset_groups(config)
        .into_iter()
        .map(|(p, presets)| -> Result<(String, serde_json::Value)> {
            Ok((p.to_string(), serde_json::to_value(presets)?))
        })
        .collect::<Result<serde_json::Map<_, _>>>()?;
    Ok(serde_json::Value::Object(output))
}

fn print_presets(config: &AppConfig, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&presets_json(config)?)?);
        return Ok(());
    }

    for (param, presets) in preset_groups(config) {
        println!("{}:", param);
        for preset in presets {
            println!("  {:<14} {}", preset.value, preset.label);
        }
    }
    Ok(())
}

async fn run_tui(config: AppConfig) -> Result<()> {
    ui::init_theme(theme::Theme::from_config(&config.theme));

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config, Arc::new(SystemClipboard::new()));

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if key.code == KeyCode::Char('c')
                        && key.modifiers.contains(KeyModifiers::CONTROL)
                        && !key.modifiers.contains(KeyModifiers::ALT)
                    {
                        return Ok(());
                    }
                    // Keep the session alive on handler errors
                    if let Err(e) = app.handle_key(key).await {
                        tracing::error!("Key handling failed: {:#}", e);
                    }
                    if app.should_quit {
                        return Ok(());
                    }
                }
            }
        }

        app.tick();
    }
}
