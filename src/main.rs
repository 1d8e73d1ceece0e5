use std::cell::RefCell;
use std::error::Error;
use std::process;
use std::rc::Rc;

use clap::Parser;

use chatterm::config::Config;
use chatterm::controller::ChatController;
use chatterm::demo::{self, DemoSource};
use chatterm::error::{AppError, WireError};
use chatterm::events::{Event, ThreadedManager};
use chatterm::logging;
use chatterm::meta::{LoggingOutbound, Outbound};
use chatterm::net::tcp::TcpTransport;
use chatterm::net::wire;
use chatterm::router::EventRouter;
use chatterm::ui::input::InputAction;
use chatterm::ui::term::{TermInput, TermScreen};
use chatterm::ui::SurfaceBuilder;

fn main() {
    let config = Config::parse();

    // By the time run() returns the terminal has been handed back, so errors can go to stderr.
    if let Err(e) = run(&config) {
        eprintln!("chatterm: {}", e);
        let mut source = e.source();
        while let Some(cause) = source {
            eprintln!("  caused by: {}", cause);
            source = cause.source();
        }
        process::exit(1);
    }
}

fn run(config: &Config) -> Result<(), AppError> {
    let _log_guard = logging::init(&config.logging)?;
    tracing::info!(user = %config.username, room = %config.room, demo = config.demo, "starting");

    let mut manager = ThreadedManager::new();

    let outbound: Box<dyn Outbound> = if config.demo {
        manager.start_source(Rc::new(RefCell::new(DemoSource::new(demo::DEFAULT_INTERVAL, None))));
        Box::new(LoggingOutbound)
    } else {
        let (transport, mut sender) = TcpTransport::connect(&config.host_url, config.port)?;
        sender.join(&config.room, &config.username)?;
        manager.start_source(Rc::new(RefCell::new(transport)));
        Box::new(sender)
    };

    let screen = TermScreen::new().map_err(AppError::Terminal)?;
    manager.start_source(Rc::new(RefCell::new(TermInput::new())));

    let surface = SurfaceBuilder::new()
        .title(config.title())
        .status_header(config.status_header())
        .scrollback(config.scrollback)
        .build(screen);
    let controller = Rc::new(RefCell::new(ChatController::new(
        surface,
        outbound,
        config.controller_settings(),
    )));

    let mut router = EventRouter::new();
    ChatController::attach(&controller, &mut router);
    controller.borrow_mut().start().map_err(AppError::Terminal)?;

    loop {
        match manager.next_event()? {
            Event::ServerLine(line) => match wire::decode(&line) {
                Ok(event) => router.publish(&event)?,
                Err(WireError::Blank) => tracing::trace!("ignoring blank server line"),
                Err(WireError::UnknownKind(e)) => {
                    tracing::error!(%line, "server sent an event kind we don't know");
                    return Err(e.into());
                }
                Err(e) => tracing::warn!(%line, error = %e, "skipping malformed server line"),
            },
            Event::Input(InputAction::Quit) => {
                tracing::info!("quitting");
                return Ok(());
            }
            Event::Input(action) => controller.borrow_mut().handle_input(action)?,
            Event::Resize => controller.borrow_mut().resize().map_err(AppError::Terminal)?,
            Event::ConnectionEnd { reason } => return Err(AppError::ConnectionEnd(reason)),
            Event::InternalError { what } => return Err(AppError::Internal(what)),
        }
    }
}
