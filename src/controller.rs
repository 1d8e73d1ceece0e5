//! Turns chat events into pane updates.
//!
//! Every handled event mutates exactly one pane and then redraws the whole surface once.  There
//! is no batching: N events cost N redraws.

use std::cell::RefCell;
use std::io;
use std::rc::Rc;

use crate::color::ColorRegistry;
use crate::error::HandlerError;
use crate::meta::{ActivityNotice, ChatMessage, Outbound, RosterSnapshot, UserIdentity};
use crate::router::{ChatEvent, EventKind, EventRouter, Handler};
use crate::ui::input::InputAction;
use crate::ui::pane::{Line, Span, Style};
use crate::ui::{Screen, Surface};

/// What to do when the user submits a line that is empty or only whitespace.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, clap::ValueEnum)]
pub enum EmptyInputPolicy {
    /// Send it like any other line.
    #[default]
    PassThrough,
    /// Don't send it; leave the input box as it was.
    Reject,
}

#[derive(Clone, Debug, Default)]
pub struct ControllerSettings {
    /// Who we are.  Needed only for echoing our own lines.
    pub local_user: Option<UserIdentity>,
    /// Append submitted lines to the chat pane as if the server had sent them back.
    pub echo: bool,
    pub empty_input: EmptyInputPolicy,
}

pub struct ChatController<S: Screen> {
    colors: ColorRegistry,
    surface: Surface<S>,
    outbound: Box<dyn Outbound>,
    settings: ControllerSettings,
}

impl<S: Screen> ChatController<S> {
    pub fn new(surface: Surface<S>, outbound: Box<dyn Outbound>, settings: ControllerSettings) -> ChatController<S> {
        ChatController::with_colors(ColorRegistry::new(), surface, outbound, settings)
    }

    pub fn with_colors(
        colors: ColorRegistry,
        surface: Surface<S>,
        outbound: Box<dyn Outbound>,
        settings: ControllerSettings,
    ) -> ChatController<S> {
        ChatController {
            colors,
            surface,
            outbound,
            settings,
        }
    }

    /// Subscribe `this` to every chat event kind.
    pub fn attach(this: &Rc<RefCell<ChatController<S>>>, router: &mut EventRouter)
    where
        S: 'static,
    {
        for kind in EventKind::ALL.iter() {
            router.subscribe(*kind, this.clone());
        }
    }

    /// Put the cursor in the input box and draw the first frame.
    pub fn start(&mut self) -> io::Result<()> {
        self.surface.focus_input();
        self.surface.render()
    }

    pub fn surface(&self) -> &Surface<S> {
        &self.surface
    }

    pub fn colors(&self) -> &ColorRegistry {
        &self.colors
    }

    /// A user's name in their color, bold.
    fn user_span(&mut self, user: &UserIdentity) -> Span {
        let color = self.colors.color_for(user);
        Span::new(user.as_str(), Style::user(color))
    }

    fn message_line(&mut self, msg: &ChatMessage) -> Line {
        let name = self.user_span(&msg.sender);
        Line::new(vec![name, Span::new(format!(": {}", msg.text), Style::plain())])
    }

    pub fn on_message(&mut self, msg: &ChatMessage) -> Result<(), HandlerError> {
        let line = self.message_line(msg);
        self.surface.chat_mut().add_item(line);
        self.surface.render()?;
        Ok(())
    }

    /// The whole notice is drawn in the color of the user it starts with.
    pub fn on_activity(&mut self, notice: &ActivityNotice) -> Result<(), HandlerError> {
        let color = self.colors.color_for(&notice.identity());
        self.surface
            .activity_mut()
            .add_item(Line::styled(notice.as_str(), Style::user(color)));
        self.surface.render()?;
        Ok(())
    }

    /// Repaint the roster body from scratch: one line per entry, in the order given.
    pub fn on_status(&mut self, roster: &RosterSnapshot) -> Result<(), HandlerError> {
        let lines: Vec<Line> = roster
            .iter()
            .map(|user| Line::new(vec![self.user_span(user)]))
            .collect();

        let status = self.surface.status_mut();
        status.clear_items();
        for line in lines {
            status.add_item(line);
        }

        self.surface.render()?;
        Ok(())
    }

    /// Apply a key-level action to the input box.
    pub fn handle_input(&mut self, action: InputAction) -> Result<(), HandlerError> {
        match action {
            InputAction::Submit => {
                self.submit_input()?;
            }
            InputAction::Quit => {}
            edit => {
                self.surface.input_mut().apply(edit);
                self.surface.render()?;
            }
        }
        Ok(())
    }

    /// Send whatever is in the input box, then clear it.  Returns the line that went out, or
    /// `None` if the empty-input policy held it back.  On a transport failure the input is left
    /// alone so it can be resent.
    pub fn submit_input(&mut self) -> Result<Option<String>, HandlerError> {
        let line = self.surface.input().value();

        if self.settings.empty_input == EmptyInputPolicy::Reject && line.trim().is_empty() {
            tracing::debug!("ignoring empty submission");
            return Ok(None);
        }

        self.outbound.send_line(&line)?;

        if self.settings.echo {
            if let Some(me) = self.settings.local_user.clone() {
                let echoed = self.message_line(&ChatMessage {
                    sender: me,
                    text: line.clone(),
                });
                self.surface.chat_mut().add_item(echoed);
            }
        }

        self.surface.input_mut().clear();
        self.surface.render()?;
        Ok(Some(line))
    }

    pub fn resize(&mut self) -> io::Result<()> {
        self.surface.resize()
    }
}

impl<S: Screen> Handler for ChatController<S> {
    fn handle(&mut self, event: &ChatEvent) -> Result<(), HandlerError> {
        tracing::debug!(kind = %event.kind(), "rendering event");
        match event {
            ChatEvent::MessageReceived(msg) => self.on_message(msg),
            ChatEvent::ActivityUpdate(notice) => self.on_activity(notice),
            ChatEvent::StatusUpdated(roster) => self.on_status(roster),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::ColorToken;
    use crate::error::{RouterError, TransportError};
    use crate::ui::{RecordingScreen, SurfaceBuilder};
    use pretty_assertions::assert_eq;

    #[derive(Clone, Default)]
    struct SentLines(Rc<RefCell<Vec<String>>>);

    impl Outbound for SentLines {
        fn send_line(&mut self, line: &str) -> Result<(), TransportError> {
            self.0.borrow_mut().push(line.to_string());
            Ok(())
        }
    }

    struct BrokenPipe;

    impl Outbound for BrokenPipe {
        fn send_line(&mut self, _line: &str) -> Result<(), TransportError> {
            Err(TransportError::Io(io::Error::new(io::ErrorKind::BrokenPipe, "gone")))
        }
    }

    const HEADER: &str = "Users";

    fn controller_with(settings: ControllerSettings) -> (ChatController<RecordingScreen>, SentLines) {
        let sent = SentLines::default();
        let surface = SurfaceBuilder::new()
            .status_header(HEADER)
            .build(RecordingScreen::default());
        let controller = ChatController::with_colors(
            ColorRegistry::with_seed(42),
            surface,
            Box::new(sent.clone()),
            settings,
        );
        (controller, sent)
    }

    fn controller() -> ChatController<RecordingScreen> {
        controller_with(ControllerSettings::default()).0
    }

    fn draws(c: &ChatController<RecordingScreen>) -> usize {
        c.surface().screen().draws
    }

    fn color_of(c: &ChatController<RecordingScreen>, name: &str) -> ColorToken {
        c.colors().get(&UserIdentity::new(name)).expect("user has a color")
    }

    fn user_line(c: &ChatController<RecordingScreen>, name: &str) -> Line {
        Line::styled(name, Style::user(color_of(c, name)))
    }

    fn roster(names: &[&str]) -> RosterSnapshot {
        names.iter().copied().collect()
    }

    fn status_items(c: &ChatController<RecordingScreen>) -> Vec<Line> {
        c.surface().status().items().cloned().collect()
    }

    #[test]
    fn message_appends_one_colored_line_and_redraws_once() {
        let mut c = controller();
        c.on_message(&ChatMessage::new("alice", "hi")).unwrap();

        let items: Vec<&Line> = c.surface().chat().items().collect();
        assert_eq!(items.len(), 1);
        let alice = color_of(&c, "alice");
        assert_eq!(
            *items[0],
            Line::new(vec![
                Span::new("alice", Style::user(alice)),
                Span::new(": hi", Style::plain()),
            ])
        );
        assert!(items[0].plain_text().contains("hi"));
        assert_eq!(draws(&c), 1);
    }

    #[test]
    fn activity_keeps_the_original_notice() {
        let mut c = controller();
        c.on_activity(&ActivityNotice::new("bob left")).unwrap();

        let bob = color_of(&c, "bob");
        let items: Vec<&Line> = c.surface().activity().items().collect();
        assert_eq!(items, vec![&Line::styled("bob left", Style::user(bob))]);
        assert_eq!(c.colors().len(), 1);
        assert_eq!(draws(&c), 1);
    }

    #[test]
    fn activity_without_whitespace_colors_by_whole_line() {
        let mut c = controller();
        c.on_activity(&ActivityNotice::new("carol")).unwrap();
        c.on_activity(&ActivityNotice::new("")).unwrap();

        assert!(c.colors().get(&UserIdentity::new("carol")).is_some());
        assert!(c.colors().get(&UserIdentity::new("")).is_some());
        assert_eq!(c.surface().activity().len(), 2);
    }

    #[test]
    fn status_repaint_keeps_header_and_replaces_body() {
        let mut c = controller();
        c.on_status(&roster(&["x", "y"])).unwrap();
        c.on_status(&roster(&["a", "b", "c"])).unwrap();

        let expected = vec![
            Line::styled(HEADER, Style::bold()),
            user_line(&c, "a"),
            user_line(&c, "b"),
            user_line(&c, "c"),
        ];
        assert_eq!(status_items(&c), expected);
        assert_eq!(draws(&c), 2);
    }

    #[test]
    fn status_repaint_is_a_snapshot_and_keeps_duplicates() {
        let mut c = controller();
        c.on_status(&roster(&["a"])).unwrap();
        c.on_status(&roster(&["a", "a"])).unwrap();

        let expected = vec![
            Line::styled(HEADER, Style::bold()),
            user_line(&c, "a"),
            user_line(&c, "a"),
        ];
        assert_eq!(status_items(&c), expected);
    }

    #[test]
    fn empty_roster_leaves_just_the_header() {
        let mut c = controller();
        c.on_status(&roster(&["a", "b"])).unwrap();
        c.on_status(&roster(&[])).unwrap();
        c.on_status(&roster(&[])).unwrap();
        assert_eq!(status_items(&c), vec![Line::styled(HEADER, Style::bold())]);
    }

    #[test]
    fn end_to_end_through_the_router() {
        let (c, _) = controller_with(ControllerSettings::default());
        let c = Rc::new(RefCell::new(c));
        let mut router = EventRouter::new();
        ChatController::attach(&c, &mut router);

        router.publish(&ChatEvent::StatusUpdated(roster(&["alice"]))).unwrap();
        router
            .publish(&ChatEvent::MessageReceived(ChatMessage::new("alice", "Hello")))
            .unwrap();
        router
            .publish(&ChatEvent::ActivityUpdate(ActivityNotice::new("alice join")))
            .unwrap();
        router
            .publish(&ChatEvent::StatusUpdated(roster(&["alice", "bob"])))
            .unwrap();

        let c = c.borrow();
        let alice = color_of(&c, "alice");
        assert_eq!(
            status_items(&c),
            vec![
                Line::styled(HEADER, Style::bold()),
                user_line(&c, "alice"),
                user_line(&c, "bob"),
            ]
        );

        let chat: Vec<&Line> = c.surface().chat().items().collect();
        assert_eq!(chat.len(), 1);
        assert_eq!(chat[0].spans()[0].style, Style::user(alice));
        assert_eq!(chat[0].plain_text(), "alice: Hello");

        let activity: Vec<&Line> = c.surface().activity().items().collect();
        assert_eq!(activity, vec![&Line::styled("alice join", Style::user(alice))]);

        assert_eq!(c.colors().len(), 2);
        assert_eq!(draws(&c), 4);
    }

    #[test]
    fn render_failure_surfaces_through_publish() {
        let (mut c, _) = controller_with(ControllerSettings::default());
        c.surface.screen_mut().fail_next = true;
        let c = Rc::new(RefCell::new(c));
        let mut router = EventRouter::new();
        ChatController::attach(&c, &mut router);

        let err = router
            .publish(&ChatEvent::MessageReceived(ChatMessage::new("alice", "hi")))
            .unwrap_err();
        match err {
            RouterError::Handler {
                kind: EventKind::MessageReceived,
                source: HandlerError::Render(_),
            } => {}
            other => panic!("unexpected error: {:?}", other),
        }
    }

    fn type_line(c: &mut ChatController<RecordingScreen>, text: &str) {
        for ch in text.chars() {
            c.handle_input(InputAction::Insert(ch)).unwrap();
        }
    }

    #[test]
    fn submit_sends_and_clears() {
        let (mut c, sent) = controller_with(ControllerSettings::default());
        type_line(&mut c, "hello there");
        let before = draws(&c);

        c.handle_input(InputAction::Submit).unwrap();

        assert_eq!(*sent.0.borrow(), vec!["hello there".to_string()]);
        assert_eq!(c.surface().input().value(), "");
        assert_eq!(c.surface().chat().len(), 0);
        assert_eq!(draws(&c), before + 1);
    }

    #[test]
    fn pass_through_policy_sends_empty_lines() {
        let (mut c, sent) = controller_with(ControllerSettings::default());
        assert_eq!(c.submit_input().unwrap(), Some(String::new()));
        assert_eq!(*sent.0.borrow(), vec![String::new()]);
    }

    #[test]
    fn reject_policy_holds_back_blank_lines() {
        let (mut c, sent) = controller_with(ControllerSettings {
            empty_input: EmptyInputPolicy::Reject,
            ..ControllerSettings::default()
        });
        type_line(&mut c, "   ");
        assert_eq!(c.submit_input().unwrap(), None);
        assert!(sent.0.borrow().is_empty());
        assert_eq!(c.surface().input().value(), "   ");

        c.handle_input(InputAction::ClearLine).unwrap();
        type_line(&mut c, "ok");
        assert_eq!(c.submit_input().unwrap(), Some("ok".to_string()));
    }

    #[test]
    fn echo_shows_own_line_in_own_color() {
        let (mut c, _) = controller_with(ControllerSettings {
            local_user: Some(UserIdentity::new("me")),
            echo: true,
            ..ControllerSettings::default()
        });
        c.on_message(&ChatMessage::new("me", "earlier")).unwrap();
        type_line(&mut c, "now");
        c.submit_input().unwrap();

        let chat: Vec<String> = c.surface().chat().items().map(Line::plain_text).collect();
        assert_eq!(chat, vec!["me: earlier", "me: now"]);
        let lines: Vec<&Line> = c.surface().chat().items().collect();
        assert_eq!(lines[0].spans()[0].style, lines[1].spans()[0].style);
    }

    #[test]
    fn transport_failure_keeps_the_input() {
        let surface = SurfaceBuilder::new().build(RecordingScreen::default());
        let mut c = ChatController::new(surface, Box::new(BrokenPipe), ControllerSettings::default());
        type_line(&mut c, "retry me");

        match c.submit_input() {
            Err(HandlerError::Outbound(_)) => {}
            other => panic!("expected outbound failure, got {:?}", other),
        }
        assert_eq!(c.surface().input().value(), "retry me");
    }

    #[test]
    fn start_focuses_input_and_draws() {
        let mut c = controller();
        c.start().unwrap();
        assert!(c.surface().input().is_focused());
        assert_eq!(draws(&c), 1);
    }
}
