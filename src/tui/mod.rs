//! Form-driven terminal UI.
//!
//! The UI thread owns the [`SessionState`] aggregate and is its only writer
//! on the presentation side; the controller communicates through events. All
//! blocking terminal I/O stays off the Tokio runtime.

use crate::cli::Cli;
use crate::engine::{LocalEngine, RuntimeHandle};
use crate::model::{FormState, NOTE_INPUT_SLOTS};
use crate::orchestrator::{self, SessionEvent, UiCommand};
use crate::session::SessionState;
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame, Terminal,
};
use std::sync::Arc;
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

/// Which form field receives keystrokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    NoteScript,
    TransactionScript,
    NoteInput(usize),
    AssetAmount,
    WalletToggle,
    AuthToggle,
    AccountCode,
}

impl Focus {
    fn next(self) -> Self {
        match self {
            Focus::NoteScript => Focus::TransactionScript,
            Focus::TransactionScript => Focus::NoteInput(0),
            Focus::NoteInput(i) if i + 1 < NOTE_INPUT_SLOTS => Focus::NoteInput(i + 1),
            Focus::NoteInput(_) => Focus::AssetAmount,
            Focus::AssetAmount => Focus::WalletToggle,
            Focus::WalletToggle => Focus::AuthToggle,
            Focus::AuthToggle => Focus::AccountCode,
            Focus::AccountCode => Focus::NoteScript,
        }
    }

    fn prev(self) -> Self {
        match self {
            Focus::NoteScript => Focus::AccountCode,
            Focus::TransactionScript => Focus::NoteScript,
            Focus::NoteInput(0) => Focus::TransactionScript,
            Focus::NoteInput(i) => Focus::NoteInput(i - 1),
            Focus::AssetAmount => Focus::NoteInput(NOTE_INPUT_SLOTS - 1),
            Focus::WalletToggle => Focus::AssetAmount,
            Focus::AuthToggle => Focus::WalletToggle,
            Focus::AccountCode => Focus::AuthToggle,
        }
    }
}

struct UiState {
    session: SessionState,
    focus: Focus,
    running: bool,
    /// Per-call policy: submissions are accepted even though the runtime is
    /// not loaded yet.
    accepting: bool,
    info: String,
}

impl UiState {
    fn new(form: FormState) -> Self {
        Self {
            session: SessionState::new(form),
            focus: Focus::NoteScript,
            running: false,
            accepting: false,
            info: "Initializing engine…".into(),
        }
    }
}

pub async fn run(args: Cli) -> Result<()> {
    // Unbounded channels avoid backpressure between the UI thread and the
    // controller task.
    let (event_tx, event_rx) = mpsc::unbounded_channel::<SessionEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    let form = crate::cli::build_form(&args)?;
    let runtime = RuntimeHandle::new(Arc::new(LocalEngine), args.init_policy);

    // TUI runs in a dedicated thread to keep blocking I/O out of the runtime.
    let ui_handle = std::thread::spawn(move || run_threaded(form, event_rx, cmd_tx));

    let res = orchestrator::run_controller(runtime, event_tx, cmd_rx).await;

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }

    res
}

/// Run the TUI loop on a dedicated thread.
fn run_threaded(
    form: FormState,
    mut event_rx: UnboundedReceiver<SessionEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    let mut state = UiState::new(form);

    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    let res = loop {
        // Drain controller events without blocking to keep the UI responsive.
        while let Ok(ev) = event_rx.try_recv() {
            apply_event(&mut state, ev);
        }

        if last_tick.elapsed() >= tick_rate {
            terminal.draw(|f| draw(f.area(), f, &state)).ok();
            last_tick = Instant::now();
        }

        // Poll input with a short timeout to avoid blocking the render loop.
        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                match (k.modifiers, k.code) {
                    (KeyModifiers::CONTROL, KeyCode::Char('c')) => {
                        let _ = cmd_tx.send(UiCommand::Quit);
                        break Ok(());
                    }
                    (KeyModifiers::CONTROL, KeyCode::Char('r')) => {
                        if state.running {
                            state.info = "Execution already running".into();
                        } else {
                            state.info = "Executing transaction…".into();
                            let _ = cmd_tx.send(UiCommand::Submit(state.session.form().clone()));
                        }
                    }
                    (KeyModifiers::CONTROL, KeyCode::Char('l')) => {
                        let _ = cmd_tx.send(UiCommand::Reset);
                    }
                    (_, KeyCode::Tab) => state.focus = state.focus.next(),
                    (_, KeyCode::BackTab) => state.focus = state.focus.prev(),
                    (_, KeyCode::Char(c)) => edit_char(&mut state, c),
                    (_, KeyCode::Enter) => {
                        // Newlines only make sense in the script fields.
                        if matches!(
                            state.focus,
                            Focus::NoteScript | Focus::TransactionScript | Focus::AccountCode
                        ) {
                            edit_char(&mut state, '\n');
                        }
                    }
                    (_, KeyCode::Backspace) => edit_backspace(&mut state),
                    _ => {}
                }
            }
        }
    };

    disable_raw_mode().ok();
    execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
    terminal.show_cursor().ok();
    res
}

fn apply_event(state: &mut UiState, ev: SessionEvent) {
    match ev {
        SessionEvent::RuntimeReady => {
            state.session.set_runtime_ready(true);
            state.info = "Engine ready".into();
        }
        SessionEvent::AcceptingSubmissions => {
            state.accepting = true;
            state.info = "Engine initializes on each submission".into();
        }
        SessionEvent::RuntimeInitFailed { message } => {
            state.session.set_runtime_ready(false);
            state.session.record_error(message.clone());
            state.info = message;
        }
        SessionEvent::SubmissionStarted => {
            state.running = true;
            state.session.begin_submission();
        }
        SessionEvent::ExecutionCompleted { outputs } => {
            state.running = false;
            state.session.record_result(*outputs);
            state.info = "Execution completed".into();
        }
        SessionEvent::ExecutionFailed { message } => {
            state.running = false;
            state.session.record_error(message);
            state.info = "Execution failed".into();
        }
        SessionEvent::SessionReset => {
            state.running = false;
            state.session.reset();
            state.info = "Session reset".into();
        }
        SessionEvent::Info(msg) => state.info = msg,
    }
}

/// Append a character to the focused field. Numeric fields re-sanitize the
/// whole new value, so an invalid keystroke lands as "0".
fn edit_char(state: &mut UiState, c: char) {
    let session = &mut state.session;
    match state.focus {
        Focus::NoteScript => {
            let mut text = session.form().note_script.clone();
            text.push(c);
            session.set_note_script(text);
        }
        Focus::TransactionScript => {
            let mut text = session.form().transaction_script.clone();
            text.push(c);
            session.set_transaction_script(text);
        }
        Focus::AccountCode => {
            let mut text = session.form().account_code.clone();
            text.push(c);
            session.set_account_code(text);
        }
        Focus::NoteInput(i) => {
            let mut value = session.form().note_inputs[i].clone();
            value.push(c);
            session.set_note_input(i, &value);
        }
        Focus::AssetAmount => {
            let mut value = session.form().asset_amount.clone();
            value.push(c);
            session.set_asset_amount(&value);
        }
        Focus::WalletToggle => {
            if c == ' ' {
                session.set_wallet_enabled(!session.form().wallet_enabled);
            }
        }
        Focus::AuthToggle => {
            if c == ' ' {
                session.set_auth_enabled(!session.form().auth_enabled);
            }
        }
    }
}

fn edit_backspace(state: &mut UiState) {
    let session = &mut state.session;
    match state.focus {
        Focus::NoteScript => {
            let mut text = session.form().note_script.clone();
            text.pop();
            session.set_note_script(text);
        }
        Focus::TransactionScript => {
            let mut text = session.form().transaction_script.clone();
            text.pop();
            session.set_transaction_script(text);
        }
        Focus::AccountCode => {
            let mut text = session.form().account_code.clone();
            text.pop();
            session.set_account_code(text);
        }
        Focus::NoteInput(i) => {
            let mut value = session.form().note_inputs[i].clone();
            value.pop();
            session.set_note_input(i, &value);
        }
        Focus::AssetAmount => {
            let mut value = session.form().asset_amount.clone();
            value.pop();
            session.set_asset_amount(&value);
        }
        Focus::WalletToggle | Focus::AuthToggle => {}
    }
}

fn pane_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    }
}

fn script_pane<'a>(title: &'a str, text: &'a str, focused: bool) -> Paragraph<'a> {
    Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(pane_style(focused)),
        )
        .wrap(Wrap { trim: false })
}

fn draw(area: Rect, f: &mut Frame, state: &UiState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(45),
            Constraint::Percentage(45),
            Constraint::Length(3),
        ])
        .split(area);

    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(38),
            Constraint::Percentage(38),
            Constraint::Percentage(24),
        ])
        .split(rows[0]);

    let form = state.session.form();
    f.render_widget(
        script_pane(
            "Note Script",
            &form.note_script,
            state.focus == Focus::NoteScript,
        ),
        top[0],
    );
    f.render_widget(
        script_pane(
            "Transaction Script",
            &form.transaction_script,
            state.focus == Focus::TransactionScript,
        ),
        top[1],
    );
    f.render_widget(inputs_pane(state), top[2]);

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);

    f.render_widget(
        script_pane(
            "Account Code",
            &form.account_code,
            state.focus == Focus::AccountCode,
        ),
        bottom[0],
    );
    f.render_widget(outcome_pane(state), bottom[1]);

    f.render_widget(status_bar(state), rows[2]);
}

fn inputs_pane(state: &UiState) -> Paragraph<'_> {
    let form = state.session.form();
    let mut lines: Vec<Line> = Vec::new();
    for (i, value) in form.note_inputs.iter().enumerate() {
        let label = format!("Input {}: ", i + 1);
        let style = pane_style(state.focus == Focus::NoteInput(i));
        lines.push(Line::from(vec![
            Span::styled(label, style),
            Span::raw(value.as_str()),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled(
            "Asset Amount: ",
            pane_style(state.focus == Focus::AssetAmount),
        ),
        Span::raw(form.asset_amount.as_str()),
    ]));
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled(
            format!("[{}] Wallet", if form.wallet_enabled { "x" } else { " " }),
            pane_style(state.focus == Focus::WalletToggle),
        ),
        Span::raw("  "),
        Span::styled(
            format!("[{}] Auth", if form.auth_enabled { "x" } else { " " }),
            pane_style(state.focus == Focus::AuthToggle),
        ),
    ]));

    Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Note Inputs"))
}

fn outcome_pane(state: &UiState) -> Paragraph<'_> {
    let outcome = state.session.outcome();
    let mut lines: Vec<Line> = Vec::new();

    if state.running {
        lines.push(Line::from(Span::styled(
            "Executing…",
            Style::default().add_modifier(Modifier::ITALIC),
        )));
    } else if let Some(err) = outcome.error() {
        lines.push(Line::from(Span::styled(
            "Error:",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(Span::styled(
            err.to_string(),
            Style::default().fg(Color::Red),
        )));
    } else if let Some(outputs) = outcome.result() {
        for line in crate::cli::text_summary(outputs) {
            lines.push(Line::from(line));
        }
        if let Some(ts) = outcome.completed_at() {
            lines.push(Line::from(Span::styled(
                format!("Completed at {ts}"),
                Style::default().fg(Color::Gray),
            )));
        }
    } else {
        lines.push(Line::from(Span::styled(
            "No execution yet. Ctrl+R to run.",
            Style::default().fg(Color::Gray),
        )));
    }

    Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Outputs"))
        .wrap(Wrap { trim: false })
}

fn status_bar(state: &UiState) -> Paragraph<'_> {
    let ready = if state.running {
        Span::styled("busy", Style::default().fg(Color::Yellow))
    } else if state.session.runtime().ready {
        Span::styled("ready", Style::default().fg(Color::Green))
    } else if state.accepting {
        Span::styled("on-demand", Style::default().fg(Color::Green))
    } else {
        Span::styled("loading", Style::default().fg(Color::Yellow))
    };
    let line = Line::from(vec![
        Span::raw("Engine: "),
        ready,
        Span::raw("  |  Tab focus  Ctrl+R run  Ctrl+L reset  Ctrl+C quit  |  "),
        Span::raw(state.info.as_str()),
    ]);
    Paragraph::new(line).block(Block::default().borders(Borders::ALL))
}
