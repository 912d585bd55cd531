//! Debugger application state and logic.

use crate::cpu::{decode, StepOutcome};
use crate::host::Session;
use crate::loader::ProgramImage;
use crate::trace::format_step;
use std::collections::HashSet;

/// Lines of memory the view can scroll through (8 words per line).
pub const MEMORY_LINES: usize = crate::cpu::MEMORY_SIZE / 16;

/// Debugger application state.
pub struct DebuggerApp {
    /// The loaded program and its machine.
    pub session: Session,
    /// Breakpoints (by address).
    pub breakpoints: HashSet<u16>,
    /// Is the debugger running continuously?
    pub running: bool,
    /// Should we quit?
    pub should_quit: bool,
    /// Status message to display.
    pub status: String,
    /// Memory view scroll offset, in lines.
    pub mem_scroll: usize,
}

impl DebuggerApp {
    /// Create a new debugger around a loaded program.
    pub fn new(session: Session) -> Self {
        // Start the memory view on the data segment
        let mem_scroll = session.program.data.start / 16;

        Self {
            session,
            breakpoints: HashSet::new(),
            running: false,
            should_quit: false,
            status: "Ready. Press 's' to step, 'r' to run, 'q' to quit.".into(),
            mem_scroll,
        }
    }

    /// Step one instruction.
    pub fn step(&mut self) {
        let machine = &mut self.session.machine;
        if !machine.is_running() {
            self.status = format!("Machine stopped: {:?}", machine.status());
            self.running = false;
            return;
        }

        match machine.step() {
            StepOutcome::Continue => {
                if let Some(record) = machine.last_step() {
                    self.status = format_step(record);
                }
            }
            StepOutcome::Halted => {
                self.status = format!("Halted after {} steps", machine.steps());
                self.running = false;
            }
            StepOutcome::Faulted(fault) => {
                self.status = format!("Fault: {}", fault);
                self.running = false;
            }
        }
    }

    /// Run until halt, breakpoint, or fault.
    pub fn run(&mut self) {
        self.running = true;
        self.status = "Running...".into();
    }

    /// Run one iteration of continuous execution.
    pub fn tick(&mut self) {
        if !self.running {
            return;
        }

        // The first tick steps off a breakpoint we are already sitting on
        self.step();

        let pc = self.session.machine.pc;
        if self.running && self.breakpoints.contains(&pc) {
            self.running = false;
            self.status = format!("Breakpoint at PC={:04X}", pc);
        }
    }

    /// Toggle breakpoint at current PC.
    pub fn toggle_breakpoint(&mut self) {
        let pc = self.session.machine.pc;
        if self.breakpoints.remove(&pc) {
            self.status = format!("Removed breakpoint at PC={:04X}", pc);
        } else {
            self.breakpoints.insert(pc);
            self.status = format!("Set breakpoint at PC={:04X}", pc);
        }
    }

    /// Reload the program and start over.
    pub fn reset(&mut self) {
        self.running = false;
        self.status = match self.session.reset() {
            Ok(()) => "Reset. Ready.".into(),
            Err(e) => format!("Reset failed: {}", e),
        };
    }

    /// The program being debugged.
    pub fn image(&self) -> &ProgramImage {
        &self.session.image
    }

    /// Decoded words around the current PC: `(address, text, is_current)`.
    pub fn get_code_view(&self, lines: usize) -> Vec<(u16, String, bool)> {
        let machine = &self.session.machine;
        let pc = machine.pc;
        let start = pc.saturating_sub(2 * (lines as u16 / 2));

        (0..lines as u16)
            .filter_map(|i| {
                let addr = start.checked_add(2 * i)?;
                let word = machine.mem.read_word(addr).ok()?;
                let text = format!("{:04X}  {}", word, decode(word));
                Some((addr, text, addr == pc))
            })
            .collect()
    }
}

/// Run the debugger with a program.
pub fn run_debugger(image: ProgramImage) -> std::io::Result<()> {
    use crossterm::{
        event::{self, Event, KeyCode, KeyEventKind},
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
        ExecutableCommand,
    };
    use ratatui::prelude::*;
    use std::io::stdout;
    use std::time::Duration;

    let session = Session::load(image)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut app = DebuggerApp::new(session);

    // Main loop
    loop {
        terminal.draw(|frame| {
            super::ui::draw(frame, &app);
        })?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') => app.should_quit = true,
                        KeyCode::Char('s') => {
                            app.running = false;
                            app.step();
                        }
                        KeyCode::Char('r') => app.run(),
                        KeyCode::Char('p') => {
                            app.running = false;
                            app.status = "Paused.".into();
                        }
                        KeyCode::Char('b') => app.toggle_breakpoint(),
                        KeyCode::Char('x') => app.reset(),
                        KeyCode::Up => {
                            app.mem_scroll = app.mem_scroll.saturating_sub(1);
                        }
                        KeyCode::Down => {
                            if app.mem_scroll + 1 < MEMORY_LINES {
                                app.mem_scroll += 1;
                            }
                        }
                        _ => {}
                    }
                }
            }
        }

        if app.running {
            app.tick();
        }

        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::programs;

    fn app() -> DebuggerApp {
        DebuggerApp::new(Session::load(programs::range_sum(-2, 3)).unwrap())
    }

    #[test]
    fn test_step_updates_status() {
        let mut app = app();
        app.step();

        assert_eq!(app.status, "0200: 0003  sub r0, r0, r0");
        assert_eq!(app.session.machine.pc, 0x0202);
    }

    #[test]
    fn test_run_stops_at_breakpoint() {
        let mut app = app();
        app.breakpoints.insert(0x0216);
        app.run();

        while app.running {
            app.tick();
        }

        assert_eq!(app.session.machine.pc, 0x0216);
        assert!(app.session.machine.is_running());
        assert!(app.status.starts_with("Breakpoint"));

        // Resuming continues to the halt
        app.run();
        while app.running {
            app.tick();
        }
        assert!(app.session.machine.is_halted());
    }

    #[test]
    fn test_toggle_breakpoint_and_reset() {
        let mut app = app();
        app.toggle_breakpoint();
        assert!(app.breakpoints.contains(&0x0200));
        app.toggle_breakpoint();
        assert!(app.breakpoints.is_empty());

        app.step();
        app.reset();
        assert_eq!(app.session.machine.pc, 0x0200);
        assert_eq!(app.session.machine.steps(), 0);
    }

    #[test]
    fn test_code_view_marks_pc() {
        let app = app();
        let view = app.get_code_view(5);

        assert_eq!(view.len(), 5);
        assert_eq!(view[0].0, 0x01FC);
        assert_eq!(view[2], (0x0200, "0003  sub r0, r0, r0".to_string(), true));
        assert!(!view[3].2);
    }
}
