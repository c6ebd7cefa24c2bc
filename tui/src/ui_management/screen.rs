use std::io::{self, Write};

use crossterm::{
    cursor::{MoveTo, MoveToColumn},
    queue,
    style::Print,
    terminal::{Clear, ClearType},
};

use crate::state_store::output::Output;

use super::components::InputBox;

pub const PROMPT: &str = "$ ";

/// [Screen] writes the state store output and keeps the prompt below it.
///
/// In raw mode the prompt line is redrawn in place, including the partially typed input. Otherwise
/// the terminal owns the input echo and only the prompt itself is written.
pub struct Screen<W: Write> {
    writer: W,
    raw_mode: bool,
    prompt_visible: bool,
}

impl<W: Write> Screen<W> {
    pub fn new(writer: W, raw_mode: bool) -> Self {
        Self {
            writer,
            raw_mode,
            prompt_visible: false,
        }
    }

    pub fn write(&mut self, output: Output, input_box: &InputBox) -> io::Result<()> {
        match output {
            Output::Lines(lines) => {
                self.take_prompt_line()?;
                for line in lines {
                    self.print_line(&line)?;
                }
                self.restore_prompt_line(input_box)?;
            }
            Output::ClearScreen => {
                queue!(self.writer, Clear(ClearType::All), MoveTo(0, 0))?;
                self.restore_prompt_line(input_box)?;
            }
            Output::Prompt => {
                self.take_prompt_line()?;
                self.prompt_visible = true;
                self.restore_prompt_line(input_box)?;
            }
        }

        self.writer.flush()
    }

    /// Draws the prompt line again after the input changed
    pub fn redraw_prompt(&mut self, input_box: &InputBox) -> io::Result<()> {
        if !self.raw_mode {
            return Ok(());
        }

        self.take_prompt_line()?;
        self.restore_prompt_line(input_box)?;
        self.writer.flush()
    }

    /// Lists completion candidates between the output and the prompt
    pub fn list_candidates(&mut self, candidates: &[&str], input_box: &InputBox) -> io::Result<()> {
        self.write(Output::Lines(vec![candidates.join("  ")]), input_box)
    }

    /// Moves past the submitted line; the prompt stays hidden until the next [Output::Prompt]
    pub fn submit(&mut self) -> io::Result<()> {
        if self.raw_mode && self.prompt_visible {
            queue!(self.writer, Print("\r\n"))?;
        }
        self.prompt_visible = false;

        self.writer.flush()
    }

    fn print_line(&mut self, line: &str) -> io::Result<()> {
        let new_line = if self.raw_mode { "\r\n" } else { "\n" };

        queue!(self.writer, Print(line), Print(new_line))
    }

    /// Gets the prompt out of the way of the lines about to be printed
    fn take_prompt_line(&mut self) -> io::Result<()> {
        if !self.prompt_visible {
            return Ok(());
        }

        if self.raw_mode {
            queue!(self.writer, MoveToColumn(0), Clear(ClearType::CurrentLine))
        } else {
            queue!(self.writer, Print("\n"))
        }
    }

    fn restore_prompt_line(&mut self, input_box: &InputBox) -> io::Result<()> {
        if !self.prompt_visible {
            return Ok(());
        }

        if self.raw_mode {
            let column = PROMPT.chars().count() + input_box.cursor_position();
            queue!(
                self.writer,
                Print(PROMPT),
                Print(input_box.text()),
                MoveToColumn(u16::try_from(column).unwrap_or(u16::MAX))
            )
        } else {
            queue!(self.writer, Print(PROMPT))
        }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.writer
    }
}
