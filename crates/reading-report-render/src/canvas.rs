//! Page sink abstraction for document encoders.

use crate::render_ir::{CircleCommand, DrawCommand, RectCommand, RenderPage, TextCommand};

/// Receiver of laid-out pages, implemented by document encoders.
///
/// Calls arrive in order: `begin_page`, the page's primitives (content layer
/// first, then chrome), `end_page`, and `page_break` between two pages.
pub trait PageCanvas {
    type Error;

    fn begin_page(&mut self, page_number: usize) -> Result<(), Self::Error>;
    fn fill_rect(&mut self, rect: &RectCommand) -> Result<(), Self::Error>;
    fn stroke_rect(&mut self, rect: &RectCommand) -> Result<(), Self::Error>;
    fn circle(&mut self, circle: &CircleCommand) -> Result<(), Self::Error>;
    fn text_run(&mut self, text: &TextCommand) -> Result<(), Self::Error>;
    fn end_page(&mut self) -> Result<(), Self::Error>;

    fn page_break(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Replay pages into a canvas, stopping at the first sink error.
pub fn replay_pages<C>(pages: &[RenderPage], canvas: &mut C) -> Result<(), C::Error>
where
    C: PageCanvas + ?Sized,
{
    for (idx, page) in pages.iter().enumerate() {
        if idx > 0 {
            canvas.page_break()?;
        }
        canvas.begin_page(page.page_number)?;
        for cmd in page.merged_commands_iter() {
            match cmd {
                DrawCommand::FillRect(rect) => canvas.fill_rect(rect)?,
                DrawCommand::StrokeRect(rect) => canvas.stroke_rect(rect)?,
                DrawCommand::Circle(circle) => canvas.circle(circle)?,
                DrawCommand::Text(text) => canvas.text_run(text)?,
            }
        }
        canvas.end_page()?;
    }
    Ok(())
}
