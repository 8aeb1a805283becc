use std::{fmt, io::Write, rc::Rc};

use crate::CommandError;

/// Where help, version and error text goes.
#[derive(Clone)]
pub struct Output {
    write_out: Rc<dyn Fn(&str)>,
    write_err: Rc<dyn Fn(&str)>,
}

impl Output {
    pub fn new<O, E>(write_out: O, write_err: E) -> Output
    where
        O: Fn(&str) + 'static,
        E: Fn(&str) + 'static,
    {
        Output { write_out: Rc::new(write_out), write_err: Rc::new(write_err) }
    }

    pub fn write_out(&self, text: &str) {
        (self.write_out)(text)
    }

    pub fn write_err(&self, text: &str) {
        (self.write_err)(text)
    }
}

impl Default for Output {
    fn default() -> Output {
        Output::new(
            |text| drop(std::io::stdout().write_all(text.as_bytes())),
            |text| drop(std::io::stderr().write_all(text.as_bytes())),
        )
    }
}

impl fmt::Debug for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Output")
    }
}

/// What happens to a terminal [`CommandError`] once `parse` finishes.
#[derive(Clone, Default)]
pub enum ExitPolicy {
    /// Terminate the process with the error's exit code.
    #[default]
    Exit,
    /// Return the error from `parse`, after calling the callback if any.
    Return(Option<Rc<dyn Fn(&CommandError)>>),
}

impl fmt::Debug for ExitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitPolicy::Exit => f.write_str("Exit"),
            ExitPolicy::Return(cb) => write!(f, "Return(callback: {})", cb.is_some()),
        }
    }
}
